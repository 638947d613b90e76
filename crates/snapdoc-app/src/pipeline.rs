// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline controller: one selection walked through build and upload.
//
// Steps take `&mut self`, so a controller never builds and uploads at the
// same time. Each controller owns its selection and document; only the
// stores are shared.

use std::sync::Arc;

use snapdoc_core::error::{ErrorKind, Result, SnapdocError};
use snapdoc_core::types::{CaptureId, CaptureRecord, DocumentPayload, UploadReceipt};
use snapdoc_document::DocumentBuilder;
use snapdoc_store::CollectionStore;
use snapdoc_sync::SyncClient;
use tracing::{debug, error, info, instrument, warn};

/// Pipeline step a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Selecting,
    Building,
    Uploading,
}

/// Where the pipeline is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing selected, nothing built.
    Idle,
    /// At least one capture selected.
    Selecting,
    /// Document build in progress.
    Building,
    /// Document built; waiting for the user to confirm the upload.
    Built,
    /// Upload in progress.
    Uploading,
    /// Upload accepted. Passed through on the way back to `Idle`.
    Done,
    /// A step failed. The selection is kept so the step can be re-triggered.
    Error {
        stage: Stage,
        kind: ErrorKind,
        message: String,
    },
}

pub struct PipelineController {
    collection: Arc<CollectionStore>,
    builder: Arc<DocumentBuilder>,
    client: Arc<SyncClient>,
    /// Selected ids in the order they were picked.
    selected: Vec<CaptureId>,
    state: PipelineState,
    document: Option<DocumentPayload>,
    last_upload: Option<UploadReceipt>,
}

impl PipelineController {
    pub fn new(
        collection: Arc<CollectionStore>,
        builder: Arc<DocumentBuilder>,
        client: Arc<SyncClient>,
    ) -> Self {
        Self {
            collection,
            builder,
            client,
            selected: Vec::new(),
            state: PipelineState::Idle,
            document: None,
            last_upload: None,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// The built document awaiting upload, if any.
    pub fn document(&self) -> Option<&DocumentPayload> {
        self.document.as_ref()
    }

    pub fn last_upload(&self) -> Option<&UploadReceipt> {
        self.last_upload.as_ref()
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "pipeline transition");
        }
        self.state = next;
    }

    fn fail(&mut self, stage: Stage, err: &SnapdocError) {
        error!(?stage, error = %err, "pipeline step failed");
        self.transition(PipelineState::Error {
            stage,
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    // -- Selection -----------------------------------------------------------

    /// Selected captures that still exist, in collection order.
    pub fn selection(&self) -> Vec<CaptureId> {
        self.selected_records().into_iter().map(|r| r.id).collect()
    }

    /// Records for the current selection, in collection order.
    pub fn selected_records(&self) -> Vec<CaptureRecord> {
        self.collection
            .snapshot()
            .into_iter()
            .filter(|r| self.selected.contains(&r.id))
            .collect()
    }

    pub fn is_selected(&self, id: &CaptureId) -> bool {
        self.selected.contains(id)
    }

    /// Flip membership of `id`. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &CaptureId) -> Result<bool> {
        if self.selected.contains(id) {
            self.deselect(id);
            Ok(false)
        } else {
            self.select(id)?;
            Ok(true)
        }
    }

    /// Add `id` to the selection. It must name an existing capture.
    pub fn select(&mut self, id: &CaptureId) -> Result<()> {
        if self.selected.contains(id) {
            return Ok(());
        }
        if !self.collection.contains(id) {
            return Err(SnapdocError::InvalidCapture(format!("no capture with id {id}")));
        }
        self.selected.push(id.clone());
        self.selection_changed();
        Ok(())
    }

    /// Remove `id` from the selection. Returns whether it was selected.
    pub fn deselect(&mut self, id: &CaptureId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| s != id);
        let changed = self.selected.len() != before;
        if changed {
            self.selection_changed();
        }
        changed
    }

    pub fn clear_selection(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.selection_changed();
        }
    }

    /// Delete a capture from the collection and drop it from the selection.
    pub async fn remove_capture(&mut self, id: &CaptureId) -> bool {
        let removed = match self.collection.remove(id).await {
            Ok(removed) => removed,
            // Only a real removal reaches the durable write.
            Err(_) => true,
        };
        self.deselect(id);
        removed
    }

    /// A built document no longer matches a changed selection.
    fn selection_changed(&mut self) {
        if self.document.is_some() {
            info!("selection changed; discarding built document");
            self.drop_document();
        }
        self.settle();
    }

    /// `Uploading` outside `confirm_upload` means its future was dropped
    /// mid-request. The document is still held, so fall back to `Built`.
    fn recover_interrupted_upload(&mut self) {
        if self.state == PipelineState::Uploading {
            warn!("previous upload was abandoned; document awaits confirmation again");
            if self.document.is_some() {
                self.transition(PipelineState::Built);
            } else {
                self.settle();
            }
        }
    }

    fn settle(&mut self) {
        let next = if self.selected.is_empty() {
            PipelineState::Idle
        } else {
            PipelineState::Selecting
        };
        self.transition(next);
    }

    // -- Build ---------------------------------------------------------------

    /// Build a document from the current selection.
    ///
    /// Selected ids whose captures have since been removed are dropped
    /// first. An empty effective selection fails without invoking the
    /// builder. The builder works on a snapshot, so captures added or removed
    /// while it runs do not affect the result.
    #[instrument(skip(self), fields(selected = self.selected.len()))]
    pub async fn build(&mut self) -> Result<&DocumentPayload> {
        self.recover_interrupted_upload();
        let images = self.selected_records();
        if images.len() != self.selected.len() {
            let stale = self.selected.len() - images.len();
            warn!(stale, "dropping selected captures that no longer exist");
            self.selected.retain(|id| images.iter().any(|r| &r.id == id));
        }

        if self.document.is_some() {
            self.drop_document();
        }

        if images.is_empty() {
            let err = SnapdocError::EmptySelection;
            self.fail(Stage::Selecting, &err);
            return Err(err);
        }

        self.transition(PipelineState::Building);
        match self.builder.build(&images).await {
            Ok(document) => {
                info!(file_name = %document.file_name, pages = document.page_count(), "document ready for upload");
                self.transition(PipelineState::Built);
                Ok(self.document.insert(document))
            }
            Err(err) => {
                self.fail(Stage::Building, &err);
                Err(err)
            }
        }
    }

    // -- Upload --------------------------------------------------------------

    /// Upload the built document. On success the selection is cleared and
    /// the pipeline returns to `Idle`; on failure the document is kept so
    /// calling this again retries without rebuilding.
    #[instrument(skip(self))]
    pub async fn confirm_upload(&mut self) -> Result<UploadReceipt> {
        self.recover_interrupted_upload();
        if self.document.is_none() {
            return Err(SnapdocError::NothingToUpload);
        }

        self.transition(PipelineState::Uploading);
        let Some(document) = self.document.as_ref() else {
            return Err(SnapdocError::NothingToUpload);
        };
        let file_name = document.file_name.clone();
        match self.client.upload(document).await {
            Ok(receipt) => {
                info!(file_name = %file_name, "upload complete");
                self.transition(PipelineState::Done);
                self.document = None;
                self.selected.clear();
                self.last_upload = Some(receipt.clone());
                self.transition(PipelineState::Idle);
                Ok(receipt)
            }
            Err(err) => {
                self.fail(Stage::Uploading, &err);
                Err(err)
            }
        }
    }

    /// Keep the built document without uploading it.
    pub fn decline_upload(&mut self) -> Result<()> {
        self.recover_interrupted_upload();
        if self.document.is_none() {
            return Err(SnapdocError::InvalidTransition(
                "no built document to decline".into(),
            ));
        }
        info!("upload declined; document kept");
        self.transition(PipelineState::Built);
        Ok(())
    }

    /// Throw away the built document (and its on-disk artifact). Returns
    /// whether there was one.
    pub fn discard_document(&mut self) -> bool {
        if self.document.is_none() {
            return false;
        }
        self.drop_document();
        self.settle();
        true
    }

    fn drop_document(&mut self) {
        if let Some(path) = self.document.take().and_then(|d| d.artifact) {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(error = %e, path = %path.display(), "could not delete discarded artifact");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;
    use snapdoc_core::AppConfig;
    use snapdoc_core::types::{RenderTarget, User};
    use snapdoc_store::{MemoryBacking, SessionStore};
    use snapdoc_sync::{MockTransport, TransportError, UPLOAD_PATH};

    struct Rig {
        collection: Arc<CollectionStore>,
        session: Arc<SessionStore>,
        transport: MockTransport,
        pipeline: PipelineController,
    }

    fn rig(transport: MockTransport, builder: DocumentBuilder) -> Rig {
        let collection = Arc::new(CollectionStore::new(Arc::new(MemoryBacking::new())));
        let session = Arc::new(SessionStore::new(Arc::new(MemoryBacking::new())));
        let client = Arc::new(SyncClient::new(Arc::new(transport.clone()), session.clone()));
        let pipeline = PipelineController::new(collection.clone(), Arc::new(builder), client);
        Rig {
            collection,
            session,
            transport,
            pipeline,
        }
    }

    fn default_rig() -> Rig {
        rig(MockTransport::accepting("T1"), DocumentBuilder::new(RenderTarget::Native))
    }

    async fn add(rig: &Rig, id: &str, offset: i64) -> CaptureId {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(offset);
        let record = CaptureRecord::with_id(id, format!("file://{id}.jpg"), at);
        rig.collection.append(record).await.unwrap();
        CaptureId::from(id)
    }

    async fn sign_in(rig: &Rig) {
        let user = User {
            id: "1".into(),
            email: "ada@example.com".into(),
        };
        rig.session.set_session(user, "T1").await.unwrap();
    }

    #[tokio::test]
    async fn toggling_moves_between_idle_and_selecting() {
        let mut r = default_rig();
        let a = add(&r, "a", 0).await;

        assert!(r.pipeline.toggle(&a).unwrap());
        assert_eq!(r.pipeline.state(), &PipelineState::Selecting);
        assert!(!r.pipeline.toggle(&a).unwrap());
        assert_eq!(r.pipeline.state(), &PipelineState::Idle);
    }

    #[tokio::test]
    async fn unknown_ids_cannot_be_selected() {
        let mut r = default_rig();
        let err = r.pipeline.select(&CaptureId::from("ghost")).unwrap_err();
        assert!(matches!(err, SnapdocError::InvalidCapture(_)));
        assert!(r.pipeline.selection().is_empty());
    }

    #[tokio::test]
    async fn selection_follows_collection_order() {
        let mut r = default_rig();
        let a = add(&r, "a", 0).await;
        let b = add(&r, "b", 1).await;
        let c = add(&r, "c", 2).await;

        r.pipeline.select(&c).unwrap();
        r.pipeline.select(&a).unwrap();
        r.pipeline.select(&b).unwrap();
        assert_eq!(r.pipeline.selection(), vec![a, b, c]);
    }

    #[tokio::test]
    async fn empty_selection_fails_without_building() {
        let dir = tempfile::tempdir().unwrap();
        let builder = DocumentBuilder::new(RenderTarget::Native).with_output_dir(dir.path());
        let mut r = rig(MockTransport::accepting("T1"), builder);

        let err = r.pipeline.build().await.unwrap_err();
        assert!(matches!(err, SnapdocError::EmptySelection));
        assert!(matches!(
            r.pipeline.state(),
            PipelineState::Error {
                stage: Stage::Selecting,
                kind: ErrorKind::EmptySelection,
                ..
            }
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn build_waits_for_confirmation() {
        let mut r = default_rig();
        sign_in(&r).await;
        let a = add(&r, "a", 0).await;
        r.pipeline.select(&a).unwrap();

        r.pipeline.build().await.unwrap();
        assert_eq!(r.pipeline.state(), &PipelineState::Built);
        assert_eq!(r.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn decline_keeps_document() {
        let mut r = default_rig();
        let a = add(&r, "a", 0).await;
        r.pipeline.select(&a).unwrap();
        r.pipeline.build().await.unwrap();

        r.pipeline.decline_upload().unwrap();
        assert_eq!(r.pipeline.state(), &PipelineState::Built);
        assert!(r.pipeline.document().is_some());
    }

    #[tokio::test]
    async fn decline_without_document_is_invalid() {
        let mut r = default_rig();
        assert!(matches!(
            r.pipeline.decline_upload(),
            Err(SnapdocError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn successful_upload_resets_pipeline() {
        let mut r = default_rig();
        sign_in(&r).await;
        let a = add(&r, "a", 0).await;
        r.pipeline.select(&a).unwrap();
        r.pipeline.build().await.unwrap();

        let receipt = r.pipeline.confirm_upload().await.unwrap();
        assert_eq!(r.pipeline.state(), &PipelineState::Idle);
        assert!(r.pipeline.selection().is_empty());
        assert!(r.pipeline.document().is_none());
        assert_eq!(r.pipeline.last_upload(), Some(&receipt));
        // The capture itself stays in the collection.
        assert!(r.collection.contains(&a));
    }

    #[tokio::test]
    async fn confirm_without_document_is_rejected() {
        let mut r = default_rig();
        assert!(matches!(
            r.pipeline.confirm_upload().await,
            Err(SnapdocError::NothingToUpload)
        ));
        assert_eq!(r.pipeline.state(), &PipelineState::Idle);
    }

    #[tokio::test]
    async fn failed_upload_keeps_document_for_retry() {
        let transport = MockTransport::new();
        transport.fail(UPLOAD_PATH, TransportError::Timeout);
        let mut r = rig(transport, DocumentBuilder::new(RenderTarget::Native));
        sign_in(&r).await;
        let a = add(&r, "a", 0).await;
        r.pipeline.select(&a).unwrap();
        let built_sha = r.pipeline.build().await.unwrap().sha256.clone();

        let err = r.pipeline.confirm_upload().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upload);
        assert!(matches!(
            r.pipeline.state(),
            PipelineState::Error {
                stage: Stage::Uploading,
                kind: ErrorKind::Upload,
                ..
            }
        ));
        assert_eq!(r.pipeline.selection(), vec![a.clone()]);

        // Service recovers; retry uploads the very same bytes.
        r.transport.respond(UPLOAD_PATH, 200, json!({"success": true}));
        r.pipeline.confirm_upload().await.unwrap();
        let sent = r.transport.calls_to(UPLOAD_PATH);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].body["sha256"], built_sha.as_str());
        assert_eq!(r.pipeline.state(), &PipelineState::Idle);
    }

    #[tokio::test]
    async fn selection_change_discards_built_document() {
        let dir = tempfile::tempdir().unwrap();
        let builder = DocumentBuilder::new(RenderTarget::Markup).with_output_dir(dir.path());
        let mut r = rig(MockTransport::accepting("T1"), builder);
        let a = add(&r, "a", 0).await;
        let b = add(&r, "b", 1).await;
        r.pipeline.select(&a).unwrap();

        let artifact = r.pipeline.build().await.unwrap().artifact.clone().unwrap();
        assert!(artifact.exists());

        r.pipeline.select(&b).unwrap();
        assert!(r.pipeline.document().is_none());
        assert_eq!(r.pipeline.state(), &PipelineState::Selecting);
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn discard_returns_to_selecting() {
        let mut r = default_rig();
        let a = add(&r, "a", 0).await;
        r.pipeline.select(&a).unwrap();
        r.pipeline.build().await.unwrap();

        assert!(r.pipeline.discard_document());
        assert_eq!(r.pipeline.state(), &PipelineState::Selecting);
        assert!(!r.pipeline.discard_document());
    }

    #[tokio::test]
    async fn removed_capture_is_dropped_before_build() {
        let mut r = default_rig();
        let a = add(&r, "a", 0).await;
        let b = add(&r, "b", 1).await;
        r.pipeline.select(&a).unwrap();
        r.pipeline.select(&b).unwrap();

        // Removed behind the controller's back.
        r.collection.remove(&b).await.unwrap();

        let doc = r.pipeline.build().await.unwrap();
        assert_eq!(doc.uris(), vec!["file://a.jpg"]);
        assert!(!r.pipeline.is_selected(&b));
    }

    #[tokio::test]
    async fn remove_capture_through_controller_updates_selection() {
        let mut r = default_rig();
        let a = add(&r, "a", 0).await;
        r.pipeline.select(&a).unwrap();

        assert!(r.pipeline.remove_capture(&a).await);
        assert!(r.collection.is_empty());
        assert_eq!(r.pipeline.state(), &PipelineState::Idle);
    }

    #[tokio::test]
    async fn build_failure_is_reported_with_stage() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let config = AppConfig::default();
        let builder = DocumentBuilder::from_config(&config, Some(blocker));
        let mut r = rig(MockTransport::accepting("T1"), builder);
        let a = add(&r, "a", 0).await;
        r.pipeline.select(&a).unwrap();

        let err = r.pipeline.build().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DocumentBuild);
        assert!(matches!(
            r.pipeline.state(),
            PipelineState::Error {
                stage: Stage::Building,
                ..
            }
        ));
        assert!(r.pipeline.document().is_none());
        // Selection survives for a manual retry.
        assert_eq!(r.pipeline.selection(), vec![a]);
    }

    #[tokio::test]
    async fn pipelines_sharing_a_builder_keep_separate_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let builder = DocumentBuilder::new(RenderTarget::Native).with_output_dir(dir.path());
        let mut first = rig(MockTransport::accepting("T1"), builder);
        let a = add(&first, "a", 0).await;
        let b = add(&first, "b", 1).await;
        let mut second = PipelineController::new(
            first.collection.clone(),
            first.pipeline.builder.clone(),
            first.pipeline.client.clone(),
        );

        first.pipeline.select(&a).unwrap();
        second.select(&b).unwrap();
        let one = first.pipeline.build().await.unwrap().clone();
        let two = second.build().await.unwrap().clone();

        let (p1, p2) = (one.artifact.clone().unwrap(), two.artifact.clone().unwrap());
        assert_ne!(p1, p2);
        assert_eq!(std::fs::read(&p1).unwrap(), one.bytes);
        assert_eq!(std::fs::read(&p2).unwrap(), two.bytes);

        assert!(second.discard_document());
        assert!(!p2.exists());
        assert_eq!(std::fs::read(&p1).unwrap(), one.bytes);
        assert_eq!(first.pipeline.document(), Some(&one));
    }

    #[tokio::test]
    async fn abandoned_upload_falls_back_to_built() {
        use std::time::Duration as StdDuration;
        use snapdoc_sync::HttpTransport;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPLOAD_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true}))
                    .set_delay(StdDuration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), StdDuration::from_secs(30)).unwrap();
        let mut r = default_rig();
        let client = Arc::new(SyncClient::new(Arc::new(transport), r.session.clone()));
        r.pipeline.client = client;
        sign_in(&r).await;
        let a = add(&r, "a", 0).await;
        r.pipeline.select(&a).unwrap();
        r.pipeline.build().await.unwrap();

        let abandoned =
            tokio::time::timeout(StdDuration::from_millis(100), r.pipeline.confirm_upload()).await;
        assert!(abandoned.is_err());
        assert_eq!(r.pipeline.state(), &PipelineState::Uploading);

        r.pipeline.decline_upload().unwrap();
        assert_eq!(r.pipeline.state(), &PipelineState::Built);
        assert!(r.pipeline.document().is_some());
        assert_eq!(r.pipeline.selection(), vec![a]);
    }
}
