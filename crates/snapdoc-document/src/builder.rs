// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document builder: ordered captures in, one `DocumentPayload` out.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use snapdoc_core::config::AppConfig;
use snapdoc_core::error::{Result, SnapdocError};
use snapdoc_core::types::{CaptureRecord, DocumentPayload, PageEntry, RenderTarget};
use snapdoc_security::hash_bytes;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::artifact;
use crate::render::{DocumentDraft, DocumentRenderer, renderer_for};

/// Title used when none is configured.
pub const DEFAULT_TITLE: &str = "Camera Document";

/// Builds documents with one rendering strategy.
///
/// The builder holds no per-document state; one instance can build any
/// number of documents, concurrently if need be.
pub struct DocumentBuilder {
    renderer: Box<dyn DocumentRenderer>,
    title: String,
    output_dir: Option<PathBuf>,
}

impl DocumentBuilder {
    pub fn new(target: RenderTarget) -> Self {
        Self::with_renderer(renderer_for(target))
    }

    pub fn with_renderer(renderer: Box<dyn DocumentRenderer>) -> Self {
        Self {
            renderer,
            title: DEFAULT_TITLE.to_owned(),
            output_dir: None,
        }
    }

    /// Builder configured from application settings. Artifacts go to
    /// `documents_dir` only when `config.write_artifacts` is set.
    pub fn from_config(config: &AppConfig, documents_dir: Option<PathBuf>) -> Self {
        let mut builder = Self::new(config.render_target).with_title(config.document_title.clone());
        if config.write_artifacts {
            builder.output_dir = documents_dir;
        }
        builder
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Also write each built document under `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn target(&self) -> RenderTarget {
        self.renderer.target()
    }

    /// Build a document stamped with the current time.
    pub async fn build(&self, images: &[CaptureRecord]) -> Result<DocumentPayload> {
        self.build_at(images, Utc::now()).await
    }

    /// Build a document stamped with `created_at`.
    ///
    /// Pages follow `images` exactly, repeats included. Identical inputs
    /// produce identical bytes. An empty slice is rejected before anything
    /// is rendered or written.
    #[instrument(skip(self, images), fields(pages = images.len(), target = ?self.target()))]
    pub async fn build_at(
        &self,
        images: &[CaptureRecord],
        created_at: DateTime<Utc>,
    ) -> Result<DocumentPayload> {
        if images.is_empty() {
            return Err(SnapdocError::EmptySelection);
        }

        let draft = DocumentDraft {
            title: self.title.clone(),
            created_at,
            pages: images.iter().map(PageEntry::from).collect(),
        };
        let bytes = self.renderer.render(&draft).map_err(|e| match e {
            SnapdocError::DocumentBuild(_) => e,
            other => SnapdocError::DocumentBuild(other.to_string()),
        })?;

        let sha256 = hash_bytes(&bytes);
        let file_name = format!(
            "document_{}.{}",
            created_at.timestamp_millis(),
            self.renderer.extension()
        );

        // Builders are shared between pipelines, so each build gets its own
        // file on disk even when two land in the same millisecond.
        let artifact = match &self.output_dir {
            Some(dir) => {
                let disk_name = format!(
                    "document_{}_{}.{}",
                    created_at.timestamp_millis(),
                    Uuid::new_v4().simple(),
                    self.renderer.extension()
                );
                Some(artifact::materialize(dir, &disk_name, &bytes).await?)
            }
            None => None,
        };

        info!(file_name = %file_name, bytes = bytes.len(), "document built");

        Ok(DocumentPayload {
            created_at,
            title: draft.title,
            pages: draft.pages,
            target: self.renderer.target(),
            mime_type: self.renderer.mime_type().to_owned(),
            file_name,
            bytes,
            sha256,
            artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use snapdoc_security::verify_payload;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap()
    }

    fn record(id: &str, minute: u32) -> CaptureRecord {
        CaptureRecord::with_id(id, format!("file://{id}.jpg"), at(minute))
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let builder = DocumentBuilder::new(RenderTarget::Markup);
        let err = builder.build(&[]).await.unwrap_err();
        assert!(matches!(err, SnapdocError::EmptySelection));
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let builder = DocumentBuilder::new(RenderTarget::Native).with_output_dir(dir.path());
        assert!(builder.build(&[]).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn pages_follow_input_order() {
        let builder = DocumentBuilder::new(RenderTarget::Native);
        let doc = builder
            .build(&[record("c", 2), record("a", 0), record("b", 1)])
            .await
            .unwrap();
        assert_eq!(doc.uris(), vec!["file://c.jpg", "file://a.jpg", "file://b.jpg"]);
        assert_eq!(doc.page_count(), 3);
    }

    #[tokio::test]
    async fn same_input_same_bytes() {
        let builder = DocumentBuilder::new(RenderTarget::Markup);
        let images = [record("a", 0), record("b", 1)];
        let first = builder.build_at(&images, at(30)).await.unwrap();
        let second = builder.build_at(&images, at(30)).await.unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.sha256, second.sha256);
        assert_eq!(first.file_name, second.file_name);
    }

    #[tokio::test]
    async fn payload_metadata_matches_strategy() {
        let created = at(45);
        let markup = DocumentBuilder::new(RenderTarget::Markup)
            .build_at(&[record("a", 0)], created)
            .await
            .unwrap();
        assert_eq!(markup.mime_type, "text/html");
        assert_eq!(markup.file_name, format!("document_{}.html", created.timestamp_millis()));

        let native = DocumentBuilder::new(RenderTarget::Native)
            .build_at(&[record("a", 0)], created)
            .await
            .unwrap();
        assert_eq!(native.mime_type, "application/json");
        assert!(native.file_name.ends_with(".json"));
        verify_payload(&native).unwrap();
    }

    #[tokio::test]
    async fn configured_title_reaches_document() {
        let config = AppConfig {
            render_target: RenderTarget::Markup,
            document_title: "Receipts <March>".into(),
            ..AppConfig::default()
        };
        let doc = DocumentBuilder::from_config(&config, None)
            .build(&[record("a", 0)])
            .await
            .unwrap();
        assert_eq!(doc.title, "Receipts <March>");
        let html = String::from_utf8(doc.bytes).unwrap();
        assert!(html.contains("<h1>Receipts &lt;March&gt;</h1>"));
    }

    #[tokio::test]
    async fn artifact_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default();
        let doc = DocumentBuilder::from_config(&config, Some(dir.path().to_path_buf()))
            .build(&[record("a", 0)])
            .await
            .unwrap();

        let path = doc.artifact.clone().unwrap();
        assert_eq!(std::fs::read(path).unwrap(), doc.bytes);
    }

    #[tokio::test]
    async fn same_millisecond_builds_get_separate_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let builder = DocumentBuilder::new(RenderTarget::Native).with_output_dir(dir.path());
        let first = builder.build_at(&[record("a", 0)], at(30)).await.unwrap();
        let second = builder.build_at(&[record("b", 1)], at(30)).await.unwrap();

        assert_eq!(first.file_name, second.file_name);
        let (p1, p2) = (first.artifact.clone().unwrap(), second.artifact.clone().unwrap());
        assert_ne!(p1, p2);
        assert_eq!(std::fs::read(&p1).unwrap(), first.bytes);
        assert_eq!(std::fs::read(&p2).unwrap(), second.bytes);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn artifact_skipped_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            write_artifacts: false,
            ..AppConfig::default()
        };
        let doc = DocumentBuilder::from_config(&config, Some(dir.path().to_path_buf()))
            .build(&[record("a", 0)])
            .await
            .unwrap();
        assert!(doc.artifact.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unwritable_output_fails_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"file").unwrap();

        let err = DocumentBuilder::new(RenderTarget::Native)
            .with_output_dir(&blocker)
            .build(&[record("a", 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, SnapdocError::DocumentBuild(_)));
    }
}
