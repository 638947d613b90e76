// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: initialises the stores and collaborators once per
// process and exposes async methods for the presentation layer to call.
//
// Storage failures stop here: they are logged and the operation carries on
// with the in-memory state. Authentication, build, and upload failures are
// passed through unchanged so the user can be told and retry.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use snapdoc_bridge::{NativeCamera, NativeGallery, NativeKeychain, PlatformBridge, StubBridge};
use snapdoc_core::AppConfig;
use snapdoc_core::error::{Result, SnapdocError};
use snapdoc_core::types::{CaptureId, CaptureRecord, User};
use snapdoc_document::DocumentBuilder;
use snapdoc_security::EncryptedStorage;
use snapdoc_store::{Backing, CollectionStore, MemoryBacking, SealedBacking, SessionStore, SqliteBacking};
use snapdoc_sync::{HttpTransport, SyncClient, Transport};
use tracing::{error, info, instrument, warn};

use crate::pipeline::PipelineController;

const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "store.db";
const DOCUMENTS_DIR: &str = "documents";
/// Keychain entry holding the passphrase that seals the stored session.
pub const SESSION_KEY_SECRET: &str = "snapdoc.session-key";

/// Shared application services.
///
/// All fields are cheaply cloneable (Arc-wrapped) so the struct can be moved
/// into async tasks freely.
#[derive(Clone)]
pub struct AppServices {
    collection: Arc<CollectionStore>,
    session: Arc<SessionStore>,
    client: Arc<SyncClient>,
    builder: Arc<DocumentBuilder>,
    bridge: Arc<dyn PlatformBridge>,
    data_dir: Option<PathBuf>,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Initialise all services under `data_dir`. Call once at app startup.
    ///
    /// Opens the record database, seals the session record with a
    /// keychain-held passphrase when configured (falling back to plain
    /// storage if the keychain is unusable), and restores both stores.
    #[instrument(skip_all, fields(data_dir = %data_dir.display()))]
    pub async fn init(
        data_dir: &Path,
        config: AppConfig,
        bridge: Arc<dyn PlatformBridge>,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let database: Arc<dyn Backing> = Arc::new(SqliteBacking::open(data_dir.join(DATABASE_FILE))?);

        let session_backing: Arc<dyn Backing> = if config.encrypt_session {
            match session_passphrase(bridge.as_ref()) {
                Ok(passphrase) => Arc::new(SealedBacking::new(database.clone(), passphrase)),
                Err(e) => {
                    warn!(error = %e, "keychain unavailable; session stored unencrypted");
                    database.clone()
                }
            }
        } else {
            database.clone()
        };

        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config)?);
        let documents = data_dir.join(DOCUMENTS_DIR);

        let services = Self::assemble(
            config,
            database,
            session_backing,
            transport,
            bridge,
            Some(data_dir.to_path_buf()),
            Some(documents),
        );
        services.restore().await;
        info!(platform = services.bridge.platform_name(), "app services initialised");
        Ok(services)
    }

    /// Resolve the data directory, load `config.json`, and initialise.
    pub async fn open(bridge: Arc<dyn PlatformBridge>) -> Result<Self> {
        let dir = super::data_dir::data_dir();
        let config = load_config(&dir);
        Self::init(&dir, config, bridge).await
    }

    /// Services over process memory only: nothing survives the process and
    /// no artifacts are written. The bridge is the desktop stub.
    pub fn in_memory(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
        let backing: Arc<dyn Backing> = Arc::new(MemoryBacking::new());
        Self::assemble(
            config,
            backing.clone(),
            backing,
            transport,
            Arc::new(StubBridge),
            None,
            None,
        )
    }

    /// Services over caller-supplied backings, restored from whatever they
    /// already hold. Two calls over the same backings behave like a restart.
    pub async fn with_backing(
        config: AppConfig,
        backing: Arc<dyn Backing>,
        transport: Arc<dyn Transport>,
        bridge: Arc<dyn PlatformBridge>,
    ) -> Self {
        let services = Self::assemble(config, backing.clone(), backing, transport, bridge, None, None);
        services.restore().await;
        services
    }

    /// Replace the platform bridge.
    pub fn with_bridge(mut self, bridge: Arc<dyn PlatformBridge>) -> Self {
        self.bridge = bridge;
        self
    }

    fn assemble(
        config: AppConfig,
        collection_backing: Arc<dyn Backing>,
        session_backing: Arc<dyn Backing>,
        transport: Arc<dyn Transport>,
        bridge: Arc<dyn PlatformBridge>,
        data_dir: Option<PathBuf>,
        documents_dir: Option<PathBuf>,
    ) -> Self {
        let collection = Arc::new(CollectionStore::new(collection_backing));
        let session = Arc::new(SessionStore::new(session_backing));
        let client = Arc::new(SyncClient::new(transport, session.clone()));
        let builder = Arc::new(DocumentBuilder::from_config(&config, documents_dir));

        Self {
            collection,
            session,
            client,
            builder,
            bridge,
            data_dir,
            config: Arc::new(Mutex::new(config)),
        }
    }

    async fn restore(&self) {
        let captures = self.collection.load().await;
        let signed_in = self.session.load().await;
        info!(captures, signed_in, "stores restored");
    }

    // -- Session -------------------------------------------------------------

    /// Sign in and make the returned session current.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let session = self.client.login(email, password).await?;
        let user = session.user.clone();
        self.adopt(session.user, session.token).await;
        Ok(user)
    }

    /// Create an account and sign in as it.
    pub async fn register(&self, email: &str, password: &str) -> Result<User> {
        let session = self.client.register(email, password).await?;
        let user = session.user.clone();
        self.adopt(session.user, session.token).await;
        Ok(user)
    }

    async fn adopt(&self, user: User, token: String) {
        if let Err(e) = self.session.set_session(user, token).await {
            warn!(error = %e, "signed in for this run only");
        }
    }

    pub async fn logout(&self) {
        if let Err(e) = self.session.clear_session().await {
            warn!(error = %e, "stored session may reappear after restart");
        }
        info!("signed out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.user()
    }

    // -- Captures ------------------------------------------------------------

    /// All captures, oldest first.
    pub fn captures(&self) -> Vec<CaptureRecord> {
        self.collection.snapshot()
    }

    /// Take a photo with the device camera, copy it to the photo library,
    /// and add it to the collection.
    ///
    /// Returns `Ok(None)` if the user cancelled the camera.
    #[instrument(skip(self))]
    pub async fn capture(&self) -> Result<Option<CaptureRecord>> {
        let bridge = self.bridge.as_ref();
        let permitted = bridge.has_permission()? || bridge.request_permission()?;
        if !permitted {
            warn!("photo library permission denied");
            return Err(SnapdocError::Bridge(
                "photo library permission is required to save captures".into(),
            ));
        }

        let Some(photo) = bridge.capture_photo()? else {
            info!("capture cancelled");
            return Ok(None);
        };
        bridge.save_to_library(&photo.uri).map_err(|e| {
            error!(error = %e, uri = %photo.uri, "could not save capture to photo library");
            e
        })?;

        self.ingest(photo.uri, photo.captured_at).await.map(Some)
    }

    /// Add an image the capture collaborator already holds.
    #[instrument(skip(self, uri))]
    pub async fn ingest(
        &self,
        uri: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Result<CaptureRecord> {
        let uri = uri.into();
        if uri.trim().is_empty() {
            return Err(SnapdocError::InvalidCapture("image reference is empty".into()));
        }

        let record = CaptureRecord::new(uri, captured_at);
        match self.collection.append(record.clone()).await {
            Ok(()) | Err(SnapdocError::Persistence(_)) => {
                info!(id = %record.id, "capture added");
                Ok(record)
            }
            Err(e) => Err(e),
        }
    }

    /// Remove a capture. Returns whether it was present.
    pub async fn remove_capture(&self, id: &CaptureId) -> bool {
        match self.collection.remove(id).await {
            Ok(removed) => removed,
            // Only a real removal reaches the durable write.
            Err(_) => true,
        }
    }

    // -- Pipeline ------------------------------------------------------------

    /// A fresh pipeline with an empty selection.
    pub fn new_pipeline(&self) -> PipelineController {
        PipelineController::new(
            self.collection.clone(),
            self.builder.clone(),
            self.client.clone(),
        )
    }

    // -- Config --------------------------------------------------------------

    pub fn config(&self) -> AppConfig {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Update and persist the config. Transport and builder settings take
    /// effect on the next start.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config.clone();
        match &self.data_dir {
            Some(dir) => persist_config(dir, config),
            None => Ok(()),
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn bridge(&self) -> &dyn PlatformBridge {
        self.bridge.as_ref()
    }
}

/// Read the passphrase sealing the session record, minting and storing one
/// on first use.
fn session_passphrase(bridge: &dyn PlatformBridge) -> Result<String> {
    if let Some(bytes) = bridge.load_secret(SESSION_KEY_SECRET)? {
        return String::from_utf8(bytes)
            .map_err(|_| SnapdocError::Bridge("session key in keychain is not UTF-8".into()));
    }
    let passphrase = EncryptedStorage::generate_passphrase();
    bridge.store_secret(SESSION_KEY_SECRET, passphrase.as_bytes())?;
    info!("session key created");
    Ok(passphrase)
}

/// Load `config.json` from `data_dir`, or defaults if it is missing or bad.
pub fn load_config(data_dir: &Path) -> AppConfig {
    let path = data_dir.join(CONFIG_FILE);
    let Ok(data) = std::fs::read_to_string(&path) else {
        return AppConfig::default();
    };
    serde_json::from_str(&data).unwrap_or_else(|e| {
        warn!(error = %e, path = %path.display(), "config unreadable; using defaults");
        AppConfig::default()
    })
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
