// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synchronization client: credential exchange and document upload.
//
// The bearer token is read from the session store at the moment each
// authenticated request is made and never kept between calls, so a sign-out
// takes effect on the very next request. No call is retried here; a single
// failed attempt is returned to the caller as is.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use snapdoc_core::error::{Result, SnapdocError};
use snapdoc_core::types::{DocumentPayload, Session, UploadReceipt, User};
use snapdoc_store::SessionStore;
use tracing::{error, info, instrument, warn};

use crate::transport::{Transport, TransportResponse};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const UPLOAD_PATH: &str = "/files/upload";

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    user: User,
    token: String,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    file_name: &'a str,
    mime_type: &'a str,
    created_at: chrono::DateTime<Utc>,
    page_count: usize,
    sha256: &'a str,
    /// Document bytes, standard base64.
    content: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Server-supplied reason from an error body, if it has one.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

#[derive(Clone, Copy)]
enum AuthAction {
    Login,
    Register,
}

impl AuthAction {
    fn path(self) -> &'static str {
        match self {
            Self::Login => LOGIN_PATH,
            Self::Register => REGISTER_PATH,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "registration",
        }
    }
}

pub struct SyncClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
}

impl SyncClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self { transport, session }
    }

    /// Exchange existing credentials for a session.
    ///
    /// The returned session is not stored; the caller decides when to call
    /// `SessionStore::set_session` with it.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        self.authenticate(AuthAction::Login, email, password).await
    }

    /// Create an account and return its first session.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<Session> {
        self.authenticate(AuthAction::Register, email, password).await
    }

    async fn authenticate(&self, action: AuthAction, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(SnapdocError::InvalidCredentials(
                "email and password are required".into(),
            ));
        }

        let body = serde_json::to_value(Credentials { email, password })?;
        let response = self
            .transport
            .post_json(action.path(), &body, None)
            .await
            .map_err(|e| {
                error!(error = %e, "{} request failed", action.label());
                SnapdocError::Auth {
                    status: None,
                    detail: e.to_string(),
                }
            })?;

        if !response.is_success() {
            warn!(status = response.status, "{} rejected", action.label());
            return Err(SnapdocError::Auth {
                status: Some(response.status),
                detail: failure_detail(&response),
            });
        }

        let parsed: AuthResponse =
            serde_json::from_slice(&response.body).map_err(|e| SnapdocError::Auth {
                status: Some(response.status),
                detail: format!("malformed {} response: {e}", action.label()),
            })?;
        if parsed.token.is_empty() {
            return Err(SnapdocError::Auth {
                status: Some(response.status),
                detail: "server issued an empty token".into(),
            });
        }

        info!(user_id = %parsed.user.id, "{} succeeded", action.label());
        Ok(Session {
            user: parsed.user,
            token: parsed.token,
        })
    }

    /// Upload a built document under the current session.
    ///
    /// Fails with `Unauthenticated`, without touching the network, when no
    /// session is active at the moment of the call.
    #[instrument(skip(self, document), fields(file_name = %document.file_name, pages = document.page_count()))]
    pub async fn upload(&self, document: &DocumentPayload) -> Result<UploadReceipt> {
        let Some(token) = self.session.token() else {
            warn!("upload attempted while signed out");
            return Err(SnapdocError::Unauthenticated);
        };

        let body = serde_json::to_value(UploadRequest {
            file_name: &document.file_name,
            mime_type: &document.mime_type,
            created_at: document.created_at,
            page_count: document.page_count(),
            sha256: &document.sha256,
            content: BASE64.encode(&document.bytes),
        })?;

        let response = self
            .transport
            .post_json(UPLOAD_PATH, &body, Some(&token))
            .await
            .map_err(|e| {
                error!(error = %e, "upload request failed");
                SnapdocError::Upload {
                    status: None,
                    detail: e.to_string(),
                }
            })?;

        if !response.is_success() {
            warn!(status = response.status, "upload rejected");
            return Err(SnapdocError::Upload {
                status: Some(response.status),
                detail: failure_detail(&response),
            });
        }

        let parsed: UploadResponse =
            serde_json::from_slice(&response.body).map_err(|e| SnapdocError::Upload {
                status: Some(response.status),
                detail: format!("malformed upload response: {e}"),
            })?;
        if !parsed.success {
            warn!(status = response.status, "server reported upload failure");
            return Err(SnapdocError::Upload {
                status: Some(response.status),
                detail: parsed
                    .message
                    .unwrap_or_else(|| "server reported the upload as unsuccessful".into()),
            });
        }

        info!(url = parsed.url.as_deref().unwrap_or("-"), "document uploaded");
        Ok(UploadReceipt {
            file_name: document.file_name.clone(),
            url: parsed.url,
            uploaded_at: Utc::now(),
        })
    }
}

fn failure_detail(response: &TransportResponse) -> String {
    serde_json::from_slice::<ErrorBody>(&response.body)
        .map(|b| b.message)
        .unwrap_or_else(|_| format!("API Error: {}", response.status))
}
