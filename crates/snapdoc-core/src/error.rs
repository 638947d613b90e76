// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for SnapDoc.

use thiserror::Error;

use crate::types::CaptureId;

/// Top-level error type for all SnapDoc operations.
#[derive(Debug, Error)]
pub enum SnapdocError {
    // -- Storage / persistence --
    #[error("durable storage failed: {0}")]
    Persistence(String),

    #[error("capture {0} is already in the collection")]
    DuplicateCapture(CaptureId),

    #[error("invalid capture: {0}")]
    InvalidCapture(String),

    // -- Pipeline --
    #[error("no images selected")]
    EmptySelection,

    #[error("document build failed: {0}")]
    DocumentBuild(String),

    #[error("no built document to upload")]
    NothingToUpload,

    #[error("pipeline step not allowed: {0}")]
    InvalidTransition(String),

    // -- Remote service --
    #[error("not signed in")]
    Unauthenticated,

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("authentication failed{}: {detail}", status_suffix(.status))]
    Auth { status: Option<u16>, detail: String },

    #[error("upload failed{}: {detail}", status_suffix(.status))]
    Upload { status: Option<u16>, detail: String },

    // -- Security --
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

/// Coarse, copyable classification of a [`SnapdocError`].
///
/// The pipeline controller records this in its `Error` state so callers can
/// tell which kind of failure interrupted the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Persistence,
    EmptySelection,
    DocumentBuild,
    Unauthenticated,
    Auth,
    Upload,
    InvalidInput,
    InvalidState,
    Security,
    Platform,
}

impl SnapdocError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Persistence(_) | Self::Io(_) | Self::Serialization(_) => ErrorKind::Persistence,
            Self::EmptySelection => ErrorKind::EmptySelection,
            Self::DocumentBuild(_) => ErrorKind::DocumentBuild,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Upload { .. } => ErrorKind::Upload,
            Self::DuplicateCapture(_) | Self::InvalidCapture(_) | Self::InvalidCredentials(_) => {
                ErrorKind::InvalidInput
            }
            Self::NothingToUpload | Self::InvalidTransition(_) => ErrorKind::InvalidState,
            Self::Encryption(_) | Self::Decryption(_) | Self::IntegrityMismatch { .. } => {
                ErrorKind::Security
            }
            Self::Bridge(_) | Self::PlatformUnavailable => ErrorKind::Platform,
        }
    }

    /// HTTP status attached to a remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Upload { status, .. } => *status,
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SnapdocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_message_carries_status() {
        let err = SnapdocError::Upload {
            status: Some(503),
            detail: "service unavailable".into(),
        };
        assert_eq!(err.to_string(), "upload failed (HTTP 503): service unavailable");
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.kind(), ErrorKind::Upload);
    }

    #[test]
    fn transport_failure_has_no_status() {
        let err = SnapdocError::Auth {
            status: None,
            detail: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "authentication failed: connection refused");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn io_errors_classify_as_persistence() {
        let err = SnapdocError::from(std::io::Error::other("disk full"));
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }
}
