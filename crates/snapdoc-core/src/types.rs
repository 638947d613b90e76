// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the SnapDoc capture-to-document pipeline.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a captured image.
///
/// Stored as an opaque string so that snapshots written by older clients
/// (which used millisecond timestamps as ids) still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureId(pub String);

impl CaptureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CaptureId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaptureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaptureId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// One persisted image capture. Never mutated in place once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: CaptureId,
    /// Reference to the image bytes (local file path or content URI).
    pub uri: String,
    /// When the photo was taken.
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,
}

impl CaptureRecord {
    /// Create a record with a freshly assigned id.
    pub fn new(uri: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            id: CaptureId::new(),
            uri: uri.into(),
            captured_at,
        }
    }

    /// Create a record with a caller-chosen id.
    pub fn with_id(id: impl Into<CaptureId>, uri: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            captured_at,
        }
    }
}

/// Identity returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// An authenticated session: the user and bearer token are always held together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Rendering strategy, chosen once per deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RenderTarget {
    /// Self-contained HTML, one section per image.
    Markup,
    /// Native document manifest.
    #[default]
    Native,
}

/// One image slot in a rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub capture_id: CaptureId,
    pub uri: String,
    pub captured_at: DateTime<Utc>,
}

impl From<&CaptureRecord> for PageEntry {
    fn from(record: &CaptureRecord) -> Self {
        Self {
            capture_id: record.id.clone(),
            uri: record.uri.clone(),
            captured_at: record.captured_at,
        }
    }
}

/// A rendered document ready for upload.
///
/// Holds read-only copies of the image references taken at build time; the
/// image bytes themselves stay wherever the capture collaborator put them.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    pub created_at: DateTime<Utc>,
    pub title: String,
    /// Images in selection order.
    pub pages: Vec<PageEntry>,
    pub target: RenderTarget,
    pub mime_type: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// SHA-256 of `bytes`, lowercase hex.
    pub sha256: String,
    /// Where the artifact was written, if it was materialized on disk.
    pub artifact: Option<PathBuf>,
}

impl DocumentPayload {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Image references in document order.
    pub fn uris(&self) -> Vec<&str> {
        self.pages.iter().map(|p| p.uri.as_str()).collect()
    }
}

impl std::fmt::Debug for DocumentPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPayload")
            .field("created_at", &self.created_at)
            .field("title", &self.title)
            .field("pages", &self.pages)
            .field("target", &self.target)
            .field("mime_type", &self.mime_type)
            .field("file_name", &self.file_name)
            .field("bytes_len", &self.bytes.len())
            .field("sha256", &self.sha256)
            .field("artifact", &self.artifact)
            .finish()
    }
}

/// Server acknowledgement of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub file_name: String,
    /// Remote location of the stored document, when the server reports one.
    pub url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_record_uses_timestamp_field_name() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = CaptureRecord::with_id("1709287200000", "file://a.jpg", at);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "1709287200000");
        assert_eq!(json["uri"], "file://a.jpg");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn fresh_ids_are_distinct() {
        let a = CaptureId::new();
        let b = CaptureId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn session_debug_hides_token() {
        let session = Session {
            user: User {
                id: "1".into(),
                email: "a@example.com".into(),
            },
            token: "secret-token".into(),
        };
        let printed = format!("{session:?}");
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("a@example.com"));
    }
}
