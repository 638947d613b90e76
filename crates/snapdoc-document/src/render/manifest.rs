// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native-document strategy: a structured manifest listing every image with
// its capture time. The receiving service lays the pages out; this side does
// no page encoding of its own.

use chrono::{DateTime, Utc};
use serde::Serialize;
use snapdoc_core::error::{Result, SnapdocError};
use snapdoc_core::types::RenderTarget;

use super::{DocumentDraft, DocumentRenderer};

/// Value of the manifest's `type` field.
pub const MANIFEST_TYPE: &str = "pdf_document";

#[derive(Serialize)]
struct Manifest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'a str,
    created_at: DateTime<Utc>,
    images: Vec<ManifestImage<'a>>,
    total_images: usize,
}

#[derive(Serialize)]
struct ManifestImage<'a> {
    id: &'a str,
    timestamp: DateTime<Utc>,
    uri: &'a str,
}

pub struct ManifestRenderer;

impl DocumentRenderer for ManifestRenderer {
    fn target(&self) -> RenderTarget {
        RenderTarget::Native
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, draft: &DocumentDraft) -> Result<Vec<u8>> {
        let manifest = Manifest {
            kind: MANIFEST_TYPE,
            title: &draft.title,
            created_at: draft.created_at,
            images: draft
                .pages
                .iter()
                .map(|p| ManifestImage {
                    id: p.capture_id.as_str(),
                    timestamp: p.captured_at,
                    uri: &p.uri,
                })
                .collect(),
            total_images: draft.pages.len(),
        };
        serde_json::to_vec_pretty(&manifest)
            .map_err(|e| SnapdocError::DocumentBuild(format!("manifest encoding: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use snapdoc_core::types::PageEntry;

    fn page(id: &str, minute: u32) -> PageEntry {
        PageEntry {
            capture_id: id.into(),
            uri: format!("file://{id}.jpg"),
            captured_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn manifest_lists_images_in_draft_order() {
        let draft = DocumentDraft {
            title: "Camera Document".into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
            pages: vec![page("b", 1), page("a", 0)],
        };
        let json: serde_json::Value =
            serde_json::from_slice(&ManifestRenderer.render(&draft).unwrap()).unwrap();

        assert_eq!(json["type"], MANIFEST_TYPE);
        assert_eq!(json["total_images"], 2);
        assert_eq!(json["images"][0]["id"], "b");
        assert_eq!(json["images"][1]["uri"], "file://a.jpg");
        assert_eq!(json["created_at"], "2026-03-02T08:00:00Z");
    }
}
