// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendering strategies.

pub mod manifest;
pub mod markup;

use chrono::{DateTime, Utc};
use snapdoc_core::error::Result;
use snapdoc_core::types::{PageEntry, RenderTarget};

pub use manifest::ManifestRenderer;
pub use markup::MarkupRenderer;

/// Everything a renderer needs, fixed before rendering starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Pages in the exact order they must appear.
    pub pages: Vec<PageEntry>,
}

/// A way of turning a [`DocumentDraft`] into document bytes.
///
/// Implementations must be deterministic for a given draft and must emit
/// every page exactly once, in draft order.
pub trait DocumentRenderer: Send + Sync {
    fn target(&self) -> RenderTarget;

    /// MIME type of the rendered bytes.
    fn mime_type(&self) -> &'static str;

    /// File extension (without dot) for materialized artifacts.
    fn extension(&self) -> &'static str;

    fn render(&self, draft: &DocumentDraft) -> Result<Vec<u8>>;
}

/// The renderer for a deployment target.
pub fn renderer_for(target: RenderTarget) -> Box<dyn DocumentRenderer> {
    match target {
        RenderTarget::Markup => Box::new(MarkupRenderer),
        RenderTarget::Native => Box::new(ManifestRenderer),
    }
}

/// Capture time as shown to readers of the document.
pub(crate) fn display_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
