// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// snapdoc-document: turns an ordered list of captures into a single
// exportable document.
//
// Rendering is a pure function of the input captures, the title, and the
// creation timestamp. Two strategies exist: self-contained HTML markup and a
// native document manifest; the deployment target picks one through
// `AppConfig::render_target`.

pub mod artifact;
pub mod builder;
pub mod render;

pub use builder::DocumentBuilder;
pub use render::{DocumentDraft, DocumentRenderer, ManifestRenderer, MarkupRenderer, renderer_for};
