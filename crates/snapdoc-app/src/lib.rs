// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// snapdoc-app: the in-process API a presentation layer drives.
//
// `AppServices` owns the shared stores and collaborators for the life of the
// process; `PipelineController` walks one selection through build and upload.

pub mod pipeline;
pub mod services;

pub use pipeline::{PipelineController, PipelineState, Stage};
pub use services::app_services::AppServices;
pub use services::data_dir::{data_dir, data_subdir};

/// Install the global `tracing` subscriber.
///
/// Honours `RUST_LOG`, defaulting to `info`. Calling it again (or after the
/// host installed its own subscriber) is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
