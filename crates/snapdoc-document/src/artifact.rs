// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-disk materialization of rendered documents.
//
// A document either lands under its final name with its full contents or not
// at all: bytes go to a hidden partial file first, which is renamed into place
// once fully written and flushed.

use std::path::{Path, PathBuf};

use snapdoc_core::error::{Result, SnapdocError};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

/// Write `bytes` to `dir/file_name`, creating `dir` if needed.
#[instrument(skip(bytes), fields(dir = %dir.display(), bytes = bytes.len()))]
pub async fn materialize(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let target = dir.join(file_name);
    let partial = dir.join(format!(".{file_name}.partial"));

    match write_then_rename(dir, &partial, &target, bytes).await {
        Ok(()) => {
            debug!(path = %target.display(), "artifact written");
            Ok(target)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %cleanup, path = %partial.display(), "partial artifact left behind");
                }
            }
            Err(SnapdocError::DocumentBuild(format!(
                "writing {}: {e}",
                target.display()
            )))
        }
    }
}

async fn write_then_rename(
    dir: &Path,
    partial: &Path,
    target: &Path,
    bytes: &[u8],
) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let mut file = tokio::fs::File::create(partial).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(partial, target).await
}
