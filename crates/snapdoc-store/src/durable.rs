// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered whole-snapshot writes for a single record key.
//
// Callers stamp each snapshot with a generation while they still hold the
// lock on the in-memory value, so generation order equals mutation order.
// Writes then go through an async mutex, and a snapshot older than the last
// one written is dropped instead of overwriting newer state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use snapdoc_core::error::{Result, SnapdocError};
use tokio::sync::Mutex;
use tracing::debug;

use crate::backing::Backing;

pub(crate) struct SnapshotWriter {
    key: &'static str,
    backing: Arc<dyn Backing>,
    next_generation: AtomicU64,
    last_written: Mutex<u64>,
}

impl SnapshotWriter {
    pub(crate) fn new(key: &'static str, backing: Arc<dyn Backing>) -> Self {
        Self {
            key,
            backing,
            next_generation: AtomicU64::new(0),
            last_written: Mutex::new(0),
        }
    }

    pub(crate) fn key(&self) -> &'static str {
        self.key
    }

    /// Must be called while the in-memory value is still locked.
    pub(crate) fn stamp(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn read(&self) -> Result<Option<Vec<u8>>> {
        self.backing.load(self.key)
    }

    /// Write `snapshot` (or delete the record when `None`).
    pub(crate) async fn write(&self, generation: u64, snapshot: Option<Vec<u8>>) -> Result<()> {
        let mut last_written = self.last_written.lock().await;
        if generation <= *last_written {
            debug!(key = self.key, generation, "newer snapshot already written; skipping");
            return Ok(());
        }
        // Advance even on failure: anything stamped earlier is older than the
        // in-memory state this write represents.
        *last_written = generation;

        let outcome = match snapshot {
            Some(bytes) => self.backing.store(self.key, &bytes),
            None => self.backing.delete(self.key),
        };
        outcome.map_err(into_persistence)
    }
}

/// Fold any backing failure into `SnapdocError::Persistence`.
pub(crate) fn into_persistence(err: SnapdocError) -> SnapdocError {
    match err {
        SnapdocError::Persistence(_) => err,
        other => SnapdocError::Persistence(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::MemoryBacking;

    #[tokio::test]
    async fn stale_generation_does_not_overwrite() {
        let backing = Arc::new(MemoryBacking::new());
        let writer = SnapshotWriter::new("k", backing.clone());

        let older = writer.stamp();
        let newer = writer.stamp();
        writer.write(newer, Some(b"new".to_vec())).await.unwrap();
        writer.write(older, Some(b"old".to_vec())).await.unwrap();

        assert_eq!(backing.raw("k").as_deref(), Some(&b"new"[..]));
        assert_eq!(backing.write_count(), 1);
    }

    #[tokio::test]
    async fn none_deletes_the_record() {
        let backing = Arc::new(MemoryBacking::new());
        backing.insert_raw("k", "v");
        let writer = SnapshotWriter::new("k", backing.clone());

        let generation = writer.stamp();
        writer.write(generation, None).await.unwrap();
        assert!(backing.raw("k").is_none());
    }
}
