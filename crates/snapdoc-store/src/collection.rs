// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistent collection of captured images.
//
// Insertion order is preserved and is the default display and document
// order. Ids are unique across the collection.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use snapdoc_core::error::{Result, SnapdocError};
use snapdoc_core::types::{CaptureId, CaptureRecord};
use tracing::{debug, info, instrument, warn};

use crate::backing::Backing;
use crate::durable::{SnapshotWriter, into_persistence};

/// Record key for the collection snapshot.
pub const COLLECTION_KEY: &str = "captured_images";

/// Owns the authoritative list of captures for the running process.
pub struct CollectionStore {
    records: RwLock<Vec<CaptureRecord>>,
    writer: SnapshotWriter,
}

impl CollectionStore {
    /// Create an empty store over `backing`. Call [`load`](Self::load) at startup.
    pub fn new(backing: Arc<dyn Backing>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            writer: SnapshotWriter::new(COLLECTION_KEY, backing),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<CaptureRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<CaptureRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the in-memory collection with the durable snapshot.
    ///
    /// Missing data yields an empty collection. Unreadable or corrupt data is
    /// logged and also yields an empty collection. Returns the number of
    /// records restored.
    #[instrument(skip(self), fields(key = self.writer.key()))]
    pub async fn load(&self) -> usize {
        let restored = match self.writer.read() {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<CaptureRecord>>(&bytes) {
                Ok(records) => dedupe(records),
                Err(e) => {
                    warn!(error = %e, "stored collection is corrupt; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read stored collection; starting empty");
                Vec::new()
            }
        };

        let count = restored.len();
        *self.write() = restored;
        info!(count, "collection loaded");
        count
    }

    /// Append `record` to the end of the collection, then persist.
    ///
    /// The record stays in memory even when the durable write fails; the
    /// failure is logged and returned as `SnapdocError::Persistence`.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn append(&self, record: CaptureRecord) -> Result<()> {
        let (generation, snapshot) = {
            let mut records = self.write();
            if records.iter().any(|r| r.id == record.id) {
                return Err(SnapdocError::DuplicateCapture(record.id));
            }
            records.push(record);
            debug!(len = records.len(), "capture appended");
            (self.writer.stamp(), encode(&records))
        };
        self.persist(generation, snapshot).await
    }

    /// Remove the record with `id`. Returns whether anything was removed;
    /// a missing id is not an error and writes nothing.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn remove(&self, id: &CaptureId) -> Result<bool> {
        let (generation, snapshot) = {
            let mut records = self.write();
            let before = records.len();
            records.retain(|r| &r.id != id);
            if records.len() == before {
                debug!("capture not present; nothing to remove");
                return Ok(false);
            }
            (self.writer.stamp(), encode(&records))
        };
        self.persist(generation, snapshot).await?;
        Ok(true)
    }

    async fn persist(&self, generation: u64, snapshot: Result<Vec<u8>>) -> Result<()> {
        let outcome = match snapshot {
            Ok(bytes) => self.writer.write(generation, Some(bytes)).await,
            Err(e) => Err(into_persistence(e)),
        };
        if let Err(ref e) = outcome {
            warn!(error = %e, "collection kept in memory but not persisted");
        }
        outcome
    }

    /// Owned copy of the collection, unaffected by later mutation.
    pub fn snapshot(&self) -> Vec<CaptureRecord> {
        self.read().clone()
    }

    pub fn get(&self, id: &CaptureId) -> Option<CaptureRecord> {
        self.read().iter().find(|r| &r.id == id).cloned()
    }

    pub fn contains(&self, id: &CaptureId) -> bool {
        self.read().iter().any(|r| &r.id == id)
    }

    /// Ids in collection order.
    pub fn ids(&self) -> Vec<CaptureId> {
        self.read().iter().map(|r| r.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

fn encode(records: &[CaptureRecord]) -> Result<Vec<u8>> {
    serde_json::to_vec(records).map_err(SnapdocError::from)
}

/// Keep the first occurrence of each id.
fn dedupe(records: Vec<CaptureRecord>) -> Vec<CaptureRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    let total = records.len();
    let unique: Vec<_> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if unique.len() != total {
        warn!(dropped = total - unique.len(), "duplicate capture ids in stored collection");
    }
    unique
}
