// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Durable keyed record storage.
//
// Every record is read and written whole: there are no partial updates and no
// versioning. `SqliteBacking` is what the app uses on device; `MemoryBacking`
// serves tests and the in-memory fallback; `SealedBacking` encrypts values on
// their way to any other backing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use snapdoc_core::error::{Result, SnapdocError};
use snapdoc_security::EncryptedStorage;
use tracing::{debug, info, instrument};

/// A durable map from record key to an opaque byte value.
pub trait Backing: Send + Sync {
    /// Read the whole value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the value stored under `key`.
    fn store(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key` entirely. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

impl<B: Backing + ?Sized> Backing for Arc<B> {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).load(key)
    }

    fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        (**self).store(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS records (
        key TEXT PRIMARY KEY,
        value BLOB NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

fn db_err(context: &str, e: rusqlite::Error) -> SnapdocError {
    SnapdocError::Persistence(format!("{context}: {e}"))
}

/// Key/value records in a local SQLite database.
///
/// `rusqlite::Connection` is `Send` but not `Sync`, so it sits behind a mutex.
/// Every statement is a single-row read or upsert, so the lock is held only
/// briefly.
pub struct SqliteBacking {
    conn: Mutex<Connection>,
}

impl SqliteBacking {
    /// Open (or create) the database at `path` in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| db_err("open", e))?;

        // WAL survives unclean shutdowns (app killed mid-write) more gracefully.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| db_err("WAL pragma", e))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| db_err("create table", e))?;

        info!("record database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| db_err("open in-memory", e))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| db_err("create table", e))?;
        debug!("in-memory record database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Backing for SqliteBacking {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.conn()
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .map_err(|e| db_err("load", e))
    }

    fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                 updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| db_err("store", e))?;
        debug!(key, bytes = value.len(), "record written");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM records WHERE key = ?1", params![key])
            .map_err(|e| db_err("delete", e))?;
        debug!(key, "record deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-memory backing with switchable failure modes for tests.
#[derive(Default)]
pub struct MemoryBacking {
    values: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryBacking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `store`/`delete` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `load` fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `store`/`delete` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Place raw bytes under `key`, bypassing any encoding.
    pub fn insert_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.values().insert(key.to_owned(), value.into());
    }

    /// Raw bytes currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.values().get(key).cloned()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_write(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SnapdocError::Persistence(format!("write to '{key}' refused")));
        }
        Ok(())
    }
}

impl Backing for MemoryBacking {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SnapdocError::Persistence(format!("read of '{key}' refused")));
        }
        Ok(self.raw(key))
    }

    fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        self.check_write(key)?;
        self.values().insert(key.to_owned(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.check_write(key)?;
        self.values().remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Encrypted wrapper
// ---------------------------------------------------------------------------

/// Encrypts every value before handing it to the inner backing.
///
/// A value that fails to decrypt surfaces as `SnapdocError::Decryption`; the
/// stores treat that exactly like unparseable data.
pub struct SealedBacking<B> {
    inner: B,
    storage: EncryptedStorage,
}

impl<B: Backing> SealedBacking<B> {
    pub fn new(inner: B, passphrase: impl Into<String>) -> Self {
        Self {
            inner,
            storage: EncryptedStorage::new(passphrase),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: Backing> Backing for SealedBacking<B> {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.inner.load(key)? {
            Some(sealed) => self.storage.decrypt(&sealed).map(Some),
            None => Ok(None),
        }
    }

    fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        let sealed = self.storage.encrypt(value)?;
        self.inner.store(key, &sealed)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }
}
