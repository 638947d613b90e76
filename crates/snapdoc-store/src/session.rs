// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-slot durable session: the signed-in user and their bearer token.
//
// The slot holds `Option<Session>`, so a token without a user (or the
// reverse) cannot be represented, in memory or on disk.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use snapdoc_core::error::{Result, SnapdocError};
use snapdoc_core::types::{Session, User};
use tracing::{info, instrument, warn};

use crate::backing::Backing;
use crate::durable::{SnapshotWriter, into_persistence};

/// Record key for the session snapshot.
pub const SESSION_KEY: &str = "auth_data";

pub struct SessionStore {
    current: RwLock<Option<Session>>,
    writer: SnapshotWriter,
}

impl SessionStore {
    pub fn new(backing: Arc<dyn Backing>) -> Self {
        Self {
            current: RwLock::new(None),
            writer: SnapshotWriter::new(SESSION_KEY, backing),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore the session saved by a previous run.
    ///
    /// Absent, unreadable, or malformed records leave the store signed out;
    /// nothing is reported to the caller. Returns whether a session was restored.
    #[instrument(skip(self))]
    pub async fn load(&self) -> bool {
        let restored = match self.writer.read() {
            Ok(Some(bytes)) => match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(error = %e, "stored session is malformed; staying signed out");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read stored session; staying signed out");
                None
            }
        };

        let authenticated = restored.is_some();
        if let Some(ref session) = restored {
            info!(user_id = %session.user.id, "session restored");
        }
        *self.write() = restored;
        authenticated
    }

    /// Sign in: set user and token together, then persist them as one record.
    #[instrument(skip(self, user, token), fields(user_id = %user.id))]
    pub async fn set_session(&self, user: User, token: impl Into<String>) -> Result<()> {
        let session = Session {
            user,
            token: token.into(),
        };
        let (generation, snapshot) = {
            let mut current = self.write();
            let snapshot = serde_json::to_vec(&session).map_err(SnapdocError::from);
            *current = Some(session);
            (self.writer.stamp(), snapshot)
        };
        info!("session set");

        let outcome = match snapshot {
            Ok(bytes) => self.writer.write(generation, Some(bytes)).await,
            Err(e) => Err(into_persistence(e)),
        };
        if let Err(ref e) = outcome {
            warn!(error = %e, "session active but not persisted");
        }
        outcome
    }

    /// Sign out: clear user and token together, then delete the stored record.
    #[instrument(skip(self))]
    pub async fn clear_session(&self) -> Result<()> {
        let generation = {
            let mut current = self.write();
            *current = None;
            self.writer.stamp()
        };
        info!("session cleared");

        let outcome = self.writer.write(generation, None).await;
        if let Err(ref e) = outcome {
            warn!(error = %e, "signed out in memory but stored session not deleted");
        }
        outcome
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    /// Bearer token as of this instant. Callers must not hold on to it.
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.read().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }
}
