// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// snapdoc-store: the two pieces of process-wide durable state: the ordered
// collection of captured images and the single-slot authenticated session.
//
// Both stores follow the same contract: mutate the authoritative in-memory
// value first, then write a whole snapshot to the backing. A failed write is
// logged and reported but never rolls the in-memory change back.

pub mod backing;
pub mod collection;
mod durable;
pub mod session;

pub use backing::{Backing, MemoryBacking, SealedBacking, SqliteBacking};
pub use collection::{COLLECTION_KEY, CollectionStore};
pub use session::{SESSION_KEY, SessionStore};
