// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// snapdoc-security: fingerprints for built documents and passphrase
// encryption for records kept at rest (the stored session in particular).

pub mod integrity;
pub mod storage;

pub use integrity::{hash_bytes, verify_hash, verify_payload};
pub use storage::EncryptedStorage;
