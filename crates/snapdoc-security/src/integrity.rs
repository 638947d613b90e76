// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document fingerprints: SHA-256 over rendered document bytes.

use sha2::{Digest, Sha256};
use snapdoc_core::DocumentPayload;
use snapdoc_core::error::{Result, SnapdocError};

/// SHA-256 of `data` as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Check `data` against an expected hex digest.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<()> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(SnapdocError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}

/// Confirm a built document's bytes still match the fingerprint taken at build time.
pub fn verify_payload(payload: &DocumentPayload) -> Result<()> {
    verify_hash(&payload.bytes, &payload.sha256)
}
