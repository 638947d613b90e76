// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Passphrase encryption for records at rest, using age's scrypt recipient.
// The passphrase itself lives in the platform keychain; this type only holds
// it for as long as the store that owns it.

use std::io::{Read, Write};

use age::secrecy::SecretString;
use snapdoc_core::error::{Result, SnapdocError};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Encrypts and decrypts whole records with a single passphrase.
pub struct EncryptedStorage {
    passphrase: SecretString,
}

impl EncryptedStorage {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: SecretString::from(passphrase.into()),
        }
    }

    /// Produce a fresh random passphrase suitable for storing in a keychain.
    pub fn generate_passphrase() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    /// Encrypt `plaintext` into a complete age file.
    #[instrument(skip_all, fields(plaintext_len = plaintext.len()))]
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let encryptor = age::Encryptor::with_user_passphrase(self.passphrase.clone());
        let mut sealed = Vec::new();

        let mut writer = encryptor
            .wrap_output(&mut sealed)
            .map_err(|e| SnapdocError::Encryption(e.to_string()))?;
        writer
            .write_all(plaintext)
            .map_err(|e| SnapdocError::Encryption(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| SnapdocError::Encryption(e.to_string()))?;

        debug!(sealed_len = sealed.len(), "record sealed");
        Ok(sealed)
    }

    /// Decrypt an age file produced by [`encrypt`](Self::encrypt).
    #[instrument(skip_all, fields(sealed_len = sealed.len()))]
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        let decryptor =
            age::Decryptor::new(sealed).map_err(|e| SnapdocError::Decryption(e.to_string()))?;
        let identity = age::scrypt::Identity::new(self.passphrase.clone());

        let mut reader = decryptor
            .decrypt(std::iter::once(&identity as &dyn age::Identity))
            .map_err(|e| SnapdocError::Decryption(e.to_string()))?;

        let mut plaintext = Vec::new();
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| SnapdocError::Decryption(e.to_string()))?;
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_session_opens_with_same_passphrase() {
        let storage = EncryptedStorage::new("keychain-passphrase");
        let record = br#"{"user":{"id":"1","email":"a@example.com"},"token":"T1"}"#;

        let sealed = storage.encrypt(record).expect("encrypt");
        let token = br#""token":"T1""#;
        assert!(!sealed.windows(token.len()).any(|w| w == token));

        assert_eq!(storage.decrypt(&sealed).expect("decrypt"), record);
    }

    #[test]
    fn other_passphrase_cannot_open() {
        let sealed = EncryptedStorage::new("first").encrypt(b"token").expect("encrypt");
        assert!(EncryptedStorage::new("second").decrypt(&sealed).is_err());
    }

    #[test]
    fn garbage_is_a_decryption_error() {
        let err = EncryptedStorage::new("p").decrypt(b"not an age file").unwrap_err();
        assert!(matches!(err, SnapdocError::Decryption(_)));
    }

    #[test]
    fn generated_passphrases_differ() {
        let a = EncryptedStorage::generate_passphrase();
        let b = EncryptedStorage::generate_passphrase();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
