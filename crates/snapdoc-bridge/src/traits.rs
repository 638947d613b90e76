// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic capability traits.

use chrono::{DateTime, Utc};
use snapdoc_core::error::Result;

/// All native capabilities the app needs from its host.
pub trait PlatformBridge: NativeCamera + NativeGallery + NativeKeychain + Send + Sync {
    /// Human-readable platform name (e.g. "iOS 18", "Android 15").
    fn platform_name(&self) -> &str;
}

/// A photo just taken, as reported by the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    /// Local reference to the image (e.g. `file:///…/IMG_0001.jpg`).
    pub uri: String,
    pub captured_at: DateTime<Utc>,
}

pub trait NativeCamera {
    /// Take one photo. `Ok(None)` means the user cancelled.
    fn capture_photo(&self) -> Result<Option<CapturedPhoto>>;
}

/// The device photo library.
pub trait NativeGallery {
    fn has_permission(&self) -> Result<bool>;

    /// Prompt for library access. Returns whether it was granted.
    fn request_permission(&self) -> Result<bool>;

    /// Copy the image at `uri` into the user's photo library.
    fn save_to_library(&self, uri: &str) -> Result<()>;
}

/// Secure key storage in the platform keychain / keystore.
pub trait NativeKeychain {
    /// Store a secret under the given key.
    fn store_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret by key. Returns None if not found.
    fn load_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn delete_secret(&self, key: &str) -> Result<()>;
}
