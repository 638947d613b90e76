// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where native mobile APIs are unavailable.
//
// Every capability returns `PlatformUnavailable`.

use snapdoc_core::error::{Result, SnapdocError};

use crate::traits::*;

pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeCamera for StubBridge {
    fn capture_photo(&self) -> Result<Option<CapturedPhoto>> {
        tracing::warn!("NativeCamera::capture_photo called on stub bridge");
        Err(SnapdocError::PlatformUnavailable)
    }
}

impl NativeGallery for StubBridge {
    fn has_permission(&self) -> Result<bool> {
        Err(SnapdocError::PlatformUnavailable)
    }

    fn request_permission(&self) -> Result<bool> {
        tracing::warn!("NativeGallery::request_permission called on stub bridge");
        Err(SnapdocError::PlatformUnavailable)
    }

    fn save_to_library(&self, _uri: &str) -> Result<()> {
        Err(SnapdocError::PlatformUnavailable)
    }
}

impl NativeKeychain for StubBridge {
    fn store_secret(&self, _key: &str, _value: &[u8]) -> Result<()> {
        tracing::warn!("NativeKeychain::store_secret called on stub bridge");
        Err(SnapdocError::PlatformUnavailable)
    }

    fn load_secret(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(SnapdocError::PlatformUnavailable)
    }

    fn delete_secret(&self, _key: &str) -> Result<()> {
        Err(SnapdocError::PlatformUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_capability_is_unavailable() {
        let bridge = StubBridge;
        assert!(matches!(bridge.capture_photo(), Err(SnapdocError::PlatformUnavailable)));
        assert!(matches!(bridge.request_permission(), Err(SnapdocError::PlatformUnavailable)));
        assert!(matches!(bridge.load_secret("k"), Err(SnapdocError::PlatformUnavailable)));
        assert_eq!(bridge.platform_name(), "Desktop (stub)");
    }
}
