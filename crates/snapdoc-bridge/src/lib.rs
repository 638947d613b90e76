// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// snapdoc-bridge: the device capabilities the core leans on but does not
// implement: the camera, the photo library, and the keychain.
//
// Native shells (iOS, Android) provide their own `PlatformBridge`. Inside
// this workspace there are two: `StubBridge`, which refuses everything, and
// `SimulatedBridge`, an in-process device for tests and demos.

pub mod simulated;
pub mod stub;
pub mod traits;

pub use simulated::SimulatedBridge;
pub use stub::StubBridge;
pub use traits::{CapturedPhoto, NativeCamera, NativeGallery, NativeKeychain, PlatformBridge};

/// Bridge for builds with no native shell attached.
pub fn platform_bridge() -> Box<dyn PlatformBridge> {
    Box::new(StubBridge)
}
