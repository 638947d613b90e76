// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process device: a scriptable camera, a photo library that records what
// was saved, and a map-backed keychain.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use snapdoc_core::error::{Result, SnapdocError};
use tracing::debug;

use crate::traits::*;

struct Device {
    permission_granted: bool,
    grant_on_request: bool,
    /// Scripted camera results; `None` entries are cancellations.
    queued: VecDeque<Option<CapturedPhoto>>,
    shots: u64,
    library: Vec<String>,
    gallery_broken: bool,
    keychain: HashMap<String, Vec<u8>>,
    keychain_broken: bool,
}

pub struct SimulatedBridge {
    device: Mutex<Device>,
}

impl Default for SimulatedBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBridge {
    /// A device that has not yet been asked for library access and grants
    /// it when asked.
    pub fn new() -> Self {
        Self {
            device: Mutex::new(Device {
                permission_granted: false,
                grant_on_request: true,
                queued: VecDeque::new(),
                shots: 0,
                library: Vec::new(),
                gallery_broken: false,
                keychain: HashMap::new(),
                keychain_broken: false,
            }),
        }
    }

    fn device(&self) -> MutexGuard<'_, Device> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the user refuse library access when prompted.
    pub fn deny_permission(&self) {
        let mut device = self.device();
        device.permission_granted = false;
        device.grant_on_request = false;
    }

    /// The next capture returns this photo.
    pub fn queue_photo(&self, uri: impl Into<String>, captured_at: DateTime<Utc>) {
        self.device().queued.push_back(Some(CapturedPhoto {
            uri: uri.into(),
            captured_at,
        }));
    }

    /// The next capture is cancelled by the user.
    pub fn queue_cancel(&self) {
        self.device().queued.push_back(None);
    }

    pub fn fail_gallery_saves(&self, fail: bool) {
        self.device().gallery_broken = fail;
    }

    pub fn fail_keychain(&self, fail: bool) {
        self.device().keychain_broken = fail;
    }

    /// Every URI saved to the photo library, oldest first.
    pub fn library(&self) -> Vec<String> {
        self.device().library.clone()
    }
}

impl PlatformBridge for SimulatedBridge {
    fn platform_name(&self) -> &str {
        "Simulated device"
    }
}

impl NativeCamera for SimulatedBridge {
    fn capture_photo(&self) -> Result<Option<CapturedPhoto>> {
        let mut device = self.device();
        if let Some(scripted) = device.queued.pop_front() {
            return Ok(scripted);
        }
        device.shots += 1;
        let photo = CapturedPhoto {
            uri: format!("file:///simulated/IMG_{:04}.jpg", device.shots),
            captured_at: Utc::now(),
        };
        debug!(uri = %photo.uri, "simulated capture");
        Ok(Some(photo))
    }
}

impl NativeGallery for SimulatedBridge {
    fn has_permission(&self) -> Result<bool> {
        Ok(self.device().permission_granted)
    }

    fn request_permission(&self) -> Result<bool> {
        let mut device = self.device();
        device.permission_granted = device.grant_on_request;
        Ok(device.permission_granted)
    }

    fn save_to_library(&self, uri: &str) -> Result<()> {
        let mut device = self.device();
        if !device.permission_granted {
            return Err(SnapdocError::Bridge("photo library permission not granted".into()));
        }
        if device.gallery_broken {
            return Err(SnapdocError::Bridge("photo library unavailable".into()));
        }
        device.library.push(uri.to_owned());
        Ok(())
    }
}

impl NativeKeychain for SimulatedBridge {
    fn store_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut device = self.device();
        if device.keychain_broken {
            return Err(SnapdocError::Bridge("keychain locked".into()));
        }
        device.keychain.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn load_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let device = self.device();
        if device.keychain_broken {
            return Err(SnapdocError::Bridge("keychain locked".into()));
        }
        Ok(device.keychain.get(key).cloned())
    }

    fn delete_secret(&self, key: &str) -> Result<()> {
        let mut device = self.device();
        if device.keychain_broken {
            return Err(SnapdocError::Bridge("keychain locked".into()));
        }
        device.keychain.remove(key);
        Ok(())
    }
}
