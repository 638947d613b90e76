// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

/// Overrides every other location when set.
pub const DATA_DIR_ENV: &str = "SNAPDOC_DATA_DIR";

/// Return the application data directory, creating it if needed.
///
/// On desktop this uses a conventional location. On mobile the native shell
/// should pass its documents directory through `SNAPDOC_DATA_DIR` instead.
pub fn data_dir() -> PathBuf {
    let dir = resolve(|key| std::env::var(key).ok());
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Return a subdirectory inside the data dir (e.g. "documents").
pub fn data_subdir(name: &str) -> PathBuf {
    let dir = data_dir().join(name);
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn resolve(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    let set = |key: &str| var(key).filter(|v| !v.is_empty());

    if let Some(explicit) = set(DATA_DIR_ENV) {
        return PathBuf::from(explicit);
    }
    if let Some(xdg) = set("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("snapdoc");
    }
    if let Some(home) = set("HOME") {
        return PathBuf::from(home).join(".local").join("share").join("snapdoc");
    }
    // Last resort
    std::env::temp_dir().join("snapdoc")
}
