// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::types::RenderTarget;

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root URL of the remote document service.
    pub api_base_url: String,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    /// Which rendering strategy the document builder uses on this target.
    pub render_target: RenderTarget,
    /// Title embedded in generated documents.
    pub document_title: String,
    /// Write built documents under the data directory's `documents/` folder.
    pub write_artifacts: bool,
    /// Encrypt the stored session with a passphrase kept in the platform keychain.
    pub encrypt_session: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.example.com".into(),
            request_timeout_secs: 30,
            render_target: RenderTarget::default(),
            document_title: "Camera Document".into(),
            write_artifacts: true,
            encrypt_session: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"api_base_url": "http://localhost:8080"}"#).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.render_target, RenderTarget::Native);
    }
}
