// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the presentation layer.
//
// Every technical error is mapped to plain English with a clear suggestion.
// `retriable` tells the UI whether offering "Try again" for the failed step
// makes sense; nothing here retries on its own.

use crate::error::SnapdocError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or server hiccup; trying the same step again may work.
    Transient,
    /// User must do something first (select photos, sign in, grant access).
    ActionRequired,
    /// Cannot be fixed by retrying or user action.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether re-triggering the same step is worth offering.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, retriable: bool, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable,
            severity,
        }
    }
}

/// Convert a `SnapdocError` into a `HumanError`.
pub fn humanize_error(err: &SnapdocError) -> HumanError {
    match err {
        SnapdocError::Persistence(_) => HumanError::new(
            "Your photos couldn't be saved to storage.",
            "They are still available for now. Free up some space on your device and try again.",
            true,
            Severity::Transient,
        ),

        SnapdocError::DuplicateCapture(_) => HumanError::new(
            "This photo is already in your gallery.",
            "There's nothing else to do.",
            false,
            Severity::Permanent,
        ),

        SnapdocError::InvalidCapture(_) => HumanError::new(
            "The camera didn't return a usable photo.",
            "Try taking the photo again.",
            true,
            Severity::Transient,
        ),

        SnapdocError::EmptySelection => HumanError::new(
            "No images selected.",
            "Please select at least one image to generate a PDF.",
            false,
            Severity::ActionRequired,
        ),

        SnapdocError::DocumentBuild(_) => HumanError::new(
            "We couldn't create the document.",
            "Try generating it again. If this keeps happening, your device's storage may be full.",
            true,
            Severity::Transient,
        ),

        SnapdocError::NothingToUpload => HumanError::new(
            "There's no document to upload yet.",
            "Generate a PDF from your selected photos first.",
            false,
            Severity::ActionRequired,
        ),

        SnapdocError::InvalidTransition(_) => HumanError::new(
            "That can't be done right now.",
            "Wait for the current step to finish, then try again.",
            false,
            Severity::ActionRequired,
        ),

        SnapdocError::Unauthenticated => HumanError::new(
            "You're not signed in.",
            "Sign in on the Profile tab, then upload again.",
            false,
            Severity::ActionRequired,
        ),

        SnapdocError::InvalidCredentials(_) => HumanError::new(
            "Please fill in all fields.",
            "Enter both your email address and your password.",
            false,
            Severity::ActionRequired,
        ),

        SnapdocError::Auth { status, .. } => humanize_auth_status(*status),

        SnapdocError::Upload { status, .. } => humanize_upload_status(*status),

        SnapdocError::Encryption(_) | SnapdocError::Decryption(_) => HumanError::new(
            "There was a security problem.",
            "You may need to sign in again.",
            false,
            Severity::Permanent,
        ),

        SnapdocError::IntegrityMismatch { .. } => HumanError::new(
            "The document changed after it was created.",
            "Generate the PDF again before uploading.",
            false,
            Severity::Permanent,
        ),

        SnapdocError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError::new(
                    "A photo couldn't be found.",
                    "It may have been deleted from your device. Remove it from the gallery and try again.",
                    false,
                    Severity::ActionRequired,
                )
            } else {
                HumanError::new(
                    "There was a problem reading or writing a file.",
                    "Try again. If this keeps happening, your device's storage may be full.",
                    true,
                    Severity::Transient,
                )
            }
        }

        SnapdocError::Serialization(_) => HumanError::new(
            "The app had an internal data problem.",
            "Try again. If this keeps happening, please report it.",
            true,
            Severity::Transient,
        ),

        SnapdocError::Bridge(detail) => {
            if detail.contains("permission") {
                HumanError::new(
                    "Permission required.",
                    "Media library access is needed to save photos. Allow it in your device settings.",
                    false,
                    Severity::ActionRequired,
                )
            } else {
                HumanError::new(
                    "A device feature didn't work.",
                    "Try restarting the app.",
                    true,
                    Severity::Transient,
                )
            }
        }

        SnapdocError::PlatformUnavailable => HumanError::new(
            "This feature isn't available on your device.",
            "Some features need a phone or tablet with a camera.",
            false,
            Severity::Permanent,
        ),
    }
}

fn humanize_auth_status(status: Option<u16>) -> HumanError {
    match status {
        Some(401) | Some(403) => HumanError::new(
            "Login failed.",
            "Check your email address and password, then try again.",
            false,
            Severity::ActionRequired,
        ),
        Some(409) => HumanError::new(
            "Registration failed.",
            "An account with this email may already exist. Try signing in instead.",
            false,
            Severity::ActionRequired,
        ),
        Some(code) if code >= 500 => HumanError::new(
            "The server had a problem.",
            "Please try again in a moment.",
            true,
            Severity::Transient,
        ),
        Some(_) => HumanError::new(
            "Login failed.",
            "Please try again.",
            true,
            Severity::Transient,
        ),
        None => HumanError::new(
            "We couldn't reach the server.",
            "Please check your connection and try again.",
            true,
            Severity::Transient,
        ),
    }
}

fn humanize_upload_status(status: Option<u16>) -> HumanError {
    match status {
        Some(401) | Some(403) => HumanError::new(
            "Your session has expired.",
            "Sign in again, then upload the PDF.",
            false,
            Severity::ActionRequired,
        ),
        Some(413) => HumanError::new(
            "This document is too large to upload.",
            "Select fewer photos and generate a new PDF.",
            false,
            Severity::ActionRequired,
        ),
        _ => HumanError::new(
            "Failed to upload PDF.",
            "Please check your connection and try again.",
            true,
            Severity::Transient,
        ),
    }
}
