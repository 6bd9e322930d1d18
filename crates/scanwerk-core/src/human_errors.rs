// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people holding a phone over a sheet of paper.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how a front end presents it.

use crate::error::ScanwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Storage hiccup; trying again may work.
    Transient,
    /// User must do something (adjust corners, retake the photo).
    ActionRequired,
    /// Retrying will not help (wrong file, bad settings).
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether running the same operation again can succeed unchanged.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanwerkError` into a `HumanError`.
pub fn humanize_error(err: &ScanwerkError) -> HumanError {
    match err {
        // -- Scan errors --
        ScanwerkError::DocumentNotFound => HumanError {
            message: "We couldn't find the edges of the document.".into(),
            suggestion: "Place the page on a darker, plain surface and retake the photo, or mark the four corners by hand.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::InvalidGeometry(_) => HumanError {
            message: "Those corners don't outline a page.".into(),
            suggestion: "Move the corner markers so they sit on the four corners of the document, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::NoImage => HumanError {
            message: "There's no picture to scan yet.".into(),
            suggestion: "Take a photo or choose an image first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::UnknownTemplate(name) => HumanError {
            message: "That document type isn't one we know.".into(),
            suggestion: format!("Pick one of the listed document types. (Asked for: {name})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Codec errors --
        ScanwerkError::Decode(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanwerkError::Encode(_) => HumanError {
            message: "The scan couldn't be saved in that format.".into(),
            suggestion: "Try saving with a .png or .jpg file name.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Configuration --
        ScanwerkError::InvalidConfig(detail) => HumanError {
            message: "The scanner settings don't make sense.".into(),
            suggestion: format!("Fix the settings file or remove it to use the defaults. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or try copying the file to a different location first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        ScanwerkError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check that the settings file is valid JSON.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
