// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Scan errors --
    /// No quadrilateral qualified as the document outline. Expected outcome;
    /// callers fall back to manual corners.
    #[error("no document outline found")]
    DocumentNotFound,

    #[error("invalid corner geometry: {0}")]
    InvalidGeometry(String),

    #[error("no image available")]
    NoImage,

    #[error("unknown document template: {0}")]
    UnknownTemplate(String),

    // -- Codec errors (raised by the front end, never by the core) --
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;
