// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document — The document scanning core.
//
// Finds a document outline in a photograph, warps it to a top-down view, and
// normalizes the result (deskew, auto-crop, white balance, shadow removal,
// contrast, sharpening). Everything operates on in-memory rasters; decoding
// and encoding are left to the caller.

pub mod enhance;
pub mod image;
pub mod scan;
pub mod templates;

// Re-export the primary entry points so callers can use `scanwerk_document::ScanPipeline` etc.
pub use enhance::pipeline::{ScanPipeline, enhance_document};
pub use enhance::skew::{SkewEstimator, rotate_expand};
pub use enhance::trim::ContentBoundsTrimmer;
pub use self::image::processor::ImageProcessor;
pub use scan::detect::{EdgeContourDetector, QuadCandidate};
pub use scan::rectify::rectify;
pub use scan::session::ScannerSession;
pub use templates::DocumentTemplate;
