// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning — outline detection, perspective rectification and the
// per-image scanner session.

pub mod detect;
pub mod geometry;
pub mod homography;
pub mod rectify;
pub mod session;

pub use detect::{EdgeContourDetector, QuadCandidate};
pub use rectify::{rectify, target_size};
pub use session::ScannerSession;
