// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement — deskew, auto-crop and tone normalization, plus the pipeline
// that chains them.

pub mod color;
pub mod pipeline;
pub mod skew;
pub mod tone;
pub mod trim;

pub use pipeline::{ScanPipeline, enhance_document};
pub use skew::{SkewEstimator, rotate_expand};
pub use tone::{auto_contrast, equalize_local, remove_shadows, sharpen, white_balance};
pub use trim::{ContentBoundsTrimmer, trim};
