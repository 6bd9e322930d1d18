// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration. Plain values with defaults; loaded from JSON by the
// front end, never persisted by the core.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanwerkError};

/// Document-outline detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Images are downscaled so neither side exceeds this many pixels.
    pub working_bound: u32,
    /// Side of the square Gaussian kernel applied before edge detection.
    pub blur_kernel: u32,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Dilation radius applied to the edge map to close corner gaps (0 = off).
    pub edge_dilation: u8,
    /// Only the largest contours by area are examined.
    pub max_candidates: usize,
    /// Polygon simplification tolerance as a fraction of contour perimeter.
    pub epsilon_factor: f64,
    /// Minimum quadrilateral area, in square pixels at working resolution.
    pub min_area: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            working_bound: 1500,
            blur_kernel: 5,
            canny_low: 50.0,
            canny_high: 150.0,
            edge_dilation: 1,
            max_candidates: 10,
            epsilon_factor: 0.02,
            min_area: 10_000.0,
        }
    }
}

/// Skew estimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkewConfig {
    /// Fused estimates are clamped to +/- this many degrees.
    pub max_angle: f64,
    /// Estimates smaller than this many degrees are treated as zero.
    pub min_angle: f64,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Minimum Hough accumulator votes for a line.
    pub hough_vote_threshold: u32,
    /// Hough non-maximum suppression radius.
    pub hough_suppression_radius: u32,
    /// Projection-profile search covers [-range, +range] degrees with both
    /// ends included, so the defaults try 21 angles, +5 among them. A
    /// half-open sweep would stop at +4.5 and try 20.
    pub projection_range: f64,
    pub projection_step: f64,
}

impl Default for SkewConfig {
    fn default() -> Self {
        Self {
            max_angle: 10.0,
            min_angle: 0.1,
            canny_low: 50.0,
            canny_high: 150.0,
            hough_vote_threshold: 100,
            hough_suppression_radius: 8,
            projection_range: 5.0,
            projection_step: 0.5,
        }
    }
}

/// Auto-crop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    /// Pixels darker than this count as content.
    pub background_threshold: u8,
    /// Border kept around the content box.
    pub padding: u32,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            background_threshold: 250,
            padding: 10,
        }
    }
}

/// Switches and knobs for the one-call enhancement pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    pub deskew: bool,
    pub crop: bool,
    pub white_balance: bool,
    pub remove_shadow: bool,
    pub auto_contrast: bool,
    pub sharpen: bool,
    /// Percentage of samples clipped at each end by the contrast stretch.
    pub clip_percent: f64,
    /// CLAHE clip limit used for shadow removal.
    pub shadow_clip_limit: f32,
    /// CLAHE tile grid (tiles per side) used for shadow removal.
    pub shadow_tile_grid: u32,
    pub sharpen_amount: f32,
    /// Overrides `skew.max_angle` for the deskew stage when set.
    pub max_skew_angle: Option<f64>,
    /// Overrides `trim.padding` for the crop stage when set.
    pub crop_padding: Option<u32>,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            deskew: true,
            crop: true,
            white_balance: true,
            remove_shadow: true,
            auto_contrast: true,
            sharpen: true,
            clip_percent: 1.0,
            shadow_clip_limit: 3.0,
            shadow_tile_grid: 8,
            sharpen_amount: 0.5,
            max_skew_angle: None,
            crop_padding: None,
        }
    }
}

/// Everything the scanner can be tuned with, as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detector: DetectorConfig,
    pub skew: SkewConfig,
    pub trim: TrimConfig,
    pub enhancement: EnhancementConfig,
}

impl ScanConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ScanConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ScanwerkError::InvalidConfig(msg.to_string()));

        let d = &self.detector;
        if d.working_bound == 0 {
            return invalid("detector.working_bound must be positive");
        }
        if d.blur_kernel == 0 || d.blur_kernel % 2 == 0 {
            return invalid("detector.blur_kernel must be odd");
        }
        if d.canny_low > d.canny_high {
            return invalid("detector.canny_low must not exceed canny_high");
        }
        if d.max_candidates == 0 {
            return invalid("detector.max_candidates must be positive");
        }
        if !(d.epsilon_factor > 0.0 && d.epsilon_factor < 1.0) {
            return invalid("detector.epsilon_factor must lie in (0, 1)");
        }

        let s = &self.skew;
        if !(s.max_angle >= 0.0 && s.max_angle <= 45.0) {
            return invalid("skew.max_angle must lie in [0, 45]");
        }
        if !(s.canny_low <= s.canny_high) {
            return invalid("skew.canny_low must not exceed canny_high");
        }
        if s.projection_step <= 0.0 || s.projection_range < 0.0 {
            return invalid("skew.projection_step must be positive and projection_range non-negative");
        }

        let e = &self.enhancement;
        if !(0.0..50.0).contains(&e.clip_percent) {
            return invalid("enhancement.clip_percent must lie in [0, 50)");
        }
        if e.max_skew_angle.is_some_and(|a| !(0.0..=45.0).contains(&a)) {
            return invalid("enhancement.max_skew_angle must lie in [0, 45]");
        }
        if e.shadow_tile_grid == 0 {
            return invalid("enhancement.shadow_tile_grid must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ScanConfig::from_json(r#"{ "skew": { "max_angle": 5.0 }, "enhancement": { "sharpen": false } }"#)
            .expect("partial config parses");
        assert_eq!(config.skew.max_angle, 5.0);
        assert_eq!(config.skew.min_angle, 0.1);
        assert!(!config.enhancement.sharpen);
        assert!(config.enhancement.deskew);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn even_blur_kernel_is_rejected() {
        let err = ScanConfig::from_json(r#"{ "detector": { "blur_kernel": 4 } }"#).unwrap_err();
        assert!(matches!(err, ScanwerkError::InvalidConfig(_)));
    }

    #[test]
    fn inverted_skew_canny_thresholds_are_rejected() {
        let err = ScanConfig::from_json(r#"{ "skew": { "canny_low": 200.0, "canny_high": 100.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ScanwerkError::InvalidConfig(ref msg) if msg.contains("skew.canny_low")));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = ScanConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ScanwerkError::Serialization(_)));
    }
}
