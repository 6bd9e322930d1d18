// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Skew estimation and canvas-expanding rotation.
//
// Two independent estimators vote on the page tilt: dominant Hough lines and
// the row-projection profile of the ink. Their mean, clamped, is the angle.
// Angles are degrees, positive meaning counter-clockwise on screen.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::edges::canny;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::hough::{LineDetectionOptions, detect_lines};
use scanwerk_core::{RasterImage, SkewConfig};
use tracing::{debug, info, instrument, warn};

/// Estimates and removes small page rotations.
#[derive(Debug, Clone, Default)]
pub struct SkewEstimator {
    config: SkewConfig,
}

impl SkewEstimator {
    pub fn new(config: SkewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SkewConfig {
        &self.config
    }

    /// Counter-clockwise rotation that straightens `image`.
    ///
    /// Never fails: with no usable evidence the estimate is `0.0`. The result
    /// is clamped to `+/- max_angle` and snapped to zero below `min_angle`.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn estimate_angle(&self, image: &RasterImage) -> f64 {
        if image.is_empty() {
            return 0.0;
        }
        let gray = image.to_luma8();

        let estimates: Vec<f64> = [self.line_angle(&gray), self.projection_angle(&gray)]
            .into_iter()
            .flatten()
            .collect();
        if estimates.is_empty() {
            debug!("No skew evidence");
            return 0.0;
        }

        let mean = estimates.iter().sum::<f64>() / estimates.len() as f64;
        let clamped = mean.clamp(-self.config.max_angle, self.config.max_angle);
        let angle = if clamped.abs() < self.config.min_angle {
            0.0
        } else {
            clamped
        };
        debug!(?estimates, angle, "Skew estimates fused");
        angle
    }

    /// Median tilt of near-horizontal Hough lines, if any were found.
    ///
    /// Inverted Canny thresholds yield `None` rather than an edge map.
    pub fn line_angle(&self, gray: &GrayImage) -> Option<f64> {
        let (low, high) = (self.config.canny_low, self.config.canny_high);
        if !(low <= high) {
            warn!(low, high, "Canny thresholds inverted; skipping line estimate");
            return None;
        }
        let edges = canny(gray, low, high);
        let lines = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: self.config.hough_vote_threshold,
                suppression_radius: self.config.hough_suppression_radius,
            },
        );

        let mut angles: Vec<f64> = lines
            .iter()
            .map(|line| line.angle_in_degrees as f64 - 90.0)
            .filter(|a| *a > -45.0 && *a < 45.0)
            .collect();
        debug!(line_count = lines.len(), kept = angles.len(), "Hough lines");

        median(&mut angles)
    }

    /// Trial angle whose rotation gives the most peaked row profile of ink.
    ///
    /// `None` when the image has a single tone or every trial scores the same.
    pub fn projection_angle(&self, gray: &GrayImage) -> Option<f64> {
        let threshold = otsu_level(gray);
        let (w, h) = gray.dimensions();
        let cx = w as f64 / 2.0;
        let cy = h as f64 / 2.0;

        let ink: Vec<(f64, f64)> = gray
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] <= threshold)
            .map(|(x, y, _)| (x as f64 - cx, y as f64 - cy))
            .collect();
        if ink.is_empty() || ink.len() as u64 == w as u64 * h as u64 {
            return None;
        }

        let step = self.config.projection_step;
        let range = self.config.projection_range;
        let trials = ((2.0 * range) / step).floor() as i64;

        let mut best: Option<(f64, f64)> = None;
        let mut all_equal = true;
        let mut first_score = None;
        let mut rows = vec![0u64; h as usize];

        for k in 0..=trials {
            let angle = -range + k as f64 * step;
            accumulate_rows(&ink, angle, (w, h), &mut rows);
            let score = variance(&rows);

            match first_score {
                None => first_score = Some(score),
                Some(f) if f != score => all_equal = false,
                _ => {}
            }
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((angle, score));
            }
        }

        if all_equal {
            return None;
        }
        best.map(|(angle, _)| angle)
    }

    /// Estimate the skew and rotate it away. Returns the applied angle; when
    /// it is zero the image is returned unchanged.
    #[instrument(skip(self, image))]
    pub fn deskew(&self, image: &RasterImage) -> (RasterImage, f64) {
        let angle = self.estimate_angle(image);
        if angle == 0.0 {
            return (image.clone(), 0.0);
        }
        info!(angle, "Deskewing");
        (rotate_expand(image, angle), angle)
    }
}

/// Rotate counter-clockwise by `degrees` about the centre, growing the canvas
/// so nothing is clipped. New area is white.
pub fn rotate_expand(image: &RasterImage, degrees: f64) -> RasterImage {
    if image.is_empty() {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let (s, c) = degrees.to_radians().sin_cos();
    let new_w = ((h as f64 * s.abs() + w as f64 * c.abs()) as u32).max(1);
    let new_h = ((h as f64 * c.abs() + w as f64 * s.abs()) as u32).max(1);

    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let (ncx, ncy) = (new_w as f64 / 2.0, new_h as f64 / 2.0);
    let tx = ncx - c * cx - s * cy;
    let ty = ncy + s * cx - c * cy;

    let matrix = [
        c as f32, s as f32, tx as f32, //
        -s as f32, c as f32, ty as f32, //
        0.0, 0.0, 1.0,
    ];
    let Some(projection) = Projection::from_matrix(matrix) else {
        warn!(degrees, "Rotation matrix is not invertible; returning unchanged");
        return image.clone();
    };
    debug!(degrees, new_w, new_h, "Rotating with canvas expansion");

    match image {
        RasterImage::Gray(gray) => {
            let mut out = GrayImage::new(new_w, new_h);
            warp_into(gray, &projection, Interpolation::Bilinear, Luma([255]), &mut out);
            RasterImage::Gray(out)
        }
        RasterImage::Rgb(rgb) => {
            let mut out = RgbImage::new(new_w, new_h);
            warp_into(rgb, &projection, Interpolation::Bilinear, Rgb([255, 255, 255]), &mut out);
            RasterImage::Rgb(out)
        }
    }
}

/// Ink count per row after rotating centred offsets by `angle` about the
/// canvas centre. The canvas is not expanded: ink rotated off either axis is
/// dropped.
fn accumulate_rows(ink: &[(f64, f64)], angle: f64, (w, h): (u32, u32), rows: &mut [u64]) {
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let (s, c) = angle.to_radians().sin_cos();

    rows.iter_mut().for_each(|r| *r = 0);
    for &(dx, dy) in ink {
        let x = (cx + c * dx + s * dy).round();
        let y = (cy - s * dx + c * dy).round();
        if x >= 0.0 && x < w as f64 && y >= 0.0 && y < h as f64 {
            rows[y as usize] += 1;
        }
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn variance(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n
}
