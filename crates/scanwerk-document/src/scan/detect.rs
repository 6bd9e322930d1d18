// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document outline detection: edge map, contour tracing, quadrilateral search.

use image::GrayImage;
use image::imageops::{self, FilterType};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use scanwerk_core::{CornerSet, DetectorConfig, Point2D, RasterImage, polygon_area};
use tracing::{debug, info, instrument};

use super::geometry::{approximate_closed_polygon, closed_perimeter};

/// A quadrilateral accepted by the detector, with the numbers that qualified it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadCandidate {
    /// Corners in original-image coordinates, unordered.
    pub corners: CornerSet,
    /// Area of the traced contour at working resolution.
    pub contour_area: f64,
    /// Simplification tolerance that produced the four vertices.
    pub epsilon: f64,
}

/// Finds the largest four-sided outline in a photograph.
///
/// The image is reduced to a working resolution, blurred, run through Canny,
/// and its contours are traced. The largest contours are simplified with
/// Douglas-Peucker; the first that collapses to exactly four vertices with
/// enough area is the document.
#[derive(Debug, Clone, Default)]
pub struct EdgeContourDetector {
    config: DetectorConfig,
}

impl EdgeContourDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Corners of the document outline, or `None` when nothing qualifies.
    pub fn detect(&self, image: &RasterImage) -> Option<CornerSet> {
        self.find_candidate(image).map(|candidate| candidate.corners)
    }

    /// Like [`detect`](Self::detect) but keeps the contour area and epsilon.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn find_candidate(&self, image: &RasterImage) -> Option<QuadCandidate> {
        if image.is_empty() {
            return None;
        }

        let (orig_w, orig_h) = image.dimensions();
        let working = self.working_gray(image);
        let (work_w, work_h) = working.dimensions();
        let scale_x = orig_w as f64 / work_w as f64;
        let scale_y = orig_h as f64 / work_h as f64;
        debug!(work_w, work_h, scale_x, scale_y, "Working resolution");

        let edges = self.edge_map(&working);

        let mut contours: Vec<(f64, Vec<Point2D>)> = find_contours::<u32>(&edges)
            .into_iter()
            .filter(|c| c.points.len() >= 4)
            .map(|c| {
                let pts: Vec<Point2D> = c
                    .points
                    .iter()
                    .map(|p| Point2D::new(p.x as f64, p.y as f64))
                    .collect();
                (polygon_area(&pts), pts)
            })
            .collect();
        contours.sort_by(|a, b| b.0.total_cmp(&a.0));
        debug!(contour_count = contours.len(), "Contours traced");

        for (contour_area, points) in contours.iter().take(self.config.max_candidates) {
            let epsilon = self.config.epsilon_factor * closed_perimeter(points);
            let approx = approximate_closed_polygon(points, epsilon);
            if approx.len() != 4 {
                continue;
            }
            let area = polygon_area(&approx);
            if area <= self.config.min_area {
                debug!(area, "Quadrilateral too small");
                continue;
            }

            let corners = CornerSet::from_slice(&approx).ok()?.scaled(scale_x, scale_y);
            info!(contour_area, area, "Document outline found");
            return Some(QuadCandidate {
                corners,
                contour_area: *contour_area,
                epsilon,
            });
        }

        info!("No document outline found");
        None
    }

    /// Luminance at working resolution. Images already within the bound are
    /// left at full size.
    fn working_gray(&self, image: &RasterImage) -> GrayImage {
        let gray = image.to_luma8();
        let (w, h) = gray.dimensions();
        let bound = self.config.working_bound;
        if w <= bound && h <= bound {
            return gray;
        }
        let scale = (bound as f64 / w as f64).min(bound as f64 / h as f64);
        let new_w = ((w as f64 * scale) as u32).max(1);
        let new_h = ((h as f64 * scale) as u32).max(1);
        imageops::resize(&gray, new_w, new_h, FilterType::Triangle)
    }

    /// Blurred Canny edges, optionally thickened.
    pub(crate) fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, kernel_sigma(self.config.blur_kernel));
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);
        if self.config.edge_dilation == 0 {
            edges
        } else {
            dilate(&edges, Norm::LInf, self.config.edge_dilation)
        }
    }
}

/// Gaussian sigma implied by a kernel size when none is given explicitly.
pub(crate) fn kernel_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel.max(1) as f32 - 1.0) * 0.5 - 1.0) + 0.8
}
