// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner session — the image being worked on plus the results of the last
// detection and rectification.

use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use scanwerk_core::error::Result;
use scanwerk_core::{CornerSet, DetectorConfig, RasterImage, ScanwerkError};
use tracing::{debug, info, instrument};

use super::detect::EdgeContourDetector;
use super::rectify::rectify;

const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const OUTLINE_HALF_WIDTH: i32 = 1;
const CORNER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CORNER_RADIUS: i32 = 10;

/// Holds one photograph through detect and scan.
///
/// Not shared between threads; use one session per image.
#[derive(Debug, Clone, Default)]
pub struct ScannerSession {
    detector: EdgeContourDetector,
    original_image: Option<RasterImage>,
    last_detected_corners: Option<CornerSet>,
    last_rectified_image: Option<RasterImage>,
}

impl ScannerSession {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            detector: EdgeContourDetector::new(config),
            ..Self::default()
        }
    }

    /// Replace the working image and forget earlier results.
    pub fn set_image(&mut self, image: RasterImage) {
        debug!(width = image.width(), height = image.height(), "Session image set");
        self.original_image = Some(image);
        self.last_detected_corners = None;
        self.last_rectified_image = None;
    }

    pub fn original_image(&self) -> Option<&RasterImage> {
        self.original_image.as_ref()
    }

    pub fn last_detected_corners(&self) -> Option<&CornerSet> {
        self.last_detected_corners.as_ref()
    }

    pub fn last_rectified_image(&self) -> Option<&RasterImage> {
        self.last_rectified_image.as_ref()
    }

    /// Detect the document outline in the current image and remember it.
    ///
    /// # Errors
    ///
    /// [`ScanwerkError::NoImage`] without an image,
    /// [`ScanwerkError::DocumentNotFound`] when nothing qualifies.
    #[instrument(skip(self))]
    pub fn detect(&mut self) -> Result<CornerSet> {
        let image = self.original_image.as_ref().ok_or(ScanwerkError::NoImage)?;
        let corners = self.detector.detect(image);
        self.last_detected_corners = corners;
        corners.ok_or(ScanwerkError::DocumentNotFound)
    }

    /// Rectify the current image, using `manual_corners` when given and
    /// detection otherwise.
    #[instrument(skip_all, fields(manual = manual_corners.is_some()))]
    pub fn scan(&mut self, manual_corners: Option<&CornerSet>) -> Result<RasterImage> {
        if self.original_image.is_none() {
            return Err(ScanwerkError::NoImage);
        }
        let corners = match manual_corners {
            Some(corners) => *corners,
            None => self.detect()?,
        };
        let image = self.original_image.as_ref().ok_or(ScanwerkError::NoImage)?;
        let rectified = rectify(image, &corners, None)?;
        info!(
            width = rectified.width(),
            height = rectified.height(),
            "Document scanned"
        );
        self.last_rectified_image = Some(rectified.clone());
        Ok(rectified)
    }

    /// Drop the image and all results.
    pub fn reset(&mut self) {
        self.original_image = None;
        self.last_detected_corners = None;
        self.last_rectified_image = None;
    }

    /// RGB copy of the image with the last detected outline drawn on it.
    pub fn preview(&self) -> Result<RasterImage> {
        let image = self.original_image.as_ref().ok_or(ScanwerkError::NoImage)?;
        let mut canvas = image.to_rgb8();

        if let Some(corners) = &self.last_detected_corners {
            let pts = corners.ordered();
            let pts = pts.points();
            for i in 0..4 {
                let a = pts[i];
                let b = pts[(i + 1) % 4];
                for dy in -OUTLINE_HALF_WIDTH..=OUTLINE_HALF_WIDTH {
                    for dx in -OUTLINE_HALF_WIDTH..=OUTLINE_HALF_WIDTH {
                        draw_line_segment_mut(
                            &mut canvas,
                            ((a.x as f32) + dx as f32, (a.y as f32) + dy as f32),
                            ((b.x as f32) + dx as f32, (b.y as f32) + dy as f32),
                            OUTLINE_COLOR,
                        );
                    }
                }
            }
            for p in pts {
                draw_filled_circle_mut(
                    &mut canvas,
                    (p.x.round() as i32, p.y.round() as i32),
                    CORNER_RADIUS,
                    CORNER_COLOR,
                );
            }
        }

        Ok(RasterImage::Rgb(canvas))
    }
}
