// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-call pipelines: "detect -> rectify" and "deskew -> crop -> tone".

use scanwerk_core::error::Result;
use scanwerk_core::{CornerSet, EnhancementConfig, RasterImage, ScanConfig, ScanwerkError};
use tracing::{debug, info, instrument};

use super::skew::SkewEstimator;
use super::tone;
use super::trim::ContentBoundsTrimmer;
use crate::scan::detect::EdgeContourDetector;
use crate::scan::rectify::rectify;

/// Composes the stages with one shared configuration.
#[derive(Debug, Clone, Default)]
pub struct ScanPipeline {
    detector: EdgeContourDetector,
    skew: SkewEstimator,
    trimmer: ContentBoundsTrimmer,
    enhancement: EnhancementConfig,
}

impl ScanPipeline {
    /// Stage configs come from `config`; the enhancement overrides
    /// (`max_skew_angle`, `crop_padding`) win over them when set.
    pub fn new(config: ScanConfig) -> Self {
        let ScanConfig {
            detector,
            mut skew,
            mut trim,
            enhancement,
        } = config;
        if let Some(max_angle) = enhancement.max_skew_angle {
            skew.max_angle = max_angle;
        }
        if let Some(padding) = enhancement.crop_padding {
            trim.padding = padding;
        }
        Self {
            detector: EdgeContourDetector::new(detector),
            skew: SkewEstimator::new(skew),
            trimmer: ContentBoundsTrimmer::new(trim),
            enhancement,
        }
    }

    pub fn detector(&self) -> &EdgeContourDetector {
        &self.detector
    }

    pub fn skew_estimator(&self) -> &SkewEstimator {
        &self.skew
    }

    pub fn trimmer(&self) -> &ContentBoundsTrimmer {
        &self.trimmer
    }

    pub fn enhancement(&self) -> &EnhancementConfig {
        &self.enhancement
    }

    /// Rectify the document in `image`. Manual corners skip detection.
    ///
    /// # Errors
    ///
    /// [`ScanwerkError::DocumentNotFound`] when detection finds nothing, or
    /// [`ScanwerkError::InvalidGeometry`] for degenerate corners.
    #[instrument(skip_all, fields(manual = manual_corners.is_some()))]
    pub fn scan(
        &self,
        image: &RasterImage,
        manual_corners: Option<&CornerSet>,
    ) -> Result<RasterImage> {
        if image.is_empty() {
            return Err(ScanwerkError::NoImage);
        }
        let corners = match manual_corners {
            Some(corners) => *corners,
            None => self
                .detector
                .detect(image)
                .ok_or(ScanwerkError::DocumentNotFound)?,
        };
        rectify(image, &corners, None)
    }

    /// Deskew, crop, colour-correct, stretch and sharpen, each stage
    /// switchable through [`EnhancementConfig`].
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn enhance(&self, image: &RasterImage) -> RasterImage {
        let e = &self.enhancement;
        let mut result = image.clone();

        if e.deskew {
            let (straight, angle) = self.skew.deskew(&result);
            debug!(angle, "Deskew stage");
            result = straight;
        }
        if e.crop {
            result = self.trimmer.trim(&result);
        }
        if result.is_color() {
            if e.white_balance {
                result = tone::white_balance(&result);
            }
            if e.remove_shadow {
                result = tone::equalize_local(&result, e.shadow_clip_limit, e.shadow_tile_grid);
            }
        }
        if e.auto_contrast {
            result = tone::auto_contrast(&result, e.clip_percent);
        }
        if e.sharpen {
            result = tone::sharpen(&result, e.sharpen_amount);
        }

        info!(
            width = result.width(),
            height = result.height(),
            "Enhancement complete"
        );
        result
    }

    /// [`scan`](Self::scan) followed by [`enhance`](Self::enhance).
    pub fn scan_and_enhance(
        &self,
        image: &RasterImage,
        manual_corners: Option<&CornerSet>,
    ) -> Result<RasterImage> {
        let scanned = self.scan(image, manual_corners)?;
        Ok(self.enhance(&scanned))
    }
}

/// Enhance with default stage parameters and the given switches.
pub fn enhance_document(image: &RasterImage, config: &EnhancementConfig) -> RasterImage {
    ScanPipeline::new(ScanConfig {
        enhancement: config.clone(),
        ..ScanConfig::default()
    })
    .enhance(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;
    use scanwerk_core::Point2D;

    fn photo() -> RasterImage {
        let mut img = RgbImage::new(800, 600);
        draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(600, 400), Rgb([245, 245, 240]));
        draw_filled_rect_mut(&mut img, Rect::at(200, 200).of_size(300, 8), Rgb([20, 20, 20]));
        RasterImage::Rgb(img)
    }

    #[test]
    fn scan_detects_and_rectifies() {
        let out = ScanPipeline::default().scan(&photo(), None).expect("page found");
        let (w, h) = out.dimensions();
        assert!(w.abs_diff(600) <= 10, "width {w}");
        assert!(h.abs_diff(400) <= 10, "height {h}");
    }

    #[test]
    fn scan_uses_manual_corners() {
        let corners = CornerSet::new([
            Point2D::new(10.0, 10.0),
            Point2D::new(110.0, 10.0),
            Point2D::new(110.0, 60.0),
            Point2D::new(10.0, 60.0),
        ]);
        let out = ScanPipeline::default()
            .scan(&photo(), Some(&corners))
            .expect("manual corners are valid");
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn scan_reports_missing_document() {
        let blank = RasterImage::Gray(GrayImage::from_pixel(300, 300, Luma([30])));
        assert!(matches!(
            ScanPipeline::default().scan(&blank, None),
            Err(ScanwerkError::DocumentNotFound)
        ));
    }

    #[test]
    fn all_stages_off_is_identity() {
        let config = EnhancementConfig {
            deskew: false,
            crop: false,
            white_balance: false,
            remove_shadow: false,
            auto_contrast: false,
            sharpen: false,
            ..EnhancementConfig::default()
        };
        let img = photo();
        assert_eq!(enhance_document(&img, &config), img);
    }

    #[test]
    fn enhance_crops_blank_margins() {
        let mut img = GrayImage::from_pixel(400, 300, Luma([255]));
        draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(200, 6), Luma([0]));
        let out = ScanPipeline::default().enhance(&RasterImage::Gray(img));
        assert!(out.width() < 400 && out.height() < 300);
        assert_eq!(out.channels(), 1);
    }

    #[test]
    fn enhancement_overrides_stage_configs() {
        let pipeline = ScanPipeline::new(ScanConfig {
            enhancement: EnhancementConfig {
                max_skew_angle: Some(3.0),
                crop_padding: Some(0),
                ..EnhancementConfig::default()
            },
            ..ScanConfig::default()
        });
        assert_eq!(pipeline.skew_estimator().config().max_angle, 3.0);
        assert_eq!(pipeline.trimmer().config().padding, 0);
    }

    #[test]
    fn enhance_on_empty_image_is_noop() {
        let empty = RasterImage::Gray(GrayImage::new(0, 0));
        assert_eq!(ScanPipeline::default().enhance(&empty), empty);
    }
}
