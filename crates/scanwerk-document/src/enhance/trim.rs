// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Auto-crop to the union of everything darker than the paper.

use imageproc::contours::{BorderType, find_contours};
use imageproc::contrast::{ThresholdType, threshold};
use scanwerk_core::{RasterImage, TrimConfig};
use tracing::{debug, instrument};

use crate::image::processor::crop_raster;

/// Crops away blank margins, keeping a padded box around all content.
#[derive(Debug, Clone, Default)]
pub struct ContentBoundsTrimmer {
    config: TrimConfig,
}

impl ContentBoundsTrimmer {
    pub fn new(config: TrimConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrimConfig {
        &self.config
    }

    /// Bounding box `(x, y, width, height)` of the content plus padding, or
    /// `None` for a content-free image.
    pub fn content_bounds(&self, image: &RasterImage) -> Option<(u32, u32, u32, u32)> {
        if image.is_empty() {
            return None;
        }
        // Content is strictly darker than the background threshold; a zero
        // threshold leaves nothing that qualifies.
        let last_content_level = self.config.background_threshold.checked_sub(1)?;
        let gray = image.to_luma8();
        let content = threshold(&gray, last_content_level, ThresholdType::BinaryInverted);

        let (mut x0, mut y0, mut x1, mut y1) = (u32::MAX, u32::MAX, 0u32, 0u32);
        let mut found = false;
        for contour in find_contours::<u32>(&content) {
            if contour.border_type != BorderType::Outer {
                continue;
            }
            for p in &contour.points {
                x0 = x0.min(p.x);
                y0 = y0.min(p.y);
                x1 = x1.max(p.x + 1);
                y1 = y1.max(p.y + 1);
                found = true;
            }
        }
        if !found {
            return None;
        }

        let (w, h) = image.dimensions();
        let pad = self.config.padding;
        let left = x0.saturating_sub(pad);
        let top = y0.saturating_sub(pad);
        let right = x1.saturating_add(pad).min(w);
        let bottom = y1.saturating_add(pad).min(h);
        Some((left, top, right - left, bottom - top))
    }

    /// Crop to [`content_bounds`](Self::content_bounds); unchanged copy when
    /// there is no content.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn trim(&self, image: &RasterImage) -> RasterImage {
        match self.content_bounds(image) {
            Some((x, y, w, h)) if w > 0 && h > 0 => {
                debug!(x, y, w, h, "Trimming to content");
                crop_raster(image, x, y, w, h)
            }
            _ => {
                debug!("No content found; leaving image untouched");
                image.clone()
            }
        }
    }
}

/// Trim with the default background threshold and the given padding.
pub fn trim(image: &RasterImage, padding: u32) -> RasterImage {
    ContentBoundsTrimmer::new(TrimConfig {
        padding,
        ..TrimConfig::default()
    })
    .trim(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn blank_page_is_unchanged() {
        let blank = RasterImage::Gray(GrayImage::from_pixel(120, 80, Luma([255])));
        assert_eq!(trim(&blank, 10), blank);
    }

    #[test]
    fn crops_to_padded_content() {
        let mut img = GrayImage::from_pixel(300, 200, Luma([255]));
        draw_filled_rect_mut(&mut img, Rect::at(100, 50).of_size(40, 30), Luma([0]));
        draw_filled_rect_mut(&mut img, Rect::at(180, 120).of_size(20, 10), Luma([100]));
        let out = trim(&RasterImage::Gray(img), 10);
        // Content spans x 100..200, y 50..130.
        assert_eq!(out.dimensions(), (120, 100));
    }

    #[test]
    fn padding_is_clamped_to_image() {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut img, Rect::at(2, 3).of_size(50, 50), Rgb([10, 10, 10]));
        let trimmer = ContentBoundsTrimmer::default();
        let bounds = trimmer.content_bounds(&RasterImage::Rgb(img.clone()));
        assert_eq!(bounds, Some((0, 0, 62, 63)));
        assert!(trimmer.trim(&RasterImage::Rgb(img)).is_color());
    }

    #[test]
    fn near_white_counts_as_background() {
        let mut img = GrayImage::from_pixel(60, 60, Luma([255]));
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(10, 10), Luma([252]));
        let raster = RasterImage::Gray(img);
        assert_eq!(trim(&raster, 0), raster);
    }

    #[test]
    fn background_threshold_is_exclusive() {
        let mut img = GrayImage::from_pixel(60, 60, Luma([255]));
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(5, 5), Luma([250]));
        draw_filled_rect_mut(&mut img, Rect::at(30, 40).of_size(4, 3), Luma([249]));
        let trimmer = ContentBoundsTrimmer::new(TrimConfig {
            padding: 0,
            ..TrimConfig::default()
        });
        assert_eq!(trimmer.content_bounds(&RasterImage::Gray(img)), Some((30, 40, 4, 3)));
    }

    #[test]
    fn zero_threshold_finds_no_content() {
        let trimmer = ContentBoundsTrimmer::new(TrimConfig {
            background_threshold: 0,
            ..TrimConfig::default()
        });
        let black = RasterImage::Gray(GrayImage::from_pixel(20, 20, Luma([0])));
        assert_eq!(trimmer.content_bounds(&black), None);
        assert_eq!(trimmer.trim(&black), black);
    }
}
