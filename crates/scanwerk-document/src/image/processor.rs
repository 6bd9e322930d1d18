// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — resize, rotate, crop, grayscale, brightness/contrast
// adjustment, binarization and denoising. Operates on in-memory rasters using
// the `image` and `imageproc` crates; never touches the filesystem.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::definitions::Image;
use imageproc::filter::median_filter;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use scanwerk_core::RasterImage;
use tracing::{debug, info, instrument};

use crate::enhance::skew::rotate_expand;

/// Image processing pipeline operating on a single in-memory raster.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed raster, enabling method chaining.
///
/// ```ignore
/// let result = ImageProcessor::from_raster(photo)
///     .resize(800, 600)
///     .rotate(90.0)
///     .grayscale()
///     .adjust_brightness(10)
///     .into_raster();
/// ```
pub struct ImageProcessor {
    /// The current working raster.
    image: RasterImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded raster.
    pub fn from_raster(image: RasterImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying raster.
    pub fn as_raster(&self) -> &RasterImage {
        &self.image
    }

    /// Consume the processor and return the underlying raster.
    pub fn into_raster(self) -> RasterImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize the image to fit within `max_width` x `max_height`, preserving
    /// aspect ratio. Uses Lanczos3 filtering for high-quality downscaling.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn resize(self, max_width: u32, max_height: u32) -> Self {
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            max_width,
            max_height,
            "Resizing image"
        );
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return self;
        }
        let scale = (max_width as f64 / w as f64).min(max_height as f64 / h as f64);
        let new_w = ((w as f64 * scale).round() as u32).max(1);
        let new_h = ((h as f64 * scale).round() as u32).max(1);
        let resized = resize_raster(&self.image, new_w, new_h, FilterType::Lanczos3);
        debug!(new_w, new_h, "Resize complete");
        Self { image: resized }
    }

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        Self {
            image: resize_raster(&self.image, width, height, FilterType::CatmullRom),
        }
    }

    /// Rotate the image by an arbitrary angle in degrees (clockwise).
    ///
    /// For 90/180/270 degree rotations, lossless rotation is used. For other
    /// angles the canvas expands to contain the rotated image and the new
    /// background is white.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        info!(degrees, "Rotating image");

        // Fast-path for exact multiples of 90.
        let normalised = degrees.rem_euclid(360.0);
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: map_lossless(self.image, imageops::rotate90, imageops::rotate90),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: map_lossless(self.image, imageops::rotate180, imageops::rotate180),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: map_lossless(self.image, imageops::rotate270, imageops::rotate270),
            };
        }
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }

        // rotate_expand turns counter-clockwise for positive angles.
        let rotated = rotate_expand(&self.image, -(degrees as f64));
        debug!("General rotation applied");
        Self { image: rotated }
    }

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner; `width` and `height` define the
    /// size of the crop rectangle. Values are clamped to image bounds.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let (img_w, img_h) = self.image.dimensions();
        if img_w == 0 || img_h == 0 {
            return self;
        }

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x).max(1);
        let safe_h = height.min(img_h - safe_y).max(1);

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        Self {
            image: crop_raster(&self.image, safe_x, safe_y, safe_w, safe_h),
        }
    }

    /// Convert the image to grayscale (luma).
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        debug!("Converting to grayscale");
        Self {
            image: RasterImage::Gray(self.image.to_luma8()),
        }
    }

    /// Adjust brightness by `value` (-255..=255).
    ///
    /// Positive values brighten, negative values darken. The value is clamped to
    /// [-255, 255].
    #[instrument(skip(self), fields(value))]
    pub fn adjust_brightness(self, value: i32) -> Self {
        let clamped = value.clamp(-255, 255);
        debug!(clamped, "Adjusting brightness");
        self.map_samples(|sample| (sample as i32 + clamped).clamp(0, 255) as u8)
    }

    /// Adjust contrast by a factor. Values > 1.0 increase contrast; values
    /// < 1.0 decrease it. A value of 1.0 is a no-op.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        debug!(factor, "Adjusting contrast");
        self.map_samples(|sample| (factor * (sample as f32 - 128.0) + 128.0).clamp(0.0, 255.0) as u8)
    }

    /// Linear gain/offset: `v * (1 + contrast / 100) + brightness`, absolute
    /// value saturated to 0..=255. `contrast` and `brightness` nominally lie in
    /// -100..=100.
    #[instrument(skip(self), fields(brightness, contrast))]
    pub fn adjust_brightness_contrast(self, brightness: i32, contrast: i32) -> Self {
        if brightness == 0 && contrast == 0 {
            return self;
        }
        let alpha = 1.0 + contrast as f32 / 100.0;
        let beta = brightness as f32;
        self.map_samples(|sample| (alpha * sample as f32 + beta).abs().round().min(255.0) as u8)
    }

    /// Apply adaptive thresholding to produce a black-and-white image.
    ///
    /// Uses a local mean approach: for each pixel, the threshold is the mean
    /// intensity within a `block_radius` neighbourhood, minus a constant `c`.
    /// Pixels darker than the local threshold become black; others become white.
    #[instrument(skip(self), fields(block_radius, c))]
    pub fn binarize(self, block_radius: u32, c: i32) -> Self {
        info!(block_radius, c, "Applying adaptive binarization");

        let gray = self.image.to_luma8();
        let (width, height) = gray.dimensions();
        let sums: Image<Luma<u64>> = integral_image::<_, u64>(&gray);

        let mut output = GrayImage::new(width, height);
        for (x, y, dst) in output.enumerate_pixels_mut() {
            // Inclusive window, clamped to the image.
            let left = x.saturating_sub(block_radius);
            let top = y.saturating_sub(block_radius);
            let right = x.saturating_add(block_radius).min(width - 1);
            let bottom = y.saturating_add(block_radius).min(height - 1);
            let area = u64::from(right - left + 1) * u64::from(bottom - top + 1);

            let sum = sum_image_pixels(&sums, left, top, right, bottom)[0];
            let local_mean = sum as f64 / area as f64;
            let threshold = (local_mean as i32 - c).clamp(0, 255) as u8;
            dst.0[0] = if gray.get_pixel(x, y).0[0] < threshold { 0 } else { 255 };
        }

        Self {
            image: RasterImage::Gray(output),
        }
    }

    /// Global binarization at the Otsu level: values above it become white,
    /// the level itself and everything darker become black.
    #[instrument(skip(self))]
    pub fn binarize_otsu(self) -> Self {
        let gray = self.image.to_luma8();
        let level = otsu_level(&gray);
        debug!(level, "Otsu level computed");

        Self {
            image: RasterImage::Gray(threshold(&gray, level, ThresholdType::Binary)),
        }
    }

    /// Median filter over a `(2r+1)^2` window; knocks out salt-and-pepper noise
    /// while keeping edges.
    #[instrument(skip(self), fields(radius))]
    pub fn median_denoise(self, radius: u32) -> Self {
        if radius == 0 {
            return self;
        }
        let image = match &self.image {
            RasterImage::Gray(gray) => RasterImage::Gray(median_filter(gray, radius, radius)),
            RasterImage::Rgb(rgb) => RasterImage::Rgb(median_filter(rgb, radius, radius)),
        };
        Self { image }
    }

    fn map_samples(self, f: impl Fn(u8) -> u8) -> Self {
        let mut image = self.image;
        for sample in image.samples_mut() {
            *sample = f(*sample);
        }
        Self { image }
    }
}

// -- Raster helpers -------------------------------------------------------------

/// Resample to exactly `width` x `height`.
pub(crate) fn resize_raster(
    image: &RasterImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> RasterImage {
    match image {
        RasterImage::Gray(gray) => RasterImage::Gray(imageops::resize(gray, width, height, filter)),
        RasterImage::Rgb(rgb) => RasterImage::Rgb(imageops::resize(rgb, width, height, filter)),
    }
}

/// Copy out a sub-rectangle. The caller guarantees it lies inside the image.
pub(crate) fn crop_raster(image: &RasterImage, x: u32, y: u32, width: u32, height: u32) -> RasterImage {
    match image {
        RasterImage::Gray(gray) => {
            RasterImage::Gray(imageops::crop_imm(gray, x, y, width, height).to_image())
        }
        RasterImage::Rgb(rgb) => {
            RasterImage::Rgb(imageops::crop_imm(rgb, x, y, width, height).to_image())
        }
    }
}

fn map_lossless(
    image: RasterImage,
    gray_op: fn(&GrayImage) -> GrayImage,
    rgb_op: fn(&image::RgbImage) -> image::RgbImage,
) -> RasterImage {
    match image {
        RasterImage::Gray(gray) => RasterImage::Gray(gray_op(&gray)),
        RasterImage::Rgb(rgb) => RasterImage::Rgb(rgb_op(&rgb)),
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gray(w: u32, h: u32, v: u8) -> RasterImage {
        RasterImage::Gray(GrayImage::from_pixel(w, h, Luma([v])))
    }

    #[test]
    fn resize_fits_within_bounds() {
        let out = ImageProcessor::from_raster(gray(400, 200, 90)).resize(100, 100);
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let out = ImageProcessor::from_raster(gray(30, 20, 0)).rotate(90.0);
        assert_eq!((out.width(), out.height()), (20, 30));
        let out = ImageProcessor::from_raster(gray(30, 20, 0)).rotate(-90.0);
        assert_eq!((out.width(), out.height()), (20, 30));
    }

    #[test]
    fn arbitrary_rotation_expands_canvas() {
        let out = ImageProcessor::from_raster(gray(100, 50, 0)).rotate(30.0);
        assert!(out.width() > 100);
        assert!(out.height() > 50);
    }

    #[test]
    fn crop_is_clamped_to_bounds() {
        let out = ImageProcessor::from_raster(gray(50, 40, 10)).crop(30, 30, 100, 100);
        assert_eq!((out.width(), out.height()), (20, 10));
    }

    #[test]
    fn brightness_saturates() {
        let out = ImageProcessor::from_raster(gray(2, 2, 250))
            .adjust_brightness(20)
            .into_raster();
        assert!(out.samples().iter().all(|&v| v == 255));
    }

    #[test]
    fn brightness_contrast_applies_gain_then_offset() {
        let out = ImageProcessor::from_raster(gray(1, 1, 100))
            .adjust_brightness_contrast(10, 20)
            .into_raster();
        // 100 * 1.2 + 10
        assert_eq!(out.samples(), &[130]);
    }

    #[test]
    fn grayscale_drops_to_one_channel() {
        let rgb = RasterImage::Rgb(RgbImage::from_pixel(3, 3, Rgb([200, 10, 10])));
        let out = ImageProcessor::from_raster(rgb).grayscale().into_raster();
        assert_eq!(out.channels(), 1);
    }

    #[test]
    fn otsu_splits_bimodal_histogram() {
        let mut img = GrayImage::from_pixel(20, 10, Luma([30]));
        for y in 0..10 {
            for x in 10..20 {
                img.put_pixel(x, y, Luma([220]));
            }
        }
        // The level sits on the last dark value, so it must stay black.
        assert_eq!(otsu_level(&img), 30);

        let bw = ImageProcessor::from_raster(RasterImage::Gray(img))
            .binarize_otsu()
            .into_raster();
        let samples = bw.samples();
        assert_eq!(samples.iter().filter(|&&v| v == 0).count(), 100);
        assert_eq!(samples.iter().filter(|&&v| v == 255).count(), 100);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[15], 255);
    }

    #[test]
    fn otsu_binarize_keeps_ink_on_two_tone_page() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([235]));
        for x in 3..27 {
            for y in [10, 11, 20, 21] {
                img.put_pixel(x, y, Luma([40]));
            }
        }
        let RasterImage::Gray(bw) = ImageProcessor::from_raster(RasterImage::Gray(img))
            .binarize_otsu()
            .into_raster()
        else {
            panic!("binarize_otsu must return a gray raster");
        };
        assert_eq!(bw.get_pixel(15, 10).0[0], 0);
        assert_eq!(bw.get_pixel(15, 21).0[0], 0);
        assert_eq!(bw.get_pixel(15, 15).0[0], 255);
    }

    #[test]
    fn adaptive_binarize_matches_local_mean_at_borders() {
        // 3x1 image, radius 1: the corner window covers two pixels.
        let img = GrayImage::from_raw(3, 1, vec![100, 110, 200]).expect("3x1 buffer");
        let RasterImage::Gray(out) = ImageProcessor::from_raster(RasterImage::Gray(img))
            .binarize(1, 0)
            .into_raster()
        else {
            panic!("binarize must return a gray raster");
        };
        // means 105, 136.67, 155: only the first two pixels fall below theirs
        assert_eq!(out.as_raw(), &vec![0, 0, 255]);
    }

    #[test]
    fn adaptive_binarize_keeps_dark_text_dark() {
        let mut img = GrayImage::from_pixel(40, 40, Luma([200]));
        for x in 5..35 {
            img.put_pixel(x, 20, Luma([20]));
        }
        let out = ImageProcessor::from_raster(RasterImage::Gray(img))
            .binarize(7, 10)
            .into_raster();
        let RasterImage::Gray(out) = out else {
            panic!("binarize must return a gray raster");
        };
        assert_eq!(out.get_pixel(20, 20).0[0], 0);
        assert_eq!(out.get_pixel(20, 5).0[0], 255);
    }

    #[test]
    fn median_removes_isolated_speck() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([255]));
        img.put_pixel(4, 4, Luma([0]));
        let out = ImageProcessor::from_raster(RasterImage::Gray(img))
            .median_denoise(1)
            .into_raster();
        assert!(out.samples().iter().all(|&v| v == 255));
    }
}
