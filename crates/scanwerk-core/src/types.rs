// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk document scanner.

use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanwerkError};

/// Quadrilaterals enclosing less than this many square pixels are degenerate.
const MIN_QUAD_AREA: f64 = 1.0;

/// Relative cross-product magnitude below which three corners count as collinear
/// (roughly 0.06 degrees of turn).
const COLLINEAR_TOLERANCE: f64 = 1e-3;

// -- Raster images --------------------------------------------------------------

/// An 8-bit raster with one (luminance) or three (RGB) channels.
///
/// Row-major, origin top-left. Every Scanwerk operation returns a new
/// `RasterImage` rather than mutating its input.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterImage {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl RasterImage {
    /// Wrap a decoded image. Images without colour information become `Gray`,
    /// everything else is flattened to 8-bit RGB (alpha is dropped).
    pub fn from_dynamic(image: DynamicImage) -> Self {
        if image.color().has_color() {
            Self::Rgb(image.to_rgb8())
        } else {
            Self::Gray(image.to_luma8())
        }
    }

    /// Hand the pixels back to the codec layer.
    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            Self::Gray(gray) => DynamicImage::ImageLuma8(gray),
            Self::Rgb(rgb) => DynamicImage::ImageRgb8(rgb),
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Self::Gray(gray) => gray.width(),
            Self::Rgb(rgb) => rgb.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Gray(gray) => gray.height(),
            Self::Rgb(rgb) => rgb.height(),
        }
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Number of samples per pixel (1 or 3).
    pub fn channels(&self) -> u8 {
        match self {
            Self::Gray(_) => 1,
            Self::Rgb(_) => 3,
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Self::Rgb(_))
    }

    /// True when the image has zero area.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Interleaved samples, row-major.
    pub fn samples(&self) -> &[u8] {
        match self {
            Self::Gray(gray) => gray.as_raw(),
            Self::Rgb(rgb) => rgb.as_raw(),
        }
    }

    /// Mutable interleaved samples, row-major.
    pub fn samples_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Gray(gray) => &mut **gray,
            Self::Rgb(rgb) => &mut **rgb,
        }
    }

    /// Single-channel luminance copy.
    pub fn to_luma8(&self) -> GrayImage {
        match self {
            Self::Gray(gray) => gray.clone(),
            Self::Rgb(rgb) => image::imageops::grayscale(rgb),
        }
    }

    /// Three-channel copy (luminance replicated for `Gray`).
    pub fn to_rgb8(&self) -> RgbImage {
        match self {
            Self::Gray(gray) => DynamicImage::ImageLuma8(gray.clone()).to_rgb8(),
            Self::Rgb(rgb) => rgb.clone(),
        }
    }
}

impl From<GrayImage> for RasterImage {
    fn from(gray: GrayImage) -> Self {
        Self::Gray(gray)
    }
}

impl From<RgbImage> for RasterImage {
    fn from(rgb: RgbImage) -> Self {
        Self::Rgb(rgb)
    }
}

// -- Geometry -------------------------------------------------------------------

/// A sub-pixel image coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Exactly four document corners.
///
/// As produced by detection the order is arbitrary; [`CornerSet::ordered`]
/// rearranges them into top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerSet {
    points: [Point2D; 4],
}

impl CornerSet {
    pub const fn new(points: [Point2D; 4]) -> Self {
        Self { points }
    }

    /// Build a corner set from a slice, which must hold exactly four points.
    pub fn from_slice(points: &[Point2D]) -> Result<Self> {
        let points: [Point2D; 4] = points.try_into().map_err(|_| {
            ScanwerkError::InvalidGeometry(format!("expected 4 corners, got {}", points.len()))
        })?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point2D; 4] {
        &self.points
    }

    /// Reorder into `[top_left, top_right, bottom_right, bottom_left]`.
    ///
    /// Top-left has the smallest `x + y`, bottom-right the largest; top-right
    /// has the smallest `y - x`, bottom-left the largest. Robust to input order
    /// for convex, roughly upright quadrilaterals (rotation under ~45 degrees).
    pub fn ordered(&self) -> CornerSet {
        let sum = |p: &Point2D| p.x + p.y;
        let diff = |p: &Point2D| p.y - p.x;

        let top_left = extreme_by(&self.points, sum, false);
        let bottom_right = extreme_by(&self.points, sum, true);
        let top_right = extreme_by(&self.points, diff, false);
        let bottom_left = extreme_by(&self.points, diff, true);

        CornerSet::new([top_left, top_right, bottom_right, bottom_left])
    }

    /// Order the corners and reject degenerate quadrilaterals (near-zero area
    /// or three collinear corners).
    pub fn validated(&self) -> Result<CornerSet> {
        let ordered = self.ordered();
        let area = ordered.area();
        if !area.is_finite() || area < MIN_QUAD_AREA {
            return Err(ScanwerkError::InvalidGeometry(format!(
                "corner quadrilateral encloses {area:.3} px^2"
            )));
        }

        let pts = ordered.points;
        for i in 0..4 {
            let a = pts[i];
            let b = pts[(i + 1) % 4];
            let c = pts[(i + 2) % 4];
            let (ux, uy) = (b.x - a.x, b.y - a.y);
            let (vx, vy) = (c.x - b.x, c.y - b.y);
            let lengths = (ux.hypot(uy)) * (vx.hypot(vy));
            let cross = ux * vy - uy * vx;
            if lengths <= f64::EPSILON || cross.abs() <= COLLINEAR_TOLERANCE * lengths {
                return Err(ScanwerkError::InvalidGeometry(format!(
                    "corners ({:.1}, {:.1}), ({:.1}, {:.1}), ({:.1}, {:.1}) are collinear",
                    a.x, a.y, b.x, b.y, c.x, c.y
                )));
            }
        }

        Ok(ordered)
    }

    /// Enclosed area in the current point order (shoelace formula).
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        self.points.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    }

    /// Scale every corner independently along each axis.
    pub fn scaled(&self, scale_x: f64, scale_y: f64) -> CornerSet {
        CornerSet::new(
            self.points
                .map(|p| Point2D::new(p.x * scale_x, p.y * scale_y)),
        )
    }
}

/// Absolute area of a simple polygon via the shoelace formula.
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice_area.abs() / 2.0
}

/// First point minimising (or maximising) `key`.
fn extreme_by(points: &[Point2D; 4], key: impl Fn(&Point2D) -> f64, max: bool) -> Point2D {
    let mut best = points[0];
    let mut best_key = key(&points[0]);
    for p in &points[1..] {
        let k = key(p);
        if (max && k > best_key) || (!max && k < best_key) {
            best = *p;
            best_key = k;
        }
    }
    best
}

// -- Paper sizes ----------------------------------------------------------------

/// Standard paper sizes used to give templates a canonical output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in inches. North American sizes are exact; ISO sizes are
    /// converted from millimetres.
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
            Self::Tabloid => (11.0, 17.0),
            _ => {
                let (w, h) = self.dimensions_mm();
                (w as f64 / 25.4, h as f64 / 25.4)
            }
        }
    }

    /// Pixel dimensions at the given resolution (A4 at 300 DPI is 2480x3508).
    pub fn pixels_at(&self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.dimensions_in();
        (
            (w * dpi as f64).round() as u32,
            (h * dpi as f64).round() as u32,
        )
    }
}

impl std::str::FromStr for PaperSize {
    type Err = ScanwerkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "a3" => Ok(Self::A3),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "tabloid" => Ok(Self::Tabloid),
            other => Err(ScanwerkError::InvalidConfig(format!(
                "unknown paper size: {other}"
            ))),
        }
    }
}
