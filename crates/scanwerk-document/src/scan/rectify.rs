// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — warp a document quadrilateral to a top-down
// rectangle.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use scanwerk_core::error::Result;
use scanwerk_core::{CornerSet, Point2D, RasterImage, ScanwerkError};
use tracing::{debug, info, instrument, warn};

use super::homography::{homography_from_points, to_row_major_f32};

/// Output size implied by the ordered corners: the longer of each pair of
/// opposite edges, truncated to whole pixels.
pub fn target_size(ordered: &CornerSet) -> (u32, u32) {
    let [tl, tr, br, bl] = *ordered.points();
    let width = (br.distance(&bl) as u32).max(tr.distance(&tl) as u32);
    let height = (tr.distance(&br) as u32).max(tl.distance(&bl) as u32);
    (width, height)
}

/// Warp the region outlined by `corners` to an upright rectangle.
///
/// Corners may be given in any order. The output is `output_size` when set,
/// otherwise [`target_size`]. Pixels that map outside the source are black.
///
/// # Errors
///
/// [`ScanwerkError::InvalidGeometry`] when the corners are degenerate, the
/// homography is singular or the target size is zero.
#[instrument(skip(image, corners), fields(width = image.width(), height = image.height()))]
pub fn rectify(
    image: &RasterImage,
    corners: &CornerSet,
    output_size: Option<(u32, u32)>,
) -> Result<RasterImage> {
    let ordered = corners.validated()?;
    let (out_w, out_h) = output_size.unwrap_or_else(|| target_size(&ordered));
    if out_w == 0 || out_h == 0 {
        return Err(ScanwerkError::InvalidGeometry(format!(
            "target size {out_w}x{out_h} is empty"
        )));
    }

    let (max_x, max_y) = ((out_w - 1) as f64, (out_h - 1) as f64);
    let dst = [
        Point2D::new(0.0, 0.0),
        Point2D::new(max_x, 0.0),
        Point2D::new(max_x, max_y),
        Point2D::new(0.0, max_y),
    ];

    // A 1x1 target collapses every destination corner onto the origin; warp
    // with a plain translation instead.
    let matrix = if out_w == 1 || out_h == 1 {
        let tl = ordered.points()[0];
        [1.0, 0.0, -tl.x as f32, 0.0, 1.0, -tl.y as f32, 0.0, 0.0, 1.0]
    } else {
        let h = homography_from_points(ordered.points(), &dst).ok_or_else(|| {
            warn!("Homography is singular");
            ScanwerkError::InvalidGeometry("corner homography is singular".into())
        })?;
        to_row_major_f32(&h)
    };
    debug!(?matrix, "Homography computed");

    let projection = Projection::from_matrix(matrix).ok_or_else(|| {
        ScanwerkError::InvalidGeometry("corner homography is not invertible".into())
    })?;

    let warped = match image {
        RasterImage::Gray(gray) => {
            let mut out = GrayImage::new(out_w, out_h);
            warp_into(gray, &projection, Interpolation::Bilinear, Luma([0]), &mut out);
            RasterImage::Gray(out)
        }
        RasterImage::Rgb(rgb) => {
            let mut out = RgbImage::new(out_w, out_h);
            warp_into(rgb, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
            RasterImage::Rgb(out)
        }
    };

    info!(out_w, out_h, "Perspective rectification applied");
    Ok(warped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    fn corners(points: [(f64, f64); 4]) -> CornerSet {
        CornerSet::new(points.map(Point2D::from))
    }

    fn bright_fraction(image: &RasterImage) -> f64 {
        let samples = image.samples();
        samples.iter().filter(|&&v| v > 200).count() as f64 / samples.len() as f64
    }

    #[test]
    fn size_uses_longer_opposite_edges() {
        let quad = corners([(0.0, 0.0), (100.5, 0.0), (110.0, 50.0), (0.0, 40.0)]).ordered();
        let (w, h) = target_size(&quad);
        assert_eq!(w, 110);
        assert_eq!(h, 50);
    }

    #[test]
    fn axis_aligned_rectangle_is_cropped_out() {
        let mut img = GrayImage::new(800, 600);
        draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(600, 400), Luma([255]));
        let quad = corners([(699.0, 499.0), (100.0, 100.0), (100.0, 499.0), (699.0, 100.0)]);

        let out = rectify(&RasterImage::Gray(img), &quad, None).expect("valid quad");
        assert_eq!(out.dimensions(), (599, 399));
        assert!(bright_fraction(&out) > 0.99);
    }

    #[test]
    fn perspective_quad_becomes_rectangle() {
        let mut img = RgbImage::new(800, 600);
        let poly = [
            Point::new(150, 90),
            Point::new(660, 130),
            Point::new(620, 520),
            Point::new(120, 480),
        ];
        draw_polygon_mut(&mut img, &poly, Rgb([250, 250, 250]));
        let quad = corners([(150.0, 90.0), (660.0, 130.0), (620.0, 520.0), (120.0, 480.0)]);

        let out = rectify(&RasterImage::Rgb(img), &quad, None).expect("valid quad");
        assert!(out.is_color());
        assert!(bright_fraction(&out) > 0.95);
    }

    #[test]
    fn explicit_size_overrides() {
        let img = RasterImage::Gray(GrayImage::from_pixel(200, 200, Luma([90])));
        let quad = corners([(10.0, 10.0), (190.0, 10.0), (190.0, 190.0), (10.0, 190.0)]);
        let out = rectify(&img, &quad, Some((50, 70))).expect("valid quad");
        assert_eq!(out.dimensions(), (50, 70));
    }

    #[test]
    fn outside_source_is_black() {
        let img = RasterImage::Gray(GrayImage::from_pixel(100, 100, Luma([255])));
        // Corners extend well past the right edge of the image.
        let quad = corners([(0.0, 0.0), (300.0, 0.0), (300.0, 99.0), (0.0, 99.0)]);
        let out = rectify(&img, &quad, None).expect("valid quad");
        let RasterImage::Gray(out) = out else {
            panic!("gray in, gray out");
        };
        assert_eq!(out.get_pixel(250, 50).0[0], 0);
        assert_eq!(out.get_pixel(20, 50).0[0], 255);
    }

    #[test]
    fn collinear_corners_are_rejected() {
        let img = RasterImage::Gray(GrayImage::new(100, 100));
        let quad = corners([(0.0, 0.0), (50.0, 50.0), (99.0, 99.0), (0.0, 99.0)]);
        assert!(matches!(
            rectify(&img, &quad, None),
            Err(ScanwerkError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn zero_output_size_is_rejected() {
        let img = RasterImage::Gray(GrayImage::new(100, 100));
        let quad = corners([(0.0, 0.0), (99.0, 0.0), (99.0, 99.0), (0.0, 99.0)]);
        assert!(rectify(&img, &quad, Some((0, 10))).is_err());
    }
}
