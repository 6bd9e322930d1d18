// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File boundary: image decode/encode, settings loading and corner parsing.
// The processing crates never touch the filesystem; everything that does
// lives here.

use std::path::Path;

use image::ImageError;
use scanwerk_core::error::Result;
use scanwerk_core::{CornerSet, Point2D, RasterImage, ScanConfig, ScanwerkError};
use tracing::{debug, info};

/// Decode any format the `image` crate understands into a raster.
pub fn load_image(path: &Path) -> Result<RasterImage> {
    let decoded = image::open(path).map_err(|e| match e {
        ImageError::IoError(io) => ScanwerkError::Io(io),
        other => ScanwerkError::Decode(format!("{}: {other}", path.display())),
    })?;
    let raster = RasterImage::from_dynamic(decoded);
    debug!(
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        channels = raster.channels(),
        "Image loaded"
    );
    Ok(raster)
}

/// Encode `image` with the format implied by the file extension.
pub fn save_image(image: RasterImage, path: &Path) -> Result<()> {
    let (width, height) = image.dimensions();
    image.into_dynamic().save(path).map_err(|e| match e {
        ImageError::IoError(io) => ScanwerkError::Io(io),
        other => ScanwerkError::Encode(format!("{}: {other}", path.display())),
    })?;
    info!(path = %path.display(), width, height, "Image written");
    Ok(())
}

/// Read and validate a settings file, or fall back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    let Some(path) = path else {
        return Ok(ScanConfig::default());
    };
    let json = std::fs::read_to_string(path)?;
    let config = ScanConfig::from_json(&json)?;
    debug!(path = %path.display(), "Settings loaded");
    Ok(config)
}

/// Parse `x,y,x,y,x,y,x,y` into four corners.
pub fn parse_corners(text: &str) -> Result<CornerSet> {
    let values = text
        .split(',')
        .map(|v| {
            let v = v.trim();
            v.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| ScanwerkError::InvalidGeometry(format!("not a coordinate: '{v}'")))
        })
        .collect::<Result<Vec<f64>>>()?;

    if values.len() != 8 {
        return Err(ScanwerkError::InvalidGeometry(format!(
            "expected 8 numbers (four x,y pairs), got {}",
            values.len()
        )));
    }
    let points: Vec<Point2D> = values
        .chunks_exact(2)
        .map(|xy| Point2D::new(xy[0], xy[1]))
        .collect();
    CornerSet::from_slice(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn parse_corners_reads_four_pairs() {
        let corners = parse_corners("10, 20,110,20, 110,70,10,70").expect("valid");
        assert_eq!(corners.points()[0], Point2D::new(10.0, 20.0));
        assert_eq!(corners.points()[2], Point2D::new(110.0, 70.0));
    }

    #[test]
    fn parse_corners_rejects_bad_input() {
        assert!(matches!(
            parse_corners("1,2,3,4,5,6"),
            Err(ScanwerkError::InvalidGeometry(_))
        ));
        assert!(matches!(
            parse_corners("1,2,3,4,5,6,7,x"),
            Err(ScanwerkError::InvalidGeometry(_))
        ));
        assert!(parse_corners("1,2,3,4,5,6,7,NaN").is_err());
    }

    #[test]
    fn missing_config_path_means_defaults() {
        assert_eq!(load_config(None).expect("defaults"), ScanConfig::default());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "trim": { "padding": 3 } }"#).expect("write");

        let config = load_config(Some(&path)).expect("valid settings");
        assert_eq!(config.trim.padding, 3);
        assert_eq!(config.detector, ScanConfig::default().detector);
    }

    #[test]
    fn unreadable_config_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.json");
        assert!(matches!(load_config(Some(&missing)), Err(ScanwerkError::Io(_))));
    }

    #[test]
    fn png_round_trip_keeps_channels() {
        let dir = tempfile::tempdir().expect("tempdir");

        let gray_path = dir.path().join("gray.png");
        let gray = RasterImage::Gray(GrayImage::from_pixel(7, 5, Luma([90])));
        save_image(gray.clone(), &gray_path).expect("encode");
        assert_eq!(load_image(&gray_path).expect("decode"), gray);

        let rgb_path = dir.path().join("rgb.png");
        let rgb = RasterImage::Rgb(RgbImage::from_pixel(4, 3, Rgb([1, 2, 3])));
        save_image(rgb.clone(), &rgb_path).expect("encode");
        assert_eq!(load_image(&rgb_path).expect("decode"), rgb);
    }

    #[test]
    fn garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").expect("write");
        assert!(matches!(load_image(&path), Err(ScanwerkError::Decode(_))));
    }

    #[test]
    fn unknown_extension_is_encode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.unknownext");
        let img = RasterImage::Gray(GrayImage::new(2, 2));
        assert!(matches!(save_image(img, &path), Err(ScanwerkError::Encode(_))));
    }
}
