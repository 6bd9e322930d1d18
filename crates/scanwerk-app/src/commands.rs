// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers. Each one loads its input, runs the processing crate
// and writes the result; stdout carries machine-readable output only.

use std::path::Path;

use scanwerk_core::error::Result;
use scanwerk_core::{CornerSet, Point2D, RasterImage, ScanConfig, ScanwerkError};
use scanwerk_document::{DocumentTemplate, ScanPipeline, ScannerSession};
use serde::Serialize;
use tracing::info;

use crate::files;

/// Detection result as printed by `scanwerk detect`.
#[derive(Debug, Serialize)]
struct DetectReport {
    width: u32,
    height: u32,
    /// Top-left, top-right, bottom-right, bottom-left.
    corners: [Point2D; 4],
    area: f64,
}

impl DetectReport {
    fn new(image: &RasterImage, corners: &CornerSet) -> Self {
        let ordered = corners.ordered();
        Self {
            width: image.width(),
            height: image.height(),
            corners: *ordered.points(),
            area: ordered.area(),
        }
    }
}

pub fn detect(config: &ScanConfig, input: &Path, preview: Option<&Path>) -> Result<()> {
    let mut session = ScannerSession::new(config.detector.clone());
    session.set_image(files::load_image(input)?);

    let found = session.detect();
    // A preview of a failed detection is still useful: it shows the bare photo.
    if let Some(path) = preview {
        files::save_image(session.preview()?, path)?;
    }
    let corners = found?;

    let image = session.original_image().ok_or(ScanwerkError::NoImage)?;
    let report = DetectReport::new(image, &corners);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn scan(
    config: &ScanConfig,
    input: &Path,
    output: &Path,
    corners: Option<&str>,
    template: Option<&str>,
    enhance: bool,
) -> Result<()> {
    let manual = corners.map(files::parse_corners).transpose()?;
    let template = template.map(str::parse::<DocumentTemplate>).transpose()?;

    let mut session = ScannerSession::new(config.detector.clone());
    session.set_image(files::load_image(input)?);

    let mut result = match template {
        Some(template) => {
            let corners = match manual {
                Some(corners) => corners,
                None => session.detect()?,
            };
            let image = session.original_image().ok_or(ScanwerkError::NoImage)?;
            info!(template = template.name(), "Applying template");
            template.rectify_to_template(image, &corners)?
        }
        None => session.scan(manual.as_ref())?,
    };

    if enhance {
        result = ScanPipeline::new(config.clone()).enhance(&result);
    }
    files::save_image(result, output)
}

pub fn enhance(config: &ScanConfig, input: &Path, output: &Path) -> Result<()> {
    let image = files::load_image(input)?;
    let enhanced = ScanPipeline::new(config.clone()).enhance(&image);
    files::save_image(enhanced, output)
}

pub fn deskew(config: &ScanConfig, input: &Path, output: &Path) -> Result<()> {
    let image = files::load_image(input)?;
    let pipeline = ScanPipeline::new(config.clone());
    let (straight, angle) = pipeline.skew_estimator().deskew(&image);
    println!("{angle:.2}");
    files::save_image(straight, output)
}

pub fn templates() -> Result<()> {
    for template in DocumentTemplate::ALL {
        let s = template.settings();
        println!(
            "{:<16} {:<18} {}x{}",
            template.name(),
            s.display_name,
            s.size.0,
            s.size.1
        );
    }
    Ok(())
}
