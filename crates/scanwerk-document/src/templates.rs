// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document templates — fixed processing presets for common document kinds.

use serde::{Deserialize, Serialize};
use scanwerk_core::error::Result;
use scanwerk_core::{CornerSet, RasterImage, ScanwerkError};
use tracing::{debug, instrument};

use crate::enhance::tone;
use crate::image::processor::ImageProcessor;
use crate::scan::rectify::rectify;

/// How a template renders colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Color,
    Grayscale,
    BlackWhite,
}

/// Binarization used by [`ColorMode::BlackWhite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Local mean over an 11x11 window minus 2.
    Adaptive,
    Otsu,
}

/// The parameter set behind a [`DocumentTemplate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemplateSettings {
    pub display_name: &'static str,
    /// Output size (width, height) in pixels.
    pub size: (u32, u32),
    pub color_mode: ColorMode,
    pub threshold_method: ThresholdMethod,
    /// CLAHE clip limit for local contrast.
    pub clip_limit: f32,
    pub sharpen_strength: Option<f32>,
    pub denoise: bool,
    /// Offset added after the contrast gain, -100..=100.
    pub brightness: i32,
    /// Contrast gain in percent, -100..=100.
    pub contrast: i32,
}

/// Adaptive threshold window radius (11x11 window).
const ADAPTIVE_BLOCK_RADIUS: u32 = 5;
const ADAPTIVE_OFFSET: i32 = 2;
const LOCAL_CONTRAST_GRID: u32 = 8;
const DENOISE_RADIUS: u32 = 1;

const RECEIPT: TemplateSettings = TemplateSettings {
    display_name: "Receipt",
    size: (800, 1200),
    color_mode: ColorMode::BlackWhite,
    threshold_method: ThresholdMethod::Adaptive,
    clip_limit: 3.0,
    sharpen_strength: Some(1.2),
    denoise: true,
    brightness: 10,
    contrast: 15,
};

const BUSINESS_CARD: TemplateSettings = TemplateSettings {
    display_name: "Business Card",
    size: (1050, 600),
    color_mode: ColorMode::Color,
    threshold_method: ThresholdMethod::Adaptive,
    clip_limit: 2.0,
    sharpen_strength: Some(1.5),
    denoise: true,
    brightness: 5,
    contrast: 10,
};

const ID_CARD: TemplateSettings = TemplateSettings {
    display_name: "ID Card",
    size: (1280, 810),
    color_mode: ColorMode::Color,
    threshold_method: ThresholdMethod::Adaptive,
    clip_limit: 2.5,
    sharpen_strength: Some(1.3),
    denoise: true,
    brightness: 0,
    contrast: 10,
};

// A4 at 300 DPI.
const TEXT_DOCUMENT: TemplateSettings = TemplateSettings {
    display_name: "Text Document",
    size: (2480, 3508),
    color_mode: ColorMode::BlackWhite,
    threshold_method: ThresholdMethod::Adaptive,
    clip_limit: 2.5,
    sharpen_strength: None,
    denoise: true,
    brightness: 15,
    contrast: 20,
};

const PHOTO_DOCUMENT: TemplateSettings = TemplateSettings {
    display_name: "Photo Document",
    size: (2480, 3508),
    color_mode: ColorMode::Color,
    threshold_method: ThresholdMethod::Adaptive,
    clip_limit: 1.5,
    sharpen_strength: Some(0.8),
    denoise: true,
    brightness: 0,
    contrast: 5,
};

const WHITEBOARD: TemplateSettings = TemplateSettings {
    display_name: "Whiteboard",
    size: (1920, 1080),
    color_mode: ColorMode::BlackWhite,
    threshold_method: ThresholdMethod::Adaptive,
    clip_limit: 3.5,
    sharpen_strength: Some(1.5),
    denoise: true,
    brightness: 20,
    contrast: 30,
};

// 5.5" x 8.5" at 300 DPI.
const BOOK_PAGE: TemplateSettings = TemplateSettings {
    display_name: "Book Page",
    size: (1654, 2339),
    color_mode: ColorMode::BlackWhite,
    threshold_method: ThresholdMethod::Adaptive,
    clip_limit: 2.0,
    sharpen_strength: None,
    denoise: true,
    brightness: 10,
    contrast: 15,
};

const INVOICE: TemplateSettings = TemplateSettings {
    display_name: "Invoice",
    size: (2480, 3508),
    color_mode: ColorMode::BlackWhite,
    threshold_method: ThresholdMethod::Otsu,
    clip_limit: 2.5,
    sharpen_strength: Some(1.0),
    denoise: true,
    brightness: 12,
    contrast: 18,
};

// Letter at 300 DPI.
const MAGAZINE: TemplateSettings = TemplateSettings {
    display_name: "Magazine",
    size: (2550, 3300),
    color_mode: ColorMode::Color,
    threshold_method: ThresholdMethod::Adaptive,
    clip_limit: 1.8,
    sharpen_strength: Some(1.0),
    denoise: true,
    brightness: 0,
    contrast: 8,
};

const PASSPORT: TemplateSettings = TemplateSettings {
    display_name: "Passport",
    size: (1398, 1960),
    color_mode: ColorMode::Color,
    threshold_method: ThresholdMethod::Adaptive,
    clip_limit: 2.0,
    sharpen_strength: Some(1.2),
    denoise: true,
    brightness: 5,
    contrast: 10,
};

/// Named processing presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentTemplate {
    Receipt,
    BusinessCard,
    IdCard,
    TextDocument,
    PhotoDocument,
    Whiteboard,
    BookPage,
    Invoice,
    Magazine,
    Passport,
}

impl DocumentTemplate {
    pub const ALL: [DocumentTemplate; 10] = [
        Self::Receipt,
        Self::BusinessCard,
        Self::IdCard,
        Self::TextDocument,
        Self::PhotoDocument,
        Self::Whiteboard,
        Self::BookPage,
        Self::Invoice,
        Self::Magazine,
        Self::Passport,
    ];

    /// Lookup key, e.g. `"business_card"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::BusinessCard => "business_card",
            Self::IdCard => "id_card",
            Self::TextDocument => "text_document",
            Self::PhotoDocument => "photo_document",
            Self::Whiteboard => "whiteboard",
            Self::BookPage => "book_page",
            Self::Invoice => "invoice",
            Self::Magazine => "magazine",
            Self::Passport => "passport",
        }
    }

    pub fn settings(&self) -> &'static TemplateSettings {
        match self {
            Self::Receipt => &RECEIPT,
            Self::BusinessCard => &BUSINESS_CARD,
            Self::IdCard => &ID_CARD,
            Self::TextDocument => &TEXT_DOCUMENT,
            Self::PhotoDocument => &PHOTO_DOCUMENT,
            Self::Whiteboard => &WHITEBOARD,
            Self::BookPage => &BOOK_PAGE,
            Self::Invoice => &INVOICE,
            Self::Magazine => &MAGAZINE,
            Self::Passport => &PASSPORT,
        }
    }

    /// Resize to the template size, then apply colour mode, local contrast,
    /// sharpening, denoising and brightness/contrast in that order.
    #[instrument(skip(image), fields(template = self.name()))]
    pub fn apply(&self, image: &RasterImage) -> RasterImage {
        if image.is_empty() {
            return image.clone();
        }
        let s = self.settings();
        let (w, h) = s.size;

        let mut processor = ImageProcessor::from_raster(image.clone());
        if processor.as_raster().dimensions() != (w, h) {
            processor = processor.resize_exact(w, h);
        }
        processor = match (s.color_mode, s.threshold_method) {
            (ColorMode::Color, _) => processor,
            (ColorMode::Grayscale, _) => processor.grayscale(),
            (ColorMode::BlackWhite, ThresholdMethod::Adaptive) => {
                processor.binarize(ADAPTIVE_BLOCK_RADIUS, ADAPTIVE_OFFSET)
            }
            (ColorMode::BlackWhite, ThresholdMethod::Otsu) => processor.binarize_otsu(),
        };

        let mut result = tone::equalize_local(&processor.into_raster(), s.clip_limit, LOCAL_CONTRAST_GRID);
        if let Some(strength) = s.sharpen_strength {
            result = tone::sharpen(&result, strength);
        }

        let mut processor = ImageProcessor::from_raster(result);
        if s.denoise {
            processor = processor.median_denoise(DENOISE_RADIUS);
        }
        debug!(brightness = s.brightness, contrast = s.contrast, "Final adjustment");
        processor
            .adjust_brightness_contrast(s.brightness, s.contrast)
            .into_raster()
    }

    /// Rectify straight to the template size and apply the template.
    ///
    /// # Errors
    ///
    /// [`ScanwerkError::InvalidGeometry`] for degenerate corners.
    pub fn rectify_to_template(&self, image: &RasterImage, corners: &CornerSet) -> Result<RasterImage> {
        let warped = rectify(image, corners, Some(self.settings().size))?;
        Ok(self.apply(&warped))
    }
}

impl std::fmt::Display for DocumentTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DocumentTemplate {
    type Err = ScanwerkError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|t| t.name() == key)
            .ok_or_else(|| ScanwerkError::UnknownTemplate(s.to_string()))
    }
}
