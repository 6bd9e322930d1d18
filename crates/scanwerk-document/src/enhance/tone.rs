// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tone normalization: gray-world white balance, CLAHE, percentile contrast
// stretch and unsharp sharpening. All functions are pure and infallible;
// zero-area images come back unchanged.

use image::{GrayImage, Luma, Rgb, RgbImage};
use scanwerk_core::RasterImage;
use tracing::{debug, instrument};

use super::color::{Lab, lab_to_srgb, srgb_to_lab};

/// Scale each channel so the three channel means meet at their average.
#[instrument(skip(image))]
pub fn white_balance(image: &RasterImage) -> RasterImage {
    let RasterImage::Rgb(rgb) = image else {
        return image.clone();
    };
    if image.is_empty() {
        return image.clone();
    }

    let mut sums = [0u64; 3];
    for p in rgb.pixels() {
        for c in 0..3 {
            sums[c] += p.0[c] as u64;
        }
    }
    let count = rgb.width() as f64 * rgb.height() as f64;
    let means = sums.map(|s| s as f64 / count);
    let gray = means.iter().sum::<f64>() / 3.0;
    let gains = means.map(|m| if m > 0.0 { gray / m } else { 1.0 });
    debug!(?means, ?gains, "Gray-world gains");

    let mut out = rgb.clone();
    for p in out.pixels_mut() {
        for c in 0..3 {
            p.0[c] = (p.0[c] as f64 * gains[c]).clamp(0.0, 255.0) as u8;
        }
    }
    RasterImage::Rgb(out)
}

/// Contrast-limited adaptive histogram equalization.
///
/// Colour images are equalized on Lab lightness only; chroma is kept. Gray
/// images are equalized directly. `tile_grid` is the number of tiles per side.
#[instrument(skip(image))]
pub fn equalize_local(image: &RasterImage, clip_limit: f32, tile_grid: u32) -> RasterImage {
    if image.is_empty() || tile_grid == 0 {
        return image.clone();
    }
    match image {
        RasterImage::Gray(gray) => RasterImage::Gray(clahe(gray, tile_grid, clip_limit)),
        RasterImage::Rgb(rgb) => {
            let (w, h) = rgb.dimensions();
            let labs: Vec<Lab> = rgb.pixels().map(|p| srgb_to_lab(p.0)).collect();
            let lightness = GrayImage::from_fn(w, h, |x, y| {
                let l = labs[(y * w + x) as usize].l;
                Luma([(l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8])
            });
            let equalized = clahe(&lightness, tile_grid, clip_limit);

            let out = RgbImage::from_fn(w, h, |x, y| {
                let lab = labs[(y * w + x) as usize];
                let l = equalized.get_pixel(x, y).0[0] as f32 * 100.0 / 255.0;
                Rgb(lab_to_srgb(Lab { l, ..lab }))
            });
            RasterImage::Rgb(out)
        }
    }
}

/// Lift shadows and uneven lighting with CLAHE (clip 3.0, 8x8 tiles).
pub fn remove_shadows(image: &RasterImage) -> RasterImage {
    equalize_local(image, 3.0, 8)
}

/// Per-channel percentile stretch.
///
/// The darkest and brightest `clip_percent` of samples saturate; the range in
/// between is mapped linearly onto 0..=255. Channels whose clipped range is
/// empty are left alone.
#[instrument(skip(image))]
pub fn auto_contrast(image: &RasterImage, clip_percent: f64) -> RasterImage {
    if image.is_empty() {
        return image.clone();
    }
    let channels = image.channels() as usize;
    let mut out = image.clone();
    let samples = out.samples_mut();

    for c in 0..channels {
        let mut hist = [0u64; 256];
        for px in samples.chunks_exact(channels) {
            hist[px[c] as usize] += 1;
        }
        let Some((low, high)) = clip_range(&hist, clip_percent) else {
            continue;
        };
        let scale = 255.0 / (high - low) as f32;
        debug!(channel = c, low, high, "Contrast stretch");
        for px in samples.chunks_exact_mut(channels) {
            let v = (px[c] as f32 - low as f32) * scale;
            px[c] = v.clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// First histogram values whose cumulative share reaches `clip%` and
/// `100 - clip%`. `None` when they do not form a proper range.
fn clip_range(hist: &[u64; 256], clip_percent: f64) -> Option<(usize, usize)> {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return None;
    }
    let low_share = clip_percent / 100.0;
    let high_share = 1.0 - clip_percent / 100.0;

    let mut cumulative = 0u64;
    let mut low = None;
    let mut high = None;
    for (value, &count) in hist.iter().enumerate() {
        cumulative += count;
        let share = cumulative as f64 / total as f64;
        if low.is_none() && share >= low_share {
            low = Some(value);
        }
        if high.is_none() && share >= high_share {
            high = Some(value);
            break;
        }
    }
    let (low, high) = (low?, high.unwrap_or(255));
    (high > low).then_some((low, high))
}

/// 3x3 sharpen: centre `1 + 4s`, edge neighbours `-s`, corners zero.
/// Borders replicate the nearest pixel.
#[instrument(skip(image))]
pub fn sharpen(image: &RasterImage, strength: f32) -> RasterImage {
    if image.is_empty() || strength == 0.0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let channels = image.channels() as usize;
    let src = image.samples();
    let mut out = image.clone();
    let dst = out.samples_mut();

    let at = |x: i64, y: i64, c: usize| -> f32 {
        let x = x.clamp(0, w as i64 - 1) as usize;
        let y = y.clamp(0, h as i64 - 1) as usize;
        src[(y * w as usize + x) * channels + c] as f32
    };

    for y in 0..h as i64 {
        for x in 0..w as i64 {
            for c in 0..channels {
                let centre = at(x, y, c);
                let ring = at(x - 1, y, c) + at(x + 1, y, c) + at(x, y - 1, c) + at(x, y + 1, c);
                let v = (1.0 + 4.0 * strength) * centre - strength * ring;
                dst[(y as usize * w as usize + x as usize) * channels + c] =
                    v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

// -- CLAHE ----------------------------------------------------------------------

/// Equalize with one clipped histogram per tile and bilinear blending of the
/// neighbouring tile mappings.
fn clahe(gray: &GrayImage, tiles: u32, clip_limit: f32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let tiles = tiles as usize;
    let (w, h) = (w as usize, h as usize);
    let tile_w = w / tiles;
    let tile_h = h / tiles;
    if tile_w == 0 || tile_h == 0 {
        return gray.clone();
    }
    let src = gray.as_raw();

    let mut maps = vec![[0u8; 256]; tiles * tiles];
    for ty in 0..tiles {
        for tx in 0..tiles {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = if tx == tiles - 1 { w } else { x0 + tile_w };
            let y1 = if ty == tiles - 1 { h } else { y0 + tile_h };
            let tile_pixels = ((x1 - x0) * (y1 - y0)) as u32;

            let mut hist = [0u32; 256];
            for row in y0..y1 {
                for &v in &src[row * w + x0..row * w + x1] {
                    hist[v as usize] += 1;
                }
            }

            // Clip and hand the excess back evenly; the remainder goes to
            // bins spaced across the whole range, not the darkest ones.
            let clip = ((clip_limit * tile_pixels as f32 / 256.0) as u32).max(1);
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let per_bin = excess / 256;
            hist.iter_mut().for_each(|bin| *bin += per_bin);
            let remainder = (excess % 256) as usize;
            if remainder > 0 {
                let spacing = (256 / remainder).max(1);
                for bin in hist.iter_mut().step_by(spacing).take(remainder) {
                    *bin += 1;
                }
            }

            let scale = 255.0 / tile_pixels as f32;
            let map = &mut maps[ty * tiles + tx];
            let mut cdf = 0u32;
            for (i, &count) in hist.iter().enumerate() {
                cdf += count;
                map[i] = (cdf as f32 * scale).round().min(255.0) as u8;
            }
        }
    }

    let mut out = GrayImage::new(w as u32, h as u32);
    let last = tiles as i64 - 1;
    let samples: &mut [u8] = &mut out;
    for (idx, dst) in samples.iter_mut().enumerate() {
        let (x, y) = (idx % w, idx / w);
        let v = src[idx] as usize;

        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let tx0 = (fx.floor() as i64).clamp(0, last) as usize;
        let tx1 = (fx.floor() as i64 + 1).clamp(0, last) as usize;
        let ty0 = (fy.floor() as i64).clamp(0, last) as usize;
        let ty1 = (fy.floor() as i64 + 1).clamp(0, last) as usize;
        let ax = fx - fx.floor();
        let ay = fy - fy.floor();

        let top = maps[ty0 * tiles + tx0][v] as f32 * (1.0 - ax) + maps[ty0 * tiles + tx1][v] as f32 * ax;
        let bottom = maps[ty1 * tiles + tx0][v] as f32 * (1.0 - ax) + maps[ty1 * tiles + tx1][v] as f32 * ax;
        *dst = (top * (1.0 - ay) + bottom * ay).round().clamp(0.0, 255.0) as u8;
    }
    out
}
