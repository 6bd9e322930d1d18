// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the scanwerk-document crate: outline detection,
// rectification and skew estimation on synthetic pages.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use scanwerk_core::RasterImage;
use scanwerk_document::{EdgeContourDetector, SkewEstimator, rectify, rotate_expand};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 800x600 photo: light page on a dark table.
fn page_photo() -> RasterImage {
    let mut img = RgbImage::from_pixel(800, 600, Rgb([35, 30, 30]));
    draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(600, 400), Rgb([240, 238, 230]));
    RasterImage::Rgb(img)
}

/// 600x800 ruled page tilted by two degrees.
fn tilted_text() -> RasterImage {
    let mut img = GrayImage::from_pixel(600, 800, Luma([250]));
    let mut y = 40;
    while y + 5 < 760 {
        draw_filled_rect_mut(&mut img, Rect::at(60, y).of_size(480, 5), Luma([20]));
        y += 24;
    }
    rotate_expand(&RasterImage::Gray(img), -2.0)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_detection(c: &mut Criterion) {
    let photo = page_photo();
    let detector = EdgeContourDetector::default();

    c.bench_function("detect (800x600)", |b| {
        b.iter(|| black_box(detector.detect(black_box(&photo))));
    });
}

fn bench_rectify(c: &mut Criterion) {
    let photo = page_photo();
    let corners = EdgeContourDetector::default()
        .detect(&photo)
        .expect("fixture page is detectable");

    c.bench_function("rectify (600x400 out)", |b| {
        b.iter(|| black_box(rectify(black_box(&photo), &corners, None)));
    });
}

fn bench_deskew(c: &mut Criterion) {
    let page = tilted_text();
    let estimator = SkewEstimator::default();

    c.bench_function("estimate_angle (ruled page)", |b| {
        b.iter(|| black_box(estimator.estimate_angle(black_box(&page))));
    });
}

criterion_group!(benches, bench_detection, bench_rectify, bench_deskew);
criterion_main!(benches);
