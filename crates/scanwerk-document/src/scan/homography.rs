// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Four-point homography estimation.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use scanwerk_core::Point2D;

const EPS: f64 = 1e-12;

/// Projective transform mapping the four `src` points exactly onto `dst`.
///
/// Solves the 8x8 direct linear system with `h33 = 1`. Returns `None` when the
/// system is singular (three collinear points on either side) or the result
/// is not finite.
pub fn homography_from_points(src: &[Point2D; 4], dst: &[Point2D; 4]) -> Option<Matrix3<f64>> {
    if has_collinear_triple(src) || has_collinear_triple(dst) {
        return None;
    }

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        let r = 2 * i;
        a[(r, 0)] = s.x;
        a[(r, 1)] = s.y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -d.x * s.x;
        a[(r, 7)] = -d.x * s.y;
        b[r] = d.x;

        a[(r + 1, 3)] = s.x;
        a[(r + 1, 4)] = s.y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -d.y * s.x;
        a[(r + 1, 7)] = -d.y * s.y;
        b[r + 1] = d.y;
    }

    let h = a.lu().solve(&b)?;
    if h.iter().any(|v| !v.is_finite()) {
        return None;
    }

    Some(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0))
}

fn has_collinear_triple(points: &[Point2D; 4]) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    TRIPLES.iter().any(|&(i, j, k)| {
        let (a, b, c) = (points[i], points[j], points[k]);
        let (ux, uy) = (b.x - a.x, b.y - a.y);
        let (vx, vy) = (c.x - a.x, c.y - a.y);
        let scale = ux.hypot(uy) * vx.hypot(vy);
        scale <= EPS || (ux * vy - uy * vx).abs() <= 1e-9 * scale
    })
}

/// Map a point through `h`; `None` if it lands on the line at infinity.
pub fn apply_homography(h: &Matrix3<f64>, p: Point2D) -> Option<Point2D> {
    let v = h * Vector3::new(p.x, p.y, 1.0);
    let w = v[2];
    if !w.is_finite() || w.abs() <= EPS {
        return None;
    }
    Some(Point2D::new(v[0] / w, v[1] / w))
}

/// Row-major `f32` copy, the layout `imageproc` projections are built from.
pub fn to_row_major_f32(h: &Matrix3<f64>) -> [f32; 9] {
    let mut out = [0.0f32; 9];
    for r in 0..3 {
        for c in 0..3 {
            out[r * 3 + c] = h[(r, c)] as f32;
        }
    }
    out
}
