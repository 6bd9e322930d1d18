// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon helpers for contour simplification.

use scanwerk_core::Point2D;

/// Length of the closed polyline through `points`.
pub fn closed_perimeter(points: &[Point2D]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.distance(b))
        .sum()
}

/// Simplify a closed contour with the Douglas-Peucker algorithm.
///
/// The contour is split at two mutually distant vertices, each half is
/// simplified as an open chain with tolerance `epsilon`, and the joined ring
/// is swept once more to drop vertices lying within `epsilon` of the line
/// through their neighbours.
pub fn approximate_closed_polygon(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let first = farthest_from(points, points[0]);
    let second = farthest_from(points, points[first]);
    if first == second {
        return vec![points[first]];
    }

    let forward = cyclic_chain(points, first, second);
    let backward = cyclic_chain(points, second, first);

    let mut ring = simplify_open_chain(&forward, epsilon);
    ring.pop();
    let mut tail = simplify_open_chain(&backward, epsilon);
    tail.pop();
    ring.extend(tail);

    drop_collinear_vertices(ring, epsilon)
}

/// Index of the point farthest from `origin` (first on ties).
fn farthest_from(points: &[Point2D], origin: Point2D) -> usize {
    let mut best = 0;
    let mut best_dist = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance(&origin);
        if d > best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// Points from `start` to `end` inclusive, walking forward with wrap-around.
fn cyclic_chain(points: &[Point2D], start: usize, end: usize) -> Vec<Point2D> {
    let n = points.len();
    let len = (end + n - start) % n + 1;
    (0..len).map(|k| points[(start + k) % n]).collect()
}

/// Classic open-chain Douglas-Peucker. Both endpoints are always kept.
fn simplify_open_chain(chain: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    let n = chain.len();
    if n <= 2 {
        return chain.to_vec();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let mut split = lo;
        let mut max_dist = -1.0;
        for i in lo + 1..hi {
            let d = distance_to_line(chain[i], chain[lo], chain[hi]);
            if d > max_dist {
                max_dist = d;
                split = i;
            }
        }
        if max_dist > epsilon {
            keep[split] = true;
            stack.push((lo, split));
            stack.push((split, hi));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

fn drop_collinear_vertices(mut ring: Vec<Point2D>, epsilon: f64) -> Vec<Point2D> {
    let mut changed = true;
    while changed && ring.len() > 3 {
        changed = false;
        let n = ring.len();
        for i in 0..n {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            if distance_to_line(ring[i], prev, next) <= epsilon {
                ring.remove(i);
                changed = true;
                break;
            }
        }
    }
    ring
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`
/// (plain distance to `a` when the two coincide).
fn distance_to_line(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = dx.hypot(dy);
    if len <= f64::EPSILON {
        return p.distance(&a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Boundary of an axis-aligned rectangle sampled every pixel, clockwise.
    fn rectangle_outline(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point2D> {
        let mut pts = Vec::new();
        for x in x0..x1 {
            pts.push(Point2D::new(x as f64, y0 as f64));
        }
        for y in y0..y1 {
            pts.push(Point2D::new(x1 as f64, y as f64));
        }
        for x in (x0 + 1..=x1).rev() {
            pts.push(Point2D::new(x as f64, y1 as f64));
        }
        for y in (y0 + 1..=y1).rev() {
            pts.push(Point2D::new(x0 as f64, y as f64));
        }
        pts
    }

    #[test]
    fn rectangle_outline_collapses_to_four_corners() {
        let outline = rectangle_outline(10, 20, 210, 120);
        let eps = 0.02 * closed_perimeter(&outline);
        let poly = approximate_closed_polygon(&outline, eps);
        assert_eq!(poly.len(), 4);
        for corner in [(10.0, 20.0), (210.0, 20.0), (210.0, 120.0), (10.0, 120.0)] {
            let c = Point2D::from(corner);
            assert!(poly.iter().any(|p| p.distance(&c) < 1.5), "missing {c:?} in {poly:?}");
        }
    }

    #[test]
    fn noisy_edge_is_flattened() {
        let mut outline = rectangle_outline(0, 0, 300, 200);
        for (i, p) in outline.iter_mut().enumerate() {
            if p.y == 0.0 && i % 7 == 0 {
                p.y = 1.0;
            }
        }
        let eps = 0.02 * closed_perimeter(&outline);
        assert_eq!(approximate_closed_polygon(&outline, eps).len(), 4);
    }

    #[test]
    fn triangle_keeps_three_vertices() {
        let mut outline = Vec::new();
        for i in 0..100 {
            outline.push(Point2D::new(i as f64, 0.0));
        }
        for i in 0..100 {
            outline.push(Point2D::new(100.0 - i as f64 * 0.5, i as f64));
        }
        for i in 0..100 {
            outline.push(Point2D::new(50.0 - i as f64 * 0.5, 100.0 - i as f64));
        }
        let eps = 0.02 * closed_perimeter(&outline);
        assert_eq!(approximate_closed_polygon(&outline, eps).len(), 3);
    }

    #[test]
    fn perimeter_of_unit_square() {
        let square = [
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
        ];
        assert!((closed_perimeter(&square) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_pass_through() {
        let single = [Point2D::new(3.0, 4.0)];
        assert_eq!(approximate_closed_polygon(&single, 1.0), single.to_vec());
        let same = [Point2D::new(1.0, 1.0); 5];
        assert_eq!(approximate_closed_polygon(&same, 1.0).len(), 1);
    }
}
