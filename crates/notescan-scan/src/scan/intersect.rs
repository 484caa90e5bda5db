// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pairwise line intersections between the two orientation buckets.

use notescan_core::{LineParams, Point2D};
use tracing::{debug, instrument};

/// Determinant magnitude below which two lines count as parallel.
pub const PARALLEL_EPS: f64 = 1e-10;

/// Intersection of two implicit lines, or `None` when (nearly) parallel.
///
/// Solves `a1*x + b1*y = -c1`, `a2*x + b2*y = -c2` by Cramer's rule.
pub fn intersect(l1: &LineParams, l2: &LineParams) -> Option<Point2D> {
    let det = l1.a * l2.b - l2.a * l1.b;
    if det.abs() < PARALLEL_EPS {
        return None;
    }
    let x = (l1.b * l2.c - l2.b * l1.c) / det;
    let y = (l1.c * l2.a - l2.c * l1.a) / det;
    Some(Point2D::new(x, y))
}

/// True when `p` lies in the image expanded by `margin` * size on every side.
pub fn within_margin(p: &Point2D, width: u32, height: u32, margin: f64) -> bool {
    let (w, h) = (width as f64, height as f64);
    (-w * margin..=w * (1.0 + margin)).contains(&p.x)
        && (-h * margin..=h * (1.0 + margin)).contains(&p.y)
}

/// Intersect every primary line with every secondary line, keeping points
/// inside the margin-expanded image. May return an empty list.
#[instrument(skip_all, fields(primary = primary.len(), secondary = secondary.len()))]
pub fn find_intersections(
    primary: &[LineParams],
    secondary: &[LineParams],
    width: u32,
    height: u32,
    margin: f64,
) -> Vec<Point2D> {
    let points: Vec<Point2D> = primary
        .iter()
        .flat_map(|p| secondary.iter().filter_map(move |s| intersect(p, s)))
        .filter(|pt| within_margin(pt, width, height, margin))
        .collect();
    debug!(intersections = points.len(), "Intersections found");
    points
}
