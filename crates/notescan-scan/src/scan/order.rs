// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cyclic ordering of the four corner estimates.

use std::f64::consts::PI;

use notescan_core::{Point2D, Quadrilateral};

/// Order four corners by polar angle around their centroid.
///
/// The key is `atan2(dy, dx) + PI`, ascending. With y pointing down this
/// walks TL, TR, BR, BL for an upright page; the first element is not
/// checked against the true top-left, so pages rotated by more than 45
/// degrees come out cyclically shifted.
pub fn order_corners(corners: &[Point2D; 4]) -> Quadrilateral {
    let Some(center) = Point2D::centroid(corners) else {
        return Quadrilateral::from_points(*corners);
    };
    let key = |p: &Point2D| (p.y - center.y).atan2(p.x - center.x) + PI;

    let mut sorted = *corners;
    sorted.sort_by(|a, b| key(a).total_cmp(&key(b)));
    Quadrilateral::from_points(sorted)
}
