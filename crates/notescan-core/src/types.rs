// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Notescan page rectifier.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Strategy;
use crate::error::FailureKind;

/// Relative tolerance below which a quadrilateral counts as flat.
const DEGENERATE_EPS: f64 = 1e-6;

/// A floating-point position in the image plane (x right, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Z component of `(b - self) x (c - self)`.
    pub fn cross(&self, b: &Point2D, c: &Point2D) -> f64 {
        (b.x - self.x) * (c.y - self.y) - (b.y - self.y) * (c.x - self.x)
    }

    /// Arithmetic mean of a non-empty set of points.
    pub fn centroid(points: &[Point2D]) -> Option<Point2D> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point2D::new(sx / n, sy / n))
    }
}

/// Which of the two line buckets a segment was sorted into.
///
/// `Primary` holds segments whose angle is below 45° or above 135°, i.e.
/// near-horizontal segments. The first scanner release called this bucket
/// "vertical".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Primary,
    Secondary,
}

impl Orientation {
    /// Classify a segment by `|atan2(dy, dx)|` in degrees.
    pub fn from_angle_degrees(angle: f64) -> Self {
        if !(45.0..=135.0).contains(&angle) {
            Self::Primary
        } else {
            Self::Secondary
        }
    }
}

/// A finite segment returned by the line detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point2D,
    pub end: Point2D,
}

impl LineSegment {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    /// `|atan2(y2 - y1, x2 - x1)|` in degrees, in `[0, 180]`.
    pub fn angle_degrees(&self) -> f64 {
        (self.end.y - self.start.y)
            .atan2(self.end.x - self.start.x)
            .to_degrees()
            .abs()
    }
}

/// Implicit line `a*x + b*y + c = 0` with `a² + b² = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub orientation: Orientation,
}

impl LineParams {
    /// Line through both endpoints of `segment`, tagged by its angle.
    ///
    /// Returns `None` when the endpoints coincide.
    pub fn from_segment(segment: &LineSegment) -> Option<Self> {
        let (p, q) = (segment.start, segment.end);
        let a = q.y - p.y;
        let b = p.x - q.x;
        let norm = a.hypot(b);
        if norm <= f64::EPSILON {
            return None;
        }
        let c = q.x * p.y - p.x * q.y;
        Some(Self {
            a: a / norm,
            b: b / norm,
            c: c / norm,
            orientation: Orientation::from_angle_degrees(segment.angle_degrees()),
        })
    }

    /// Signed distance of `point` from the line.
    pub fn signed_distance(&self, point: &Point2D) -> f64 {
        self.a * point.x + self.b * point.y + self.c
    }
}

/// A corner estimate: the centroid of one cluster of intersections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    pub position: Point2D,
    /// Number of intersections merged into this corner.
    pub support: usize,
}

/// Corner estimates in cluster-discovery order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CornerSet(pub Vec<Corner>);

impl CornerSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Corner> {
        self.0.iter()
    }

    /// Positions as a fixed array when exactly four corners are present.
    pub fn as_four(&self) -> Option<[Point2D; 4]> {
        match self.0.as_slice() {
            [a, b, c, d] => Some([a.position, b.position, c.position, d.position]),
            _ => None,
        }
    }
}

/// Four page corners in TopLeft, TopRight, BottomRight, BottomLeft order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub top_left: Point2D,
    pub top_right: Point2D,
    pub bottom_right: Point2D,
    pub bottom_left: Point2D,
}

impl Quadrilateral {
    /// Build from points already in TL, TR, BR, BL order.
    pub fn from_points(points: [Point2D; 4]) -> Self {
        let [top_left, top_right, bottom_right, bottom_left] = points;
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub fn points(&self) -> [Point2D; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Shoelace area of the polygon TL -> TR -> BR -> BL.
    pub fn area(&self) -> f64 {
        let pts = self.points();
        let twice: f64 = (0..4)
            .map(|i| {
                let (p, q) = (pts[i], pts[(i + 1) % 4]);
                p.x * q.y - q.x * p.y
            })
            .sum();
        twice.abs() / 2.0
    }

    /// True when the area vanishes or any three vertices are collinear.
    ///
    /// Both tests are relative to the squared longest side so the check is
    /// scale-free.
    pub fn is_degenerate(&self) -> bool {
        let pts = self.points();
        let longest = (0..4)
            .flat_map(|i| ((i + 1)..4).map(move |j| (i, j)))
            .map(|(i, j)| pts[i].distance(&pts[j]))
            .fold(0.0_f64, f64::max);
        if longest <= f64::EPSILON {
            return true;
        }
        let scale = longest * longest;
        if self.area() <= DEGENERATE_EPS * scale {
            return true;
        }
        (0..4).any(|skip| {
            let tri: Vec<Point2D> = (0..4).filter(|&i| i != skip).map(|i| pts[i]).collect();
            tri[0].cross(&tri[1], &tri[2]).abs() <= DEGENERATE_EPS * scale
        })
    }
}

/// Non-fatal findings attached to a successful scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Even the floor quality exceeded the size budget.
    CompressionBudgetUnreachable {
        budget_bytes: usize,
        achieved_bytes: usize,
    },
}

/// Outcome of one successfully rectified and written page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub quality: u8,
    pub budget_met: bool,
    pub strategy: Strategy,
}

/// A page that could not be rectified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedScan {
    pub input: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// Per-batch results; one failure never stops the remaining pages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded: Vec<ScanReport>,
    pub failed: Vec<FailedScan>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed(&self) -> usize {
        self.failed.len()
    }
}
