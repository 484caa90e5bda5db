// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Probabilistic Hough transform returning finite line segments.
//
// Edge points vote one at a time. As soon as a point pushes one of its
// (theta, rho) cells over the vote threshold, the corresponding line is
// walked in both directions through the edge map, bridging gaps of up to
// `max_gap` pixels. Points on the walked corridor are removed from further
// consideration and, if the segment is long enough, their votes are taken
// back. Points are visited in a shuffled order drawn from a fixed seed, so
// the output is a pure function of the edge map and the seed.

use image::GrayImage;
use notescan_core::{LineSegment, Point2D};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Angular resolution: one bin per degree over [0, 180).
pub const THETA_BINS: usize = 180;

/// Seed for the edge-point visiting order used by the line detector.
pub const DEFAULT_SEED: u64 = 0x6e6f_7465_7363_616e;

/// Tuning for [`probabilistic_hough`].
#[derive(Debug, Clone, Copy)]
pub struct HoughParams {
    /// Votes a (theta, rho) cell needs before a segment is traced.
    pub min_votes: u32,
    /// Minimum extent along x or y for a traced segment to be kept.
    pub min_length: u32,
    /// Largest run of missing edge pixels bridged inside one segment.
    pub max_gap: u32,
    /// Stop after this many segments.
    pub max_segments: usize,
    /// Seeds the order edge points are visited in.
    pub seed: u64,
}

struct Accumulator {
    cells: Vec<i32>,
    num_rho: usize,
    rho_offset: i64,
    cos_table: [f64; THETA_BINS],
    sin_table: [f64; THETA_BINS],
}

impl Accumulator {
    fn new(width: usize, height: usize) -> Self {
        let num_rho = (width + height) * 2 + 1;
        let mut cos_table = [0.0; THETA_BINS];
        let mut sin_table = [0.0; THETA_BINS];
        for n in 0..THETA_BINS {
            let theta = (n as f64).to_radians();
            cos_table[n] = theta.cos();
            sin_table[n] = theta.sin();
        }
        Self {
            cells: vec![0; num_rho * THETA_BINS],
            num_rho,
            rho_offset: ((num_rho - 1) / 2) as i64,
            cos_table,
            sin_table,
        }
    }

    #[inline]
    fn cell(&self, x: usize, y: usize, n: usize) -> usize {
        let rho = (x as f64 * self.cos_table[n] + y as f64 * self.sin_table[n]).round() as i64;
        n * self.num_rho + (rho + self.rho_offset) as usize
    }

    /// Add one vote per angle for (x, y); returns the strongest cell touched
    /// as `(votes, theta_bin)`.
    fn vote(&mut self, x: usize, y: usize) -> (i32, usize) {
        let mut best = (0, 0);
        for n in 0..THETA_BINS {
            let idx = self.cell(x, y, n);
            self.cells[idx] += 1;
            if self.cells[idx] > best.0 {
                best = (self.cells[idx], n);
            }
        }
        best
    }

    fn unvote(&mut self, x: usize, y: usize) {
        for n in 0..THETA_BINS {
            let idx = self.cell(x, y, n);
            self.cells[idx] -= 1;
        }
    }

    /// Unit step along the line of bin `n`, with the dominant axis set to +-1.
    fn step(&self, n: usize) -> (f64, f64) {
        let a = -self.sin_table[n];
        let b = self.cos_table[n];
        if a.abs() > b.abs() {
            (a.signum(), b / a.abs())
        } else {
            (a / b.abs(), b.signum())
        }
    }
}

/// Run the probabilistic Hough transform over a binary edge map (non-zero
/// pixels are edges).
pub fn probabilistic_hough(edges: &GrayImage, params: &HoughParams) -> Vec<LineSegment> {
    let (width, height) = (edges.width() as usize, edges.height() as usize);
    if width == 0 || height == 0 || params.max_segments == 0 {
        return Vec::new();
    }

    let mut pending: Vec<bool> = edges.pixels().map(|p| p.0[0] > 0).collect();
    let mut voted = vec![false; width * height];
    let mut points: Vec<(usize, usize)> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .filter(|&(x, y)| pending[y * width + x])
        .collect();
    points.shuffle(&mut StdRng::seed_from_u64(params.seed));

    let mut acc = Accumulator::new(width, height);
    let mut segments = Vec::new();
    let max_gap = params.max_gap as usize;
    let min_length = params.min_length as i64;

    let pixel_at = |pos: (f64, f64)| -> Option<(usize, usize)> {
        let (px, py) = (pos.0.round(), pos.1.round());
        if px < 0.0 || py < 0.0 || px >= width as f64 || py >= height as f64 {
            None
        } else {
            Some((px as usize, py as usize))
        }
    };

    for &(x, y) in &points {
        if !pending[y * width + x] {
            continue;
        }

        let (max_votes, theta_bin) = acc.vote(x, y);
        voted[y * width + x] = true;
        if max_votes < params.min_votes as i32 {
            continue;
        }

        let (sx, sy) = acc.step(theta_bin);
        let directions = [(sx, sy), (-sx, -sy)];

        // Trace both ways to find the segment ends.
        let mut ends = [(x, y); 2];
        for (k, &(dx, dy)) in directions.iter().enumerate() {
            let mut pos = (x as f64, y as f64);
            let mut gap = 0usize;
            loop {
                pos = (pos.0 + dx, pos.1 + dy);
                let Some((px, py)) = pixel_at(pos) else { break };
                if pending[py * width + px] {
                    gap = 0;
                    ends[k] = (px, py);
                } else {
                    gap += 1;
                    if gap > max_gap {
                        break;
                    }
                }
            }
        }

        let good = (ends[1].0 as i64 - ends[0].0 as i64).abs() >= min_length
            || (ends[1].1 as i64 - ends[0].1 as i64).abs() >= min_length;

        // Retrace, consuming the corridor and withdrawing its votes.
        for (k, &(dx, dy)) in directions.iter().enumerate() {
            let mut pos = (x as f64, y as f64);
            loop {
                let Some((px, py)) = pixel_at(pos) else { break };
                let idx = py * width + px;
                if pending[idx] {
                    if good && voted[idx] {
                        acc.unvote(px, py);
                        voted[idx] = false;
                    }
                    pending[idx] = false;
                }
                if (px, py) == ends[k] {
                    break;
                }
                pos = (pos.0 + dx, pos.1 + dy);
            }
        }

        if good {
            segments.push(LineSegment::new(
                Point2D::new(ends[0].0 as f64, ends[0].1 as f64),
                Point2D::new(ends[1].0 as f64, ends[1].1 as f64),
            ));
            if segments.len() >= params.max_segments {
                break;
            }
        }
    }

    debug!(
        edge_points = points.len(),
        segments = segments.len(),
        "Probabilistic Hough complete"
    );
    segments
}
