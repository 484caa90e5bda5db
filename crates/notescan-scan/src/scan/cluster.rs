// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner clustering: density-based merging of line intersections into
// corner estimates, and reduction of surplus clusters to the four page corners.

use notescan_core::error::ScanError;
use notescan_core::{Corner, CornerSelection, CornerSet, Point2D, ScanConfig};
use rstar::RTree;
use rstar::primitives::GeomWithData;
use tracing::{debug, info, instrument, warn};

/// One density-connected group of points.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Indices into the input slice, ascending.
    pub members: Vec<usize>,
    pub centroid: Point2D,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Label {
    Unvisited,
    Noise,
    Member(usize),
}

/// R-tree over the input points, tagged with their input index.
struct NeighbourIndex<'a> {
    points: &'a [Point2D],
    squared_epsilon: f64,
    tree: RTree<GeomWithData<[f64; 2], usize>>,
}

impl<'a> NeighbourIndex<'a> {
    fn new(points: &'a [Point2D], epsilon: f64) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new([p.x, p.y], i))
            .collect();
        Self {
            points,
            squared_epsilon: epsilon * epsilon,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Indices within `epsilon` of point `i` (itself included), ascending.
    fn neighbours(&self, i: usize) -> Vec<usize> {
        let p = self.points[i];
        let mut found: Vec<usize> = self
            .tree
            .locate_within_distance([p.x, p.y], self.squared_epsilon)
            .map(|entry| entry.data)
            .collect();
        found.sort_unstable();
        found
    }
}

/// DBSCAN over `points`.
///
/// A point with at least `min_points` neighbours within `epsilon` (itself
/// included) is a core point; clusters are grown from core points and
/// non-core points reachable from one join as border points. Unreachable
/// points are noise and are dropped. Clusters are numbered in order of their
/// lowest-index point and neighbours are expanded in index order, so equal
/// inputs give identical output.
pub fn dbscan(points: &[Point2D], epsilon: f64, min_points: usize) -> Vec<Cluster> {
    let index = NeighbourIndex::new(points, epsilon);
    let mut labels = vec![Label::Unvisited; points.len()];
    let mut cluster_count = 0usize;

    for i in 0..points.len() {
        if labels[i] != Label::Unvisited {
            continue;
        }
        let seeds = index.neighbours(i);
        if seeds.len() < min_points {
            labels[i] = Label::Noise;
            continue;
        }

        let id = cluster_count;
        cluster_count += 1;
        labels[i] = Label::Member(id);

        let mut queue = std::collections::VecDeque::from(seeds);
        while let Some(j) = queue.pop_front() {
            match labels[j] {
                Label::Noise => labels[j] = Label::Member(id),
                Label::Unvisited => {
                    labels[j] = Label::Member(id);
                    let reach = index.neighbours(j);
                    if reach.len() >= min_points {
                        queue.extend(reach);
                    }
                }
                Label::Member(_) => {}
            }
        }
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); cluster_count];
    for (i, label) in labels.iter().enumerate() {
        if let Label::Member(id) = label {
            members[*id].push(i);
        }
    }

    members
        .into_iter()
        .filter_map(|members| {
            let pts: Vec<Point2D> = members.iter().map(|&i| points[i]).collect();
            let centroid = Point2D::centroid(&pts)?;
            Some(Cluster { members, centroid })
        })
        .collect()
}

/// The image's own corners: (0,0), (W,0), (W,H), (0,H).
pub fn image_corners(width: u32, height: u32) -> [Point2D; 4] {
    let (w, h) = (width as f64, height as f64);
    [
        Point2D::new(0.0, 0.0),
        Point2D::new(w, 0.0),
        Point2D::new(w, h),
        Point2D::new(0.0, h),
    ]
}

/// Merge intersections into exactly four corner estimates.
///
/// Fewer than four clusters is [`ScanError::InsufficientCorners`]; more than
/// four are reduced according to `config.corner_selection`.
#[instrument(skip_all, fields(points = points.len()))]
pub fn cluster_corners(
    points: &[Point2D],
    width: u32,
    height: u32,
    config: &ScanConfig,
) -> Result<CornerSet, ScanError> {
    let clusters = dbscan(points, config.cluster_epsilon_px, config.cluster_min_points);
    let corners: Vec<Corner> = clusters
        .iter()
        .map(|c| Corner {
            position: c.centroid,
            support: c.members.len(),
        })
        .collect();
    info!(clusters = corners.len(), "Intersections clustered");

    match corners.len() {
        n if n < 4 => {
            warn!(found = n, "Fewer than 4 corner clusters");
            Err(ScanError::InsufficientCorners { found: n })
        }
        4 => Ok(CornerSet(corners)),
        n => {
            let targets = image_corners(width, height);
            let picks = match config.corner_selection {
                CornerSelection::Assignment => assign_one_to_one(&corners, &targets),
                CornerSelection::NearestImageCorner => nearest_per_target(&corners, &targets),
            };
            debug!(clusters = n, ?picks, mode = ?config.corner_selection, "Reduced to 4 corners");
            Ok(CornerSet(picks.iter().map(|&i| corners[i]).collect()))
        }
    }
}

/// For each target independently, the index of the closest corner. The same
/// corner may be returned for several targets.
pub fn nearest_per_target(corners: &[Corner], targets: &[Point2D; 4]) -> [usize; 4] {
    targets.map(|target| {
        let mut best = (0usize, f64::INFINITY);
        for (i, corner) in corners.iter().enumerate() {
            let d = corner.position.distance(&target);
            if d < best.1 {
                best = (i, d);
            }
        }
        best.0
    })
}

/// Distinct corner indices, one per target, minimising the summed distance.
///
/// Dynamic programme over (corners considered, targets already taken); with
/// four targets there are only 16 target subsets, so this is linear in the
/// number of corners. Requires at least four corners.
pub fn assign_one_to_one(corners: &[Corner], targets: &[Point2D; 4]) -> [usize; 4] {
    const FULL: usize = 0b1111;
    let n = corners.len();
    let mut cost = vec![[f64::INFINITY; 16]; n + 1];
    let mut choice: Vec<[Option<(usize, Option<usize>)>; 16]> = vec![[None; 16]; n + 1];
    cost[0][0] = 0.0;

    for j in 0..n {
        for mask in 0..16 {
            let base = cost[j][mask];
            if !base.is_finite() {
                continue;
            }
            if base < cost[j + 1][mask] {
                cost[j + 1][mask] = base;
                choice[j + 1][mask] = Some((mask, None));
            }
            for (k, target) in targets.iter().enumerate() {
                if mask & (1 << k) != 0 {
                    continue;
                }
                let next = mask | (1 << k);
                let total = base + corners[j].position.distance(target);
                if total < cost[j + 1][next] {
                    cost[j + 1][next] = total;
                    choice[j + 1][next] = Some((mask, Some(k)));
                }
            }
        }
    }

    let mut picks = [0usize; 4];
    let mut mask = FULL;
    for j in (1..=n).rev() {
        if let Some((prev, assigned)) = choice[j][mask] {
            if let Some(k) = assigned {
                picks[k] = j - 1;
            }
            mask = prev;
        }
    }
    picks
}
