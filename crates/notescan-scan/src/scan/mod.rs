// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page detection and rectification stages, in pipeline order: binary mask,
// edge lines, intersections, corner clusters, corner order, perspective warp
// and size-bounded encoding. `boundary` and `unwarp` form the alternate
// boundary-scan path.

pub mod boundary;
pub mod cluster;
pub mod encode;
pub mod hough;
pub mod intersect;
pub mod lines;
pub mod order;
pub mod preprocess;
pub mod rectify;
pub mod unwarp;

pub use boundary::{BoundaryScanRectifier, RowBounds, scan_row_bounds};
pub use cluster::cluster_corners;
pub use encode::{EncodedImage, encode_within_budget};
pub use intersect::find_intersections;
pub use lines::{OrientedLines, detect_lines};
pub use order::order_corners;
pub use preprocess::binary_mask;
pub use rectify::{RectifiedImage, rectify};
pub use unwarp::{FnUnwarper, PassthroughUnwarper, Unwarper};
