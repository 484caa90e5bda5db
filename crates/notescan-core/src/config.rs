// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Result, ScanError};

/// Largest width or height a baseline JPEG can carry.
pub const MAX_OUTPUT_DIMENSION: u32 = u16::MAX as u32;

/// Which output dimension is pinned; the other follows the page aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSize {
    TargetWidth(u32),
    TargetHeight(u32),
}

/// How the page boundary is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Edge lines, intersections, corner clusters and a homography.
    Geometric,
    /// External unwarping model followed by a row-intensity boundary scan.
    BoundaryScan,
}

/// How more than four corner clusters are reduced to four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerSelection {
    /// Minimum-cost one-to-one matching against the image corners.
    Assignment,
    /// Independent nearest centroid per image corner; may repeat a centroid.
    NearestImageCorner,
}

/// Immutable settings for one scanner instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub output_size: OutputSize,
    /// Upper bound on the encoded JPEG size, in KiB.
    pub size_budget_kb: u32,

    // -- Preprocessing --
    pub blur_sigma: f32,
    pub threshold_block_radius: u32,
    pub threshold_bias: i32,

    // -- Line detection --
    pub canny_low: f32,
    pub canny_high: f32,
    /// Largest share of edge pixels a mask may carry before it is treated as
    /// texture or noise rather than a page outline.
    pub max_edge_density: f64,
    pub hough_min_votes: u32,
    pub hough_min_length: u32,
    pub hough_max_gap: u32,
    /// Cap on segments examined and on each orientation bucket.
    pub max_lines: usize,

    // -- Corners --
    /// Fraction of width/height an intersection may fall outside the image.
    pub intersection_margin: f64,
    pub cluster_epsilon_px: f64,
    pub cluster_min_points: usize,
    pub corner_selection: CornerSelection,

    pub strategy: Strategy,

    // -- Encoding --
    pub jpeg_start_quality: u8,
    pub jpeg_quality_step: u8,
    pub jpeg_min_quality: u8,

    // -- Boundary scan --
    pub boundary_window: usize,
    pub boundary_padding: usize,
    pub boundary_min_step: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            output_size: OutputSize::TargetWidth(595),
            size_budget_kb: 200,
            blur_sigma: 1.1,
            threshold_block_radius: 15,
            threshold_bias: 10,
            canny_low: 50.0,
            canny_high: 150.0,
            max_edge_density: 0.1,
            hough_min_votes: 30,
            hough_min_length: 50,
            hough_max_gap: 20,
            max_lines: 100,
            intersection_margin: 0.2,
            cluster_epsilon_px: 20.0,
            cluster_min_points: 1,
            corner_selection: CornerSelection::Assignment,
            strategy: Strategy::Geometric,
            jpeg_start_quality: 95,
            jpeg_quality_step: 5,
            jpeg_min_quality: 10,
            boundary_window: 20,
            boundary_padding: 25,
            boundary_min_step: 1.0,
        }
    }
}

impl ScanConfig {
    /// Settings that reproduce the first scanner release: height-pinned
    /// output (A4 at 100 DPI) and independent nearest-corner selection.
    ///
    /// The free output dimension is still rounded to the nearest pixel. That
    /// release truncated it, so widths here can be one pixel larger than the
    /// ones it wrote.
    pub fn as_observed() -> Self {
        Self {
            output_size: OutputSize::TargetHeight(842),
            corner_selection: CornerSelection::NearestImageCorner,
            ..Self::default()
        }
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(?config, "Scan configuration loaded");
        Ok(config)
    }

    /// Size budget in bytes.
    pub fn size_budget_bytes(&self) -> usize {
        self.size_budget_kb as usize * 1024
    }

    /// Reject settings no pipeline stage can honour.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ScanError::InvalidConfig(msg.to_string()));

        match self.output_size {
            OutputSize::TargetWidth(0) | OutputSize::TargetHeight(0) => {
                return invalid("output size must be at least one pixel");
            }
            OutputSize::TargetWidth(n) | OutputSize::TargetHeight(n)
                if n > MAX_OUTPUT_DIMENSION =>
            {
                return invalid("output size must not exceed 65535 pixels");
            }
            _ => {}
        }
        if self.size_budget_kb == 0 {
            return invalid("size_budget_kb must be positive");
        }
        if !(self.blur_sigma > 0.0) {
            return invalid("blur_sigma must be positive");
        }
        if self.canny_low < 0.0 || self.canny_low > self.canny_high {
            return invalid("canny thresholds must satisfy 0 <= canny_low <= canny_high");
        }
        if !(self.max_edge_density > 0.0 && self.max_edge_density <= 1.0) {
            return invalid("max_edge_density must lie in (0, 1]");
        }
        if self.hough_min_votes == 0 {
            return invalid("hough_min_votes must be positive");
        }
        if self.max_lines == 0 {
            return invalid("max_lines must be positive");
        }
        if !(self.intersection_margin >= 0.0) {
            return invalid("intersection_margin must be non-negative");
        }
        if !(self.cluster_epsilon_px > 0.0) {
            return invalid("cluster_epsilon_px must be positive");
        }
        if self.cluster_min_points == 0 {
            return invalid("cluster_min_points must be positive");
        }
        if self.jpeg_min_quality == 0
            || self.jpeg_start_quality > 100
            || self.jpeg_min_quality > self.jpeg_start_quality
        {
            return invalid("JPEG qualities must satisfy 1 <= min <= start <= 100");
        }
        if self.jpeg_quality_step == 0 {
            return invalid("jpeg_quality_step must be positive");
        }
        if self.boundary_window < 2 {
            return invalid("boundary_window must be at least 2 rows");
        }
        if self.boundary_min_step < 0.0 {
            return invalid("boundary_min_step must be non-negative");
        }
        Ok(())
    }
}
