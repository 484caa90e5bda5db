// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary-scan rectification: unwarp the photograph, then find the page's
// top and bottom edges as sharp changes in smoothed row intensity.

use image::{DynamicImage, GrayImage};
use notescan_core::ScanConfig;
use notescan_core::error::ScanError;
use tracing::{debug, info, instrument};

use super::rectify::RectifiedImage;
use super::unwarp::Unwarper;
use crate::image::ImageProcessor;

/// Rows `[top, bottom)` kept by the boundary scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBounds {
    pub top: u32,
    pub bottom: u32,
}

impl RowBounds {
    pub fn full(rows: u32) -> Self {
        Self {
            top: 0,
            bottom: rows,
        }
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Mean intensity of every row.
fn row_means(gray: &GrayImage) -> Vec<f64> {
    let width = gray.width().max(1) as f64;
    gray.rows()
        .map(|row| row.map(|p| p.0[0] as f64).sum::<f64>() / width)
        .collect()
}

/// Locate the page's vertical extent in `gray`.
///
/// Row means are smoothed over `[i - window/2, i + window/2)`, differenced,
/// and a change counts when it exceeds twice the population standard
/// deviation of all differences (never less than `boundary_min_step`). The
/// first change at or after row `window` sets the top and the last change at
/// or before `rows - window` the bottom, each widened by `boundary_padding`.
/// Missing or crossed bounds fall back to the full extent.
pub fn scan_row_bounds(gray: &GrayImage, config: &ScanConfig) -> RowBounds {
    let rows = gray.height() as usize;
    let full = RowBounds::full(gray.height());
    let window = config.boundary_window.max(2);
    let half = window / 2;
    if rows < 2 * half + 2 {
        return full;
    }

    let means = row_means(gray);
    let mut prefix = vec![0.0; rows + 1];
    for (i, m) in means.iter().enumerate() {
        prefix[i + 1] = prefix[i] + m;
    }
    let span = (2 * half) as f64;
    // Smoothed value at row i, defined for half <= i <= rows - half.
    let smooth = |i: usize| (prefix[i + half] - prefix[i - half]) / span;

    // diffs[k] is the change at row half + 1 + k.
    let first_row = half + 1;
    let diffs: Vec<f64> = (first_row..=rows - half)
        .map(|i| smooth(i) - smooth(i - 1))
        .collect();

    let n = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / n;
    let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let threshold = (2.0 * variance.sqrt()).max(config.boundary_min_step);

    let steps: Vec<usize> = diffs
        .iter()
        .enumerate()
        .filter(|(_, d)| d.abs() > threshold)
        .map(|(k, _)| first_row + k)
        .collect();
    debug!(threshold, candidates = steps.len(), "Row intensity steps");

    let top = steps
        .iter()
        .find(|&&i| i >= window)
        .map(|&i| i.saturating_sub(config.boundary_padding));
    let last_allowed = rows.saturating_sub(window);
    let bottom = steps
        .iter()
        .rev()
        .find(|&&i| i <= last_allowed)
        .map(|&i| (i + config.boundary_padding).min(rows));

    let bounds = RowBounds {
        top: top.unwrap_or(0) as u32,
        bottom: bottom.unwrap_or(rows) as u32,
    };
    if bounds.top >= bounds.bottom {
        return full;
    }
    bounds
}

/// Alternate rectification path: external unwarp, row-bound crop, resize.
pub struct BoundaryScanRectifier<'a> {
    unwarper: &'a dyn Unwarper,
    config: &'a ScanConfig,
}

impl<'a> BoundaryScanRectifier<'a> {
    pub fn new(unwarper: &'a dyn Unwarper, config: &'a ScanConfig) -> Self {
        Self { unwarper, config }
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn rectify(&self, image: &DynamicImage) -> Result<RectifiedImage, ScanError> {
        let flat = self.unwarper.unwarp(image).map_err(|err| match err {
            ScanError::UnwarpFailure(msg) => ScanError::UnwarpFailure(msg),
            other => ScanError::UnwarpFailure(other.to_string()),
        })?;

        let bounds = scan_row_bounds(&flat.to_luma8(), self.config);
        info!(
            top = bounds.top,
            bottom = bounds.bottom,
            rows = bounds.height(),
            "Page rows found"
        );

        let page = ImageProcessor::from_dynamic(flat)
            .crop_rows(bounds.top, bounds.bottom)
            .resize_to(self.config.output_size)
            .into_dynamic();
        Ok(RectifiedImage::new(page))
    }
}
