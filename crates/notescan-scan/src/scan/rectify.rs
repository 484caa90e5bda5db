// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification: maps the detected page quadrilateral onto an
// upright rectangle sized from the page's own edge lengths.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use notescan_core::error::ScanError;
use notescan_core::{MAX_OUTPUT_DIMENSION, OutputSize, Quadrilateral, ScanConfig};
use tracing::{debug, info, instrument, warn};

/// A rectified page.
#[derive(Debug, Clone)]
pub struct RectifiedImage {
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
}

impl RectifiedImage {
    pub fn new(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        Self {
            image,
            width,
            height,
        }
    }
}

/// Output size for `quad`.
///
/// The page width is the longer of the top and bottom edges and the page
/// height the longer of the left and right edges. The pinned dimension of
/// `size` is used as given; the other one is scaled to keep the page aspect
/// ratio, rounded to the nearest pixel and capped at
/// [`MAX_OUTPUT_DIMENSION`].
pub fn output_size(quad: &Quadrilateral, size: OutputSize) -> (u32, u32) {
    let page_w = quad
        .top_left
        .distance(&quad.top_right)
        .max(quad.bottom_left.distance(&quad.bottom_right));
    let page_h = quad
        .top_left
        .distance(&quad.bottom_left)
        .max(quad.top_right.distance(&quad.bottom_right));

    let follow = |free: f64, pinned_src: f64, pinned_dst: u32| -> u32 {
        if pinned_src <= f64::EPSILON {
            return 1;
        }
        let scaled = (free * pinned_dst as f64 / pinned_src).round();
        (scaled.min(MAX_OUTPUT_DIMENSION as f64) as u32).max(1)
    };
    match size {
        OutputSize::TargetWidth(w) => (w, follow(page_h, page_w, w)),
        OutputSize::TargetHeight(h) => (follow(page_w, page_h, h), h),
    }
}

/// Warp the page inside `quad` to an upright rectangle.
///
/// Flat or self-collinear quadrilaterals (including ones with a repeated
/// corner) are rejected before any pixel is touched. Destination corners are
/// (0,0), (W-1,0), (W-1,H-1), (0,H-1); resampling is bilinear and samples
/// falling outside the source are white.
#[instrument(skip(image, config), fields(src_w = image.width(), src_h = image.height()))]
pub fn rectify(
    image: &DynamicImage,
    quad: &Quadrilateral,
    config: &ScanConfig,
) -> Result<RectifiedImage, ScanError> {
    if quad.is_degenerate() {
        warn!(area = quad.area(), "Degenerate quadrilateral");
        return Err(ScanError::DegenerateQuadrilateral { area: quad.area() });
    }

    let (out_w, out_h) = output_size(quad, config.output_size);
    debug!(out_w, out_h, "Output size computed");

    let src = quad.points().map(|p| (p.x as f32, p.y as f32));
    let (max_x, max_y) = ((out_w - 1) as f32, (out_h - 1) as f32);
    let dest: [(f32, f32); 4] = [(0.0, 0.0), (max_x, 0.0), (max_x, max_y), (0.0, max_y)];

    let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
        warn!(?src, "Projective transform could not be solved");
        ScanError::DegenerateQuadrilateral { area: quad.area() }
    })?;

    let rgb_input = image.to_rgb8();
    let mut output = RgbImage::new(out_w, out_h);
    warp_into(
        &rgb_input,
        &projection,
        Interpolation::Bilinear,
        Rgb([255u8, 255, 255]),
        &mut output,
    );

    info!(out_w, out_h, "Perspective correction applied");
    Ok(RectifiedImage::new(DynamicImage::ImageRgb8(output)))
}
