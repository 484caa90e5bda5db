// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preprocessing: luma conversion, Gaussian smoothing and inverted local-mean
// binarization producing the mask the line detector runs on.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use notescan_core::ScanConfig;
use tracing::{debug, instrument};

/// Mask value for pixels darker than their neighbourhood.
pub const MASK_ON: u8 = 255;

/// Build the binary boundary mask for `image`.
///
/// Pixels darker than `local_mean - threshold_bias` (mean over a square of
/// radius `threshold_block_radius`) become [`MASK_ON`]; everything else is 0.
/// Dark strokes and the dark side of a page border therefore light up while
/// flat paper and flat background stay off.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn binary_mask(image: &DynamicImage, config: &ScanConfig) -> GrayImage {
    let gray = image.to_luma8();
    let blurred = gaussian_blur_f32(&gray, config.blur_sigma);
    let mask = adaptive_threshold_inv(
        &blurred,
        config.threshold_block_radius,
        config.threshold_bias,
    );
    debug!(
        on_pixels = mask.pixels().filter(|p| p.0[0] == MASK_ON).count(),
        "Binary mask built"
    );
    mask
}

/// Inverted adaptive threshold against the local mean.
pub fn adaptive_threshold_inv(gray: &GrayImage, block_radius: u32, bias: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = compute_integral_image(gray);
    let mut output = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let local_mean = region_mean(&integral, width, height, x, y, block_radius);
            let threshold = local_mean - bias as f64;
            let pixel_val = gray.get_pixel(x, y).0[0] as f64;
            let value = if pixel_val < threshold { MASK_ON } else { 0 };
            output.put_pixel(x, y, Luma([value]));
        }
    }

    output
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` contains the sum of all pixel values in the
/// rectangle [0, 0) to (x, y) (exclusive on both axes). The table has
/// dimensions `(width+1) x (height+1)` with a zero-padded border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value within a square of the given radius centred on (cx, cy),
/// clamped to the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(img_width as usize);
    let y2 = ((cy + radius + 1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    // S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1]
    let sum = integral[y2 * stride + x2] as f64
        - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}
