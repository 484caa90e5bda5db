// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Size-bounded JPEG output.

use image::DynamicImage;
use notescan_core::error::ScanError;
use notescan_core::{Diagnostic, ScanConfig};
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;

/// JPEG bytes plus the quality that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub quality: u8,
    /// False when even the floor quality exceeded the size budget.
    pub budget_met: bool,
}

/// Qualities tried in order: `start`, `start - step`, ... down to `min`.
/// `min` is always the last entry even when the step overshoots it.
pub fn quality_ladder(start: u8, step: u8, min: u8) -> Vec<u8> {
    let mut ladder = Vec::new();
    let mut q = start;
    while q > min {
        ladder.push(q);
        q = q.saturating_sub(step.max(1));
    }
    ladder.push(min.min(start));
    ladder
}

/// Encode `image` at the highest ladder quality that fits the size budget.
///
/// When no quality fits, the floor-quality encoding is returned anyway with
/// `budget_met = false` and a [`Diagnostic::CompressionBudgetUnreachable`].
#[instrument(skip(image, config), fields(width = image.width(), height = image.height()))]
pub fn encode_within_budget(
    image: &DynamicImage,
    config: &ScanConfig,
) -> Result<(EncodedImage, Option<Diagnostic>), ScanError> {
    let budget = config.size_budget_bytes();
    let processor = ImageProcessor::from_dynamic(image.clone());

    let mut last = None;
    for quality in quality_ladder(
        config.jpeg_start_quality,
        config.jpeg_quality_step,
        config.jpeg_min_quality,
    ) {
        let bytes = processor.to_jpeg_bytes(quality)?;
        debug!(quality, size = bytes.len(), budget, "Trial encode");
        if bytes.len() <= budget {
            info!(quality, size = bytes.len(), "Encoded within budget");
            return Ok((
                EncodedImage {
                    bytes,
                    quality,
                    budget_met: true,
                },
                None,
            ));
        }
        last = Some((bytes, quality));
    }

    let Some((bytes, quality)) = last else {
        return Err(ScanError::Encode("no JPEG quality to try".into()));
    };
    warn!(
        quality,
        size = bytes.len(),
        budget,
        "Size budget unreachable, keeping floor quality"
    );
    let diagnostic = Diagnostic::CompressionBudgetUnreachable {
        budget_bytes: budget,
        achieved_bytes: bytes.len(),
    };
    Ok((
        EncodedImage {
            bytes,
            quality,
            budget_met: false,
        },
        Some(diagnostic),
    ))
}
