// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner entry point: chains the stages for one image, writes results to
// disk and isolates failures across a batch.
//
// `DocumentScanner` holds only immutable configuration and a shared unwarper,
// so one instance can serve many threads at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use notescan_core::error::{Result, ScanError};
use notescan_core::{
    BatchReport, CornerSet, Diagnostic, FailedScan, LineSegment, Point2D, Quadrilateral,
    ScanConfig, ScanReport, Strategy,
};
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;
use crate::scan::boundary::BoundaryScanRectifier;
use crate::scan::rectify::RectifiedImage;
use crate::scan::unwarp::{PassthroughUnwarper, Unwarper};
use crate::scan::{
    binary_mask, cluster_corners, detect_lines, encode_within_budget, find_intersections,
    order_corners, rectify,
};

/// Everything the geometric detector found on the way to the page outline.
#[derive(Debug, Clone)]
pub struct Detection {
    pub segments: Vec<LineSegment>,
    pub intersections: Vec<Point2D>,
    pub corners: CornerSet,
    pub quad: Quadrilateral,
}

/// A rectified, encoded page held in memory.
#[derive(Debug, Clone)]
pub struct ScannedPage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub budget_met: bool,
    pub diagnostic: Option<Diagnostic>,
}

/// Rectifies page photographs according to one [`ScanConfig`].
#[derive(Clone)]
pub struct DocumentScanner {
    config: ScanConfig,
    unwarper: Arc<dyn Unwarper>,
}

impl std::fmt::Debug for DocumentScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentScanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DocumentScanner {
    // -- Construction ---------------------------------------------------------

    /// Create a scanner, rejecting invalid configuration up front. The
    /// boundary-scan strategy starts with a pass-through unwarper.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            unwarper: Arc::new(PassthroughUnwarper),
        })
    }

    /// Use `unwarper` for the boundary-scan strategy.
    pub fn with_unwarper(mut self, unwarper: Arc<dyn Unwarper>) -> Self {
        self.unwarper = unwarper;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    // -- Single image ---------------------------------------------------------

    /// Run mask, lines, intersections, clustering and ordering.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect_quadrilateral(&self, image: &DynamicImage) -> Result<Detection> {
        let (width, height) = (image.width(), image.height());

        let mask = binary_mask(image, &self.config);
        let lines = detect_lines(&mask, &self.config)?;
        let intersections = find_intersections(
            &lines.primary,
            &lines.secondary,
            width,
            height,
            self.config.intersection_margin,
        );
        let corners = cluster_corners(&intersections, width, height, &self.config)?;
        let four = corners
            .as_four()
            .ok_or(ScanError::InsufficientCorners { found: corners.len() })?;
        let quad = order_corners(&four);
        debug!(?quad, "Page outline");

        Ok(Detection {
            segments: lines.segments,
            intersections,
            corners,
            quad,
        })
    }

    /// Produce the upright page using the configured strategy.
    #[instrument(skip_all, fields(strategy = ?self.config.strategy))]
    pub fn rectify_image(&self, image: &DynamicImage) -> Result<RectifiedImage> {
        match self.config.strategy {
            Strategy::Geometric => {
                let detection = self.detect_quadrilateral(image)?;
                rectify(image, &detection.quad, &self.config)
            }
            Strategy::BoundaryScan => {
                BoundaryScanRectifier::new(self.unwarper.as_ref(), &self.config).rectify(image)
            }
        }
    }

    /// Rectify and encode one image.
    pub fn scan_image(&self, image: &DynamicImage) -> Result<ScannedPage> {
        let page = self.rectify_image(image)?;
        let (encoded, diagnostic) = encode_within_budget(&page.image, &self.config)?;
        Ok(ScannedPage {
            jpeg: encoded.bytes,
            width: page.width,
            height: page.height,
            quality: encoded.quality,
            budget_met: encoded.budget_met,
            diagnostic,
        })
    }

    /// Decode then scan an encoded photograph.
    pub fn scan_bytes(&self, data: &[u8]) -> Result<ScannedPage> {
        let image = ImageProcessor::from_bytes(data)?.into_dynamic();
        self.scan_image(&image)
    }

    // -- Files ----------------------------------------------------------------

    /// Scan `input` and write `scan_<name>.jpg` into `output_dir`.
    ///
    /// Nothing is written when any stage fails.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn scan_file(&self, input: &Path, output_dir: &Path) -> Result<ScanReport> {
        let image = ImageProcessor::open(input)?.into_dynamic();
        let page = self.scan_image(&image)?;

        std::fs::create_dir_all(output_dir)?;
        let output = output_dir.join(output_file_name(input));
        std::fs::write(&output, &page.jpeg)?;
        info!(
            output = %output.display(),
            bytes = page.jpeg.len(),
            quality = page.quality,
            "Page written"
        );

        Ok(ScanReport {
            input: input.to_path_buf(),
            output,
            width: page.width,
            height: page.height,
            bytes: page.jpeg.len(),
            quality: page.quality,
            budget_met: page.budget_met,
            strategy: self.config.strategy,
        })
    }

    /// Scan every input independently; failures are recorded and skipped.
    pub fn scan_batch<P: AsRef<Path>>(&self, inputs: &[P], output_dir: &Path) -> BatchReport {
        let mut report = BatchReport::default();
        for input in inputs {
            let input = input.as_ref();
            match self.scan_file(input, output_dir) {
                Ok(scan) => report.succeeded.push(scan),
                Err(err) => report.failed.push(failed_scan(input, &err)),
            }
        }
        info!(
            processed = report.processed(),
            failed = report.failed(),
            "Batch finished"
        );
        report
    }
}

/// Record a failed page for the batch report.
pub fn failed_scan(input: &Path, err: &ScanError) -> FailedScan {
    warn!(input = %input.display(), error = %err, "Page failed");
    FailedScan {
        input: input.to_path_buf(),
        kind: err.kind(),
        message: err.to_string(),
    }
}

/// `scan_<sanitized file name>.jpg` for `input`.
pub fn output_file_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    PathBuf::from(format!("scan_{}.jpg", sanitize_filename(&stem)))
}

/// Replace every character that is not alphanumeric, `_`, `-` or `.` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
