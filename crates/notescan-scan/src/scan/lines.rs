// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge lines: Canny edges over the binary mask, probabilistic Hough segments,
// and classification into the two orientation buckets.

use image::GrayImage;
use imageproc::edges::canny;
use notescan_core::error::ScanError;
use notescan_core::{LineParams, LineSegment, Orientation, ScanConfig};
use tracing::{debug, info, instrument, warn};

use super::hough::{DEFAULT_SEED, HoughParams, probabilistic_hough};

/// Implicit lines sorted by orientation, plus the raw segments behind them.
#[derive(Debug, Clone, Default)]
pub struct OrientedLines {
    pub segments: Vec<LineSegment>,
    pub primary: Vec<LineParams>,
    pub secondary: Vec<LineParams>,
}

/// Share of non-zero pixels in an edge map.
pub fn edge_density(edges: &GrayImage) -> f64 {
    let total = edges.width() as usize * edges.height() as usize;
    if total == 0 {
        return 0.0;
    }
    let on = edges.pixels().filter(|p| p.0[0] > 0).count();
    on as f64 / total as f64
}

/// Detect boundary lines in a binary mask.
///
/// Fails with [`ScanError::InsufficientLines`] when either bucket is empty,
/// since corners need one line from each. An edge map denser than
/// `max_edge_density` fails the same way, with no lines at all.
#[instrument(skip_all, fields(width = mask.width(), height = mask.height()))]
pub fn detect_lines(mask: &GrayImage, config: &ScanConfig) -> Result<OrientedLines, ScanError> {
    let edges = canny(mask, config.canny_low, config.canny_high);

    let density = edge_density(&edges);
    debug!(density, "Edge map density");
    if density > config.max_edge_density {
        warn!(
            density,
            ceiling = config.max_edge_density,
            "Edge map too dense for a page outline"
        );
        return Err(ScanError::InsufficientLines {
            primary: 0,
            secondary: 0,
        });
    }

    let params = HoughParams {
        min_votes: config.hough_min_votes,
        min_length: config.hough_min_length,
        max_gap: config.hough_max_gap,
        max_segments: config.max_lines,
        seed: DEFAULT_SEED,
    };
    let segments = probabilistic_hough(&edges, &params);
    let lines = classify_segments(segments, config.max_lines);

    info!(
        primary = lines.primary.len(),
        secondary = lines.secondary.len(),
        "Edge lines classified"
    );

    if lines.primary.is_empty() || lines.secondary.is_empty() {
        warn!(
            primary = lines.primary.len(),
            secondary = lines.secondary.len(),
            "Not enough lines to intersect"
        );
        return Err(ScanError::InsufficientLines {
            primary: lines.primary.len(),
            secondary: lines.secondary.len(),
        });
    }

    Ok(lines)
}

/// Convert segments to normalized lines and bucket them by angle, keeping at
/// most `max_per_bucket` lines in each bucket.
pub fn classify_segments(segments: Vec<LineSegment>, max_per_bucket: usize) -> OrientedLines {
    let mut primary = Vec::new();
    let mut secondary = Vec::new();

    for line in segments.iter().filter_map(LineParams::from_segment) {
        match line.orientation {
            Orientation::Primary => primary.push(line),
            Orientation::Secondary => secondary.push(line),
        }
    }
    primary.truncate(max_per_bucket);
    secondary.truncate(max_per_bucket);

    debug!(segments = segments.len(), "Segments converted to lines");
    OrientedLines {
        segments,
        primary,
        secondary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use notescan_core::Point2D;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> LineSegment {
        LineSegment::new(Point2D::new(x1, y1), Point2D::new(x2, y2))
    }

    #[test]
    fn classification_follows_angle_thresholds() {
        let lines = classify_segments(
            vec![
                seg(0.0, 0.0, 100.0, 0.0),   // 0°
                seg(100.0, 0.0, 0.0, 10.0),  // ~174°
                seg(0.0, 0.0, 10.0, 100.0),  // ~84°
                seg(0.0, 100.0, 0.0, 0.0),   // 90°
                seg(0.0, 0.0, 60.0, 60.0),   // 45° exactly
                seg(5.0, 5.0, 5.0, 5.0),     // degenerate, dropped
            ],
            100,
        );
        assert_eq!(lines.primary.len(), 2);
        assert_eq!(lines.secondary.len(), 3);
        assert_eq!(lines.segments.len(), 6);
    }

    #[test]
    fn buckets_are_capped() {
        let segments = (0..10).map(|i| seg(0.0, i as f64, 100.0, i as f64)).collect();
        let lines = classify_segments(segments, 4);
        assert_eq!(lines.primary.len(), 4);
        assert!(lines.secondary.is_empty());
    }

    /// Mask of random 4 px blocks: edges everywhere, no straight outline.
    fn speckled_mask(width: u32, height: u32) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(11);
        let cols = width.div_ceil(4) as usize;
        let blocks: Vec<bool> = (0..cols * height.div_ceil(4) as usize)
            .map(|_| rng.gen_bool(0.5))
            .collect();
        GrayImage::from_fn(width, height, |x, y| {
            let on = blocks[(y / 4) as usize * cols + (x / 4) as usize];
            Luma([if on { 255 } else { 0 }])
        })
    }

    #[test]
    fn density_counts_edge_pixels() {
        let mut edges = GrayImage::new(10, 10);
        for x in 0..10 {
            edges.put_pixel(x, 3, Luma([255]));
        }
        assert!((edge_density(&edges) - 0.1).abs() < 1e-12);
        assert_eq!(edge_density(&GrayImage::new(0, 0)), 0.0);
    }

    #[test]
    fn speckled_mask_is_rejected_before_hough() {
        let mask = speckled_mask(400, 300);
        let edges = canny(&mask, 50.0, 150.0);
        assert!(edge_density(&edges) > ScanConfig::default().max_edge_density);

        let err = detect_lines(&mask, &ScanConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::InsufficientLines {
                primary: 0,
                secondary: 0
            }
        ));
    }

    #[test]
    fn page_outline_stays_under_the_density_ceiling() {
        let mut mask = GrayImage::new(400, 300);
        for y in 50..250 {
            for x in 80..320 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let edges = canny(&mask, 50.0, 150.0);
        assert!(edge_density(&edges) < 0.05);
        let lines = detect_lines(&mask, &ScanConfig::default()).expect("lines");
        assert!(!lines.primary.is_empty());
        assert!(!lines.secondary.is_empty());
    }

    #[test]
    fn blank_mask_has_insufficient_lines() {
        let mask = GrayImage::new(200, 150);
        let err = detect_lines(&mask, &ScanConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::InsufficientLines {
                primary: 0,
                secondary: 0
            }
        ));
    }

    #[test]
    fn one_orientation_only_is_insufficient() {
        // A thick horizontal bar only produces near-horizontal edges.
        let mut mask = GrayImage::new(300, 200);
        for y in 90..110 {
            for x in 0..300 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let err = detect_lines(&mask, &ScanConfig::default()).unwrap_err();
        match err {
            ScanError::InsufficientLines { primary, secondary } => {
                assert!(primary > 0);
                assert_eq!(secondary, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
