// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end tests for the scanner on synthetic page photographs.

mod common;

use std::sync::Arc;

use common::{SyntheticPage, blank, cut_off_page, noise};
use image::DynamicImage;
use notescan_core::{
    FailureKind, MAX_OUTPUT_DIMENSION, OutputSize, ScanConfig, ScanError, Strategy,
};
use notescan_scan::{DocumentScanner, FnUnwarper};

fn scanner() -> DocumentScanner {
    DocumentScanner::new(ScanConfig::default()).expect("scanner")
}

#[test]
fn tilted_page_keeps_its_aspect_ratio() {
    let page = SyntheticPage::tilted();
    let out = scanner().rectify_image(&page.render()).expect("rectify");

    assert_eq!(out.width, 595);
    let aspect = out.width as f64 / out.height as f64;
    let error = (aspect - page.aspect()).abs() / page.aspect();
    assert!(error < 0.02, "aspect {aspect:.4} vs {:.4}", page.aspect());
}

#[test]
fn detected_corners_sit_on_the_page_corners() {
    let page = SyntheticPage::tilted();
    let detection = scanner()
        .detect_quadrilateral(&page.render())
        .expect("detect");

    assert_eq!(detection.corners.len(), 4);
    for (found, truth) in detection.quad.points().iter().zip(page.corners()) {
        assert!(
            found.distance(&truth) < 30.0,
            "corner {found:?} too far from {truth:?}"
        );
    }
}

#[test]
fn detection_is_deterministic() {
    let image = SyntheticPage::tilted().render();
    let scanner = scanner();
    let first = scanner.detect_quadrilateral(&image).expect("first");
    let second = scanner.detect_quadrilateral(&image).expect("second");
    assert_eq!(first.corners, second.corners);
    assert_eq!(first.quad, second.quad);
}

#[test]
fn corners_stay_inside_the_margin() {
    let page = SyntheticPage::tilted();
    let config = ScanConfig::default();
    let detection = scanner()
        .detect_quadrilateral(&page.render())
        .expect("detect");

    let (w, h) = (page.width as f64, page.height as f64);
    let m = config.intersection_margin;
    for corner in detection.corners.iter() {
        let p = corner.position;
        assert!(p.x >= -m * w && p.x <= (1.0 + m) * w);
        assert!(p.y >= -m * h && p.y <= (1.0 + m) * h);
    }
}

#[test]
fn blank_photo_has_no_page() {
    let err = scanner().scan_image(&blank(400, 500)).unwrap_err();
    assert!(err.is_detection_failure());
    assert!(matches!(err, ScanError::InsufficientLines { .. }));
}

#[test]
fn pure_noise_never_yields_a_page() {
    let scanner = scanner();
    for seed in 0..6 {
        for colour in [false, true] {
            let image = noise(600, 800, seed, colour);
            match scanner.rectify_image(&image) {
                Ok(page) => panic!(
                    "seed {seed} (colour {colour}) produced a {}x{} page",
                    page.width, page.height
                ),
                Err(err) => assert!(
                    matches!(
                        err,
                        ScanError::InsufficientLines { .. } | ScanError::InsufficientCorners { .. }
                    ),
                    "seed {seed} (colour {colour}) failed with {err}"
                ),
            }
        }
    }
}

#[test]
fn page_with_a_corner_out_of_frame_has_too_few_corners() {
    let err = scanner().rectify_image(&cut_off_page()).unwrap_err();
    assert!(
        matches!(err, ScanError::InsufficientCorners { found: 1..=3 }),
        "unexpected error: {err}"
    );
}

#[test]
fn legacy_preset_pins_the_height() {
    let scanner = DocumentScanner::new(ScanConfig::as_observed()).expect("scanner");
    let page = scanner
        .scan_image(&SyntheticPage::tilted().render())
        .expect("scan");
    assert_eq!(page.height, 842);
    assert!(page.budget_met);
}

#[test]
fn scan_file_writes_a_sanitized_jpeg() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("lecture notes #3.png");
    SyntheticPage::tilted().render().save(&input).expect("save input");
    let out_dir = dir.path().join("processed");

    let report = scanner().scan_file(&input, &out_dir).expect("scan file");

    assert_eq!(report.output, out_dir.join("scan_lecture_notes__3.jpg"));
    assert_eq!(report.strategy, Strategy::Geometric);
    assert!(report.budget_met);
    let written = std::fs::read(&report.output).expect("read output");
    assert_eq!(written.len(), report.bytes);
    assert!(written.len() <= 200 * 1024);

    let decoded = image::load_from_memory(&written).expect("decode output");
    assert_eq!((decoded.width(), decoded.height()), (report.width, report.height));
}

#[test]
fn failed_scan_writes_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("blank.png");
    blank(300, 300).save(&input).expect("save input");
    let out_dir = dir.path().join("processed");

    let err = scanner().scan_file(&input, &out_dir).unwrap_err();
    assert_eq!(err.kind(), FailureKind::InsufficientLines);
    assert!(!out_dir.join("scan_blank.jpg").exists());
}

#[test]
fn missing_corner_writes_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("corner off.png");
    cut_off_page().save(&input).expect("save input");
    let out_dir = dir.path().join("processed");

    let err = scanner().scan_file(&input, &out_dir).unwrap_err();
    assert_eq!(err.kind(), FailureKind::InsufficientCorners);
    assert!(!out_dir.join("scan_corner_off.jpg").exists());
    let written = std::fs::read_dir(&out_dir).map(|d| d.count()).unwrap_or(0);
    assert_eq!(written, 0);
}

#[test]
fn batch_isolates_failures() {
    let dir = tempfile::tempdir().expect("temp dir");
    let good = dir.path().join("good.png");
    let empty = dir.path().join("empty.png");
    let missing = dir.path().join("missing.png");
    SyntheticPage::tilted().render().save(&good).expect("save good");
    blank(300, 300).save(&empty).expect("save empty");
    let out_dir = dir.path().join("out");

    let report = scanner().scan_batch(&[&missing, &good, &empty], &out_dir);

    assert_eq!(report.processed(), 1);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.succeeded[0].input, good);
    let kinds: Vec<FailureKind> = report.failed.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![FailureKind::ImageRead, FailureKind::InsufficientLines]
    );
    assert!(out_dir.join("scan_good.jpg").exists());
}

#[test]
fn boundary_scan_uses_the_injected_unwarper() {
    let config = ScanConfig {
        strategy: Strategy::BoundaryScan,
        output_size: OutputSize::TargetWidth(300),
        ..ScanConfig::default()
    };
    let flatten = FnUnwarper(|img: &DynamicImage| Ok::<_, ScanError>(img.grayscale()));
    let scanner = DocumentScanner::new(config)
        .expect("scanner")
        .with_unwarper(Arc::new(flatten));

    let page = scanner.scan_image(&blank(600, 800)).expect("scan");
    // Nothing to crop on a flat image; only the resize applies.
    assert_eq!((page.width, page.height), (300, 400));
}

#[test]
fn boundary_scan_of_a_sliver_stays_encodable() {
    let config = ScanConfig {
        strategy: Strategy::BoundaryScan,
        output_size: OutputSize::TargetWidth(4),
        ..ScanConfig::default()
    };
    let scanner = DocumentScanner::new(config).expect("scanner");

    // 1 x 20000 scaled to width 4 would be 80000 rows tall.
    let page = scanner.scan_image(&blank(1, 20_000)).expect("scan");
    assert_eq!((page.width, page.height), (4, MAX_OUTPUT_DIMENSION));
    let decoded = image::load_from_memory(&page.jpeg).expect("decode output");
    assert_eq!(decoded.height(), MAX_OUTPUT_DIMENSION);
}

#[test]
fn boundary_scan_reports_unwarp_failures() {
    let config = ScanConfig {
        strategy: Strategy::BoundaryScan,
        ..ScanConfig::default()
    };
    let broken = FnUnwarper(|_: &DynamicImage| Err::<DynamicImage, _>("weights missing"));
    let scanner = DocumentScanner::new(config)
        .expect("scanner")
        .with_unwarper(Arc::new(broken));

    let err = scanner.scan_image(&blank(100, 100)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::UnwarpFailure);
}
