// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the notescan-scan crate. Covers page detection and
// the full rectify-and-encode path on a synthetic tilted page.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use notescan_core::ScanConfig;
use notescan_scan::DocumentScanner;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 800x1000 photograph of a light 480x680 page turned by 4 degrees on a dark
/// background.
fn tilted_page() -> DynamicImage {
    let (width, height) = (800u32, 1000u32);
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let (sin, cos) = 4.0_f64.to_radians().sin_cos();
    let img = GrayImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as f64 - cx, y as f64 - cy);
        let u = dx * cos + dy * sin;
        let v = -dx * sin + dy * cos;
        if u.abs() <= 240.0 && v.abs() <= 340.0 {
            Luma([235u8])
        } else {
            Luma([25u8])
        }
    });
    DynamicImage::ImageLuma8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_detection(c: &mut Criterion) {
    let scanner = DocumentScanner::new(ScanConfig::default()).expect("scanner");
    let page = tilted_page();

    c.bench_function("detect_quadrilateral (800x1000)", |b| {
        b.iter(|| {
            // Detection failures are part of the measured path too.
            let _ = black_box(scanner.detect_quadrilateral(black_box(&page)));
        });
    });
}

fn bench_scan(c: &mut Criterion) {
    let scanner = DocumentScanner::new(ScanConfig::default()).expect("scanner");
    let page = tilted_page();

    c.bench_function("scan_image (800x1000)", |b| {
        b.iter(|| {
            let _ = black_box(scanner.scan_image(black_box(&page)));
        });
    });
}

criterion_group!(benches, bench_detection, bench_scan);
criterion_main!(benches);
