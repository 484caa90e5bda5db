// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// notescan-scan: Page photograph rectification for Notescan.
//
// Provides image helpers (decode, resize, crop, JPEG encode), the detection
// and rectification stages (binary mask, Hough lines, corner clustering,
// perspective warp, boundary scan) and the `DocumentScanner` that chains them.

pub mod image;
pub mod pipeline;
pub mod scan;

// Re-export the primary structs so callers can use `notescan_scan::DocumentScanner` etc.
pub use crate::image::processor::ImageProcessor;
pub use pipeline::{Detection, DocumentScanner, ScannedPage, sanitize_filename};
pub use scan::encode::EncodedImage;
pub use scan::rectify::RectifiedImage;
pub use scan::unwarp::{FnUnwarper, PassthroughUnwarper, Unwarper};
