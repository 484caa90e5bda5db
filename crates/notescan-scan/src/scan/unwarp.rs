// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page unwarping seam for the boundary-scan strategy. The model itself lives
// outside this crate; callers inject it through the `Unwarper` trait.

use image::DynamicImage;
use notescan_core::error::ScanError;

/// Flattens a curved or folded page photograph.
///
/// Implementations report their own failures as
/// [`ScanError::UnwarpFailure`].
pub trait Unwarper: Send + Sync {
    fn unwarp(&self, image: &DynamicImage) -> Result<DynamicImage, ScanError>;
}

/// For input that is already flat.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughUnwarper;

impl Unwarper for PassthroughUnwarper {
    fn unwarp(&self, image: &DynamicImage) -> Result<DynamicImage, ScanError> {
        Ok(image.clone())
    }
}

/// Adapts a closure to [`Unwarper`]. Closure errors are reported as
/// `UnwarpFailure` with the error's display text.
pub struct FnUnwarper<F>(pub F);

impl<F, E> Unwarper for FnUnwarper<F>
where
    F: Fn(&DynamicImage) -> Result<DynamicImage, E> + Send + Sync,
    E: std::fmt::Display,
{
    fn unwarp(&self, image: &DynamicImage) -> Result<DynamicImage, ScanError> {
        (self.0)(image).map_err(|err| ScanError::UnwarpFailure(err.to_string()))
    }
}
