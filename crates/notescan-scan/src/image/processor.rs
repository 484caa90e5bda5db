// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, aspect-preserving resize, row cropping and JPEG
// encoding. Operates on in-memory images using the `image` crate.

use image::DynamicImage;
use image::imageops::FilterType;
use notescan_core::{MAX_OUTPUT_DIMENSION, OutputSize};
use notescan_core::error::ScanError;
use tracing::{debug, info, instrument};

/// Image processing steps shared by both rectification strategies.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let jpeg = ImageProcessor::open("page.jpg")?
///     .crop_rows(40, 1900)
///     .resize_to(OutputSize::TargetWidth(595))
///     .to_jpeg_bytes(90)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, ScanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ScanError::ImageRead(format!("failed to open {}: {}", path.as_ref().display(), err))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanError> {
        let img = image::load_from_memory(data)
            .map_err(|err| ScanError::ImageRead(format!("failed to decode image: {}", err)))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize so the pinned dimension matches `size`, preserving aspect ratio.
    /// Uses Lanczos3 filtering.
    #[instrument(skip(self))]
    pub fn resize_to(self, size: OutputSize) -> Self {
        let (width, height) = scaled_dimensions(self.width(), self.height(), size);
        if (width, height) == (self.width(), self.height()) {
            return self;
        }
        info!(
            from_w = self.width(),
            from_h = self.height(),
            width,
            height,
            "Resizing image"
        );
        let resized = self.image.resize_exact(width, height, FilterType::Lanczos3);
        Self { image: resized }
    }

    /// Keep rows `[top, bottom)`, clamped to the image. An empty or inverted
    /// range leaves the image unchanged.
    #[instrument(skip(self))]
    pub fn crop_rows(self, top: u32, bottom: u32) -> Self {
        let bottom = bottom.min(self.height());
        if top >= bottom || (top == 0 && bottom == self.height()) {
            return self;
        }
        debug!(top, bottom, "Cropping rows");
        let cropped = self.image.crop_imm(0, top, self.width(), bottom - top);
        Self { image: cropped }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, ScanError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ScanError::Encode(format!("quality {}: {}", quality, err)))?;
        Ok(buffer)
    }
}

/// Output dimensions for an image of `width` x `height` scaled so the pinned
/// dimension of `size` is met exactly. The free dimension is rounded and
/// kept within `1..=MAX_OUTPUT_DIMENSION`.
pub fn scaled_dimensions(width: u32, height: u32, size: OutputSize) -> (u32, u32) {
    let follow = |free: u32, pinned_src: u32, pinned_dst: u32| -> u32 {
        if pinned_src == 0 {
            return 1;
        }
        let scaled = (free as f64 * pinned_dst as f64 / pinned_src as f64).round();
        (scaled.min(MAX_OUTPUT_DIMENSION as f64) as u32).max(1)
    };
    match size {
        OutputSize::TargetWidth(w) => (w, follow(height, width, w)),
        OutputSize::TargetHeight(h) => (follow(width, height, h), h),
    }
}
