// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Notescan.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all Notescan operations.
///
/// Every variant is terminal for the image being processed. Detection
/// failures are routine on noisy photographs and travel as ordinary values.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Input --
    #[error("could not read image: {0}")]
    ImageRead(String),

    // -- Detection --
    #[error("insufficient lines: {primary} primary, {secondary} secondary")]
    InsufficientLines { primary: usize, secondary: usize },

    #[error("insufficient corners: {found} cluster(s), need 4")]
    InsufficientCorners { found: usize },

    #[error("degenerate quadrilateral (area {area:.2} px²)")]
    DegenerateQuadrilateral { area: f64 },

    // -- Boundary-scan strategy --
    #[error("unwarping failed: {0}")]
    UnwarpFailure(String),

    // -- Output --
    #[error("JPEG encoding failed: {0}")]
    Encode(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Serializable tag for a [`ScanError`], used in batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ImageRead,
    InsufficientLines,
    InsufficientCorners,
    DegenerateQuadrilateral,
    UnwarpFailure,
    Encode,
    InvalidConfig,
    Io,
    Serialization,
}

impl ScanError {
    /// The tag of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            ScanError::ImageRead(_) => FailureKind::ImageRead,
            ScanError::InsufficientLines { .. } => FailureKind::InsufficientLines,
            ScanError::InsufficientCorners { .. } => FailureKind::InsufficientCorners,
            ScanError::DegenerateQuadrilateral { .. } => FailureKind::DegenerateQuadrilateral,
            ScanError::UnwarpFailure(_) => FailureKind::UnwarpFailure,
            ScanError::Encode(_) => FailureKind::Encode,
            ScanError::InvalidConfig(_) => FailureKind::InvalidConfig,
            ScanError::Io(_) => FailureKind::Io,
            ScanError::Serialization(_) => FailureKind::Serialization,
        }
    }

    /// True for the "no page found" outcomes of the geometric detector.
    pub fn is_detection_failure(&self) -> bool {
        matches!(
            self,
            ScanError::InsufficientLines { .. }
                | ScanError::InsufficientCorners { .. }
                | ScanError::DegenerateQuadrilateral { .. }
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
