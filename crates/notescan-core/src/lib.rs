// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Notescan: Core types, configuration and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CornerSelection, MAX_OUTPUT_DIMENSION, OutputSize, ScanConfig, Strategy};
pub use error::{FailureKind, ScanError};
pub use types::*;
