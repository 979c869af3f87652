// PPMH CLI - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use std::path::PathBuf;

/// Command errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Codec error: {0}")]
    Codec(#[from] ppmh::PpmhError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Per-position stream needs --model-text to rebuild its model")]
    ModelTextRequired,

    #[error("Roundtrip mismatch at order {order} ({mode})")]
    RoundtripMismatch { order: usize, mode: String },
}

pub type Result<T> = std::result::Result<T, CliError>;
