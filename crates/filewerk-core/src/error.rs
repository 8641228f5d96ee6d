// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Filewerk.

use thiserror::Error;

/// Top-level error type for all Filewerk operations.
///
/// Every failure is terminal for the operation that raised it. Nothing in the
/// engine retries.
#[derive(Debug, Error)]
pub enum FilewerkError {
    // -- Input --
    #[error("no input files supplied for {0}")]
    NoInput(&'static str),

    #[error("unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Tabular errors --
    #[error("failed to parse {file}: {detail}")]
    Parse { file: String, detail: String },

    #[error("no valid rows found after processing")]
    EmptyResult,

    #[error("CSV output failed: {0}")]
    Csv(String),

    // -- Document errors --
    #[error("failed to load PDF #{index} ({file}): {detail}")]
    Load {
        /// 1-based position of the document in the submitted list.
        index: usize,
        file: String,
        detail: String,
    },

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Image errors --
    #[error("failed to decode image {file}: {detail}")]
    Decode { file: String, detail: String },

    #[error("{format} encoding failed: {detail}")]
    Encode {
        format: &'static str,
        detail: String,
    },

    // -- Runtime / persistence --
    #[error("worker task failed: {0}")]
    Task(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FilewerkError>;
