// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// filewerk-transform — the Filewerk file transformation engine.
//
// Three independent processors, each a pure function of its inputs:
// CSV normalisation and tagging (multi-file, one combined export), PDF
// merging (pages concatenated in submission order), and size-targeted image
// recompression (quality search with a downscale fallback).

pub mod image;
pub mod pdf;
pub mod tabular;

// Re-export the primary entry points so callers can use
// `filewerk_transform::PdfMerger` etc.
pub use image::{ImageProcessor, SizeSearch, recompress, recompress_batch};
pub use pdf::PdfMerger;
pub use tabular::{TabularProcessor, evaluate, normalize_phone, sniff_headers};
