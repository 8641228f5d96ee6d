// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decode/encode, byte-budget search, and size-targeted
// recompression.

pub mod processor;
pub mod recompress;
pub mod search;

pub use processor::ImageProcessor;
pub use recompress::{CodecSurface, recompress, recompress_batch};
pub use search::{Encode, SearchOutcome, SizeSearch};
