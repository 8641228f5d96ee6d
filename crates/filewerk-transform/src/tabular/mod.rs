// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tabular module — column sniffing, phone normalisation, tag rules, and the
// multi-file CSV normaliser/tagger.

pub mod columns;
pub mod phone;
pub mod processor;
pub mod rules;

pub use columns::{ResolvedColumns, resolve_column, sniff_headers, sniff_roles};
pub use phone::normalize_phone;
pub use processor::TabularProcessor;
pub use rules::evaluate;
