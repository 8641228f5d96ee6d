// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Phone number canonicalisation. The result doubles as the row identifier in
// the CSV export.

/// Reduce a phone cell to its digits.
///
/// Formatting characters (`+`, whitespace, `-`, `(`, `)`) are dropped first.
/// Everything from the first `.` onwards is then discarded, which removes the
/// `.0` suffix spreadsheets add when a number column is exported as a float.
/// Any remaining non-digit is stripped last.
pub fn normalize_phone(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '+' | '-' | '(' | ')') && !c.is_whitespace())
        .collect();

    let integral = match cleaned.find('.') {
        Some(idx) => &cleaned[..idx],
        None => cleaned.as_str(),
    };

    integral.chars().filter(|c| c.is_ascii_digit()).collect()
}
