// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tag rule evaluation. Total by construction: a rule that is missing its
// column or match value simply does not fire.

use filewerk_core::types::{RawRow, RuleKind, TagRule};

/// Separator between tags in the output `tags` column.
pub const TAG_SEPARATOR: &str = ", ";

/// Evaluate `rules` in order against one raw row and join the tags that fire.
///
/// Tags are trimmed individually; the result is neither sorted nor
/// deduplicated.
pub fn evaluate(row: &RawRow, rules: &[TagRule]) -> String {
    rules
        .iter()
        .filter(|rule| fires(row, rule))
        .map(|rule| rule.tag.trim())
        .collect::<Vec<_>>()
        .join(TAG_SEPARATOR)
}

/// Whether a single rule contributes its tag for `row`.
pub fn fires(row: &RawRow, rule: &TagRule) -> bool {
    if rule.is_inert() {
        return false;
    }
    match rule.kind {
        RuleKind::Static => true,
        RuleKind::NonEmpty => cell(row, rule.column.as_deref())
            .is_some_and(|value| !value.trim().is_empty()),
        RuleKind::ValueMatch => {
            let Some(needle) = rule
                .match_value
                .as_deref()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
            else {
                return false;
            };
            cell(row, rule.column.as_deref())
                .is_some_and(|value| value.trim().to_lowercase().contains(&needle))
        }
    }
}

fn cell<'r>(row: &'r RawRow, column: Option<&str>) -> Option<&'r str> {
    column.and_then(|name| row.get(name)).map(String::as_str)
}
