// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transformation settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FilewerkError, Result};

/// Settings shared by the three processors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Target maximum size of a recompressed image, in bytes (default 5 MiB).
    pub byte_budget: u64,
    /// Fraction of the budget aimed for when rescaling (default 0.95).
    pub safety_margin: f64,
    /// Fraction of the budget below which the quality search pushes quality
    /// back up (default 0.8).
    pub acceptance_floor: f64,
    /// Quality of the first lossy encode (default 0.95).
    pub baseline_quality: f32,
    /// Lowest quality the search will try (default 0.10).
    pub min_quality: f32,
    /// Number of bisection steps (default 10).
    pub search_iterations: u32,
    /// File name of the combined CSV export.
    pub tabular_output_name: String,
    /// File name of the merged PDF.
    pub merged_output_name: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            byte_budget: 5 * 1024 * 1024,
            safety_margin: 0.95,
            acceptance_floor: 0.8,
            baseline_quality: 0.95,
            min_quality: 0.10,
            search_iterations: 10,
            tabular_output_name: "Momence Customers - YM Segment.csv".into(),
            merged_output_name: "Class Schedule.pdf".into(),
        }
    }
}

impl TransformConfig {
    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Same settings with a different image byte budget.
    pub fn with_byte_budget(mut self, byte_budget: u64) -> Self {
        self.byte_budget = byte_budget;
        self
    }

    /// Reject settings the size search cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.byte_budget == 0 {
            return Err(FilewerkError::InvalidConfig("byte_budget must be positive".into()));
        }
        if !(self.safety_margin > 0.0 && self.safety_margin <= 1.0) {
            return Err(FilewerkError::InvalidConfig(format!(
                "safety_margin must be in (0, 1], got {}",
                self.safety_margin
            )));
        }
        if !(self.acceptance_floor > 0.0 && self.acceptance_floor < self.safety_margin) {
            return Err(FilewerkError::InvalidConfig(format!(
                "acceptance_floor must be in (0, safety_margin), got {}",
                self.acceptance_floor
            )));
        }
        if !(self.min_quality > 0.0
            && self.min_quality < self.baseline_quality
            && self.baseline_quality <= 1.0)
        {
            return Err(FilewerkError::InvalidConfig(format!(
                "quality range [{}, {}] is invalid",
                self.min_quality, self.baseline_quality
            )));
        }
        if self.search_iterations == 0 {
            return Err(FilewerkError::InvalidConfig(
                "search_iterations must be at least 1".into(),
            ));
        }
        if self.tabular_output_name.trim().is_empty() || self.merged_output_name.trim().is_empty() {
            return Err(FilewerkError::InvalidConfig("output names must not be blank".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TransformConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.byte_budget, 5_242_880);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TransformConfig = serde_json::from_str(r#"{"byte_budget": 1000}"#).unwrap();
        assert_eq!(config.byte_budget, 1000);
        assert_eq!(config.merged_output_name, "Class Schedule.pdf");
    }

    #[test]
    fn zero_budget_rejected() {
        let config = TransformConfig::default().with_byte_budget(0);
        assert!(matches!(config.validate(), Err(FilewerkError::InvalidConfig(_))));
    }

    #[test]
    fn floor_above_margin_rejected() {
        let config = TransformConfig {
            acceptance_floor: 0.97,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
