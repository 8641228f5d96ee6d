// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Byte-budget search — finds an encoding quality (and, failing that, a
// downscale) that brings an image under a size budget. Independent of any
// codec: the backend is reached only through the `Encode` trait.

use filewerk_core::TransformConfig;
use filewerk_core::error::Result;
use filewerk_core::types::ImageTarget;
use tracing::{debug, info, instrument, warn};

/// Quality used for lossless targets, which ignore it.
pub const LOSSLESS_QUALITY: f32 = 1.0;

/// The encoding backend driven by [`SizeSearch`].
pub trait Encode {
    /// Encode the current surface at `quality` (0.0-1.0).
    fn encode(&mut self, quality: f32) -> Result<Vec<u8>>;

    /// Replace the current surface with the native image scaled by `scale`
    /// (`round(width * scale)` x `round(height * scale)`).
    fn rescale(&mut self, scale: f64) -> Result<()>;
}

/// Result of a search run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub bytes: Vec<u8>,
    /// Quality of the returned encoding.
    pub quality: f32,
    /// Geometric scale applied to the native image (1.0 when untouched).
    pub scale: f64,
    /// Number of encode calls made.
    pub encodes: u32,
}

impl SearchOutcome {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Where one encoding falls relative to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    /// Larger than the budget: lower the quality.
    Over,
    /// Below the acceptance floor: there is room to raise the quality.
    Under,
    /// Inside `[floor, budget]`: good enough.
    Accept,
}

/// Bounded search over encoding quality with a single geometric fallback.
#[derive(Debug, Clone)]
pub struct SizeSearch {
    budget: u64,
    safety_margin: f64,
    acceptance_floor: f64,
    baseline_quality: f32,
    min_quality: f32,
    iterations: u32,
}

impl SizeSearch {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            budget: config.byte_budget,
            safety_margin: config.safety_margin,
            acceptance_floor: config.acceptance_floor,
            baseline_quality: config.baseline_quality,
            min_quality: config.min_quality,
            iterations: config.search_iterations,
        }
    }

    /// Run the search appropriate for `target`.
    pub fn run<E: Encode>(&self, encoder: &mut E, target: ImageTarget) -> Result<SearchOutcome> {
        if target.is_lossless() {
            self.run_lossless(encoder)
        } else {
            self.run_lossy(encoder)
        }
    }

    /// One encode; if it is over budget, one downscale and one more encode.
    #[instrument(skip_all, fields(budget = self.budget))]
    pub fn run_lossless<E: Encode>(&self, encoder: &mut E) -> Result<SearchOutcome> {
        let bytes = encoder.encode(LOSSLESS_QUALITY)?;
        let mut outcome = SearchOutcome {
            bytes,
            quality: LOSSLESS_QUALITY,
            scale: 1.0,
            encodes: 1,
        };

        if self.fits(outcome.size()) {
            debug!(size = outcome.size(), "Lossless encode within budget");
            return Ok(outcome);
        }

        self.rescale_once(encoder, &mut outcome)?;
        Ok(outcome)
    }

    /// Baseline encode, then bisection over quality, then a downscale if the
    /// last encode is still over budget.
    #[instrument(skip_all, fields(budget = self.budget))]
    pub fn run_lossy<E: Encode>(&self, encoder: &mut E) -> Result<SearchOutcome> {
        let mut quality = self.baseline_quality;
        let mut bytes = encoder.encode(quality)?;
        let mut encodes = 1;
        debug!(quality, size = bytes.len(), "Baseline encode");

        if !self.fits(bytes.len() as u64) {
            let (mut lo, mut hi) = (self.min_quality, self.baseline_quality);
            for iteration in 0..self.iterations {
                quality = (lo + hi) / 2.0;
                bytes = encoder.encode(quality)?;
                encodes += 1;

                let fit = self.classify(bytes.len() as u64);
                debug!(iteration, quality, size = bytes.len(), ?fit, "Search step");
                match fit {
                    Fit::Over => hi = quality,
                    Fit::Under => lo = quality,
                    Fit::Accept => break,
                }
            }
        }

        let mut outcome = SearchOutcome {
            bytes,
            quality,
            scale: 1.0,
            encodes,
        };
        if !self.fits(outcome.size()) {
            self.rescale_once(encoder, &mut outcome)?;
        }

        info!(
            quality = outcome.quality,
            scale = outcome.scale,
            size = outcome.size(),
            encodes = outcome.encodes,
            "Lossy search finished"
        );
        Ok(outcome)
    }

    /// Scale factor expected to bring an encoding of `size` bytes to
    /// `budget * safety_margin`, assuming size grows with pixel area.
    pub fn fallback_scale(&self, size: u64) -> f64 {
        if size == 0 {
            return 1.0;
        }
        let ratio = self.budget as f64 * self.safety_margin / size as f64;
        ratio.sqrt().min(1.0)
    }

    fn rescale_once<E: Encode>(&self, encoder: &mut E, outcome: &mut SearchOutcome) -> Result<()> {
        let scale = self.fallback_scale(outcome.size());
        debug!(size = outcome.size(), scale, "Over budget, downscaling");

        encoder.rescale(scale)?;
        outcome.bytes = encoder.encode(outcome.quality)?;
        outcome.scale = scale;
        outcome.encodes += 1;

        if !self.fits(outcome.size()) {
            warn!(
                size = outcome.size(),
                budget = self.budget,
                "Still over budget after downscale; returning best effort"
            );
        }
        Ok(())
    }

    fn fits(&self, size: u64) -> bool {
        size <= self.budget
    }

    fn classify(&self, size: u64) -> Fit {
        if size > self.budget {
            Fit::Over
        } else if (size as f64) < self.budget as f64 * self.acceptance_floor {
            Fit::Under
        } else {
            Fit::Accept
        }
    }
}
