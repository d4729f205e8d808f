//! Probe-based change detection.
//!
//! Full-region extraction is the expensive part of a pass. The detector
//! samples one dominant color from a small probe region every tick and only
//! lets a full sample through when that color moved by more than a
//! perceptual threshold.

use tracing::debug;

use rgb_everywhere_core::{ColorSample, Region, Result};

use crate::Sampler;

/// Outcome of one probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeDecision {
    /// Whether a full sample and push is warranted
    pub update: bool,
    /// The probe color just taken; the next baseline
    pub probe: ColorSample,
    /// Distance from the previous baseline (None on the first probe)
    pub distance: Option<f32>,
}

/// Compares the probe color across ticks.
///
/// The baseline is owned here and refreshed on every successful probe,
/// whether or not an update fired.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    probe: Region,
    threshold: f32,
    baseline: Option<ColorSample>,
}

impl ChangeDetector {
    /// Create a detector for `probe` with the given ΔE threshold.
    pub fn new(probe: Region, threshold: f32) -> Self {
        Self {
            probe,
            threshold,
            baseline: None,
        }
    }

    /// The probe region.
    pub fn probe(&self) -> &Region {
        &self.probe
    }

    /// The ΔE threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// The current baseline, if one has been taken.
    pub fn baseline(&self) -> Option<ColorSample> {
        self.baseline
    }

    /// Pure decision: no previous sample always updates, otherwise update
    /// when the perceptual distance exceeds `threshold`.
    pub fn decide(
        previous: Option<&ColorSample>,
        current: &ColorSample,
        threshold: f32,
    ) -> ChangeDecision {
        match previous {
            None => ChangeDecision {
                update: true,
                probe: *current,
                distance: None,
            },
            Some(previous) => {
                let distance = previous.perceptual_distance(current);
                ChangeDecision {
                    update: distance > threshold,
                    probe: *current,
                    distance: Some(distance),
                }
            }
        }
    }

    /// Probe the screen and compare against an explicit previous sample.
    ///
    /// Does not touch the stored baseline; the caller threads the returned
    /// `probe` into the next call.
    pub fn evaluate(
        &self,
        sampler: &Sampler,
        previous: Option<&ColorSample>,
    ) -> Result<ChangeDecision> {
        let current = sampler.dominant_color(&self.probe)?;
        Ok(Self::decide(previous, &current, self.threshold))
    }

    /// Probe the screen, compare against the stored baseline, and replace
    /// the baseline with the new probe color.
    ///
    /// On a probe failure the error is returned and the baseline is kept.
    pub fn should_update(&mut self, sampler: &Sampler) -> Result<ChangeDecision> {
        let decision = self.evaluate(sampler, self.baseline.as_ref())?;
        self.record(decision);
        Ok(decision)
    }

    /// Feed an already-taken probe color through the detector.
    pub fn observe(&mut self, current: ColorSample) -> ChangeDecision {
        let decision = Self::decide(self.baseline.as_ref(), &current, self.threshold);
        self.record(decision);
        decision
    }

    /// Forget the baseline so the next probe always updates.
    pub fn reset(&mut self) {
        debug!("Change detector baseline cleared");
        self.baseline = None;
    }

    fn record(&mut self, decision: ChangeDecision) {
        match decision.distance {
            Some(distance) => debug!(
                "Probe {} -> {}: ΔE {:.1} (threshold {:.1}), update={}",
                self.probe, decision.probe, distance, self.threshold, decision.update
            ),
            None => debug!("Probe {} baseline set to {}", self.probe, decision.probe),
        }
        self.baseline = Some(decision.probe);
    }
}
