//! # Pitch Confidence Classifier
//!
//! Turns a feature snapshot into a trust-scored pitch estimate.
//!
//! The upstream detector's pitch is trusted whenever it is present. When it
//! is missing but the frame is clearly not silence, a rough fundamental is
//! estimated from the spectral centroid. That estimate is an empirical,
//! instrument-specific heuristic (tuned on piano), not a physical law, so
//! every threshold involved lives in [`ClassifierConfig`].
//!
//! The classifier keeps no state between calls: each snapshot is scored
//! from scratch.

use crate::features::AudioFeatureSnapshot;
use serde::{Deserialize, Serialize};

/// Where a pitch estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchSource {
    /// The upstream detector reported a pitch
    Detected,
    /// Estimated from the spectral centroid
    SpectralFallback,
    /// No pitch: silence or nothing usable
    Silent,
}

/// A pitch estimate with a confidence score in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchEstimate {
    /// Estimated fundamental in Hz, 0 when there is none
    pub frequency_hz: f64,
    /// Trust in the estimate, 0 when there is none
    pub confidence: f64,
    pub source: PitchSource,
}

impl PitchEstimate {
    /// The "silence / no input" estimate.
    pub const SILENT: PitchEstimate = PitchEstimate {
        frequency_hz: 0.0,
        confidence: 0.0,
        source: PitchSource::Silent,
    };

    pub fn is_silent(&self) -> bool {
        self.source == PitchSource::Silent
    }
}

impl Default for PitchEstimate {
    fn default() -> Self {
        Self::SILENT
    }
}

/// How confidence is assigned to a non-silent estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfidencePolicy {
    /// Fixed trust levels: `high` for a detected pitch, `low` for a
    /// spectral estimate. This is the default policy.
    FixedLevels { high: f64, low: f64 },
    /// Confidence derived from tonality and loudness:
    /// `clamp01((clamp01(hnr / hnr_full_scale) + clamp01(energy * energy_gain)) / 2)`.
    HarmonicEnergy { hnr_full_scale: f64, energy_gain: f64 },
}

impl ConfidencePolicy {
    pub const DEFAULT_HIGH: f64 = 0.9;
    pub const DEFAULT_LOW: f64 = 0.3;

    /// The alternative policy with its usual scaling.
    pub fn harmonic_energy() -> Self {
        ConfidencePolicy::HarmonicEnergy {
            hnr_full_scale: 20.0,
            energy_gain: 50.0,
        }
    }

    fn score(&self, source: PitchSource, snapshot: &AudioFeatureSnapshot) -> f64 {
        match (*self, source) {
            (_, PitchSource::Silent) => 0.0,
            (ConfidencePolicy::FixedLevels { high, .. }, PitchSource::Detected) => clamp01(high),
            (ConfidencePolicy::FixedLevels { low, .. }, PitchSource::SpectralFallback) => {
                clamp01(low)
            }
            (
                ConfidencePolicy::HarmonicEnergy {
                    hnr_full_scale,
                    energy_gain,
                },
                _,
            ) => {
                let hnr_confidence = if hnr_full_scale > 0.0 {
                    clamp01(snapshot.hnr_or_zero() / hnr_full_scale)
                } else {
                    0.0
                };
                let energy_confidence = clamp01(snapshot.energy_or_zero() * energy_gain);
                clamp01((hnr_confidence + energy_confidence) / 2.0)
            }
        }
    }
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        ConfidencePolicy::FixedLevels {
            high: Self::DEFAULT_HIGH,
            low: Self::DEFAULT_LOW,
        }
    }
}

/// Thresholds and constants for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// RMS above which a frame counts as active
    pub activity_rms_threshold: f64,
    /// Energy above which a frame counts as active
    pub activity_energy_threshold: f64,
    /// Lower bound (exclusive) of the accepted spectral centroid band, Hz
    pub min_centroid_hz: f64,
    /// Upper bound (exclusive) of the accepted spectral centroid band, Hz
    pub max_centroid_hz: f64,
    /// Minimum energy (exclusive) for attempting a spectral estimate
    pub fallback_min_energy: f64,
    /// Multiplier from spectral centroid to estimated fundamental
    pub estimate_factor: f64,
    /// Lowest accepted spectral estimate (inclusive), Hz
    pub min_estimate_hz: f64,
    /// Highest accepted spectral estimate (inclusive), Hz
    pub max_estimate_hz: f64,
    pub policy: ConfidencePolicy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            activity_rms_threshold: 0.05,
            activity_energy_threshold: 3.0,
            min_centroid_hz: 400.0,
            max_centroid_hz: 15000.0,
            fallback_min_energy: 3.0,
            estimate_factor: 0.12,
            min_estimate_hz: 80.0,
            max_estimate_hz: 2000.0,
            policy: ConfidencePolicy::default(),
        }
    }
}

/// Rule-based pitch classifier over audio features.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PitchClassifier {
    config: ClassifierConfig,
}

impl PitchClassifier {
    /// Create a classifier with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom configuration
    pub fn with_config(config: ClassifierConfig) -> Self {
        PitchClassifier { config }
    }

    /// Current thresholds and confidence policy.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Whether the frame carries enough signal to attempt an estimate.
    pub fn has_activity(&self, snapshot: &AudioFeatureSnapshot) -> bool {
        snapshot.rms_or_zero() > self.config.activity_rms_threshold
            || snapshot.energy_or_zero() > self.config.activity_energy_threshold
    }

    /// Scores a snapshot.
    ///
    /// 1. A usable detected pitch is returned as-is.
    /// 2. Without activity the result is [`PitchEstimate::SILENT`].
    /// 3. Otherwise the spectral centroid fallback is tried; an estimate
    ///    outside the accepted range is also silent.
    pub fn estimate(&self, snapshot: &AudioFeatureSnapshot) -> PitchEstimate {
        if let Some(pitch) = snapshot.valid_pitch() {
            return self.scored(pitch, PitchSource::Detected, snapshot);
        }

        if !self.has_activity(snapshot) {
            return PitchEstimate::SILENT;
        }

        match self.spectral_estimate(snapshot) {
            Some(estimated) => {
                log::trace!(
                    "[CLASSIFIER] Spectral estimate {:.1} Hz from centroid {:.1} Hz",
                    estimated,
                    snapshot.spectral_centroid_or_zero()
                );
                self.scored(estimated, PitchSource::SpectralFallback, snapshot)
            }
            None => PitchEstimate::SILENT,
        }
    }

    fn spectral_estimate(&self, snapshot: &AudioFeatureSnapshot) -> Option<f64> {
        let cfg = &self.config;
        let centroid = snapshot.spectral_centroid_or_zero();
        let in_band = centroid > cfg.min_centroid_hz && centroid < cfg.max_centroid_hz;
        if !in_band || snapshot.energy_or_zero() <= cfg.fallback_min_energy {
            return None;
        }

        let estimated = centroid * cfg.estimate_factor;
        let in_range = estimated.is_finite()
            && estimated >= cfg.min_estimate_hz
            && estimated <= cfg.max_estimate_hz;
        in_range.then_some(estimated)
    }

    fn scored(
        &self,
        frequency_hz: f64,
        source: PitchSource,
        snapshot: &AudioFeatureSnapshot,
    ) -> PitchEstimate {
        PitchEstimate {
            frequency_hz,
            confidence: self.config.policy.score(source, snapshot),
            source,
        }
    }
}

/// Scores a snapshot with the default configuration.
pub fn estimate_pitch(snapshot: &AudioFeatureSnapshot) -> PitchEstimate {
    PitchClassifier::new().estimate(snapshot)
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
