//! # Hit Pitch Module
//!
//! Judges readings against a target note for the "Hit Pitch" game mode.
//! A single reading gets a [`Verdict`]; a [`HitTracker`] declares a hit once
//! the player has held the target for enough consecutive frames.

use crate::PitchReading;
use crate::tuning::{self, NoteResult};
use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// How strict the judge is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitConfig {
    /// Maximum |cents| from the target that still counts as on target
    pub tolerance_cents: f64,
    /// Readings below this confidence are not judged
    pub min_confidence: f64,
    /// Consecutive on-target frames needed for a hit
    pub required_frames: usize,
}

impl Default for HitConfig {
    fn default() -> Self {
        HitConfig {
            tolerance_cents: 15.0,
            min_confidence: 0.5,
            required_frames: 5,
        }
    }
}

impl HitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance_cents.is_finite() && self.tolerance_cents >= 0.0) {
            bail!("tolerance_cents must be a non-negative number");
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            bail!("min_confidence must be within 0..=1");
        }
        if self.required_frames == 0 {
            bail!("required_frames must be at least 1");
        }
        Ok(())
    }
}

/// The outcome of judging one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    NoPitch,
    Unsure,
    OnTarget { cents: f64 },
    Sharp { cents: f64 },
    Flat { cents: f64 },
}

impl Verdict {
    pub fn is_on_target(&self) -> bool {
        matches!(self, Verdict::OnTarget { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::NoPitch => write!(f, "no pitch"),
            Verdict::Unsure => write!(f, "unsure"),
            Verdict::OnTarget { cents } => write!(f, "on target ({:+.0} cents)", cents),
            Verdict::Sharp { cents } => write!(f, "sharp ({:+.0} cents)", cents),
            Verdict::Flat { cents } => write!(f, "flat ({:+.0} cents)", cents),
        }
    }
}

/// A note the player is asked to hit.
#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    name: String,
    frequency_hz: f64,
}

impl HitTarget {
    /// Parses a target such as "A4", "C#3" or "Bb2".
    pub fn parse(name: &str) -> Result<Self> {
        let frequency_hz = tuning::note_frequency(name)
            .filter(|f| f.is_finite() && *f > 0.0)
            .ok_or_else(|| anyhow!("unknown note name '{}'", name.trim()))?;
        let note = tuning::frequency_to_note(frequency_hz);
        if note.is_none() {
            bail!("note '{}' is outside the audible range", name.trim());
        }
        Ok(HitTarget {
            name: note.to_string(),
            frequency_hz,
        })
    }

    /// Canonical name, e.g. "A#2" for "Bb2".
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    /// Judges one reading against this target.
    ///
    /// Cents are measured against the target frequency itself, so a reading
    /// an octave off is 1200 cents away rather than in tune.
    pub fn judge(&self, reading: &PitchReading, config: &HitConfig) -> Verdict {
        let estimate = &reading.estimate;
        if estimate.is_silent() || estimate.frequency_hz <= 0.0 {
            return Verdict::NoPitch;
        }
        if estimate.confidence < config.min_confidence {
            return Verdict::Unsure;
        }

        let cents = tuning::calculate_cents_deviation(estimate.frequency_hz, self.frequency_hz);
        if !cents.is_finite() {
            return Verdict::NoPitch;
        }
        if cents.abs() <= config.tolerance_cents {
            Verdict::OnTarget { cents }
        } else if cents > 0.0 {
            Verdict::Sharp { cents }
        } else {
            Verdict::Flat { cents }
        }
    }

    /// Whether a mapped note names this target, ignoring cents.
    pub fn matches_note(&self, note: &NoteResult) -> bool {
        !note.is_none() && note.to_string() == self.name
    }
}

/// Progress towards a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "frames", rename_all = "snake_case")]
pub enum HitState {
    Listening,
    Holding(usize),
    Hit,
}

/// Tracks consecutive on-target readings for one target.
#[derive(Debug, Clone)]
pub struct HitTracker {
    target: HitTarget,
    config: HitConfig,
    stability_buffer: VecDeque<Verdict>,
}

impl HitTracker {
    pub fn new(target: HitTarget, config: HitConfig) -> Self {
        let capacity = config.required_frames.max(1);
        HitTracker {
            target,
            config,
            stability_buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn target(&self) -> &HitTarget {
        &self.target
    }

    /// Judges a reading and updates the streak.
    ///
    /// Any reading that is not on target breaks the streak.
    pub fn push(&mut self, reading: &PitchReading) -> (Verdict, HitState) {
        let verdict = self.target.judge(reading, &self.config);
        if verdict.is_on_target() {
            self.stability_buffer.push_back(verdict);
            if self.stability_buffer.len() > self.config.required_frames.max(1) {
                self.stability_buffer.pop_front();
            }
        } else {
            self.stability_buffer.clear();
        }

        let state = self.state();
        if state == HitState::Hit {
            log::debug!(
                "[HIT] {} held for {} frames",
                self.target.name,
                self.stability_buffer.len()
            );
        }
        (verdict, state)
    }

    pub fn state(&self) -> HitState {
        match self.stability_buffer.len() {
            0 => HitState::Listening,
            n if n >= self.config.required_frames.max(1) => HitState::Hit,
            n => HitState::Holding(n),
        }
    }

    pub fn reset(&mut self) {
        self.stability_buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PitchClassifier;
    use crate::features::AudioFeatureSnapshot;
    use pretty_assertions::assert_eq;

    fn reading(pitch: f64) -> PitchReading {
        PitchReading::from_snapshot(
            &PitchClassifier::new(),
            AudioFeatureSnapshot {
                pitch: Some(pitch),
                rms: Some(0.2),
                ..Default::default()
            },
        )
    }

    fn spectral_reading() -> PitchReading {
        PitchReading::from_snapshot(
            &PitchClassifier::new(),
            AudioFeatureSnapshot {
                rms: Some(0.1),
                energy: Some(5.0),
                spectral_centroid: Some(3666.67),
                ..Default::default()
            },
        )
    }

    #[test]
    fn parses_targets() {
        let target = HitTarget::parse("A4").unwrap();
        assert_eq!(target.name(), "A4");
        assert!((target.frequency_hz() - 440.0).abs() < 1e-9);
        assert_eq!(HitTarget::parse("Bb2").unwrap().name(), "A#2");
        assert!(HitTarget::parse("X9").is_err());
        // C-1 is below 20 Hz.
        assert!(HitTarget::parse("C-1").is_err());
    }

    #[test]
    fn rejects_out_of_range_octaves() {
        assert!(HitTarget::parse("A999999999").is_err());
        assert!(HitTarget::parse("C-999999999").is_err());
        assert!(HitTarget::parse("G#2147483647").is_err());
        // Parses, but lies far above the audible range.
        assert!(HitTarget::parse("A12").is_err());
    }

    #[test]
    fn judges_readings() {
        let target = HitTarget::parse("A4").unwrap();
        let config = HitConfig::default();

        assert!(target.judge(&reading(441.0), &config).is_on_target());
        let sharp = target.judge(&reading(460.0), &config);
        assert!(matches!(sharp, Verdict::Sharp { .. }));
        let flat = target.judge(&reading(420.0), &config);
        assert!(matches!(flat, Verdict::Flat { .. }));

        // An octave up is far sharp, not in tune.
        match target.judge(&reading(880.0), &config) {
            Verdict::Sharp { cents } => assert!((cents - 1200.0).abs() < 1e-6),
            other => panic!("unexpected verdict {other:?}"),
        }

        assert_eq!(target.judge(&PitchReading::default(), &config), Verdict::NoPitch);
        // Spectral estimates carry low confidence.
        assert_eq!(target.judge(&spectral_reading(), &config), Verdict::Unsure);
    }

    #[test]
    fn tracker_declares_hit_after_required_frames() {
        let config = HitConfig {
            required_frames: 3,
            ..Default::default()
        };
        let mut tracker = HitTracker::new(HitTarget::parse("E2").unwrap(), config);
        assert_eq!(tracker.state(), HitState::Listening);

        assert_eq!(tracker.push(&reading(82.4)).1, HitState::Holding(1));
        assert_eq!(tracker.push(&reading(82.6)).1, HitState::Holding(2));
        assert_eq!(tracker.push(&reading(82.3)).1, HitState::Hit);
        assert_eq!(tracker.push(&reading(82.4)).1, HitState::Hit);

        // A miss breaks the streak.
        let (verdict, state) = tracker.push(&reading(98.0));
        assert!(matches!(verdict, Verdict::Sharp { .. }));
        assert_eq!(state, HitState::Listening);

        tracker.push(&reading(82.4));
        tracker.reset();
        assert_eq!(tracker.state(), HitState::Listening);
    }

    #[test]
    fn matches_note_by_name() {
        let target = HitTarget::parse("C4").unwrap();
        assert!(target.matches_note(&tuning::frequency_to_note(262.0)));
        assert!(!target.matches_note(&tuning::frequency_to_note(523.25)));
        assert!(!target.matches_note(&NoteResult::none()));
    }

    #[test]
    fn config_validation() {
        HitConfig::default().validate().unwrap();
        let no_frames = HitConfig {
            required_frames: 0,
            ..Default::default()
        };
        assert!(no_frames.validate().is_err());
        let over_confident = HitConfig {
            min_confidence: 1.5,
            ..Default::default()
        };
        assert!(over_confident.validate().is_err());
        let negative_tolerance = HitConfig {
            tolerance_cents: -1.0,
            ..Default::default()
        };
        assert!(negative_tolerance.validate().is_err());
    }

    #[test]
    fn verdict_display() {
        assert_eq!(Verdict::OnTarget { cents: 3.2 }.to_string(), "on target (+3 cents)");
        assert_eq!(Verdict::Flat { cents: -40.0 }.to_string(), "flat (-40 cents)");
    }
}
