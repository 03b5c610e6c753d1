// pitch-core/src/lib.rs

//! The core logic for the Hit Pitch tuner.
//! This crate maps frequencies to notes, scores audio-feature snapshots
//! into trusted pitch estimates, and judges them against target notes.
//! It consumes features computed elsewhere and contains no audio capture,
//! DSP, or GUI code.

pub mod classifier;
pub mod config;
pub mod display;
pub mod features;
pub mod hit;
pub mod tuning;
pub mod worker;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use classifier::{
    ClassifierConfig, ConfidencePolicy, PitchClassifier, PitchEstimate, PitchSource,
    estimate_pitch,
};
pub use features::{AnalysisEvent, AudioFeatureSnapshot};
pub use tuning::{NoteResult, frequency_to_note};

/// Represents the result of classifying a single feature snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchReading {
    /// The trust-scored pitch estimate.
    pub estimate: PitchEstimate,
    /// The nearest note to the estimated frequency.
    pub note: NoteResult,
    /// Input level in [0, 1] for a level meter.
    pub audio_level: f64,
    /// The snapshot this reading was derived from.
    pub features: AudioFeatureSnapshot,
}

impl PitchReading {
    /// Classifies a snapshot and maps the result to a note.
    pub fn from_snapshot(classifier: &PitchClassifier, features: AudioFeatureSnapshot) -> Self {
        let estimate = classifier.estimate(&features);
        let note = if estimate.is_silent() {
            NoteResult::none()
        } else {
            tuning::frequency_to_note(estimate.frequency_hz)
        };
        PitchReading {
            estimate,
            note,
            audio_level: display::audio_level(features.rms),
            features,
        }
    }
}

impl fmt::Display for PitchReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<4} {:>17}  {}",
            self.note.to_string(),
            display::format_frequency(self.estimate.frequency_hz),
            display::format_confidence(self.estimate.confidence)
        )?;
        if !self.estimate.is_silent() {
            if let Some(cents) = display::format_cents(self.note.cents) {
                write!(f, "  {}", cents)?;
            }
        }
        if self.estimate.source == PitchSource::SpectralFallback {
            write!(f, "  (estimated)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_from_detected_pitch() {
        let reading = PitchReading::from_snapshot(
            &PitchClassifier::new(),
            AudioFeatureSnapshot {
                pitch: Some(445.0),
                rms: Some(0.0004),
                ..Default::default()
            },
        );
        assert_eq!(reading.note.to_string(), "A4");
        assert_eq!(reading.note.cents, 20);
        assert!((reading.audio_level - 0.4).abs() < 1e-9);
        let line = reading.to_string();
        assert!(line.starts_with("A4"));
        assert!(line.contains("445.0 Hz"));
        assert!(line.contains("Confidence: 90%"));
        assert!(line.contains("+20 cents"));
    }

    #[test]
    fn silent_reading_shows_no_note() {
        let reading =
            PitchReading::from_snapshot(&PitchClassifier::new(), AudioFeatureSnapshot::default());
        assert!(reading.note.is_none());
        let line = reading.to_string();
        assert!(line.starts_with("--"));
        assert!(line.contains("No pitch detected"));
        assert!(!line.contains("cents"));
    }

    #[test]
    fn spectral_reading_is_marked_estimated() {
        let reading = PitchReading::from_snapshot(
            &PitchClassifier::new(),
            AudioFeatureSnapshot {
                rms: Some(0.1),
                energy: Some(5.0),
                spectral_centroid: Some(5000.0),
                ..Default::default()
            },
        );
        assert_eq!(reading.note.to_string(), "D5");
        assert!(reading.to_string().ends_with("(estimated)"));
    }
}
