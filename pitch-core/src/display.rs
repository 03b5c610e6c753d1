//! # Display Helpers
//!
//! Text and color-tier helpers for presenting readings: note name and
//! octave, frequency with one decimal, signed cents and a confidence
//! percentage.

use serde::{Deserialize, Serialize};

/// Formats a frequency for display, one decimal place.
pub fn format_frequency(frequency_hz: f64) -> String {
    if frequency_hz.is_finite() && frequency_hz > 0.0 {
        format!("{:.1} Hz", frequency_hz)
    } else {
        "No pitch detected".to_string()
    }
}

/// Formats a cents deviation with an explicit sign.
///
/// Returns `None` when the deviation is zero; an exact match shows no badge.
pub fn format_cents(cents: i32) -> Option<String> {
    match cents {
        0 => None,
        c if c > 0 => Some(format!("+{} cents", c)),
        c => Some(format!("{} cents", c)),
    }
}

/// Formats a confidence in [0, 1] as a whole percentage.
pub fn format_confidence(confidence: f64) -> String {
    let confidence = if confidence.is_finite() { confidence } else { 0.0 };
    format!("Confidence: {:.0}%", confidence * 100.0)
}

/// Input level in [0, 1] for a level meter, scaled up from RMS.
pub fn audio_level(rms: Option<f64>) -> f64 {
    match rms {
        Some(r) if r.is_finite() && r > 0.0 => (r * 1000.0).min(1.0),
        _ => 0.0,
    }
}

/// Color tier for a confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            ConfidenceLevel::High
        } else if confidence > 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Hex color used by the pitch display.
    pub fn color(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "#4CAF50",
            ConfidenceLevel::Medium => "#FF9800",
            ConfidenceLevel::Low => "#F44336",
        }
    }
}

/// Color tier for how close a reading is to the tempered note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentsAccuracy {
    InTune,
    Close,
    Off,
}

impl CentsAccuracy {
    pub fn from_cents(cents: i32) -> Self {
        match cents.unsigned_abs() {
            0..=5 => CentsAccuracy::InTune,
            6..=15 => CentsAccuracy::Close,
            _ => CentsAccuracy::Off,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            CentsAccuracy::InTune => "#4CAF50",
            CentsAccuracy::Close => "#FF9800",
            CentsAccuracy::Off => "#F44336",
        }
    }
}
