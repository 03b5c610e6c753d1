//! # Feature Feed Module
//!
//! Data model for the audio-analysis feed. The feed periodically delivers an
//! [`AnalysisEvent`] holding one or more data points; each point carries the
//! scalar features computed by the host audio subsystem for one frame.
//!
//! Field names follow the feed payload (`spectralCentroid`, `dataPoints`),
//! so events can be deserialized straight from JSON.

use serde::{Deserialize, Serialize};

/// Features measured for a single analysis frame.
///
/// Every field is optional; `None` means "not measured this frame".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeatureSnapshot {
    /// Detected fundamental frequency in Hz
    #[serde(default)]
    pub pitch: Option<f64>,
    /// Root-mean-square amplitude (volume)
    #[serde(default)]
    pub rms: Option<f64>,
    /// Frame energy
    #[serde(default)]
    pub energy: Option<f64>,
    /// Amplitude-weighted mean frequency of the spectrum, in Hz
    #[serde(default)]
    pub spectral_centroid: Option<f64>,
    /// Harmonics-to-noise ratio
    #[serde(default)]
    pub hnr: Option<f64>,
}

impl AudioFeatureSnapshot {
    /// Detected pitch, if present and usable.
    pub fn valid_pitch(&self) -> Option<f64> {
        self.pitch.filter(|p| p.is_finite() && *p > 0.0)
    }

    /// RMS for threshold comparisons; missing or non-finite reads as 0.
    pub fn rms_or_zero(&self) -> f64 {
        finite_or_zero(self.rms)
    }

    /// Energy for threshold comparisons; missing or non-finite reads as 0.
    pub fn energy_or_zero(&self) -> f64 {
        finite_or_zero(self.energy)
    }

    /// Spectral centroid for threshold comparisons; missing reads as 0.
    pub fn spectral_centroid_or_zero(&self) -> f64 {
        finite_or_zero(self.spectral_centroid)
    }

    /// HNR for threshold comparisons; missing reads as 0.
    pub fn hnr_or_zero(&self) -> f64 {
        finite_or_zero(self.hnr)
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// One point of an analysis event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(default)]
    pub features: Option<AudioFeatureSnapshot>,
}

/// A delivery from the audio-analysis feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisEvent {
    #[serde(default)]
    pub data_points: Vec<DataPoint>,
}

impl AnalysisEvent {
    /// Wraps a single snapshot as an event.
    pub fn from_snapshot(snapshot: AudioFeatureSnapshot) -> Self {
        Self {
            data_points: vec![DataPoint {
                features: Some(snapshot),
            }],
        }
    }

    /// Features of the most recent data point.
    ///
    /// Only the last point of a delivery is used; earlier points are stale by
    /// the time the event is handled. Returns `None` for an empty event or
    /// when the last point carries no features.
    pub fn latest_features(&self) -> Option<AudioFeatureSnapshot> {
        self.data_points.last().and_then(|point| point.features)
    }
}
