//! # Configuration Module
//!
//! Capture settings requested from the audio-analysis feed, and the
//! top-level monitor configuration saved to and loaded from JSON files.

use crate::classifier::ClassifierConfig;
use crate::hit::HitConfig;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Shortest update interval the feed is asked for, in milliseconds.
pub const MIN_INTERVAL_MS: u32 = 50;

/// Longest update interval the feed is asked for, in milliseconds.
pub const MAX_INTERVAL_MS: u32 = 200;

/// Sample encoding requested from the capture subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "pcm_16bit")]
    Pcm16Bit,
}

/// Which features the analysis feed must compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureSet {
    pub pitch: bool,
    pub rms: bool,
    pub energy: bool,
    pub spectral_centroid: bool,
    pub hnr: bool,
}

impl Default for FeatureSet {
    fn default() -> Self {
        FeatureSet {
            pitch: true,
            rms: true,
            energy: true,
            spectral_centroid: true,
            hnr: true,
        }
    }
}

impl FeatureSet {
    /// Names of the enabled features, in feed naming.
    pub fn enabled(&self) -> Vec<&'static str> {
        [
            (self.pitch, "pitch"),
            (self.rms, "rms"),
            (self.energy, "energy"),
            (self.spectral_centroid, "spectralCentroid"),
            (self.hnr, "hnr"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

/// Capture configuration handed to the audio-analysis feed.
///
/// The classifier only needs the scalar features, but they are only
/// produced when the feed is started with these settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: Encoding,
    pub enable_processing: bool,
    /// Update interval in milliseconds
    pub interval: u32,
    /// Analysis interval in milliseconds
    pub interval_analysis: u32,
    pub features: FeatureSet,
}

impl Default for CaptureConfig {
    /// 44.1 kHz mono 16-bit PCM with analysis every 200 ms.
    fn default() -> Self {
        CaptureConfig {
            sample_rate: 44100,
            channels: 1,
            encoding: Encoding::Pcm16Bit,
            enable_processing: true,
            interval: MAX_INTERVAL_MS,
            interval_analysis: MAX_INTERVAL_MS,
            features: FeatureSet::default(),
        }
    }
}

impl CaptureConfig {
    /// Checks that the settings will produce the features the classifier uses.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            bail!("sampleRate must be positive");
        }
        if self.channels != 1 {
            bail!("channels must be 1 (mono), got {}", self.channels);
        }
        if !self.enable_processing {
            bail!("enableProcessing must be on for feature analysis");
        }
        let intervals = [
            ("interval", self.interval),
            ("intervalAnalysis", self.interval_analysis),
        ];
        for (name, value) in intervals {
            if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&value) {
                bail!(
                    "{} must be within {}..={} ms, got {}",
                    name,
                    MIN_INTERVAL_MS,
                    MAX_INTERVAL_MS,
                    value
                );
            }
        }
        if self.features.enabled().is_empty() {
            bail!("at least one feature must be enabled");
        }
        Ok(())
    }
}

/// Everything the monitor needs, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub classifier: ClassifierConfig,
    pub capture: CaptureConfig,
    pub hit: HitConfig,
}

impl MonitorConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing sections and fields fall back to their defaults. The capture
    /// section is validated before returning.
    ///
    /// # Arguments
    /// * `path` - File path to load the configuration from
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config =
            Self::from_json(&data).with_context(|| format!("in config {}", path.display()))?;
        log::info!("[CONFIG] Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn from_json(data: &str) -> Result<Self> {
        let config: MonitorConfig = serde_json::from_str(data).context("parsing config JSON")?;
        config.capture.validate()?;
        config.hit.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON for this configuration.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing config")
    }

    /// Saves the configuration to a JSON file.
    ///
    /// # Arguments
    /// * `path` - File path where the configuration should be saved
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)
            .with_context(|| format!("writing config {}", path.display()))?;
        log::info!("[CONFIG] Saved configuration to {}", path.display());
        Ok(())
    }
}
