//! # Musical Tuning Module
//!
//! Maps a frequency onto the nearest equal-tempered note and measures how far
//! off it is in cents. This is the single shared note mapper used by every
//! consumer of the crate.
//!
//! ## Features
//! - Frequency to note name, octave and cents deviation
//! - Configurable concert pitch (A4 reference)
//! - Note name to frequency lookups ("A4", "C#3", "Bb2")
//! - Cent deviation between two arbitrary frequencies

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Standard concert pitch for A4 in Hz.
pub const A4_REFERENCE_HZ: f64 = 440.0;

/// Lowest frequency mapped to a note.
pub const MIN_AUDIBLE_HZ: f64 = 20.0;

/// Highest frequency mapped to a note.
pub const MAX_AUDIBLE_HZ: f64 = 20000.0;

/// Placeholder note name for "no pitch".
pub const NO_NOTE: &str = "--";

/// Pitch-class names, starting at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch-class index lookup for parsing note names.
///
/// Flats are folded onto the sharp spelling of the same pitch class, so
/// "Bb" and "A#" resolve to the same index. "Cb", "Fb", "E#" and "B#" are
/// not accepted.
static PITCH_CLASS_MAP: Lazy<BTreeMap<&'static str, i32>> = Lazy::new(|| {
    let mut map: BTreeMap<&'static str, i32> = NOTE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i as i32))
        .collect();
    for (flat, index) in [("Db", 1), ("Eb", 3), ("Gb", 6), ("Ab", 8), ("Bb", 10)] {
        map.insert(flat, index);
    }
    map
});

/// The nearest tempered note to a frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteResult {
    /// Pitch-class name (e.g. "A", "C#"), or "--" for no pitch
    pub note_name: String,
    /// Scientific pitch octave (A4 = 440 Hz lives in octave 4)
    pub octave: i32,
    /// Signed deviation from the tempered note, in [-50, 50]
    pub cents: i32,
}

impl NoteResult {
    /// The "no result" value returned for invalid input.
    pub fn none() -> Self {
        Self {
            note_name: NO_NOTE.to_string(),
            octave: 0,
            cents: 0,
        }
    }

    /// Whether this is the "no result" value.
    pub fn is_none(&self) -> bool {
        self.note_name == NO_NOTE
    }
}

impl Default for NoteResult {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for NoteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "{}", NO_NOTE)
        } else {
            write!(f, "{}{}", self.note_name, self.octave)
        }
    }
}

/// Frequency of C0 for a given A4 reference.
///
/// C0 sits 57 semitones (4.75 octaves) below A4.
fn c0_frequency(a4_hz: f64) -> f64 {
    a4_hz * 2.0_f64.powf(-4.75)
}

/// Finds the nearest musical note to a frequency using A4 = 440 Hz.
///
/// Frequencies that are non-finite, not positive, or outside the audible
/// range [20, 20000] Hz yield [`NoteResult::none`].
///
/// # Arguments
/// * `frequency_hz` - Input frequency in Hz
///
/// # Returns
/// * `NoteResult` - Note name, octave and cents deviation
pub fn frequency_to_note(frequency_hz: f64) -> NoteResult {
    frequency_to_note_with_reference(frequency_hz, A4_REFERENCE_HZ)
}

/// Finds the nearest musical note to a frequency for a custom concert pitch.
///
/// An invalid reference (non-finite or not positive) yields
/// [`NoteResult::none`], the same as an invalid frequency.
pub fn frequency_to_note_with_reference(frequency_hz: f64, a4_hz: f64) -> NoteResult {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return NoteResult::none();
    }
    if !(MIN_AUDIBLE_HZ..=MAX_AUDIBLE_HZ).contains(&frequency_hz) {
        return NoteResult::none();
    }
    if !a4_hz.is_finite() || a4_hz <= 0.0 {
        return NoteResult::none();
    }

    let c0 = c0_frequency(a4_hz);

    // Nearest semitone above C0.
    let semitones = (12.0 * (frequency_hz / c0).log2()).round();
    if !semitones.is_finite() {
        return NoteResult::none();
    }
    let h = semitones as i32;

    let octave = h.div_euclid(12);
    let pitch_class = h.rem_euclid(12) as usize;

    let exact_freq = c0 * 2.0_f64.powf(h as f64 / 12.0);
    let cents = calculate_cents_deviation(frequency_hz, exact_freq).round();
    if !cents.is_finite() {
        return NoteResult::none();
    }

    NoteResult {
        note_name: NOTE_NAMES[pitch_class].to_string(),
        octave,
        cents: cents as i32,
    }
}

/// Calculates the deviation from a target frequency in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
///
/// # Arguments
/// * `freq` - Measured frequency in Hz
/// * `target_freq` - Target frequency in Hz
///
/// # Returns
/// * Cent deviation (positive = sharp, negative = flat)
pub fn calculate_cents_deviation(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}

/// Splits a note name such as "C#3" into its pitch class and octave.
fn parse_note_name(name: &str) -> Option<(i32, i32)> {
    let name = name.trim();
    let split = name
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(i, _)| i)?;
    let (class, octave) = name.split_at(split);
    let pitch_class = *PITCH_CLASS_MAP.get(class)?;
    let octave: i32 = octave.parse().ok()?;
    Some((pitch_class, octave))
}

/// Gets the equal-tempered frequency of a named note (A4 = 440 Hz).
///
/// # Arguments
/// * `name` - Note name (e.g., "A4", "C#3", "Bb2")
///
/// # Returns
/// * `Some(frequency)` - Frequency in Hz
/// * `None` - The name could not be parsed, or its octave is out of range
pub fn note_frequency(name: &str) -> Option<f64> {
    let (pitch_class, octave) = parse_note_name(name)?;
    let semitones_from_c0 = octave.checked_mul(12)?.checked_add(pitch_class)?;
    Some(c0_frequency(A4_REFERENCE_HZ) * 2.0_f64.powf(semitones_from_c0 as f64 / 12.0))
}
