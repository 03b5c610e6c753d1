//! # Feed Reader
//!
//! Reads analysis events from a JSON-lines stream and forwards them to the
//! classifier worker. Each line is either a full event (`{"dataPoints": [...]}`)
//! or a bare feature snapshot (`{"pitch": 440.0, "rms": 0.2}`).

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use pitch_core::{AnalysisEvent, AudioFeatureSnapshot};
use serde_json::Value;
use std::io::BufRead;

/// Counts of what the reader saw.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    pub forwarded: usize,
    pub malformed: usize,
}

/// Parses one feed line.
pub fn parse_line(line: &str) -> Result<AnalysisEvent> {
    let value: Value = serde_json::from_str(line).context("invalid JSON")?;
    if value.get("dataPoints").is_some() {
        serde_json::from_value(value).context("invalid analysis event")
    } else {
        let snapshot: AudioFeatureSnapshot =
            serde_json::from_value(value).context("invalid feature snapshot")?;
        Ok(AnalysisEvent::from_snapshot(snapshot))
    }
}

/// Forwards every parsable line of `reader` to `sender`.
///
/// Malformed lines are logged and skipped. Stops early, without error, if
/// the worker has gone away.
pub fn forward_events(reader: impl BufRead, sender: &Sender<AnalysisEvent>) -> Result<FeedStats> {
    let mut stats = FeedStats::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("reading feed input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(event) => {
                if sender.send(event).is_err() {
                    log::warn!("[FEED] Worker stopped; dropping remaining input");
                    break;
                }
                stats.forwarded += 1;
            }
            Err(e) => {
                stats.malformed += 1;
                log::warn!("[FEED] Skipping line {}: {:#}", index + 1, e);
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn accepts_events_and_bare_snapshots() {
        let event = parse_line(r#"{"dataPoints":[{"features":{"pitch":220.0}}]}"#).unwrap();
        assert_eq!(event.latest_features().and_then(|f| f.pitch), Some(220.0));

        let event = parse_line(r#"{"rms":0.2,"spectralCentroid":4000}"#).unwrap();
        let features = event.latest_features().unwrap();
        assert_eq!(features.spectral_centroid, Some(4000.0));
        assert_eq!(features.pitch, None);
    }

    #[test]
    fn malformed_lines_are_counted_not_fatal() {
        let input = "{\"pitch\":440}\n\nnot json\n{\"rms\":\"loud\"}\n{\"dataPoints\":[]}\n";
        let (tx, rx) = crossbeam_channel::unbounded();
        let stats = forward_events(Cursor::new(input), &tx).unwrap();
        assert_eq!(
            stats,
            FeedStats {
                forwarded: 2,
                malformed: 2
            }
        );
        assert_eq!(rx.try_iter().count(), 2);
    }
}
