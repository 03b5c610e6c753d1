use pitch_core::config::MonitorConfig;
use pitch_core::hit::{HitState, HitTarget, HitTracker};
use pitch_core::worker::ClassifierWorker;
use pitch_core::{AnalysisEvent, PitchClassifier, PitchSource};
use pretty_assertions::assert_eq;

const FEED: &str = r#"
{"dataPoints":[{"features":{"rms":0.01,"energy":0.0}}]}
{"dataPoints":[{"features":{"rms":0.3,"energy":0}},{"features":{"pitch":329.63,"rms":0.2,"energy":4}}]}
{"dataPoints":[{"features":{"pitch":329.1,"rms":0.2,"energy":4.0}}]}
{"dataPoints":[]}
{"dataPoints":[{"features":{"rms":0.1,"energy":5.0,"spectralCentroid":5000.0}}]}
{"dataPoints":[{"features":{"pitch":330.5,"rms":0.2,"energy":4.0}}]}
"#;

fn parse_feed() -> Vec<AnalysisEvent> {
    FEED.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn worker_classifies_feed_in_order() {
    let config = MonitorConfig::default();
    let (events_tx, events_rx) = crossbeam_channel::bounded(16);
    let (mut worker, readings) =
        ClassifierWorker::spawn(PitchClassifier::with_config(config.classifier), events_rx);

    for event in parse_feed() {
        events_tx.send(event).unwrap();
    }
    drop(events_tx);
    worker.join();

    let readings: Vec<_> = readings.iter().collect();
    let summary: Vec<(String, PitchSource)> = readings
        .iter()
        .map(|r| (r.note.to_string(), r.estimate.source))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("--".to_string(), PitchSource::Silent),
            ("E4".to_string(), PitchSource::Detected),
            ("E4".to_string(), PitchSource::Detected),
            ("D5".to_string(), PitchSource::SpectralFallback),
            ("E4".to_string(), PitchSource::Detected),
        ]
    );
}

#[test]
fn tracker_follows_worker_output() {
    let config = MonitorConfig::from_json(r#"{ "hit": { "required_frames": 2 } }"#).unwrap();
    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    let (worker, readings) =
        ClassifierWorker::spawn(PitchClassifier::with_config(config.classifier), events_rx);
    let mut tracker = HitTracker::new(HitTarget::parse("E4").unwrap(), config.hit);

    let mut states = Vec::new();
    for event in parse_feed() {
        events_tx.send(event).unwrap();
    }
    for _ in 0..5 {
        let reading = readings
            .recv_timeout(std::time::Duration::from_secs(2))
            .unwrap();
        states.push(tracker.push(&reading).1);
    }
    worker.shutdown();

    assert_eq!(
        states,
        vec![
            HitState::Listening,
            HitState::Holding(1),
            HitState::Hit,
            HitState::Listening,
            HitState::Holding(1),
        ]
    );
}
