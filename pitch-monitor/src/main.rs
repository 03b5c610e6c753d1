//! # Pitch Monitor
//!
//! Headless front end for the Hit Pitch core. It reads feature snapshots
//! delivered by an audio-analysis feed (JSON lines), classifies them on a
//! dedicated worker thread, and prints one reading per event.
//!
//! ## Architecture
//! - **Main Thread**: reads the feed and forwards events to the worker
//! - **Printer Thread**: renders readings as text or JSON lines
//! - **Worker Thread**: runs the classifier
//! - **Communication**: Crossbeam channels between all three

mod feed;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use pitch_core::{
    NoteResult, PitchClassifier, PitchReading,
    config::MonitorConfig,
    display::{self, CentsAccuracy},
    hit::{HitState, HitTarget, HitTracker, Verdict},
    tuning,
    worker::ClassifierWorker,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

/// Pitch Monitor - note and confidence readings from audio features
#[derive(Parser)]
#[command(name = "pitch-monitor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a feature feed and print a reading per event
    Run {
        /// JSON-lines feed to read (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Configuration file (see `pitch-monitor config`)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Target note to hit, e.g. A4 or C#3
        #[arg(short, long)]
        target: Option<String>,

        /// Output one JSON object per reading
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration as JSON
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Map frequencies in Hz to notes
    Note {
        /// Frequencies to map
        #[arg(required = true, allow_negative_numbers = true)]
        frequencies: Vec<f64>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            input,
            config,
            target,
            json,
        } => run(input, config, target, json),
        Commands::Config { output } => print_config(output),
        Commands::Note { frequencies } => print_notes(&frequencies),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("[MONITOR] {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the feed through the classifier worker until the input ends.
fn run(
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    target: Option<String>,
    json: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => MonitorConfig::load(&path)?,
        None => MonitorConfig::default(),
    };
    let tracker = target
        .as_deref()
        .map(|name| HitTarget::parse(name).map(|t| HitTracker::new(t, config.hit)))
        .transpose()?;
    if let Some(tracker) = &tracker {
        log::info!(
            "[MONITOR] Target {} ({:.2} Hz)",
            tracker.target().name(),
            tracker.target().frequency_hz()
        );
    }

    let classifier = PitchClassifier::with_config(config.classifier);
    let thresholds = classifier.config();
    log::info!(
        "[MONITOR] Activity above rms {} or energy {}, policy {:?}",
        thresholds.activity_rms_threshold,
        thresholds.activity_energy_threshold,
        thresholds.policy
    );

    let (events_tx, events_rx) = crossbeam_channel::bounded(64);
    let (mut worker, readings) = ClassifierWorker::spawn(classifier, events_rx);
    let printer = thread::spawn(move || print_readings(readings, tracker, json));

    let stats = match input {
        Some(path) => {
            let file =
                File::open(&path).with_context(|| format!("opening feed {}", path.display()))?;
            feed::forward_events(BufReader::new(file), &events_tx)?
        }
        None => feed::forward_events(io::stdin().lock(), &events_tx)?,
    };
    drop(events_tx);
    worker.join();

    let printed = match printer.join() {
        Ok(result) => result?,
        Err(_) => bail!("printer thread panicked"),
    };
    log::info!(
        "[MONITOR] {} events forwarded, {} malformed lines, {} readings printed",
        stats.forwarded,
        stats.malformed,
        printed
    );
    Ok(())
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    reading: &'a PitchReading,
    #[serde(skip_serializing_if = "Option::is_none")]
    verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hit: Option<HitState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note_accuracy: Option<CentsAccuracy>,
}

/// Accuracy tier of the mapped note when it names the target note.
fn note_accuracy(target: &HitTarget, note: &NoteResult) -> Option<CentsAccuracy> {
    target
        .matches_note(note)
        .then(|| CentsAccuracy::from_cents(note.cents))
}

fn accuracy_label(accuracy: CentsAccuracy) -> &'static str {
    match accuracy {
        CentsAccuracy::InTune => "in tune",
        CentsAccuracy::Close => "close",
        CentsAccuracy::Off => "off",
    }
}

fn print_readings(
    readings: Receiver<PitchReading>,
    mut tracker: Option<HitTracker>,
    json: bool,
) -> Result<usize> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut printed = 0;

    for reading in readings.iter() {
        let judged = tracker.as_mut().map(|t| t.push(&reading));
        let accuracy = tracker
            .as_ref()
            .and_then(|t| note_accuracy(t.target(), &reading.note));
        if json {
            let line = JsonLine {
                reading: &reading,
                verdict: judged.map(|(v, _)| v),
                hit: judged.map(|(_, s)| s),
                note_accuracy: accuracy,
            };
            serde_json::to_writer(&mut out, &line)?;
            writeln!(out)?;
        } else {
            write!(out, "{}", reading)?;
            if let Some((verdict, state)) = judged {
                write!(out, "  | {}", verdict)?;
                if let Some(accuracy) = accuracy {
                    write!(out, "  [{}]", accuracy_label(accuracy))?;
                }
                match state {
                    HitState::Hit => write!(out, "  HIT!")?,
                    HitState::Holding(n) => write!(out, "  holding {}", n)?,
                    HitState::Listening => {}
                }
            }
            writeln!(out)?;
        }
        printed += 1;
    }
    out.flush()?;
    Ok(printed)
}

/// Prints or saves the default configuration.
fn print_config(output: Option<PathBuf>) -> Result<()> {
    let config = MonitorConfig::default();
    match output {
        Some(path) => config.save(&path),
        None => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn print_notes(frequencies: &[f64]) -> Result<()> {
    for &frequency in frequencies {
        let note = tuning::frequency_to_note(frequency);
        match display::format_cents(note.cents) {
            Some(cents) if !note.is_none() => {
                println!("{:>10.2} Hz  {}  {}", frequency, note, cents)
            }
            _ => println!("{:>10.2} Hz  {}", frequency, note),
        }
    }
    Ok(())
}
