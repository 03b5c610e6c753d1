//! # Classifier Worker
//!
//! Runs the classifier on a dedicated thread. Analysis events arrive on a
//! crossbeam channel from whatever context the feed delivers them on; each
//! usable event produces one [`PitchReading`] on the output channel.

use crate::PitchReading;
use crate::classifier::PitchClassifier;
use crate::features::AnalysisEvent;
use crossbeam_channel::{Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Handle to the classifier thread.
///
/// Dropping the handle signals shutdown without waiting for the thread.
#[derive(Debug)]
pub struct ClassifierWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ClassifierWorker {
    /// Starts the classifier thread.
    ///
    /// The thread stops when `events` is closed, when the returned receiver
    /// is dropped, or when [`ClassifierWorker::shutdown`] is called.
    ///
    /// # Returns
    /// * `(worker, readings)` - Worker handle and the channel readings arrive on
    pub fn spawn(
        classifier: PitchClassifier,
        events: Receiver<AnalysisEvent>,
    ) -> (ClassifierWorker, Receiver<PitchReading>) {
        let (reading_tx, reading_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

        let thread_handle = thread::spawn(move || {
            log::debug!("[WORKER] Classifier thread started");
            run_loop(&classifier, events, shutdown_rx, reading_tx);
            log::debug!("[WORKER] Classifier thread finished");
        });

        let worker = ClassifierWorker {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        };
        (worker, reading_rx)
    }

    /// Signals the thread to stop and waits for it to finish.
    pub fn shutdown(mut self) {
        let _ = self.shutdown_tx.try_send(());
        self.join();
    }

    /// Waits for the thread to finish on its own, e.g. after the event
    /// channel is closed.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("[WORKER] Classifier thread panicked");
            }
        }
    }
}

impl Drop for ClassifierWorker {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
    }
}

fn run_loop(
    classifier: &PitchClassifier,
    events: Receiver<AnalysisEvent>,
    shutdown_rx: Receiver<()>,
    reading_tx: Sender<PitchReading>,
) {
    let mut skipped = 0usize;
    loop {
        crossbeam_channel::select! {
            recv(events) -> msg => match msg {
                Ok(event) => match event.latest_features() {
                    Some(snapshot) => {
                        let reading = PitchReading::from_snapshot(classifier, snapshot);
                        if reading_tx.send(reading).is_err() {
                            log::debug!("[WORKER] Reading receiver dropped");
                            break;
                        }
                    }
                    None => {
                        skipped += 1;
                        log::trace!("[WORKER] Event without features skipped");
                    }
                },
                Err(_) => {
                    log::debug!("[WORKER] Event channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                log::debug!("[WORKER] Received shutdown signal");
                break;
            },
        }
    }
    if skipped > 0 {
        log::info!("[WORKER] Skipped {} events without features", skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::AudioFeatureSnapshot;
    use std::time::Duration;

    #[test]
    fn shutdown_stops_an_idle_worker() {
        let (_events_tx, events_rx) = crossbeam_channel::unbounded::<AnalysisEvent>();
        let (worker, readings) = ClassifierWorker::spawn(PitchClassifier::new(), events_rx);
        worker.shutdown();
        assert!(readings.recv_timeout(Duration::from_secs(1)).is_err());
    }

    #[test]
    fn empty_events_produce_no_reading() {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (mut worker, readings) = ClassifierWorker::spawn(PitchClassifier::new(), events_rx);
        events_tx.send(AnalysisEvent::default()).unwrap();
        events_tx
            .send(AnalysisEvent::from_snapshot(AudioFeatureSnapshot {
                pitch: Some(440.0),
                ..Default::default()
            }))
            .unwrap();
        drop(events_tx);
        worker.join();

        let all: Vec<PitchReading> = readings.iter().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].note.to_string(), "A4");
    }
}
