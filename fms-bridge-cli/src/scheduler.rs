//! Fixed-interval pass scheduling
//!
//! Runs the initial sync once, then a recurring sync every interval. Passes
//! run one after another on the calling thread, so they never overlap. The
//! wait between passes listens on a stop channel; a stop request ends the wait
//! immediately but never interrupts a pass that is already running.

use fms_bridge::{PassSummary, StatusSink, StatusSource, SyncEngine, SyncError};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Counters over the whole lifetime of a scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Passes that completed (initial included)
    pub passes: u64,
    /// Ticks skipped because a pass was still in progress
    pub skipped: u64,
    /// Vehicle failures summed over all passes
    pub vehicle_failures: u64,
}

/// Asks a running scheduler to stop after the current pass
#[derive(Debug, Clone)]
pub struct StopHandle {
    sender: Sender<()>,
}

impl StopHandle {
    pub fn stop(&self) {
        // The scheduler may already be gone; nothing left to stop then
        let _ = self.sender.send(());
    }
}

pub struct Scheduler {
    interval: Duration,
    stop: Receiver<()>,
}

impl Scheduler {
    /// Create a scheduler and the handle that stops it
    ///
    /// Dropping every `StopHandle` also stops the scheduler.
    pub fn new(interval: Duration) -> (Self, StopHandle) {
        let (sender, stop) = mpsc::channel();
        (Self { interval, stop }, StopHandle { sender })
    }

    /// Run passes until stopped
    pub fn run<S, T>(&self, engine: &SyncEngine<S, T>) -> RunStats
    where
        S: StatusSource,
        T: StatusSink,
    {
        let mut stats = RunStats::default();
        record(&mut stats, engine.initial_sync());

        log::info!(
            "Starting sync loop with an interval of {} ms",
            self.interval.as_millis()
        );

        loop {
            match self.stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {
                    log::debug!("Running sync cycle");
                    record(&mut stats, engine.sync());
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Stop requested, leaving sync loop");
                    break;
                }
            }
        }

        stats
    }
}

fn record(stats: &mut RunStats, pass: Result<PassSummary, SyncError>) {
    match pass {
        Ok(summary) => {
            stats.passes += 1;
            stats.vehicle_failures += summary.failed() as u64;
        }
        Err(error) => {
            stats.skipped += 1;
            log::warn!("Sync tick skipped: {}", error);
        }
    }
}
