// Scan scheduler
//
// Runs one full scan at startup, then alternates full and partial scans on
// independent intervals from a background thread. A full scan also counts
// as a partial one. Failed scans are logged and wait for their next turn.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::constants::{
    DEFAULT_FULL_SCAN_INTERVAL_SECS, DEFAULT_PARTIAL_SCAN_INTERVAL_SECS, DEFAULT_SCHEDULER_TICK_MS,
};
use crate::error::{IndexerError, Result};
use crate::scan::{Indexer, ScanKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSchedule {
    pub full_interval: Duration,
    pub partial_interval: Duration,
    pub tick: Duration,
}

impl Default for ScanSchedule {
    fn default() -> Self {
        Self {
            full_interval: Duration::from_secs(DEFAULT_FULL_SCAN_INTERVAL_SECS),
            partial_interval: Duration::from_secs(DEFAULT_PARTIAL_SCAN_INTERVAL_SECS),
            tick: Duration::from_millis(DEFAULT_SCHEDULER_TICK_MS),
        }
    }
}

/// Last-run bookkeeping for both scan kinds
#[derive(Debug, Clone)]
pub struct ScheduleClock {
    schedule: ScanSchedule,
    last_full: Instant,
    last_partial: Instant,
}

impl ScheduleClock {
    /// Both timers start at `now`, i.e. right after the startup full scan.
    pub fn new(schedule: ScanSchedule, now: Instant) -> Self {
        Self {
            schedule,
            last_full: now,
            last_partial: now,
        }
    }

    /// Which scan, if any, is due at `now`. Full wins over partial.
    pub fn due(&self, now: Instant) -> Option<ScanKind> {
        if now.saturating_duration_since(self.last_full) >= self.schedule.full_interval {
            Some(ScanKind::Full)
        } else if now.saturating_duration_since(self.last_partial) >= self.schedule.partial_interval {
            Some(ScanKind::Partial)
        } else {
            None
        }
    }

    /// Mark a scan of `kind` as run at `now`, whatever its outcome.
    pub fn record(&mut self, kind: ScanKind, now: Instant) {
        if kind == ScanKind::Full {
            self.last_full = now;
        }
        self.last_partial = now;
    }
}

pub struct Scheduler {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Run the startup full scan, then arm the periodic scheduler.
    ///
    /// Fails without spawning anything if the startup scan fails, including
    /// when any recording in it could not be extracted.
    pub fn start(indexer: Arc<Indexer>, schedule: ScanSchedule) -> Result<Self> {
        let report = indexer
            .full_scan()
            .map_err(|e| IndexerError::Other(format!("Failed to scan on startup: {}", e)))?;
        if report.extraction_failures > 0 {
            return Err(IndexerError::Other(format!(
                "Failed to scan on startup: {} recordings could not be indexed",
                report.extraction_failures
            )));
        }
        log::info!("Startup {}", report);

        let shutdown = Arc::new(AtomicBool::new(false));
        let clock = ScheduleClock::new(schedule, Instant::now());

        let handle = {
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("scan-scheduler".into())
                .spawn(move || run_loop(&indexer, clock, schedule.tick, &shutdown))?
        };

        log::info!(
            "Scan scheduler armed: full every {}s, partial every {}s",
            schedule.full_interval.as_secs(),
            schedule.partial_interval.as_secs()
        );

        Ok(Self { shutdown, handle: Some(handle) })
    }

    /// Ask the scheduler thread to exit after its current tick or scan.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(ref handle) = self.handle {
            handle.thread().unpark();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Wait for the scheduler thread to exit. Call `stop` first or this
    /// blocks for the life of the process.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Scan scheduler thread panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(indexer: &Indexer, mut clock: ScheduleClock, tick: Duration, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::SeqCst) {
        thread::park_timeout(tick);
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let kind = match clock.due(Instant::now()) {
            Some(kind) => kind,
            None => continue,
        };

        // Catch panics so the scheduler thread never dies
        let result = panic::catch_unwind(AssertUnwindSafe(|| indexer.scan(kind)));
        match result {
            Ok(Ok(report)) => {
                if report.extraction_failures > 0 {
                    log::error!("Scheduled {} scan had failed extractions: {}", kind, report);
                }
            }
            Ok(Err(e)) => log::error!("Scheduled {} scan failed: {}", kind, e),
            Err(_) => log::error!("Scheduled {} scan panicked (recovered)", kind),
        }

        clock.record(kind, Instant::now());
    }

    log::info!("Scan scheduler stopped");
}
