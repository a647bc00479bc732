// Bounded extraction worker pool
//
// A fixed set of scoped worker threads pulls jobs from a bounded channel.
// The producer blocks once `workers` jobs are queued, so no more than
// `workers` extractions are ever in flight regardless of batch size.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};
use std::thread;

use crate::error::{IndexerError, Result};

pub struct ExtractionPool {
    workers: usize,
}

impl ExtractionPool {
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` over every job and return the outcomes in job order.
    ///
    /// A failing or panicking task only fails its own slot. A fatal error
    /// (see `IndexerError::is_fatal`) stops admission: queued jobs are
    /// dropped, running ones finish, and the fatal error is returned.
    pub fn run<J, T, F>(&self, jobs: Vec<J>, task: F) -> Result<Vec<Result<T>>>
    where
        J: Send,
        T: Send,
        F: Fn(J) -> Result<T> + Sync,
    {
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (job_tx, job_rx) = mpsc::sync_channel::<(usize, J)>(self.workers);
        let job_rx = Mutex::new(job_rx);
        let (result_tx, result_rx) = mpsc::channel::<(usize, Result<T>)>();
        let abort = AtomicBool::new(false);

        thread::scope(|scope| -> Result<()> {
            for i in 0..self.workers.min(total) {
                let result_tx = result_tx.clone();
                let job_rx = &job_rx;
                let abort = &abort;
                let task = &task;

                thread::Builder::new()
                    .name(format!("extract-{}", i))
                    .spawn_scoped(scope, move || loop {
                        let next = match job_rx.lock() {
                            Ok(rx) => rx.recv(),
                            Err(_) => break,
                        };
                        let (index, job) = match next {
                            Ok(item) => item,
                            Err(_) => break,
                        };

                        // Drain without running once a fatal error was seen
                        if abort.load(Ordering::SeqCst) {
                            continue;
                        }

                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(job)))
                            .unwrap_or_else(|_| {
                                Err(IndexerError::Other("extraction task panicked".to_string()))
                            });

                        if matches!(outcome, Err(ref e) if e.is_fatal()) {
                            abort.store(true, Ordering::SeqCst);
                        }

                        if result_tx.send((index, outcome)).is_err() {
                            break;
                        }
                    })?;
            }

            for item in jobs.into_iter().enumerate() {
                if abort.load(Ordering::SeqCst) {
                    break;
                }
                if job_tx.send(item).is_err() {
                    break;
                }
            }
            drop(job_tx);

            Ok(())
        })?;
        drop(result_tx);

        let mut slots: Vec<Option<Result<T>>> = (0..total).map(|_| None).collect();
        for (index, outcome) in result_rx {
            slots[index] = Some(outcome);
        }

        // Report the earliest fatal error by job order
        if let Some(index) = slots
            .iter()
            .position(|slot| matches!(slot, Some(Err(e)) if e.is_fatal()))
        {
            if let Some(Err(e)) = slots[index].take() {
                return Err(e);
            }
        }

        let mut outcomes = Vec::with_capacity(total);
        for slot in slots {
            outcomes.push(slot.unwrap_or_else(|| {
                Err(IndexerError::Other("extraction worker exited early".to_string()))
            }));
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_never_exceeds_worker_budget() {
        let pool = ExtractionPool::new(3);
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let outcomes = pool
            .run((0..24).collect(), |n: i32| {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(n * 2)
            })
            .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 3);
        let values: Vec<i32> = outcomes.into_iter().map(|o| o.unwrap()).collect();
        assert_eq!(values, (0..24).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_failures_stay_isolated() {
        let pool = ExtractionPool::new(4);
        let outcomes = pool
            .run((0..10).collect(), |n: i32| {
                if n % 2 == 1 {
                    Err(IndexerError::FFprobe(format!("bad file {}", n)))
                } else if n == 4 {
                    panic!("decoder crashed");
                } else {
                    Ok(n)
                }
            })
            .unwrap();

        assert_eq!(outcomes.len(), 10);
        for (n, outcome) in outcomes.iter().enumerate() {
            match (n, outcome) {
                (4, Err(IndexerError::Other(msg))) => assert!(msg.contains("panicked")),
                (n, Err(IndexerError::FFprobe(_))) if n % 2 == 1 => {}
                (n, Ok(v)) if n % 2 == 0 && n != 4 => assert_eq!(*v as usize, n),
                (n, other) => panic!("unexpected outcome for job {}: {:?}", n, other),
            }
        }
    }

    #[test]
    fn test_fatal_error_stops_admission() {
        let pool = ExtractionPool::new(1);
        let ran = AtomicUsize::new(0);

        let result = pool.run((0..50).collect(), |n: i32| {
            ran.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(IndexerError::Database(rusqlite::Error::InvalidQuery))
            } else {
                Ok(n)
            }
        });

        assert!(matches!(result, Err(IndexerError::Database(_))));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_batch() {
        let pool = ExtractionPool::new(0);
        assert_eq!(pool.workers(), 1);
        let outcomes = pool.run(Vec::<i32>::new(), |n| Ok(n)).unwrap();
        assert!(outcomes.is_empty());
    }
}
