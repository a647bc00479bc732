// Process-wide scan flag
//
// At most one scan (full or partial) runs at a time. A second attempt is
// rejected immediately instead of queuing behind the first.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{IndexerError, Result};
use crate::scan::ScanKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning(ScanKind),
}

#[derive(Debug)]
pub struct ScanState {
    phase: Mutex<ScanPhase>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanState {
    pub fn new() -> Self {
        Self { phase: Mutex::new(ScanPhase::Idle) }
    }

    pub fn phase(&self) -> ScanPhase {
        *self.lock()
    }

    /// Move Idle -> Scanning(kind). The returned guard moves back to Idle
    /// when dropped, including on error returns and unwinding.
    pub fn try_begin(&self, kind: ScanKind) -> Result<ScanGuard<'_>> {
        let mut phase = self.lock();
        match *phase {
            ScanPhase::Scanning(running) => Err(IndexerError::ScanInProgress(running)),
            ScanPhase::Idle => {
                *phase = ScanPhase::Scanning(kind);
                Ok(ScanGuard { state: self, kind })
            }
        }
    }

    // The flag is a plain enum, so a poisoned lock still holds a valid value
    fn lock(&self) -> MutexGuard<'_, ScanPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held for the duration of one scan
#[derive(Debug)]
pub struct ScanGuard<'a> {
    state: &'a ScanState,
    kind: ScanKind,
}

impl ScanGuard<'_> {
    pub fn kind(&self) -> ScanKind {
        self.kind
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = ScanPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_scan_is_rejected() {
        let state = ScanState::new();
        let guard = state.try_begin(ScanKind::Full).unwrap();
        assert_eq!(state.phase(), ScanPhase::Scanning(ScanKind::Full));

        match state.try_begin(ScanKind::Partial) {
            Err(IndexerError::ScanInProgress(running)) => assert_eq!(running, ScanKind::Full),
            other => panic!("expected ScanInProgress, got {:?}", other),
        }

        drop(guard);
        assert_eq!(state.phase(), ScanPhase::Idle);

        let guard = state.try_begin(ScanKind::Partial).unwrap();
        assert_eq!(guard.kind(), ScanKind::Partial);
    }

    #[test]
    fn test_guard_released_on_panic() {
        let state = ScanState::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = state.try_begin(ScanKind::Full).unwrap();
            panic!("scan blew up");
        }));
        assert!(result.is_err());
        assert_eq!(state.phase(), ScanPhase::Idle);
    }
}
