// Scan engine
//
// Keeps the catalog in line with what the recorder has written to the
// storage root. A full scan reconciles everything, including deletions; a
// partial scan only picks up recordings newer than the latest known one.

pub mod extract;
pub mod full;
pub mod partial;
pub mod pool;
pub mod state;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ScanConfig;
use crate::db::Catalog;
use crate::error::Result;
use crate::metadata::{FfprobeProbe, MetadataProbe};
use crate::preview::{FfmpegThumbnailer, ThumbnailGenerator};

pub use state::{ScanGuard, ScanPhase, ScanState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    Full,
    Partial,
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanKind::Full => write!(f, "full"),
            ScanKind::Partial => write!(f, "partial"),
        }
    }
}

/// Outcome of one extraction batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub added: usize,
    pub failed: usize,
    pub thumbnails_failed: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Totals for one scan invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub kind: ScanKind,
    pub sources_added: usize,
    pub sources_removed: usize,
    pub sources_skipped: usize,
    pub recordings_added: usize,
    pub recordings_removed: usize,
    pub extraction_failures: usize,
    pub thumbnail_failures: usize,
    pub elapsed_ms: u64,
}

impl ScanReport {
    pub fn new(kind: ScanKind) -> Self {
        Self {
            kind,
            sources_added: 0,
            sources_removed: 0,
            sources_skipped: 0,
            recordings_added: 0,
            recordings_removed: 0,
            extraction_failures: 0,
            thumbnail_failures: 0,
            elapsed_ms: 0,
        }
    }

    pub fn absorb(&mut self, batch: &BatchReport) {
        self.recordings_added += batch.added;
        self.extraction_failures += batch.failed;
        self.thumbnail_failures += batch.thumbnails_failed;
    }

    /// True when nothing was inserted or deleted
    pub fn is_noop(&self) -> bool {
        self.sources_added == 0
            && self.sources_removed == 0
            && self.recordings_added == 0
            && self.recordings_removed == 0
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scan in {}ms: sources +{} -{}, recordings +{} -{}, {} failed extractions, {} missing thumbnails",
            self.kind,
            self.elapsed_ms,
            self.sources_added,
            self.sources_removed,
            self.recordings_added,
            self.recordings_removed,
            self.extraction_failures,
            self.thumbnail_failures,
        )?;
        if self.sources_skipped > 0 {
            write!(f, ", {} sources skipped", self.sources_skipped)?;
        }
        Ok(())
    }
}

/// Owns everything a scan needs: the catalog, the storage layout and the
/// external tools.
pub struct Indexer {
    catalog: Arc<Catalog>,
    config: ScanConfig,
    probe: Box<dyn MetadataProbe>,
    thumbnailer: Box<dyn ThumbnailGenerator>,
    state: ScanState,
}

impl Indexer {
    /// Indexer backed by the ffprobe/ffmpeg executables
    pub fn new(catalog: Arc<Catalog>, config: ScanConfig) -> Self {
        Self::with_tools(
            catalog,
            config,
            Box::new(FfprobeProbe),
            Box::new(FfmpegThumbnailer::default()),
        )
    }

    pub fn with_tools(
        catalog: Arc<Catalog>,
        config: ScanConfig,
        probe: Box<dyn MetadataProbe>,
        thumbnailer: Box<dyn ThumbnailGenerator>,
    ) -> Self {
        Self {
            catalog,
            config,
            probe,
            thumbnailer,
            state: ScanState::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn is_scanning(&self) -> bool {
        self.state.phase() != ScanPhase::Idle
    }

    /// Reconcile every source and recording with the storage root.
    pub fn full_scan(&self) -> Result<ScanReport> {
        let _guard = self.begin(ScanKind::Full)?;
        full::run(self)
    }

    /// Index recordings newer than each source's latest. Never deletes.
    pub fn partial_scan(&self) -> Result<ScanReport> {
        let _guard = self.begin(ScanKind::Partial)?;
        partial::run(self)
    }

    pub fn scan(&self, kind: ScanKind) -> Result<ScanReport> {
        match kind {
            ScanKind::Full => self.full_scan(),
            ScanKind::Partial => self.partial_scan(),
        }
    }

    fn begin(&self, kind: ScanKind) -> Result<ScanGuard<'_>> {
        self.state.try_begin(kind).map_err(|e| {
            log::warn!("Cannot start {} scan: {}", kind, e);
            e
        })
    }
}
