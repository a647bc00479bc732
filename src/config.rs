// Runtime configuration
//
// Every setting is a command-line flag with an environment fallback, so the
// daemon can be configured entirely from its service environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;

use crate::constants::{
    DEFAULT_EXTRACTION_WORKERS, DEFAULT_FULL_SCAN_INTERVAL_SECS,
    DEFAULT_PARTIAL_SCAN_INTERVAL_SECS, DEFAULT_SCHEDULER_TICK_MS,
};
use crate::error::{IndexerError, Result};
use crate::scheduler::ScanSchedule;

/// Catalog location
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Catalog database file
    #[arg(long = "database", env = "NVR_DATABASE_PATH", value_name = "PATH")]
    pub database: Option<PathBuf>,
}

impl DatabaseArgs {
    pub fn db_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(crate::db::default_db_path)
    }
}

/// Storage layout, thumbnail output and scan tuning
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Directory holding one subdirectory per source
    #[arg(long, env = "NVR_STORAGE_DIRPATH", value_name = "DIR")]
    pub storage_root: PathBuf,

    /// Where thumbnails are written
    #[arg(long, env = "THUMB_STORAGE_DIRPATH", value_name = "DIR")]
    pub thumb_dir: Option<PathBuf>,

    /// Seconds between full scans
    #[arg(long, env = "FULL_SCAN_INTERVAL", default_value_t = DEFAULT_FULL_SCAN_INTERVAL_SECS)]
    pub full_scan_interval: u64,

    /// Seconds between partial scans
    #[arg(long, env = "PARTIAL_SCAN_INTERVAL", default_value_t = DEFAULT_PARTIAL_SCAN_INTERVAL_SECS)]
    pub partial_scan_interval: u64,

    /// Scheduler tick in milliseconds
    #[arg(long, env = "SCAN_TICK_MS", default_value_t = DEFAULT_SCHEDULER_TICK_MS)]
    pub tick_ms: u64,

    /// Maximum concurrent metadata/thumbnail extractions
    #[arg(long, env = "THUMB_MAX_BATCH", default_value_t = DEFAULT_EXTRACTION_WORKERS)]
    pub extraction_workers: usize,
}

/// What a scan needs to know about the filesystem
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Absolute storage root
    pub storage_root: PathBuf,
    pub thumb_dir: PathBuf,
    pub extraction_workers: usize,
}

impl ScanArgs {
    /// Validate and resolve into a scan config.
    pub fn scan_config(&self) -> Result<ScanConfig> {
        if self.extraction_workers == 0 {
            return Err(IndexerError::Config("extraction workers must be at least 1".to_string()));
        }

        let storage_root = resolve_storage_root(&self.storage_root)?;
        let thumb_dir = self
            .thumb_dir
            .clone()
            .unwrap_or_else(crate::db::default_thumb_dir);

        Ok(ScanConfig {
            storage_root,
            thumb_dir,
            extraction_workers: self.extraction_workers,
        })
    }

    pub fn schedule(&self) -> Result<ScanSchedule> {
        if self.full_scan_interval == 0 || self.partial_scan_interval == 0 {
            return Err(IndexerError::Config("scan intervals must be positive".to_string()));
        }
        if self.tick_ms == 0 {
            return Err(IndexerError::Config("scheduler tick must be positive".to_string()));
        }

        Ok(ScanSchedule {
            full_interval: Duration::from_secs(self.full_scan_interval),
            partial_interval: Duration::from_secs(self.partial_scan_interval),
            tick: Duration::from_millis(self.tick_ms),
        })
    }
}

fn resolve_storage_root(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(IndexerError::Config(format!(
            "storage root {} is not a directory",
            path.display()
        )));
    }
    Ok(path.canonicalize()?)
}
