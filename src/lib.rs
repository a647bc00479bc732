// NVR Index - Library Entry Point
//
// Keeps a SQLite catalog of NVR recordings in line with the storage root
// and serves keyset-paginated reads over it.

pub mod constants;
pub mod error;
pub mod tools;
pub mod config;
pub mod logging;
pub mod db;
pub mod timestamp;
pub mod scanner;
pub mod metadata;
pub mod preview;
pub mod scan;
pub mod scheduler;
pub mod query;
pub mod format;

pub use error::{IndexerError, Result};
pub use scan::{Indexer, ScanKind, ScanReport};
pub use scheduler::{ScanSchedule, Scheduler};
