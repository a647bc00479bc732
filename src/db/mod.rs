// Database module

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use rusqlite::Connection;
use anyhow::Result;

use crate::constants::{APP_DIR_NAME, DB_FILENAME, THUMBS_FOLDER};
use crate::error::IndexerError;

/// Open or create the catalog database at the given path
pub fn open_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(db_path)?;
    configure(&conn)?;

    // Enable WAL mode so browsing reads don't block scan writes
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Open a fresh in-memory catalog with all migrations applied
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    // Enable foreign keys (must be done per connection)
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(std::time::Duration::from_millis(1500))?;
    Ok(())
}

/// Platform data directory for the catalog and thumbnails
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_DIR_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default catalog location when none is configured
pub fn default_db_path() -> PathBuf {
    data_dir().join(DB_FILENAME)
}

/// Default thumbnail directory when none is configured
pub fn default_thumb_dir() -> PathBuf {
    data_dir().join(THUMBS_FOLDER)
}

/// The catalog connection shared by the scanning path.
///
/// All scan-time writes go through this one mutex-guarded connection, which
/// keeps catalog writes single-writer even while extraction workers run in
/// parallel.
pub struct Catalog {
    conn: Mutex<Connection>,
}

impl Catalog {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    pub fn open(db_path: &Path) -> crate::error::Result<Self> {
        Ok(Self::new(open_db(db_path)?))
    }

    pub fn open_in_memory() -> crate::error::Result<Self> {
        Ok(Self::new(open_in_memory()?))
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| IndexerError::Other("catalog connection lock poisoned".to_string()))?;
        f(&conn)
    }
}
