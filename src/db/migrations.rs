// Database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.

use rusqlite::Connection;
use anyhow::Result;

/// All migrations in order. Each migration is a SQL string.
const MIGRATIONS: &[&str] = &[
    // Migration 1: Sources and recordings
    r#"
    -- One row per camera/feed directory under the storage root
    CREATE TABLE source (
        source_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        path TEXT NOT NULL
    );

    -- One row per video file on disk
    CREATE TABLE recording (
        recording_id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_id INTEGER NOT NULL REFERENCES source(source_id),
        start_ts INTEGER NOT NULL,
        utc_offset INTEGER NOT NULL,
        video_path TEXT NOT NULL,
        thumb_path TEXT,
        duration REAL,
        size INTEGER,
        bitrate INTEGER,
        vcodec TEXT,
        acodec TEXT,
        UNIQUE(source_id, video_path)
    );

    -- Keyset reads order by (start_ts, recording_id), with or without a source filter
    CREATE INDEX idx_recording_source_start ON recording(source_id, start_ts, recording_id);
    CREATE INDEX idx_recording_start ON recording(start_ts, recording_id);
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "PRAGMA user_version",
        [],
        |row| row.get(0)
    )?;
    Ok(version)
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    // Refuse to open a catalog created by a newer build
    if current_version > target_version {
        anyhow::bail!(
            "Catalog schema version {} is newer than this build supports (max {})",
            current_version,
            target_version
        );
    }

    if current_version == target_version {
        return Ok(());
    }

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        conn.execute_batch(&format!(
            "BEGIN;\n{}\nPRAGMA user_version = {};\nCOMMIT;",
            migration, migration_version
        ))?;

        log::info!("Applied catalog migration {}", migration_version);
    }

    Ok(())
}
