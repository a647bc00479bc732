// Database schema types and query helpers

use rusqlite::{Connection, params, OptionalExtension};
use serde::{Deserialize, Serialize};
use crate::error::Result;

// ----- Source -----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub path: String,
}

fn map_source(row: &rusqlite::Row) -> rusqlite::Result<Source> {
    Ok(Source {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
    })
}

pub fn insert_source(conn: &Connection, name: &str, path: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO source (name, path) VALUES (?1, ?2)",
        params![name, path],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_source(conn: &Connection, id: i64) -> Result<Option<Source>> {
    let result = conn.query_row(
        "SELECT source_id, name, path FROM source WHERE source_id = ?1",
        params![id],
        map_source,
    ).optional()?;
    Ok(result)
}

pub fn get_source_by_name(conn: &Connection, name: &str) -> Result<Option<Source>> {
    let result = conn.query_row(
        "SELECT source_id, name, path FROM source WHERE name = ?1",
        params![name],
        map_source,
    ).optional()?;
    Ok(result)
}

pub fn list_sources(conn: &Connection) -> Result<Vec<Source>> {
    let mut stmt = conn.prepare(
        "SELECT source_id, name, path FROM source ORDER BY source_id"
    )?;

    let sources = stmt.query_map([], map_source)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(sources)
}

/// Delete a source and every recording row it owns.
/// Thumbnail cleanup is the caller's job; this only touches the catalog.
pub fn delete_source(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM recording WHERE source_id = ?1", params![id])?;
    conn.execute("DELETE FROM source WHERE source_id = ?1", params![id])?;
    Ok(())
}

pub fn count_source_recordings(conn: &Connection, source_id: i64) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(recording_id) FROM recording WHERE source_id = ?1",
        params![source_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ----- Recording -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub id: i64,
    pub source_id: i64,
    /// Capture start, epoch milliseconds
    pub start_ts: i64,
    /// Recorder clock skew in milliseconds (diagnostic only)
    pub utc_offset: i64,
    pub video_path: String,
    pub thumb_path: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
    /// Bytes
    pub size: Option<i64>,
    /// Bits per second
    pub bitrate: Option<i64>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRecording {
    pub source_id: i64,
    pub start_ts: i64,
    pub utc_offset: i64,
    pub video_path: String,
    pub thumb_path: Option<String>,
    pub duration: Option<f64>,
    pub size: Option<i64>,
    pub bitrate: Option<i64>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

/// Column list matching `map_recording`
pub const RECORDING_COLUMNS: &str =
    "recording_id, source_id, start_ts, utc_offset, video_path, thumb_path,
     duration, size, bitrate, vcodec, acodec";

pub fn map_recording(row: &rusqlite::Row) -> rusqlite::Result<Recording> {
    Ok(Recording {
        id: row.get(0)?,
        source_id: row.get(1)?,
        start_ts: row.get(2)?,
        utc_offset: row.get(3)?,
        video_path: row.get(4)?,
        thumb_path: row.get(5)?,
        duration: row.get(6)?,
        size: row.get(7)?,
        bitrate: row.get(8)?,
        video_codec: row.get(9)?,
        audio_codec: row.get(10)?,
    })
}

pub fn insert_recording(conn: &Connection, recording: &NewRecording) -> Result<i64> {
    conn.execute(
        "INSERT INTO recording (source_id, start_ts, utc_offset, video_path, thumb_path,
                                duration, size, bitrate, vcodec, acodec)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            recording.source_id,
            recording.start_ts,
            recording.utc_offset,
            recording.video_path,
            recording.thumb_path,
            recording.duration,
            recording.size,
            recording.bitrate,
            recording.video_codec,
            recording.audio_codec,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_recording(conn: &Connection, id: i64) -> Result<Option<Recording>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM recording WHERE recording_id = ?1", RECORDING_COLUMNS),
        params![id],
        map_recording,
    ).optional()?;
    Ok(result)
}

pub fn list_source_recordings(conn: &Connection, source_id: i64) -> Result<Vec<Recording>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM recording WHERE source_id = ?1 ORDER BY start_ts, recording_id",
        RECORDING_COLUMNS
    ))?;

    let recordings = stmt.query_map(params![source_id], map_recording)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(recordings)
}

/// Most recent recording of a source by (start_ts, recording_id)
pub fn get_latest_recording(conn: &Connection, source_id: i64) -> Result<Option<Recording>> {
    let result = conn.query_row(
        &format!(
            "SELECT {} FROM recording WHERE source_id = ?1
             ORDER BY start_ts DESC, recording_id DESC LIMIT 1",
            RECORDING_COLUMNS
        ),
        params![source_id],
        map_recording,
    ).optional()?;
    Ok(result)
}

/// Forget a recording's thumbnail (generation failed or the file is gone)
pub fn clear_recording_thumbnail(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE recording SET thumb_path = NULL WHERE recording_id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn delete_recording(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM recording WHERE recording_id = ?1", params![id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Connection {
        crate::db::open_in_memory().unwrap()
    }

    fn new_recording(source_id: i64, start_ts: i64, path: &str) -> NewRecording {
        NewRecording {
            source_id,
            start_ts,
            utc_offset: 0,
            video_path: path.to_string(),
            thumb_path: Some(format!("/thumbs/{}.jpg", start_ts)),
            duration: Some(60.5),
            size: Some(1_048_576),
            bitrate: Some(2_000_000),
            video_codec: Some("h264".to_string()),
            audio_codec: None,
        }
    }

    #[test]
    fn test_source_roundtrip() {
        let conn = setup_db();
        let id = insert_source(&conn, "driveway", "/nvr/driveway").unwrap();

        let by_id = get_source(&conn, id).unwrap().unwrap();
        let by_name = get_source_by_name(&conn, "driveway").unwrap().unwrap();
        assert_eq!(by_id, by_name);
        assert_eq!(by_id.path, "/nvr/driveway");

        assert!(get_source(&conn, id + 1).unwrap().is_none());
        assert!(get_source_by_name(&conn, "garage").unwrap().is_none());
    }

    #[test]
    fn test_source_name_unique() {
        let conn = setup_db();
        insert_source(&conn, "driveway", "/nvr/driveway").unwrap();
        assert!(insert_source(&conn, "driveway", "/elsewhere/driveway").is_err());
    }

    #[test]
    fn test_delete_source_removes_recordings_first() {
        let conn = setup_db();
        let keep = insert_source(&conn, "keep", "/nvr/keep").unwrap();
        let gone = insert_source(&conn, "gone", "/nvr/gone").unwrap();
        insert_recording(&conn, &new_recording(keep, 1000, "/nvr/keep/videos/a.mp4")).unwrap();
        insert_recording(&conn, &new_recording(gone, 2000, "/nvr/gone/videos/b.mp4")).unwrap();
        insert_recording(&conn, &new_recording(gone, 3000, "/nvr/gone/videos/c.mp4")).unwrap();

        // Foreign keys are on, so this only succeeds if recordings go first
        delete_source(&conn, gone).unwrap();

        assert!(get_source(&conn, gone).unwrap().is_none());
        assert_eq!(count_source_recordings(&conn, gone).unwrap(), 0);
        assert_eq!(count_source_recordings(&conn, keep).unwrap(), 1);
    }

    #[test]
    fn test_recording_roundtrip() {
        let conn = setup_db();
        let source_id = insert_source(&conn, "porch", "/nvr/porch").unwrap();
        let new = new_recording(source_id, 1_704_110_400_000, "/nvr/porch/videos/x.mp4");
        let id = insert_recording(&conn, &new).unwrap();

        let rec = get_recording(&conn, id).unwrap().unwrap();
        assert_eq!(rec.source_id, source_id);
        assert_eq!(rec.start_ts, 1_704_110_400_000);
        assert_eq!(rec.video_path, "/nvr/porch/videos/x.mp4");
        assert_eq!(rec.duration, Some(60.5));
        assert_eq!(rec.video_codec.as_deref(), Some("h264"));
        assert!(rec.audio_codec.is_none());

        clear_recording_thumbnail(&conn, id).unwrap();
        assert!(get_recording(&conn, id).unwrap().unwrap().thumb_path.is_none());

        delete_recording(&conn, id).unwrap();
        assert!(get_recording(&conn, id).unwrap().is_none());
    }

    #[test]
    fn test_latest_recording_breaks_ties_by_id() {
        let conn = setup_db();
        let source_id = insert_source(&conn, "porch", "/nvr/porch").unwrap();
        assert!(get_latest_recording(&conn, source_id).unwrap().is_none());

        insert_recording(&conn, &new_recording(source_id, 5000, "/a.mp4")).unwrap();
        let tied = insert_recording(&conn, &new_recording(source_id, 9000, "/b.mp4")).unwrap();
        let latest = insert_recording(&conn, &new_recording(source_id, 9000, "/c.mp4")).unwrap();
        assert!(latest > tied);

        let rec = get_latest_recording(&conn, source_id).unwrap().unwrap();
        assert_eq!(rec.id, latest);
    }

    #[test]
    fn test_list_source_recordings_scoped() {
        let conn = setup_db();
        let a = insert_source(&conn, "a", "/a").unwrap();
        let b = insert_source(&conn, "b", "/b").unwrap();
        insert_recording(&conn, &new_recording(a, 2, "/a/2.mp4")).unwrap();
        insert_recording(&conn, &new_recording(a, 1, "/a/1.mp4")).unwrap();
        insert_recording(&conn, &new_recording(b, 3, "/b/3.mp4")).unwrap();

        let recs = list_source_recordings(&conn, a).unwrap();
        let paths: Vec<_> = recs.iter().map(|r| r.video_path.as_str()).collect();
        assert_eq!(paths, vec!["/a/1.mp4", "/a/2.mp4"]);
    }
}
