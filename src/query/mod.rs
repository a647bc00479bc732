// Read-side catalog queries for browsing
//
// Nothing here is used by the scan path.

pub mod pagination;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::db::schema::{self, map_recording, Recording, Source, RECORDING_COLUMNS};
use crate::error::{IndexerError, Result};

pub use pagination::{clamp_limit, paginate, Cursor, Direction, Page, PageRequest};

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    #[serde(flatten)]
    pub source: Source,
    pub recording_count: i64,
}

/// The recordings immediately before and after one recording in the same
/// source, by (start_ts, recording_id).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Neighbors {
    pub prev: Option<Recording>,
    pub next: Option<Recording>,
}

pub fn get_recording(conn: &Connection, id: i64) -> Result<Recording> {
    schema::get_recording(conn, id)?.ok_or(IndexerError::RecordingNotFound(id))
}

pub fn get_source(conn: &Connection, id: i64) -> Result<Source> {
    schema::get_source(conn, id)?.ok_or(IndexerError::SourceNotFound(id))
}

pub fn list_sources_with_counts(conn: &Connection) -> Result<Vec<SourceSummary>> {
    schema::list_sources(conn)?
        .into_iter()
        .map(|source| -> Result<SourceSummary> {
            let recording_count = schema::count_source_recordings(conn, source.id)?;
            Ok(SourceSummary { source, recording_count })
        })
        .collect()
}

pub fn get_recording_neighbors(conn: &Connection, recording: &Recording) -> Result<Neighbors> {
    let prev = conn
        .query_row(
            &format!(
                "SELECT {} FROM recording
                 WHERE source_id = ?1 AND (start_ts, recording_id) < (?2, ?3)
                 ORDER BY start_ts DESC, recording_id DESC LIMIT 1",
                RECORDING_COLUMNS
            ),
            params![recording.source_id, recording.start_ts, recording.id],
            map_recording,
        )
        .optional()?;

    let next = conn
        .query_row(
            &format!(
                "SELECT {} FROM recording
                 WHERE source_id = ?1 AND (start_ts, recording_id) > (?2, ?3)
                 ORDER BY start_ts ASC, recording_id ASC LIMIT 1",
                RECORDING_COLUMNS
            ),
            params![recording.source_id, recording.start_ts, recording.id],
            map_recording,
        )
        .optional()?;

    Ok(Neighbors { prev, next })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{insert_recording, insert_source, NewRecording};

    fn add(conn: &Connection, source_id: i64, start_ts: i64, name: &str) -> i64 {
        insert_recording(
            conn,
            &NewRecording {
                source_id,
                start_ts,
                utc_offset: 0,
                video_path: format!("/nvr/{}/{}.mp4", source_id, name),
                thumb_path: None,
                duration: Some(30.0),
                size: None,
                bitrate: None,
                video_codec: None,
                audio_codec: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_not_found_lookups() {
        let conn = crate::db::open_in_memory().unwrap();
        assert!(matches!(get_recording(&conn, 42), Err(IndexerError::RecordingNotFound(42))));
        assert!(matches!(get_source(&conn, 7), Err(IndexerError::SourceNotFound(7))));
    }

    #[test]
    fn test_sources_with_counts() {
        let conn = crate::db::open_in_memory().unwrap();
        let a = insert_source(&conn, "a", "/a").unwrap();
        let b = insert_source(&conn, "b", "/b").unwrap();
        add(&conn, a, 1, "x");
        add(&conn, a, 2, "y");

        let summaries = list_sources_with_counts(&conn).unwrap();
        let counts: Vec<_> = summaries
            .iter()
            .map(|s| (s.source.id, s.recording_count))
            .collect();
        assert_eq!(counts, vec![(a, 2), (b, 0)]);
    }

    #[test]
    fn test_neighbors_stay_within_source_and_break_ties() {
        let conn = crate::db::open_in_memory().unwrap();
        let a = insert_source(&conn, "a", "/a").unwrap();
        let b = insert_source(&conn, "b", "/b").unwrap();
        let first = add(&conn, a, 100, "first");
        add(&conn, b, 150, "other-source");
        let tied_low = add(&conn, a, 200, "tied-low");
        let tied_high = add(&conn, a, 200, "tied-high");
        let last = add(&conn, a, 300, "last");

        let rec = get_recording(&conn, tied_low).unwrap();
        let n = get_recording_neighbors(&conn, &rec).unwrap();
        assert_eq!(n.prev.map(|r| r.id), Some(first));
        assert_eq!(n.next.map(|r| r.id), Some(tied_high));

        let rec = get_recording(&conn, tied_high).unwrap();
        let n = get_recording_neighbors(&conn, &rec).unwrap();
        assert_eq!(n.prev.map(|r| r.id), Some(tied_low));
        assert_eq!(n.next.map(|r| r.id), Some(last));

        let rec = get_recording(&conn, last).unwrap();
        let n = get_recording_neighbors(&conn, &rec).unwrap();
        assert!(n.next.is_none());
    }
}
