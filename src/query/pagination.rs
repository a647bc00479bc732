// Keyset pagination over recordings
//
// Pages are cut on the (start_ts, recording_id) tuple, never on an offset,
// so inserts and deletes between requests cannot shift a page boundary.

use rusqlite::{params_from_iter, Connection};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_PAGE_LIMIT;
use crate::db::schema::{map_recording, Recording, RECORDING_COLUMNS};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Descending from the cursor
    #[default]
    Older,
    /// Ascending from the cursor, presented newest first
    Newer,
}

/// Position in the (start_ts, recording_id) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub start_ts: i64,
    pub id: i64,
}

impl From<&Recording> for Cursor {
    fn from(recording: &Recording) -> Self {
        Self {
            start_ts: recording.start_ts,
            id: recording.id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// None = every source; Some(empty) matches nothing
    pub sources: Option<Vec<i64>>,
    pub cursor: Option<Cursor>,
    /// Clamped to 1..=100; None or non-positive means 100
    pub limit: Option<i64>,
    pub direction: Direction,
}

impl PageRequest {
    pub fn older_than(cursor: Cursor) -> Self {
        Self {
            cursor: Some(cursor),
            direction: Direction::Older,
            ..Self::default()
        }
    }

    pub fn newer_than(cursor: Cursor) -> Self {
        Self {
            cursor: Some(cursor),
            direction: Direction::Newer,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sources(mut self, sources: Vec<i64>) -> Self {
        self.sources = Some(sources);
        self
    }
}

/// One window of recordings, always newest first
#[derive(Debug, Clone, Default, Serialize)]
pub struct Page {
    pub recordings: Vec<Recording>,
    pub has_older: bool,
    pub has_newer: bool,
}

impl Page {
    pub fn newest(&self) -> Option<&Recording> {
        self.recordings.first()
    }

    pub fn oldest(&self) -> Option<&Recording> {
        self.recordings.last()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(limit) if limit > 0 => limit.min(MAX_PAGE_LIMIT),
        _ => MAX_PAGE_LIMIT,
    }
}

/// Fetch one page. Reads `limit + 1` rows to learn whether more exist in
/// the paging direction.
pub fn paginate(conn: &Connection, request: &PageRequest) -> Result<Page> {
    let limit = clamp_limit(request.limit);

    if matches!(request.sources, Some(ref ids) if ids.is_empty()) {
        return Ok(Page::default());
    }

    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    let mut param_idx = 1;

    if let Some(ref ids) = request.sources {
        let placeholders: Vec<String> = ids
            .iter()
            .map(|id| {
                values.push(Value::Integer(*id));
                let p = format!("?{}", param_idx);
                param_idx += 1;
                p
            })
            .collect();
        conditions.push(format!("source_id IN ({})", placeholders.join(", ")));
    }

    if let Some(cursor) = request.cursor {
        let op = match request.direction {
            Direction::Older => "<",
            Direction::Newer => ">",
        };
        conditions.push(format!("(start_ts, recording_id) {} (?{}, ?{})", op, param_idx, param_idx + 1));
        values.push(Value::Integer(cursor.start_ts));
        values.push(Value::Integer(cursor.id));
        param_idx += 2;
    }

    let order = match request.direction {
        Direction::Older => "DESC",
        Direction::Newer => "ASC",
    };
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT {} FROM recording {} ORDER BY start_ts {order}, recording_id {order} LIMIT ?{}",
        RECORDING_COLUMNS,
        where_clause,
        param_idx,
        order = order,
    );
    values.push(Value::Integer(limit + 1));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params_from_iter(values), map_recording)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Ok(Page::default());
    }

    let more = rows.len() as i64 > limit;
    rows.truncate(limit as usize);

    let has_cursor = request.cursor.is_some();
    let page = match request.direction {
        Direction::Older => Page {
            recordings: rows,
            has_older: more,
            has_newer: has_cursor,
        },
        Direction::Newer => {
            rows.reverse();
            Page {
                recordings: rows,
                has_older: has_cursor,
                has_newer: more,
            }
        }
    };

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{insert_recording, insert_source, NewRecording};

    fn setup_db() -> Connection {
        crate::db::open_in_memory().unwrap()
    }

    fn add(conn: &Connection, source_id: i64, start_ts: i64) -> i64 {
        insert_recording(
            conn,
            &NewRecording {
                source_id,
                start_ts,
                utc_offset: 0,
                video_path: format!("/nvr/{}/{}-{}.mp4", source_id, start_ts, row_count(conn)),
                thumb_path: None,
                duration: None,
                size: None,
                bitrate: None,
                video_codec: None,
                audio_codec: None,
            },
        )
        .unwrap()
    }

    // Unique path component so equal timestamps don't collide on video_path
    fn row_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM recording", [], |row| row.get(0)).unwrap()
    }

    fn ids(page: &Page) -> Vec<i64> {
        page.recordings.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 100);
        assert_eq!(clamp_limit(Some(0)), 100);
        assert_eq!(clamp_limit(Some(-5)), 100);
        assert_eq!(clamp_limit(Some(25)), 25);
        assert_eq!(clamp_limit(Some(1000)), 100);
    }

    #[test]
    fn test_older_chain_covers_everything_once() {
        let conn = setup_db();
        let s = insert_source(&conn, "porch", "/nvr/porch").unwrap();
        // Several timestamp collisions on purpose
        let stamps = [10, 20, 20, 20, 30, 40, 40, 50, 60, 70, 70, 80, 90];
        for ts in stamps {
            add(&conn, s, ts);
        }

        let mut seen: Vec<(i64, i64)> = Vec::new();
        let mut page = paginate(&conn, &PageRequest::default().with_limit(4)).unwrap();
        assert!(!page.has_newer);
        loop {
            seen.extend(page.recordings.iter().map(|r| (r.start_ts, r.id)));
            if !page.has_older {
                break;
            }
            let cursor = Cursor::from(page.oldest().unwrap());
            page = paginate(&conn, &PageRequest::older_than(cursor).with_limit(4)).unwrap();
            assert!(page.has_newer);
        }

        let mut expected = seen.clone();
        expected.sort_by(|a, b| b.cmp(a));
        expected.dedup();
        assert_eq!(seen.len(), stamps.len());
        assert_eq!(seen, expected, "pages must be strictly descending with no repeats");
    }

    #[test]
    fn test_tie_break_by_id() {
        let conn = setup_db();
        let s = insert_source(&conn, "porch", "/nvr/porch").unwrap();
        for _ in 0..4 {
            add(&conn, s, 1);
        }
        let five = add(&conn, s, 1000);
        add(&conn, s, 1);
        let seven = add(&conn, s, 1000);
        assert_eq!((five, seven), (5, 7));

        let page = paginate(&conn, &PageRequest::default().with_limit(2)).unwrap();
        assert_eq!(ids(&page), vec![7, 5]);
        assert!(page.has_older);
        assert!(!page.has_newer);

        // Cursor on id 7 must still yield id 5 despite the shared timestamp
        let page = paginate(
            &conn,
            &PageRequest::older_than(Cursor { start_ts: 1000, id: 7 }).with_limit(1),
        )
        .unwrap();
        assert_eq!(ids(&page), vec![5]);
    }

    #[test]
    fn test_newer_direction_is_reversed() {
        let conn = setup_db();
        let s = insert_source(&conn, "porch", "/nvr/porch").unwrap();
        let all: Vec<i64> = (1..=6).map(|ts| add(&conn, s, ts * 100)).collect();

        let cursor = Cursor { start_ts: 200, id: all[1] };
        let page = paginate(&conn, &PageRequest::newer_than(cursor).with_limit(2)).unwrap();

        // Rows 300 and 400, newest first
        assert_eq!(ids(&page), vec![all[3], all[2]]);
        assert_eq!(page.newest().unwrap().start_ts, 400);
        assert_eq!(page.oldest().unwrap().start_ts, 300);
        assert!(page.has_newer);
        assert!(page.has_older);

        let cursor = Cursor::from(page.newest().unwrap());
        let page = paginate(&conn, &PageRequest::newer_than(cursor).with_limit(2)).unwrap();
        assert_eq!(ids(&page), vec![all[5], all[4]]);
        assert!(!page.has_newer);
        assert!(page.has_older);
    }

    #[test]
    fn test_empty_results() {
        let conn = setup_db();
        let s = insert_source(&conn, "porch", "/nvr/porch").unwrap();
        let only = add(&conn, s, 100);

        let page = paginate(&conn, &PageRequest::older_than(Cursor { start_ts: 100, id: only })).unwrap();
        assert!(page.is_empty());
        assert!(page.newest().is_none());
        assert!(!page.has_older);
        assert!(!page.has_newer);

        let page = paginate(&conn, &PageRequest::default().with_sources(vec![])).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_source_filter() {
        let conn = setup_db();
        let a = insert_source(&conn, "a", "/a").unwrap();
        let b = insert_source(&conn, "b", "/b").unwrap();
        let c = insert_source(&conn, "c", "/c").unwrap();
        let a1 = add(&conn, a, 10);
        let b1 = add(&conn, b, 20);
        add(&conn, c, 30);
        let a2 = add(&conn, a, 40);

        let page = paginate(&conn, &PageRequest::default().with_sources(vec![a, b])).unwrap();
        assert_eq!(ids(&page), vec![a2, b1, a1]);
        assert!(!page.has_older);

        let page = paginate(&conn, &PageRequest::default()).unwrap();
        assert_eq!(page.recordings.len(), 4);
    }
}
