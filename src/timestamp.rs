// Recording filename timestamp parser
//
// Recorder output is named <YYYYMMDD>_<HHMMSS>_<epoch seconds>.<ext>. The
// epoch field is authoritative; the calendar fields are the recorder's wall
// clock and only feed the skew offset.

use chrono::NaiveDateTime;
use crate::error::{IndexerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingTimestamp {
    /// Capture start, epoch milliseconds
    pub start_ms: i64,
    /// start_ms minus the calendar fields read as UTC
    pub offset_ms: i64,
}

/// Parse a recording filename (no directory component).
pub fn parse_recording_timestamp(name: &str) -> Result<RecordingTimestamp> {
    let invalid = || IndexerError::InvalidFilename(name.to_string());

    let stem = name.split('.').next().ok_or_else(invalid)?;
    let mut fields = stem.split('_');
    let date = fields.next().ok_or_else(invalid)?;
    let time = fields.next().ok_or_else(invalid)?;
    let epoch = fields.next().ok_or_else(invalid)?;
    if fields.next().is_some() {
        return Err(invalid());
    }

    if !is_digits(date, 8) || !is_digits(time, 6) {
        return Err(invalid());
    }

    let epoch_secs: i64 = epoch.parse().map_err(|_| invalid())?;
    let start_ms = epoch_secs.checked_mul(1000).ok_or_else(invalid)?;

    let wall_clock = NaiveDateTime::parse_from_str(&format!("{}{}", date, time), "%Y%m%d%H%M%S")
        .map_err(|_| invalid())?;
    let offset_ms = start_ms - wall_clock.and_utc().timestamp_millis();

    Ok(RecordingTimestamp { start_ms, offset_ms })
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}
