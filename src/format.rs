// Human-readable formatting for catalog values

use chrono::DateTime;

/// Epoch milliseconds as `YYYY-MM-DD HH:MM:SS` (UTC)
pub fn format_date(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

/// Seconds as `MM:SS`, or `HH:MM:SS` once there is at least an hour
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;

    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

/// Bytes in binary units
pub fn format_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Bits per second in decimal units
pub fn format_bitrate(bps: i64) -> String {
    if bps >= 1_000_000 {
        format!("{:.1} Mb/s", bps as f64 / 1_000_000.0)
    } else if bps >= 1_000 {
        format!("{:.0} kb/s", bps as f64 / 1_000.0)
    } else {
        format!("{} b/s", bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(1_704_110_400_000), "2024-01-01 12:00:00");
        assert_eq!(format_date(0), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00");
        assert_eq!(format_duration(59.973), "01:00");
        assert_eq!(format_duration(125.2), "02:05");
        assert_eq!(format_duration(3661.0), "01:01:01");
    }

    #[test]
    fn test_format_size_and_bitrate() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(15_728_640), "15.0 MiB");
        assert_eq!(format_bitrate(2_098_034), "2.1 Mb/s");
        assert_eq!(format_bitrate(128_000), "128 kb/s");
        assert_eq!(format_bitrate(900), "900 b/s");
    }
}
