// NVR Index Constants
// Layout and file naming are dictated by the recorder writing the storage root.

// Storage layout
pub const VIDEOS_FOLDER: &str = "videos";
pub const RECORDING_EXTENSION: &str = "mp4";

// Catalog
pub const DB_FILENAME: &str = "recordings.db";
pub const APP_DIR_NAME: &str = "nvr-index";

// Thumbnail settings
pub const THUMBS_FOLDER: &str = "thumbs";
pub const THUMB_FORMAT: &str = "jpg";
pub const THUMB_SEEK_SECONDS: f64 = 1.0;
pub const THUMB_WIDTH: u32 = 720;
pub const THUMB_HEIGHT: u32 = 480;
pub const THUMB_QSCALE: u32 = 2; // ffmpeg -q:v, 1-31 where 1 is best

// Scan scheduling defaults
pub const DEFAULT_FULL_SCAN_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_PARTIAL_SCAN_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_SCHEDULER_TICK_MS: u64 = 1000;

// Concurrency defaults
pub const DEFAULT_EXTRACTION_WORKERS: usize = 10;

// Pagination
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;
