// Thumbnail module
//
// One JPG poster frame per recording, stored under
// <thumb_dir>/<source name>/<start ms>.jpg

pub mod thumb;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::THUMB_FORMAT;

pub use thumb::{FfmpegThumbnailer, ThumbOptions};

/// Something that can render a still frame of a video to an image file.
pub trait ThumbnailGenerator: Send + Sync {
    fn generate(&self, source: &Path, seek: Duration, target: &Path) -> anyhow::Result<()>;
}

/// Deterministic thumbnail location for a recording.
pub fn thumbnail_path(thumb_dir: &Path, source_name: &str, start_ms: i64) -> PathBuf {
    thumb_dir
        .join(source_name)
        .join(format!("{}.{}", start_ms, THUMB_FORMAT))
}

/// Delete a thumbnail file. A file that is already gone counts as removed.
pub fn remove_thumbnail(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_path() {
        let path = thumbnail_path(Path::new("/var/thumbs"), "front-door", 1_704_110_400_000);
        assert_eq!(path, PathBuf::from("/var/thumbs/front-door/1704110400000.jpg"));
    }

    #[test]
    fn test_remove_thumbnail() {
        let tmp = tempfile::TempDir::new().unwrap();
        let thumb = tmp.path().join("1.jpg");
        std::fs::write(&thumb, b"jpg").unwrap();

        remove_thumbnail(&thumb).unwrap();
        assert!(!thumb.exists());

        // Second removal is a no-op
        remove_thumbnail(&thumb).unwrap();
    }
}
