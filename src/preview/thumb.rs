// Thumbnail generation
//
// Grabs a single frame a second into the recording and scales it to a fixed
// poster size.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use anyhow::{Result, anyhow, Context};

use crate::constants::{THUMB_HEIGHT, THUMB_QSCALE, THUMB_WIDTH};
use crate::preview::ThumbnailGenerator;

/// Options for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbOptions {
    pub width: u32,
    pub height: u32,
    /// ffmpeg -q:v value, 1-31 where 1 is best
    pub qscale: u32,
}

impl Default for ThumbOptions {
    fn default() -> Self {
        Self {
            width: THUMB_WIDTH,
            height: THUMB_HEIGHT,
            qscale: THUMB_QSCALE,
        }
    }
}

/// Thumbnail generator backed by the ffmpeg executable
#[derive(Debug, Clone, Default)]
pub struct FfmpegThumbnailer {
    pub options: ThumbOptions,
}

impl FfmpegThumbnailer {
    pub fn new(options: ThumbOptions) -> Self {
        Self { options }
    }
}

impl ThumbnailGenerator for FfmpegThumbnailer {
    fn generate(&self, source: &Path, seek: Duration, target: &Path) -> Result<()> {
        generate_thumbnail(source, target, seek, &self.options)
    }
}

/// Generate a thumbnail from a video file.
pub fn generate_thumbnail(
    source_path: &Path,
    output_path: &Path,
    seek: Duration,
    options: &ThumbOptions,
) -> Result<()> {
    // Ensure output directory exists
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let tmp_path = temp_path(output_path);

    let seek_time = format_duration(seek.as_secs_f64());
    let size = format!("{}x{}", options.width, options.height);

    let mut cmd = Command::new(crate::tools::ffmpeg_path());

    cmd.args(["-y", "-v", "error"])
        .args(["-ss", &seek_time])          // Seek before input (faster)
        .arg("-i")
        .arg(source_path)
        .args(["-vframes", "1"])            // Single frame
        .args(["-s", &size])
        .args(["-q:v", &options.qscale.to_string()])
        .arg(&tmp_path);

    let output = cmd.output().context("failed to run ffmpeg")?;

    if !output.status.success() {
        let _ = std::fs::remove_file(&tmp_path);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("FFmpeg thumbnail generation failed: {}", stderr.trim()));
    }

    // ffmpeg exits 0 without writing anything when the seek is past the end
    if !tmp_path.exists() {
        return Err(anyhow!("Thumbnail file was not created"));
    }

    // Atomic rename
    std::fs::rename(&tmp_path, output_path)?;

    let size = std::fs::metadata(output_path)?.len();
    if size == 0 {
        let _ = std::fs::remove_file(output_path);
        return Err(anyhow!("Thumbnail file is empty"));
    }

    Ok(())
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Per-render scratch file beside `output_path`, renamed into place once
/// ffmpeg succeeds. Concurrent renders of the same target never share one.
fn temp_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    // ffmpeg picks the muxer from the extension, so keep .jpg last
    output_path.with_file_name(format!(".{}.{}-{}.tmp.jpg", stem, std::process::id(), seq))
}

/// Format seconds as HH:MM:SS.mmm for ffmpeg.
fn format_duration(seconds: f64) -> String {
    let hours = (seconds / 3600.0) as u32;
    let minutes = ((seconds % 3600.0) / 60.0) as u32;
    let secs = seconds % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00.000");
        assert_eq!(format_duration(1.0), "00:00:01.000");
        assert_eq!(format_duration(65.25), "00:01:05.250");
        assert_eq!(format_duration(3661.0), "01:01:01.000");
    }

    #[test]
    fn test_default_options() {
        let opts = ThumbOptions::default();
        assert_eq!((opts.width, opts.height), (720, 480));
        assert_eq!(opts.qscale, 2);
    }

    #[test]
    fn test_temp_paths_are_unique_per_render() {
        let target = Path::new("/var/thumbs/porch/1704110400000.jpg");
        let a = temp_path(target);
        let b = temp_path(target);

        assert_ne!(a, b);
        for tmp in [&a, &b] {
            assert_eq!(tmp.parent(), target.parent());
            assert_ne!(tmp.as_path(), target);
            assert_eq!(tmp.extension().and_then(|e| e.to_str()), Some("jpg"));
            assert!(tmp.file_name().unwrap().to_string_lossy().contains("1704110400000"));
        }
    }

    #[test]
    fn test_missing_source_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("porch").join("1.jpg");
        let thumbnailer = FfmpegThumbnailer::default();

        // Fails either because ffmpeg is absent or because the input is
        let result = thumbnailer.generate(
            &tmp.path().join("missing.mp4"),
            Duration::from_secs(1),
            &target,
        );
        assert!(result.is_err());
        assert!(!target.exists());
        assert!(target.parent().unwrap().is_dir());
    }
}
