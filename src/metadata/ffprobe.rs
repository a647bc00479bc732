// FFprobe wrapper for metadata extraction

use std::path::Path;
use std::process::Command;
use serde::Deserialize;
use crate::error::{IndexerError, Result};
use crate::metadata::{MetadataProbe, RecordingMetadata};

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

/// Metadata probe backed by the ffprobe executable
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe;

impl MetadataProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<RecordingMetadata> {
        probe(path)
    }
}

/// Run ffprobe on a file and extract metadata
pub fn probe(path: &Path) -> Result<RecordingMetadata> {
    let output = Command::new(crate::tools::ffprobe_path())
        .args([
            "-v", "error",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| IndexerError::FFprobe(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IndexerError::FFprobe(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            stderr.trim()
        )));
    }

    parse_probe_output(&output.stdout)
}

/// Decode ffprobe's JSON document
pub fn parse_probe_output(stdout: &[u8]) -> Result<RecordingMetadata> {
    let probe_output: FFprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| IndexerError::FFprobe(format!("Failed to parse ffprobe output: {}", e)))?;

    let mut meta = RecordingMetadata::default();

    // First stream of each type wins
    if let Some(ref streams) = probe_output.streams {
        for stream in streams {
            match stream.codec_type.as_deref() {
                Some("video") if meta.video_codec.is_none() => {
                    meta.video_codec = stream.codec_name.clone();
                }
                Some("audio") if meta.audio_codec.is_none() => {
                    meta.audio_codec = stream.codec_name.clone();
                }
                _ => {}
            }
        }
    }

    if let Some(ref format) = probe_output.format {
        meta.duration = format.duration.as_ref().and_then(|s| s.parse().ok());
        meta.size = format.size.as_ref().and_then(|s| s.parse().ok());
        meta.bitrate = format.bit_rate.as_ref().and_then(|s| s.parse().ok());
    }

    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "data", "codec_name": "bin_data"},
            {"index": 1, "codec_type": "video", "codec_name": "hevc", "width": 1920},
            {"index": 2, "codec_type": "audio", "codec_name": "aac"},
            {"index": 3, "codec_type": "video", "codec_name": "mjpeg"},
            {"index": 4, "codec_type": "audio", "codec_name": "pcm_alaw"}
        ],
        "format": {
            "filename": "20240101_120000_1704110400.mp4",
            "duration": "59.973000",
            "size": "15728640",
            "bit_rate": "2098034"
        }
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let meta = parse_probe_output(SAMPLE.as_bytes()).unwrap();
        assert_eq!(meta.duration, Some(59.973));
        assert_eq!(meta.size, Some(15_728_640));
        assert_eq!(meta.bitrate, Some(2_098_034));
        assert_eq!(meta.video_codec.as_deref(), Some("hevc"));
        assert_eq!(meta.audio_codec.as_deref(), Some("aac"));
    }

    #[test]
    fn test_parse_probe_output_missing_fields() {
        let meta = parse_probe_output(br#"{"streams": [{"codec_type": "video"}]}"#).unwrap();
        assert_eq!(meta, RecordingMetadata::default());

        let meta = parse_probe_output(br#"{"format": {"duration": "N/A"}}"#).unwrap();
        assert!(meta.duration.is_none());
    }

    #[test]
    fn test_parse_probe_output_garbage() {
        let err = parse_probe_output(b"not json").unwrap_err();
        assert!(matches!(err, IndexerError::FFprobe(_)));
        assert!(!err.is_fatal());
    }
}
