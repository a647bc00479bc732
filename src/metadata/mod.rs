// Metadata extraction module

pub mod ffprobe;

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::Result;

pub use ffprobe::FfprobeProbe;

/// Container and stream facts for one recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// Seconds
    pub duration: Option<f64>,
    /// Bytes
    pub size: Option<i64>,
    /// Bits per second
    pub bitrate: Option<i64>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

/// Something that can read a recording's metadata.
///
/// Called from extraction workers, so implementations must be shareable
/// across threads.
pub trait MetadataProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<RecordingMetadata>;
}
