// Extraction: one discovered file in, one catalog row (plus thumbnail) out

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::THUMB_SEEK_SECONDS;
use crate::db::schema::{self, NewRecording, Source};
use crate::error::{IndexerError, Result};
use crate::preview;
use crate::scan::pool::ExtractionPool;
use crate::scan::{BatchReport, Indexer};
use crate::timestamp::parse_recording_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extracted {
    pub recording_id: i64,
    /// False when the row was kept without a thumbnail
    pub thumbnail: bool,
}

/// Parse, probe and persist one recording, then render its thumbnail.
///
/// The row is written before the thumbnail exists. A thumbnail failure
/// leaves the row in place with no thumbnail path.
pub fn extract_recording(indexer: &Indexer, source: &Source, video_path: &Path) -> Result<Extracted> {
    log::info!("Adding recording at {}", video_path.display());

    let file_name = video_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| IndexerError::InvalidFilename(video_path.display().to_string()))?;
    let timestamp = parse_recording_timestamp(file_name)?;

    let thumb_path = preview::thumbnail_path(&indexer.config.thumb_dir, &source.name, timestamp.start_ms);

    let meta = indexer.probe.probe(video_path)?;

    let new = NewRecording {
        source_id: source.id,
        start_ts: timestamp.start_ms,
        utc_offset: timestamp.offset_ms,
        video_path: video_path.to_string_lossy().to_string(),
        thumb_path: Some(thumb_path.to_string_lossy().to_string()),
        duration: meta.duration,
        size: meta.size,
        bitrate: meta.bitrate,
        video_codec: meta.video_codec,
        audio_codec: meta.audio_codec,
    };
    let recording_id = indexer.catalog.with_conn(|conn| schema::insert_recording(conn, &new))?;

    let seek = Duration::from_secs_f64(THUMB_SEEK_SECONDS);
    let thumbnail = match indexer.thumbnailer.generate(video_path, seek, &thumb_path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to generate thumbnail for {}: {:#}", video_path.display(), e);
            indexer
                .catalog
                .with_conn(|conn| schema::clear_recording_thumbnail(conn, recording_id))?;
            false
        }
    };

    Ok(Extracted { recording_id, thumbnail })
}

/// Extract a batch of new files for one source through the bounded pool.
pub fn run_batch(indexer: &Indexer, source: &Source, paths: Vec<PathBuf>) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    if paths.is_empty() {
        return Ok(report);
    }

    let pool = ExtractionPool::new(indexer.config.extraction_workers);
    let labels = paths.clone();
    let outcomes = pool.run(paths, |path| extract_recording(indexer, source, &path))?;

    for (path, outcome) in labels.iter().zip(outcomes) {
        match outcome {
            Ok(extracted) => {
                report.added += 1;
                if !extracted.thumbnail {
                    report.thumbnails_failed += 1;
                }
            }
            Err(e) => {
                log::error!("Failed to add recording {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }

    if !report.is_success() {
        log::error!(
            "Extraction batch for source {} finished with {} of {} failed",
            source.name,
            report.failed,
            labels.len()
        );
    }

    Ok(report)
}
