// Partial scan: catch up on recordings newer than the latest known one
//
// Walks each source's dated folders newest first. Every listed file is
// compared against the latest start timestamp; the walk does not stop at the
// first older file. Sources are not discovered and nothing is deleted here.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::constants::VIDEOS_FOLDER;
use crate::db::schema::{self, Source};
use crate::error::Result;
use crate::scan::{extract, Indexer, ScanKind, ScanReport};
use crate::scanner;
use crate::timestamp::parse_recording_timestamp;

pub(crate) fn run(indexer: &Indexer) -> Result<ScanReport> {
    let started = Instant::now();
    log::info!("Starting partial scan");

    let mut report = ScanReport::new(ScanKind::Partial);
    let sources = indexer.catalog.with_conn(schema::list_sources)?;
    for source in &sources {
        catch_up_source(indexer, source, &mut report)?;
    }

    report.elapsed_ms = started.elapsed().as_millis() as u64;
    log::info!("Completed {}", report);
    Ok(report)
}

pub fn catch_up_source(indexer: &Indexer, source: &Source, report: &mut ScanReport) -> Result<()> {
    let latest = indexer
        .catalog
        .with_conn(|conn| schema::get_latest_recording(conn, source.id))?
        .map(|r| r.start_ts);

    let videos_dir = Path::new(&source.path).join(VIDEOS_FOLDER);
    let fresh = match newer_files(&videos_dir, latest) {
        Ok(fresh) => fresh,
        Err(e) => {
            log::warn!("Skipping source {}: cannot list {}: {}", source.name, videos_dir.display(), e);
            report.sources_skipped += 1;
            return Ok(());
        }
    };

    if !fresh.is_empty() {
        log::info!("Source {} has {} new recordings", source.name, fresh.len());
    }

    let batch = extract::run_batch(indexer, source, fresh)?;
    report.absorb(&batch);
    Ok(())
}

/// Recording files under `videos_dir`'s dated folders that start after
/// `latest` (all of them when `latest` is None), newest first.
pub fn newer_files(videos_dir: &Path, latest: Option<i64>) -> Result<Vec<PathBuf>> {
    let mut days = scanner::list_directory(videos_dir, false)?;
    days.retain(|e| e.is_dir);
    days.reverse();

    let mut fresh = Vec::new();
    for day in days {
        let day_dir = videos_dir.join(&day.relative_path);
        let mut files = match scanner::list_directory(&day_dir, false) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("Cannot list {}: {}", day_dir.display(), e);
                continue;
            }
        };
        files.reverse();

        for file in files {
            if file.is_dir || !scanner::is_recording_file(&file.relative_path) {
                continue;
            }
            let name = file.relative_path.to_string_lossy();
            match parse_recording_timestamp(&name) {
                Ok(ts) if latest.map_or(true, |latest| ts.start_ms > latest) => {
                    fresh.push(day_dir.join(&file.relative_path));
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping {}: {}", day_dir.join(&file.relative_path).display(), e),
            }
        }
    }

    Ok(fresh)
}
