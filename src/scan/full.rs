// Full scan: filesystem is the source of truth
//
// Sources are diffed by name against the storage root's subdirectories,
// recordings by absolute path against each source's videos subtree.
// Nothing is transactional across steps; the next full scan converges.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::constants::VIDEOS_FOLDER;
use crate::db::schema::{self, Recording, Source};
use crate::error::Result;
use crate::preview;
use crate::scan::{extract, Indexer, ScanKind, ScanReport};
use crate::scanner;

pub(crate) fn run(indexer: &Indexer) -> Result<ScanReport> {
    let started = Instant::now();
    log::info!("Starting full scan of {}", indexer.config.storage_root.display());

    let mut report = ScanReport::new(ScanKind::Full);
    sync_sources(indexer, &mut report)?;

    let sources = indexer.catalog.with_conn(schema::list_sources)?;
    for source in &sources {
        reconcile_source(indexer, source, &mut report)?;
    }

    report.elapsed_ms = started.elapsed().as_millis() as u64;
    log::info!("Completed {}", report);
    Ok(report)
}

/// Add a source for every new storage subdirectory and drop the sources
/// whose directory is gone.
pub fn sync_sources(indexer: &Indexer, report: &mut ScanReport) -> Result<()> {
    let root = &indexer.config.storage_root;
    let on_disk: HashSet<String> = scanner::list_subdirectories(root)?.into_iter().collect();

    let cataloged = indexer.catalog.with_conn(schema::list_sources)?;
    let known: HashSet<&str> = cataloged.iter().map(|s| s.name.as_str()).collect();

    let mut added: Vec<&String> = on_disk
        .iter()
        .filter(|name| !known.contains(name.as_str()))
        .collect();
    added.sort();

    for name in added {
        let path = root.join(name);
        let id = indexer
            .catalog
            .with_conn(|conn| schema::insert_source(conn, name, &path.to_string_lossy()))?;
        log::info!("Added source {} (id {}) at {}", name, id, path.display());
        report.sources_added += 1;
    }

    for source in cataloged.iter().filter(|s| !on_disk.contains(&s.name)) {
        remove_source(indexer, source, report)?;
    }

    Ok(())
}

/// Bring one source's recordings in line with its videos subtree.
///
/// An unreadable subtree skips the source for this scan and leaves its
/// catalog rows alone.
pub fn reconcile_source(indexer: &Indexer, source: &Source, report: &mut ScanReport) -> Result<()> {
    let started = Instant::now();
    let videos_dir = Path::new(&source.path).join(VIDEOS_FOLDER);

    let entries = match scanner::list_directory(&videos_dir, true) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Skipping source {}: cannot list {}: {}", source.name, videos_dir.display(), e);
            report.sources_skipped += 1;
            return Ok(());
        }
    };

    let on_disk: HashSet<String> = entries
        .into_iter()
        .filter(|e| !e.is_dir && scanner::is_recording_file(&e.relative_path))
        .map(|e| videos_dir.join(e.relative_path).to_string_lossy().to_string())
        .collect();

    let recordings = indexer
        .catalog
        .with_conn(|conn| schema::list_source_recordings(conn, source.id))?;
    let cataloged: HashSet<&str> = recordings.iter().map(|r| r.video_path.as_str()).collect();

    let mut additions: Vec<PathBuf> = on_disk
        .iter()
        .filter(|path| !cataloged.contains(path.as_str()))
        .map(PathBuf::from)
        .collect();
    additions.sort();

    let batch = extract::run_batch(indexer, source, additions)?;
    report.absorb(&batch);

    for recording in recordings.iter().filter(|r| !on_disk.contains(&r.video_path)) {
        remove_recording(indexer, recording)?;
        report.recordings_removed += 1;
    }

    log::info!(
        "Full scan for source {} (id {}) completed in {}ms",
        source.name,
        source.id,
        started.elapsed().as_millis()
    );
    Ok(())
}

/// Delete a recording's thumbnail (best effort), then its row.
pub fn remove_recording(indexer: &Indexer, recording: &Recording) -> Result<()> {
    log::info!("Removing recording {} ({})", recording.id, recording.video_path);
    delete_thumbnail(recording);
    indexer
        .catalog
        .with_conn(|conn| schema::delete_recording(conn, recording.id))
}

/// Delete a vanished source: thumbnails first, then its rows.
pub fn remove_source(indexer: &Indexer, source: &Source, report: &mut ScanReport) -> Result<()> {
    log::info!("Removing source {} (id {})", source.name, source.id);

    let recordings = indexer
        .catalog
        .with_conn(|conn| schema::list_source_recordings(conn, source.id))?;
    for recording in &recordings {
        delete_thumbnail(recording);
    }

    indexer.catalog.with_conn(|conn| schema::delete_source(conn, source.id))?;

    report.recordings_removed += recordings.len();
    report.sources_removed += 1;
    Ok(())
}

fn delete_thumbnail(recording: &Recording) {
    if let Some(ref thumb) = recording.thumb_path {
        if let Err(e) = preview::remove_thumbnail(Path::new(thumb)) {
            log::warn!("Failed to delete thumbnail at {}: {}", thumb, e);
        }
    }
}
