// Filesystem listing for the scan engine

use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::constants::RECORDING_EXTENSION;
use crate::error::Result;

/// A directory child, relative to the listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub relative_path: PathBuf,
    pub is_dir: bool,
}

/// List the children of `dir`, descending into subdirectories when
/// `recursive` is set. Entries come back sorted by relative path.
///
/// Any unreadable directory along the way fails the whole listing.
pub fn list_directory(dir: &Path, recursive: bool) -> Result<Vec<Entry>> {
    let mut walker = WalkDir::new(dir).min_depth(1).follow_links(true);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry?;
        let relative_path = entry
            .path()
            .strip_prefix(dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path().to_path_buf());
        entries.push(Entry {
            relative_path,
            is_dir: entry.file_type().is_dir(),
        });
    }

    // Sort by path for consistent ordering
    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(entries)
}

/// Names of the immediate subdirectories of `dir`, sorted
pub fn list_subdirectories(dir: &Path) -> Result<Vec<String>> {
    let names = list_directory(dir, false)?
        .into_iter()
        .filter(|e| e.is_dir)
        .filter_map(|e| e.relative_path.to_str().map(String::from))
        .collect();
    Ok(names)
}

/// Check if a file is a recording based on extension
pub fn is_recording_file(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case(RECORDING_EXTENSION),
        None => false,
    }
}
