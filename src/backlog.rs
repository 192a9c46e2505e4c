//! Backlog staging operations: bulk import and metadata backfill.
//!
//! Paths are stored relative to the configured backlog root so the database
//! survives the backlog moving between machines.

use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::ImportSettings;
use crate::error::SongError;
use crate::metadata::{SongFile, is_supported_music_file};
use crate::store::Store;

/// Walk `folder` and insert one backlog row per supported audio file.
///
/// Inserts run in fixed-size transactions; returns the number of rows that
/// were actually new.
pub fn load_backlog_folder_files(
    folder: &Path,
    root: &Path,
    store: &mut Store,
    settings: &ImportSettings,
) -> Result<usize, SongError> {
    if !folder.is_dir() {
        return Err(SongError::MissingFolder(folder.to_path_buf()));
    }

    let paths: Vec<String> = WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_supported_music_file(e.path()))
        .map(|e| {
            let path = e.path();
            path.strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned()
        })
        .collect();

    let mut inserted = 0;
    let mut since_log = 0;
    for chunk in paths.chunks(settings.batch_size.max(1)) {
        inserted += store.insert_backlog_paths(chunk)?;
        since_log += chunk.len();
        if since_log >= settings.progress_every {
            info!(inserted, scanned = paths.len(), "backlog import progress");
            since_log = 0;
        }
    }

    info!(inserted, scanned = paths.len(), "backlog folder loaded");
    Ok(inserted)
}

/// Reload full metadata for every backlog row that has none yet.
///
/// Each row commits independently; a single file's extraction failure is
/// logged and skipped without aborting the batch.
pub fn load_backlog_folder_metadata(
    store: &Store,
    root: &Path,
    path_filter: Option<&str>,
) -> Result<usize, SongError> {
    let rows = store.backlog_paths_missing_title(path_filter)?;
    let mut updated = 0;

    for rel in &rows {
        let path = root.join(rel);
        match SongFile::load(&path) {
            Ok(song) => {
                store.update_backlog_metadata(rel, &song.metadata)?;
                updated += 1;
            }
            Err(err) => {
                warn!(file = %path.display(), %err, "skipping backlog row, metadata unreadable");
            }
        }
    }

    info!(updated, candidates = rows.len(), "backlog metadata loaded");
    Ok(updated)
}

#[cfg(test)]
mod tests;
