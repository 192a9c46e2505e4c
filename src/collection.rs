//! Identity ledger operations.
//!
//! A song's identity is the SHA-256 of its canonical name, never of its
//! bytes: two files with the same artist/title collapse to the same identity
//! regardless of encoding, bitrate or extra tags. The heard ledger remembers
//! every identity ever deleted or imported, so duplicates are caught even
//! after the original file is long gone.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::CleaningSettings;
use crate::error::SongError;
use crate::metadata::{SongFile, file_suffix, is_supported_music_file};
use crate::store::{CollectionSong, Store};

/// Fingerprint of a canonical name, used as the ledger key.
pub fn identity_hash(canonical_name: &str) -> String {
    hex::encode(Sha256::digest(canonical_name.as_bytes()))
}

fn song_identity(song: &SongFile) -> String {
    identity_hash(&song.canonical_name())
}

fn music_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_supported_music_file(e.path()))
        .map(|e| e.into_path())
        .collect()
}

/// Recursively delete `root`, recording every audio file in the heard ledger.
///
/// Before anything is removed the whole tree is validated: every entry must
/// be a supported audio file, a blacklisted sidecar file, an OS artifact or a
/// directory. Any other file aborts with `InsecureDelete` and leaves the tree
/// fully intact; this refuses to guess intent on unknown content.
pub fn delete_song_folder(
    root: &Path,
    store: &Store,
    settings: &CleaningSettings,
) -> Result<(), SongError> {
    if !root.is_dir() {
        return Err(SongError::MissingFolder(root.to_path_buf()));
    }

    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        if settings.is_os_artifact(&name) {
            continue;
        }
        let recognized = file_suffix(path)
            .map(|s| settings.is_audio_suffix(&s) || settings.is_irrelevant_suffix(&s))
            .unwrap_or(false);
        if !recognized {
            return Err(SongError::InsecureDelete(path.to_path_buf()));
        }
    }

    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if is_supported_music_file(path) {
            match SongFile::load(path) {
                Ok(song) => store.insert_heard_if_absent(&song_identity(&song), &song.file_name())?,
                Err(err) => {
                    warn!(file = %path.display(), %err, "deleting without a ledger record")
                }
            }
        }
        fs::remove_file(path)?;
    }

    for entry in WalkDir::new(root)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
    {
        fs::remove_dir(entry.path())?;
    }

    info!(folder = %root.display(), "deleted song folder");
    Ok(())
}

/// Delete every file under `root` whose identity has been heard before,
/// either in the ledger or earlier in this very run.
///
/// Files whose metadata cannot be read are skipped: without an identity we
/// cannot judge duplication, so we never delete blindly.
pub fn dedup_song_folder(root: &Path, store: &Store) -> Result<(), SongError> {
    if !root.is_dir() {
        return Err(SongError::MissingFolder(root.to_path_buf()));
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut removed = 0usize;

    for path in music_files(root) {
        let song = match SongFile::load(&path) {
            Ok(song) => song,
            Err(err) => {
                warn!(file = %path.display(), %err, "cannot judge duplication, skipping");
                continue;
            }
        };
        let hash = song_identity(&song);
        if store.heard_exists(&hash)? || seen.contains(&hash) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(file = %path.display(), "removed duplicate");
                    removed += 1;
                }
                Err(err) => warn!(file = %path.display(), %err, "could not remove duplicate"),
            }
        } else {
            seen.insert(hash);
        }
    }

    info!(removed, folder = %root.display(), "dedup finished");
    Ok(())
}

/// Collection files whose on-disk stem differs from their canonical name.
///
/// Read-only: reports, never renames. Files whose metadata cannot be read
/// are logged and skipped.
pub fn collection_name_inconsistencies(
    root: &Path,
) -> Result<Vec<(PathBuf, String)>, SongError> {
    if !root.is_dir() {
        return Err(SongError::MissingFolder(root.to_path_buf()));
    }

    let mut mismatched = Vec::new();
    for path in music_files(root) {
        let song = match SongFile::load(&path) {
            Ok(song) => song,
            Err(err) => {
                warn!(file = %path.display(), %err, "could not read collection file");
                continue;
            }
        };
        let canonical = song.canonical_name();
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        if stem != canonical {
            warn!(file = %path.display(), %canonical, "file name differs from canonical form");
            mismatched.push((path, canonical));
        }
    }
    Ok(mismatched)
}

/// Rebuild the collection snapshot from disk and reconcile the heard ledger.
///
/// The snapshot table is truncated and reinserted every run: it is a derived
/// cache of what is on disk, not a log. Heard records flagged in-collection
/// whose identity vanished are flipped back; every identity present on disk
/// ends up with an in-collection heard record.
pub fn sync_collection(root: &Path, store: &mut Store) -> Result<(), SongError> {
    if !root.is_dir() {
        return Err(SongError::MissingFolder(root.to_path_buf()));
    }

    let mut items: BTreeMap<String, SongFile> = BTreeMap::new();
    for path in music_files(root) {
        let song = match SongFile::load(&path) {
            Ok(song) => song,
            Err(err) => {
                warn!(file = %path.display(), %err, "could not read collection file");
                continue;
            }
        };
        let hash = song_identity(&song);
        if let Some(existing) = items.get(&hash) {
            // Two in-collection copies of the same identity. Size comparison
            // alone cannot pick a winner, so leave both and let a human act.
            warn!(
                kept = %existing.path.display(),
                kept_kb = existing.metadata.file_size_kb,
                other = %song.path.display(),
                other_kb = song.metadata.file_size_kb,
                "duplicate identity inside collection, resolve manually"
            );
            continue;
        }
        items.insert(hash, song);
    }

    let snapshot: Vec<CollectionSong> = items
        .iter()
        .map(|(hash, song)| CollectionSong {
            name_hash: hash.clone(),
            file_path: song.file_name(),
            file_size_kb: song.metadata.file_size_kb,
        })
        .collect();
    store.recreate_collection(&snapshot)?;

    for hash in store.heard_in_collection_hashes()? {
        if !items.contains_key(&hash) {
            store.set_heard_in_collection(&hash, false)?;
        }
    }
    for (hash, song) in &items {
        store.upsert_heard_in_collection(hash, &song.file_name())?;
    }

    info!(songs = items.len(), folder = %root.display(), "collection synced");
    Ok(())
}
