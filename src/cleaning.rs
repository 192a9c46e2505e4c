//! Multi-stage folder-cleaning pipeline.
//!
//! [`CleaningPipeline::clean`] runs a fixed sequence of full-tree passes:
//! lowercase suffixes, drop blacklisted sidecar files, drop Cyrillic-named
//! files, rename music files to their canonical name (deleting over-long DJ
//! mixes), then prune folders left empty. The order is load-bearing: later
//! stages rely on earlier ones having normalized case and removed junk, and
//! the whole sequence is idempotent, so an interrupted run is safe to repeat.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::CleaningSettings;
use crate::error::SongError;
use crate::metadata::{SongFile, file_suffix};
use crate::naming::has_cyrillic;

/// Iteration cap for the folder-pruning fixed point. Only there to stop a
/// runaway loop on an unexpected filesystem race; hitting it is a bug signal.
const MAX_PRUNE_PASSES: usize = 100;

pub struct CleaningPipeline {
    settings: CleaningSettings,
}

impl CleaningPipeline {
    pub fn new(settings: CleaningSettings) -> Self {
        Self { settings }
    }

    /// Clean `root` in place. Fails only when `root` is missing or not a
    /// directory; every per-file problem is logged and skipped.
    pub fn clean(&self, root: &Path) -> Result<(), SongError> {
        if !root.is_dir() {
            error!(folder = %root.display(), "cannot clean folder, not a directory");
            return Err(SongError::MissingFolder(root.to_path_buf()));
        }
        info!(folder = %root.display(), "cleaning folder");

        self.lowercase_suffixes(root);
        self.remove_irrelevant_files(root);
        self.remove_cyrillic_files(root);
        self.process_music_files(root);
        self.prune_folders(root);
        Ok(())
    }

    /// Stage 1: rename files with uppercase letters in their extension.
    fn lowercase_suffixes(&self, root: &Path) {
        for path in walk_files(root) {
            let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
                continue;
            };
            if !ext.chars().any(|c| c.is_ascii_uppercase()) {
                continue;
            }
            let target = path.with_extension(ext.to_ascii_lowercase());
            if target.exists() {
                warn!(file = %path.display(), "lowercased twin already exists, leaving file");
                continue;
            }
            match fs::rename(&path, &target) {
                Ok(()) => info!(file = %path.display(), "lowercased suffix"),
                Err(err) => warn!(file = %path.display(), %err, "could not lowercase suffix"),
            }
        }
    }

    /// Stage 2: delete files with a blacklisted (non-audio) suffix.
    fn remove_irrelevant_files(&self, root: &Path) {
        for path in walk_files(root) {
            let Some(suffix) = file_suffix(&path) else {
                continue;
            };
            if !self.settings.is_irrelevant_suffix(&suffix) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => info!(file = %path.display(), "removed irrelevant file"),
                Err(err) => warn!(file = %path.display(), %err, "could not remove file"),
            }
        }
    }

    /// Stage 3: delete files with Cyrillic characters in their name.
    /// A collection-scope filter, not a correctness feature.
    fn remove_cyrillic_files(&self, root: &Path) {
        for path in walk_files(root) {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !has_cyrillic(name) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => info!(file = %path.display(), "removed cyrillic-named file"),
                Err(err) => warn!(file = %path.display(), %err, "could not remove file"),
            }
        }
    }

    /// Stage 4: rename every supported music file to its canonical name,
    /// deleting files that are too long to be single tracks.
    fn process_music_files(&self, root: &Path) {
        for path in walk_files(root) {
            let Some(suffix) = file_suffix(&path) else {
                continue;
            };
            if !self.settings.is_audio_suffix(&suffix) {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if self.settings.is_os_artifact(name) {
                continue;
            }

            let song = match SongFile::load(&path) {
                Ok(song) => song,
                Err(err) => {
                    warn!(file = %path.display(), %err, "skipping music file, needs manual check");
                    continue;
                }
            };

            if song.metadata.duration_seconds > self.settings.mix_length_secs {
                match fs::remove_file(&path) {
                    Ok(()) => info!(
                        file = %path.display(),
                        duration = song.metadata.duration_seconds,
                        "removed over-long mix"
                    ),
                    Err(err) => warn!(file = %path.display(), %err, "could not remove mix"),
                }
                continue;
            }

            self.rename_to_canonical(&song, &suffix);
        }
    }

    fn rename_to_canonical(&self, song: &SongFile, suffix: &str) {
        let Some(stem) = song.path.file_stem().and_then(|s| s.to_str()) else {
            return;
        };
        let canonical = song.canonical_name();
        if stem == canonical {
            return;
        }
        let parent = song.path.parent().unwrap_or(Path::new(""));
        let target_name = format!("{canonical}.{suffix}");
        let target = parent.join(&target_name);

        let result = if stem.eq_ignore_ascii_case(&canonical) {
            // Casing-only change: many filesystems treat the old and new name
            // as the same file, so hop through a temporary name. On a
            // case-sensitive filesystem an exact-case twin can sit next to
            // this file; the listing check keeps the hop from landing on it.
            let twin_exists = fs::read_dir(parent)
                .ok()
                .into_iter()
                .flatten()
                .filter_map(Result::ok)
                .any(|entry| entry.file_name().to_string_lossy() == target_name);
            if twin_exists {
                warn!(
                    file = %song.path.display(),
                    target = %target.display(),
                    "canonical name already taken, leaving file for dedup"
                );
                return;
            }
            let tmp = parent.join(format!("{canonical}.{suffix}.renaming"));
            fs::rename(&song.path, &tmp).and_then(|()| fs::rename(&tmp, &target))
        } else if target.exists() {
            warn!(
                file = %song.path.display(),
                target = %target.display(),
                "canonical name already taken, leaving file for dedup"
            );
            return;
        } else {
            fs::rename(&song.path, &target)
        };

        match result {
            Ok(()) => info!(from = %song.path.display(), to = %target.display(), "renamed"),
            Err(err) => warn!(file = %song.path.display(), %err, "rename failed"),
        }
    }

    /// Stage 5: remove empty folders and folders holding only OS artifacts,
    /// repeating until the tree stops changing (bounded).
    fn prune_folders(&self, root: &Path) {
        for _ in 0..MAX_PRUNE_PASSES {
            let mut changed = false;
            let dirs: Vec<PathBuf> = WalkDir::new(root)
                .min_depth(1)
                .contents_first(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_dir())
                .map(|e| e.into_path())
                .collect();

            for dir in dirs {
                match self.prune_one(&dir) {
                    Ok(pruned) => changed = changed || pruned,
                    Err(err) => warn!(folder = %dir.display(), %err, "could not prune folder"),
                }
            }
            if !changed {
                return;
            }
        }
        warn!(
            folder = %root.display(),
            passes = MAX_PRUNE_PASSES,
            "folder pruning did not converge, inspect the tree manually"
        );
    }

    fn prune_one(&self, dir: &Path) -> std::io::Result<bool> {
        let entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;

        if entries.is_empty() {
            fs::remove_dir(dir)?;
            info!(folder = %dir.display(), "removed empty folder");
            return Ok(true);
        }

        let only_artifacts = entries.iter().all(|entry| {
            entry.file_type().map(|t| t.is_file()).unwrap_or(false)
                && self
                    .settings
                    .is_os_artifact(&entry.file_name().to_string_lossy())
        });
        if only_artifacts {
            for entry in &entries {
                fs::remove_file(entry.path())?;
            }
            fs::remove_dir(dir)?;
            info!(folder = %dir.display(), "removed folder holding only OS artifacts");
            return Ok(true);
        }

        Ok(false)
    }
}

/// Snapshot of every file under `root`. Collected up front so the stages can
/// rename and delete without walking a mutating tree.
fn walk_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

#[cfg(test)]
mod tests;
