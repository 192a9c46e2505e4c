use std::path::PathBuf;

use serde::Deserialize;

use crate::metadata::SUPPORTED_MUSIC_TYPES;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/songtools/config.toml` or
/// `~/.config/songtools/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SONGTOOLS__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Staging area of not-yet-curated audio files.
    pub backlog_path: PathBuf,
    /// The curated reference collection.
    pub collection_path: PathBuf,
    /// Location of the SQLite database file.
    pub database_path: PathBuf,
    pub cleaning: CleaningSettings,
    pub import: ImportSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backlog_path: PathBuf::from("backlog"),
            collection_path: PathBuf::from("collection"),
            database_path: PathBuf::from("songtools.sqlite3"),
            cleaning: CleaningSettings::default(),
            import: ImportSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleaningSettings {
    /// Files longer than this many seconds are treated as DJ mixes and
    /// removed during cleaning.
    pub mix_length_secs: u64,

    /// File extensions to treat as audio (case-insensitive, without dot).
    pub audio_extensions: Vec<String>,

    /// Suffix blacklist (without dot) of non-audio sidecar files removed
    /// during cleaning. Blacklist rather than whitelist, so exotic audio
    /// suffixes survive unless explicitly listed.
    pub irrelevant_suffixes: Vec<String>,

    /// OS metadata artifacts ignored by the music pass and pruned together
    /// with otherwise-empty folders.
    pub os_artifact_names: Vec<String>,
}

impl Default for CleaningSettings {
    fn default() -> Self {
        Self {
            mix_length_secs: 1000,
            audio_extensions: SUPPORTED_MUSIC_TYPES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            irrelevant_suffixes: [
                "jpg", "jpeg", "png", "gif", "bmp", "m3u", "m3u8", "nfo", "cue", "txt", "log",
                "sfv", "md5", "url", "htm", "html", "ini", "db",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            os_artifact_names: [".DS_Store", "Thumbs.db", "desktop.ini"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl CleaningSettings {
    pub fn is_audio_suffix(&self, suffix: &str) -> bool {
        self.audio_extensions.iter().any(|e| e == suffix)
    }

    pub fn is_irrelevant_suffix(&self, suffix: &str) -> bool {
        self.irrelevant_suffixes.iter().any(|e| e == suffix)
    }

    pub fn is_os_artifact(&self, file_name: &str) -> bool {
        file_name.starts_with("._") || self.os_artifact_names.iter().any(|n| n == file_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Backlog rows inserted per transaction during a bulk import.
    pub batch_size: usize,
    /// Emit a progress log line every this many inserted rows.
    pub progress_every: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            batch_size: 500,
            progress_every: 1000,
        }
    }
}
