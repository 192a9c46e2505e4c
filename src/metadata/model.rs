use std::path::PathBuf;

use crate::naming::build_correct_song_name;

/// Uniform metadata view over every supported container format.
///
/// Every field has a defined "unknown" zero value; absence never propagates
/// as an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    /// Unique, in tag (or filename) order.
    pub artists: Vec<String>,
    pub title: String,
    pub bpm: f64,
    pub year: u32,
    pub key: String,
    pub energy: u32,
    pub genre: String,
    pub duration_seconds: u64,
    pub file_size_kb: u64,
}

/// A music file on disk together with its extracted metadata.
#[derive(Debug, Clone)]
pub struct SongFile {
    pub path: PathBuf,
    pub metadata: TrackMetadata,
}

impl SongFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The deterministic `"Artists - Title"` name this file should carry.
    pub fn canonical_name(&self) -> String {
        build_correct_song_name(&self.metadata.artists, &self.metadata.title)
    }
}
