use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for the song tooling core.
///
/// Per-file variants (`UnsupportedFormat`, `UnreadableMetadata`,
/// `UnableToExtractData`) are isolated by the folder traversals: the file is
/// skipped and logged, the walk continues. `InsecureDelete` aborts an entire
/// destructive operation before anything is removed.
#[derive(Debug, Error)]
pub enum SongError {
    #[error("unsupported song format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("could not read metadata from {}: {reason}", path.display())]
    UnreadableMetadata { path: PathBuf, reason: String },

    #[error("unable to extract artist/title from {}", .0.display())]
    UnableToExtractData(PathBuf),

    #[error("refusing to delete folder containing unexpected file: {}", .0.display())]
    InsecureDelete(PathBuf),

    #[error("folder does not exist or is not a directory: {}", .0.display())]
    MissingFolder(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}
