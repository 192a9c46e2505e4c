//! Song file classification and metadata extraction.
//!
//! This module wraps the `lofty` tag reader behind a uniform
//! [`TrackMetadata`] view. Dispatch is by file suffix to one of a small set
//! of tag-schema adapters, with a filename fallback when the container (or
//! its tags) cannot be read.

mod extract;
mod model;

pub(crate) use extract::file_suffix;
pub use extract::{SUPPORTED_MUSIC_TYPES, is_supported_music_file};
pub use model::{SongFile, TrackMetadata};
