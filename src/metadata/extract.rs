use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use lofty::file::TaggedFileExt;
use lofty::prelude::{Accessor, AudioFile};
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use regex::Regex;
use tracing::debug;

use crate::error::SongError;

use super::model::{SongFile, TrackMetadata};

/// Suffixes (without dot, lowercase) treated as music files.
pub const SUPPORTED_MUSIC_TYPES: &[&str] = &[
    "mp3", "flac", "wav", "ogg", "aif", "aiff", "m4a", "mp4", "aac",
];

/// Comment field packing key and energy, e.g. `"8A - Energy 7"`.
static COMMENT_KEY_ENERGY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(.+?)\s*-\s*energy\s*(\d+)\s*$").expect("comment regex"));

pub fn is_supported_music_file(path: &Path) -> bool {
    file_suffix(path)
        .map(|ext| SUPPORTED_MUSIC_TYPES.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub(crate) fn file_suffix(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// The closed set of tag layouts we know how to map, selected by suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagSchema {
    Id3,
    VorbisComments,
    Mp4Atoms,
}

fn schema_for_suffix(suffix: &str) -> Option<TagSchema> {
    match suffix {
        "mp3" | "aac" | "wav" | "aif" | "aiff" => Some(TagSchema::Id3),
        "flac" | "ogg" => Some(TagSchema::VorbisComments),
        "m4a" | "mp4" => Some(TagSchema::Mp4Atoms),
        _ => None,
    }
}

/// Container-specific raw names for the dedicated key/energy tags. The
/// standard `ItemKey` is always tried first.
fn raw_key_names(schema: TagSchema) -> &'static [&'static str] {
    match schema {
        TagSchema::Id3 => &["TKEY"],
        TagSchema::VorbisComments => &["INITIALKEY", "KEY"],
        TagSchema::Mp4Atoms => &["----:com.apple.iTunes:initialkey"],
    }
}

fn raw_energy_names(schema: TagSchema) -> &'static [&'static str] {
    match schema {
        TagSchema::Id3 => &["EnergyLevel", "ENERGYLEVEL"],
        TagSchema::VorbisComments => &["ENERGYLEVEL", "ENERGY"],
        TagSchema::Mp4Atoms => &["----:com.apple.iTunes:EnergyLevel"],
    }
}

pub(crate) fn parse_key_energy_comment(comment: &str) -> (Option<String>, Option<u32>) {
    match COMMENT_KEY_ENERGY_RE.captures(comment) {
        Some(caps) => {
            let key = caps[1].trim().to_string();
            let energy = caps[2].parse().ok();
            (Some(key).filter(|k| !k.is_empty()), energy)
        }
        None => (None, None),
    }
}

/// Split a raw artist tag into unique, order-preserving names.
pub(crate) fn split_artists(raw: &str) -> Vec<String> {
    let mut artists: Vec<String> = Vec::new();
    for name in raw.split([',', ';']) {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if !artists.iter().any(|a| a.eq_ignore_ascii_case(name)) {
            artists.push(name.to_string());
        }
    }
    artists
}

fn lookup_raw<'a>(tag: &'a Tag, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| tag.get_string(&ItemKey::Unknown((*name).to_string())))
}

fn fill_from_tag(metadata: &mut TrackMetadata, tag: &Tag, schema: TagSchema) {
    if let Some(artist) = tag.artist() {
        metadata.artists = split_artists(&artist);
    }
    if let Some(title) = tag.title() {
        metadata.title = title.trim().to_string();
    }
    if let Some(genre) = tag.genre() {
        metadata.genre = genre.trim().to_string();
    }
    if let Some(year) = tag.year() {
        metadata.year = year;
    } else if let Some(date) = tag.get_string(&ItemKey::RecordingDate) {
        metadata.year = date.chars().take(4).collect::<String>().parse().unwrap_or(0);
    }
    if let Some(bpm) = tag.get_string(&ItemKey::Bpm) {
        metadata.bpm = bpm.trim().parse().unwrap_or(0.0);
    }

    // Key and energy may live in dedicated tags or packed inside the comment
    // field; the dedicated tag wins.
    let (comment_key, comment_energy) = tag
        .get_string(&ItemKey::Comment)
        .map(parse_key_energy_comment)
        .unwrap_or((None, None));

    let dedicated_key = tag
        .get_string(&ItemKey::InitialKey)
        .or_else(|| lookup_raw(tag, raw_key_names(schema)))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    metadata.key = dedicated_key.or(comment_key).unwrap_or_default();

    let dedicated_energy = lookup_raw(tag, raw_energy_names(schema)).and_then(|e| e.trim().parse().ok());
    metadata.energy = dedicated_energy.or(comment_energy).unwrap_or(0);
}

/// Split a filename stem into artists and title.
///
/// Requires exactly one `" - "` separator; zero or several is ambiguous and
/// must not be guessed.
pub(crate) fn parse_stem(path: &Path) -> Option<(Vec<String>, String)> {
    let stem = path.file_stem()?.to_str()?;
    if stem.matches(" - ").count() != 1 {
        return None;
    }
    let (artists, title) = stem.split_once(" - ")?;
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    Some((split_artists(artists), title.to_string()))
}

impl SongFile {
    /// Load a song file's metadata, falling back to filename parsing when the
    /// container or its tags cannot be read.
    ///
    /// Read-only: never touches the file.
    pub fn load(path: &Path) -> Result<SongFile, SongError> {
        if !path.is_file() {
            return Err(SongError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("song file {} does not exist", path.display()),
            )));
        }
        let suffix =
            file_suffix(path).ok_or_else(|| SongError::UnsupportedFormat(path.to_path_buf()))?;
        let schema = schema_for_suffix(&suffix)
            .ok_or_else(|| SongError::UnsupportedFormat(path.to_path_buf()))?;

        let mut metadata = TrackMetadata {
            file_size_kb: fs::metadata(path)?.len() / 1024,
            ..TrackMetadata::default()
        };

        let mut container_error = None;
        match Probe::open(path).and_then(|probe| probe.read()) {
            Ok(tagged) => {
                metadata.duration_seconds = tagged.properties().duration().as_secs();
                if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                    fill_from_tag(&mut metadata, tag, schema);
                }
            }
            Err(err) => {
                debug!(file = %path.display(), %err, "container not parseable, trying filename");
                container_error = Some(err.to_string());
            }
        }

        let stem_parts = parse_stem(path);
        let has_tag_data = !metadata.artists.is_empty() || !metadata.title.is_empty();
        if !has_tag_data && stem_parts.is_none() {
            // A broken container and a broken filename are different defects:
            // the first needs a re-rip, the second a rename.
            return Err(match container_error {
                Some(reason) => SongError::UnreadableMetadata {
                    path: path.to_path_buf(),
                    reason,
                },
                None => SongError::UnableToExtractData(path.to_path_buf()),
            });
        }
        if let Some((artists, title)) = stem_parts {
            if metadata.artists.is_empty() {
                metadata.artists = artists;
            }
            if metadata.title.is_empty() {
                metadata.title = title;
            }
        }

        Ok(SongFile {
            path: path.to_path_buf(),
            metadata,
        })
    }
}
