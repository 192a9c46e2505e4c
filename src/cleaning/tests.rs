use std::fs;
use std::path::Path;

use tempfile::tempdir;

use super::*;
use crate::config::CleaningSettings;

fn pipeline() -> CleaningPipeline {
    CleaningPipeline::new(CleaningSettings::default())
}

/// Sorted relative paths of everything under `root`.
fn tree(root: &Path) -> Vec<String> {
    let mut paths: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    paths.sort();
    paths
}

#[test]
fn clean_rejects_missing_folder() {
    let result = pipeline().clean(Path::new("/nonexistent/backlog"));
    assert!(matches!(result, Err(SongError::MissingFolder(_))));
}

#[test]
fn lowercases_uppercase_suffixes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("JdP - Track.MP3"), b"not real").unwrap();

    pipeline().clean(dir.path()).unwrap();

    assert!(dir.path().join("Jdp - Track.mp3").exists());
    assert!(!dir.path().join("JdP - Track.MP3").exists());
}

#[test]
fn removes_blacklisted_files_but_keeps_exotic_suffixes() {
    let dir = tempdir().unwrap();
    for name in [
        "cover.jpg",
        "playlist.m3u",
        "info.nfo",
        "rip.cue",
        "notes.txt",
    ] {
        fs::write(dir.path().join(name), b"junk").unwrap();
    }
    // Not on the blacklist, not a known audio suffix either: must survive.
    fs::write(dir.path().join("weird.opus"), b"maybe audio").unwrap();

    pipeline().clean(dir.path()).unwrap();

    assert_eq!(vec!["weird.opus"], tree(dir.path()));
}

#[test]
fn removes_cyrillic_named_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Привет - мир.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("JdP - Latin.mp3"), b"not real").unwrap();

    pipeline().clean(dir.path()).unwrap();

    assert_eq!(vec!["Jdp - Latin.mp3"], tree(dir.path()));
}

#[test]
fn renames_music_files_to_canonical_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("JdP, jane - frequencies.mp3"), b"not real").unwrap();

    pipeline().clean(dir.path()).unwrap();

    assert_eq!(vec!["Jane, Jdp - Frequencies.mp3"], tree(dir.path()));
}

#[test]
fn casing_only_rename_goes_through_temporary_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("jdp - cool song.mp3"), b"not real").unwrap();

    pipeline().clean(dir.path()).unwrap();

    assert_eq!(vec!["Jdp - Cool Song.mp3"], tree(dir.path()));
}

#[test]
fn casing_variant_of_canonical_twin_is_left_for_dedup() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Jdp - One.mp3"), b"keep these bytes").unwrap();
    fs::write(dir.path().join("jdp - one.mp3"), b"other bytes").unwrap();

    pipeline().clean(dir.path()).unwrap();

    assert_eq!(vec!["Jdp - One.mp3", "jdp - one.mp3"], tree(dir.path()));
    assert_eq!(
        b"keep these bytes".to_vec(),
        fs::read(dir.path().join("Jdp - One.mp3")).unwrap()
    );
}

#[test]
fn unreadable_music_files_are_left_alone() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("whatev.mp3"), b"not real").unwrap();

    pipeline().clean(dir.path()).unwrap();

    assert_eq!(vec!["whatev.mp3"], tree(dir.path()));
}

#[test]
fn prunes_empty_and_artifact_only_folders() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("empty_a/empty_a2")).unwrap();
    let marker_dir = dir.path().join("markers");
    fs::create_dir(&marker_dir).unwrap();
    fs::write(marker_dir.join(".DS_Store"), b"mac junk").unwrap();
    fs::write(dir.path().join("some artist - some song.mp3"), b"not real").unwrap();

    pipeline().clean(dir.path()).unwrap();

    assert_eq!(vec!["Some Artist - Some Song.mp3"], tree(dir.path()));
}

#[test]
fn appledouble_shadow_files_are_not_treated_as_music() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("._JdP - Track.mp3"), b"resource fork").unwrap();

    pipeline().clean(dir.path()).unwrap();

    // The shadow file is an OS artifact: its folder is pruned wholesale.
    assert!(tree(dir.path()).is_empty());
}

#[test]
fn clean_is_idempotent() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
    fs::write(dir.path().join("nested/JdP - one.mp3"), b"not real").unwrap();
    fs::write(
        dir.path().join("nested/deeper/a, b - two (original mix).mp3"),
        b"not real",
    )
    .unwrap();
    fs::write(dir.path().join("cover.png"), b"junk").unwrap();

    let cleaner = pipeline();
    cleaner.clean(dir.path()).unwrap();
    let first = tree(dir.path());
    cleaner.clean(dir.path()).unwrap();
    let second = tree(dir.path());

    assert_eq!(first, second);
    assert!(first.contains(&"nested/Jdp - One.mp3".to_string()));
    assert!(first.contains(&"nested/deeper/A, B - Two.mp3".to_string()));
}
