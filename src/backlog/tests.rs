use std::fs;

use tempfile::tempdir;

use super::*;
use crate::store::Store;

fn import_settings() -> ImportSettings {
    ImportSettings::default()
}

#[test]
fn missing_folder_is_an_error() {
    let dir = tempdir().unwrap();
    let mut store = Store::open_in_memory().unwrap();
    let err = load_backlog_folder_files(
        &dir.path().join("nope"),
        dir.path(),
        &mut store,
        &import_settings(),
    )
    .unwrap_err();
    assert!(matches!(err, SongError::MissingFolder(_)));
}

#[test]
fn import_inserts_relative_paths_for_audio_only() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("JdP - One.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("nested/Jane - Two.flac"), b"not real").unwrap();
    fs::write(dir.path().join("cover.jpg"), b"junk").unwrap();

    let mut store = Store::open_in_memory().unwrap();
    let inserted =
        load_backlog_folder_files(dir.path(), dir.path(), &mut store, &import_settings()).unwrap();

    assert_eq!(2, inserted);
    assert_eq!(2, store.backlog_count().unwrap());

    let rows = store.backlog_paths_missing_title(None).unwrap();
    assert!(rows.contains(&"JdP - One.mp3".to_string()));
    assert!(rows.contains(&"nested/Jane - Two.flac".to_string()));
}

#[test]
fn reimport_inserts_nothing_new() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("JdP - One.mp3"), b"not real").unwrap();

    let mut store = Store::open_in_memory().unwrap();
    load_backlog_folder_files(dir.path(), dir.path(), &mut store, &import_settings()).unwrap();
    let second =
        load_backlog_folder_files(dir.path(), dir.path(), &mut store, &import_settings()).unwrap();

    assert_eq!(0, second);
    assert_eq!(1, store.backlog_count().unwrap());
}

#[test]
fn small_batches_still_import_everything() {
    let dir = tempdir().unwrap();
    for n in 0..5 {
        fs::write(dir.path().join(format!("Someone - Track {n}.mp3")), b"x").unwrap();
    }

    let mut store = Store::open_in_memory().unwrap();
    let settings = ImportSettings {
        batch_size: 2,
        progress_every: 2,
    };
    let inserted =
        load_backlog_folder_files(dir.path(), dir.path(), &mut store, &settings).unwrap();

    assert_eq!(5, inserted);
}

#[test]
fn metadata_backfill_fills_rows_and_skips_unreadable() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("JdP - One.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("whatev.mp3"), b"no dash no tags").unwrap();

    let mut store = Store::open_in_memory().unwrap();
    load_backlog_folder_files(dir.path(), dir.path(), &mut store, &import_settings()).unwrap();

    let updated = load_backlog_folder_metadata(&store, dir.path(), None).unwrap();
    assert_eq!(1, updated);

    // The readable row is no longer a candidate; the unreadable one still is.
    let remaining = store.backlog_paths_missing_title(None).unwrap();
    assert_eq!(vec!["whatev.mp3".to_string()], remaining);

    // A second pass has nothing readable left to do.
    assert_eq!(0, load_backlog_folder_metadata(&store, dir.path(), None).unwrap());
}

#[test]
fn metadata_backfill_honors_the_path_filter() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("inbox")).unwrap();
    fs::write(dir.path().join("JdP - One.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("inbox/Jane - Two.mp3"), b"not real").unwrap();

    let mut store = Store::open_in_memory().unwrap();
    load_backlog_folder_files(dir.path(), dir.path(), &mut store, &import_settings()).unwrap();

    let updated = load_backlog_folder_metadata(&store, dir.path(), Some("inbox")).unwrap();
    assert_eq!(1, updated);

    let remaining = store.backlog_paths_missing_title(None).unwrap();
    assert_eq!(vec!["JdP - One.mp3".to_string()], remaining);
}
