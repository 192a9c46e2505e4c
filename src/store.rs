//! SQLite-backed record store.
//!
//! Owns the three tables of the tool: the backlog staging table, the
//! "heard" ledger and the collection snapshot. All reads and writes of those
//! tables go through [`Store`]; no other module touches the database.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, params};

use crate::error::SongError;
use crate::metadata::TrackMetadata;

/// One persistent record per track identity ever deleted or imported.
#[derive(Debug, Clone, PartialEq)]
pub struct HeardSong {
    pub name_hash: String,
    pub file_name: String,
    pub in_collection: bool,
    pub created_at: DateTime<Utc>,
}

/// Snapshot row of a file currently present in the reference collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSong {
    pub name_hash: String,
    pub file_path: String,
    pub file_size_kb: u64,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, SongError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )?;
        Self::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, SongError> {
        let conn = Connection::open_in_memory()?;
        Self::migrate(&conn)?;
        Ok(Self { conn })
    }

    fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS song_backlog (
                path             TEXT PRIMARY KEY,
                title            TEXT,
                artists          TEXT,
                bpm              REAL,
                genre            TEXT,
                duration_seconds INTEGER,
                year             INTEGER,
                key              TEXT,
                energy           INTEGER,
                file_size_kb     INTEGER
            );
            CREATE TABLE IF NOT EXISTS songs_heard (
                name_hash     TEXT PRIMARY KEY,
                file_name     TEXT,
                in_collection INTEGER NOT NULL DEFAULT 0,
                created_at    TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS song_collection (
                name_hash TEXT PRIMARY KEY,
                file_path TEXT NOT NULL,
                file_size INTEGER NOT NULL
            );",
        )
    }

    // ------------------------------------------------------------------
    // Backlog
    // ------------------------------------------------------------------

    /// Insert backlog rows for `paths`, one transaction per call.
    /// Already-known paths are left untouched.
    pub fn insert_backlog_paths(&mut self, paths: &[String]) -> Result<usize, SongError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO song_backlog (path) VALUES (?1)")?;
            for path in paths {
                inserted += stmt.execute(params![path])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Paths of backlog rows whose metadata has not been loaded yet,
    /// optionally narrowed by a substring filter. The filter matches
    /// literally, `%` and `_` carry no pattern meaning.
    pub fn backlog_paths_missing_title(
        &self,
        path_filter: Option<&str>,
    ) -> Result<Vec<String>, SongError> {
        let mut stmt = self.conn.prepare(
            "SELECT path FROM song_backlog
             WHERE title IS NULL AND (?1 = '' OR instr(path, ?1) > 0)
             ORDER BY path",
        )?;
        let needle = path_filter.unwrap_or("");
        let rows = stmt.query_map(params![needle], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, _>>()?)
    }

    /// Write every extracted field back onto an existing backlog row.
    pub fn update_backlog_metadata(
        &self,
        path: &str,
        metadata: &TrackMetadata,
    ) -> Result<(), SongError> {
        self.conn.execute(
            "UPDATE song_backlog
             SET title = ?2, artists = ?3, bpm = ?4, genre = ?5,
                 duration_seconds = ?6, year = ?7, key = ?8, energy = ?9,
                 file_size_kb = ?10
             WHERE path = ?1",
            params![
                path,
                metadata.title,
                metadata.artists.join(", "),
                metadata.bpm,
                metadata.genre,
                metadata.duration_seconds,
                metadata.year,
                metadata.key,
                metadata.energy,
                metadata.file_size_kb,
            ],
        )?;
        Ok(())
    }

    pub fn backlog_count(&self) -> Result<usize, SongError> {
        let count: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM song_backlog", [], |row| row.get(0))?;
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Heard ledger
    // ------------------------------------------------------------------

    pub fn heard_exists(&self, name_hash: &str) -> Result<bool, SongError> {
        let count: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM songs_heard WHERE name_hash = ?1",
            params![name_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// First-seen semantics: inserts only if the identity is new, never
    /// overwriting an existing row's `in_collection` flag.
    pub fn insert_heard_if_absent(
        &self,
        name_hash: &str,
        file_name: &str,
    ) -> Result<(), SongError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO songs_heard (name_hash, file_name, in_collection, created_at)
             VALUES (?1, ?2, 0, ?3)",
            params![name_hash, file_name, Utc::now()],
        )?;
        Ok(())
    }

    /// Insert a heard record flagged in-collection, or flip an existing one.
    pub fn upsert_heard_in_collection(
        &self,
        name_hash: &str,
        file_name: &str,
    ) -> Result<(), SongError> {
        self.conn.execute(
            "INSERT INTO songs_heard (name_hash, file_name, in_collection, created_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(name_hash) DO UPDATE SET in_collection = 1",
            params![name_hash, file_name, Utc::now()],
        )?;
        Ok(())
    }

    pub fn set_heard_in_collection(
        &self,
        name_hash: &str,
        in_collection: bool,
    ) -> Result<(), SongError> {
        self.conn.execute(
            "UPDATE songs_heard SET in_collection = ?2 WHERE name_hash = ?1",
            params![name_hash, in_collection],
        )?;
        Ok(())
    }

    pub fn heard_in_collection_hashes(&self) -> Result<Vec<String>, SongError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name_hash FROM songs_heard WHERE in_collection = 1")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, _>>()?)
    }

    pub fn get_heard(&self, name_hash: &str) -> Result<Option<HeardSong>, SongError> {
        let mut stmt = self.conn.prepare(
            "SELECT name_hash, file_name, in_collection, created_at
             FROM songs_heard WHERE name_hash = ?1",
        )?;
        let mut rows = stmt.query_map(params![name_hash], |row| {
            Ok(HeardSong {
                name_hash: row.get(0)?,
                file_name: row.get(1)?,
                in_collection: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        rows.next().transpose().map_err(SongError::from)
    }

    // ------------------------------------------------------------------
    // Collection snapshot
    // ------------------------------------------------------------------

    /// Truncate and reinsert the collection snapshot in one transaction.
    pub fn recreate_collection(&mut self, songs: &[CollectionSong]) -> Result<(), SongError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM song_collection", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO song_collection (name_hash, file_path, file_size)
                 VALUES (?1, ?2, ?3)",
            )?;
            for song in songs {
                stmt.execute(params![song.name_hash, song.file_path, song.file_size_kb])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn collection_count(&self) -> Result<usize, SongError> {
        let count: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM song_collection", [], |row| row.get(0))?;
        Ok(count)
    }
}
