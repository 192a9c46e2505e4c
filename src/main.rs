use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod backlog;
mod cleaning;
mod collection;
mod config;
mod error;
mod metadata;
mod naming;
mod store;

use cleaning::CleaningPipeline;
use config::Settings;
use store::Store;

#[derive(Parser)]
#[command(
    name = "songtools",
    version,
    about = "Curate a music library: clean folders, track heard songs, keep the backlog deduplicated"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize a folder in place: filenames, sidecar junk, empty dirs
    CleanFolder {
        /// Folder to clean; defaults to the configured backlog
        folder: Option<PathBuf>,
    },
    /// Register every audio file under the backlog folder in the database
    LoadFolder {
        /// Folder to scan; defaults to the configured backlog
        folder: Option<PathBuf>,
    },
    /// Extract metadata for backlog rows that have none yet
    LoadMeta {
        /// Only consider rows whose path contains this substring
        #[arg(long)]
        path_filter: Option<String>,
    },
    /// Record a folder's songs as heard, then delete the folder
    DeleteFolder { folder: PathBuf },
    /// Remove songs already heard before from a folder
    DedupFolder {
        /// Folder to deduplicate; defaults to the configured backlog
        folder: Option<PathBuf>,
    },
    /// Rebuild the collection snapshot and heard flags from disk
    SyncCollection,
    /// Report collection files whose name differs from the canonical form
    CheckCollection,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let settings = Settings::load().context("loading configuration")?;
    settings.validate().map_err(anyhow::Error::msg)?;

    match cli.command {
        Command::CleanFolder { folder } => {
            let folder = folder.unwrap_or_else(|| settings.backlog_path.clone());
            let pipeline = CleaningPipeline::new(settings.cleaning.clone());
            pipeline.clean(&folder)?;
        }
        Command::LoadFolder { folder } => {
            let folder = folder.unwrap_or_else(|| settings.backlog_path.clone());
            let mut store = Store::open(&settings.database_path)?;
            backlog::load_backlog_folder_files(
                &folder,
                &settings.backlog_path,
                &mut store,
                &settings.import,
            )?;
        }
        Command::LoadMeta { path_filter } => {
            let store = Store::open(&settings.database_path)?;
            backlog::load_backlog_folder_metadata(
                &store,
                &settings.backlog_path,
                path_filter.as_deref(),
            )?;
        }
        Command::DeleteFolder { folder } => {
            let store = Store::open(&settings.database_path)?;
            collection::delete_song_folder(&folder, &store, &settings.cleaning)?;
        }
        Command::DedupFolder { folder } => {
            let folder = folder.unwrap_or_else(|| settings.backlog_path.clone());
            let store = Store::open(&settings.database_path)?;
            collection::dedup_song_folder(&folder, &store)?;
        }
        Command::SyncCollection => {
            let mut store = Store::open(&settings.database_path)?;
            collection::sync_collection(&settings.collection_path, &mut store)?;
        }
        Command::CheckCollection => {
            let mismatches =
                collection::collection_name_inconsistencies(&settings.collection_path)?;
            info!(mismatches = mismatches.len(), "collection name check finished");
        }
    }

    Ok(())
}
