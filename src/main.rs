//! tagforge binary: walk a music library and reconcile its tags.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use tagforge::cache::{CoverCache, MetadataCache};
use tagforge::config;
use tagforge::export::LogExporter;
use tagforge::services::aggregator::AlbumAggregator;
use tagforge::services::cover::CoverFetcher;
use tagforge::services::identifier::IdentificationResolver;
use tagforge::services::lastfm::LastFmClient;

const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg"];

#[derive(Parser, Debug)]
#[command(name = "tagforge", about = "Identify and reconcile music library metadata")]
struct Args {
    /// Music library root directory
    root: PathBuf,

    /// Run fingerprint identification before the tag lookup instead of as
    /// the fallback
    #[arg(short = 'f', long)]
    force_fingerprint: bool,

    /// Last.fm API key (overrides environment and TOML config)
    #[arg(long)]
    lastfm_api_key: Option<String>,

    /// Config file path (default: ~/.config/tagforge/tagforge.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = args
        .config
        .clone()
        .or_else(config::default_config_path)
        .context("Could not determine a config file location")?;
    let toml_config = config::load_toml_config(&config_path)?;
    let api_key = config::resolve_lastfm_api_key(args.lastfm_api_key.as_deref(), &toml_config)?;

    let metadata_cache = Arc::new(MetadataCache::new());
    let provider = Arc::new(LastFmClient::new(api_key, metadata_cache)?);
    let cover_fetcher = CoverFetcher::new(Arc::new(CoverCache::new()))?;

    // No fingerprint backend is wired up yet; identification runs on tag
    // lookups alone and the fingerprint strategy is a no-op.
    let resolver = IdentificationResolver::new(provider.clone(), None);
    if args.force_fingerprint {
        tracing::warn!("No fingerprint backend available; --force-fingerprint has no effect");
    }

    let aggregator = AlbumAggregator::new(
        provider,
        resolver,
        cover_fetcher,
        Arc::new(LogExporter),
        args.force_fingerprint,
    );

    let directories = collect_album_directories(&args.root)?;
    if directories.is_empty() {
        tracing::warn!(root = %args.root.display(), "No audio files found");
        return Ok(());
    }

    for (dir, files) in directories {
        let dir_name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        tracing::info!(directory = %dir.display(), files = files.len(), "Processing album");
        let album = aggregator.process_directory(&dir_name, &files).await;
        tracing::info!(
            album = %album.name,
            songs = album.songs.len(),
            resolved = album.lookup_done && !album.tracks.is_empty(),
            "Album processed"
        );
    }

    Ok(())
}

/// Group the library's audio files by containing directory, both levels
/// sorted for a deterministic walk order. Directories without audio files
/// are skipped.
fn collect_album_directories(root: &PathBuf) -> anyhow::Result<BTreeMap<PathBuf, Vec<PathBuf>>> {
    let mut directories: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|s| ext.eq_ignore_ascii_case(s))
            });
        if !supported {
            continue;
        }

        if let Some(parent) = path.parent() {
            directories
                .entry(parent.to_path_buf())
                .or_default()
                .push(path.to_path_buf());
        }
    }

    for files in directories.values_mut() {
        files.sort();
    }

    Ok(directories)
}
