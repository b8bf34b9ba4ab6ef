//! Album aggregation pipeline
//!
//! Processes one directory of audio files as an album: reads each file's
//! tags, identifies the songs, resolves the album against the provider at
//! most once, then folds the resolved album back over every member song and
//! hands the final tag sets to the exporter. A failure in any one file is
//! logged and skipped; the rest of the album still goes through.

use std::mem;
use std::path::PathBuf;
use std::sync::Arc;

use crate::export::TagExporter;
use crate::normalize::clean_title;
use crate::services::cover::CoverFetcher;
use crate::services::identifier::IdentificationResolver;
use crate::services::provider::MetadataProvider;
use crate::services::{reconcile, tag_reader};
use crate::types::{non_empty, Album, Song};

pub struct AlbumAggregator {
    provider: Arc<dyn MetadataProvider>,
    resolver: IdentificationResolver,
    cover_fetcher: CoverFetcher,
    exporter: Arc<dyn TagExporter>,
    force_fingerprint: bool,
}

impl AlbumAggregator {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        resolver: IdentificationResolver,
        cover_fetcher: CoverFetcher,
        exporter: Arc<dyn TagExporter>,
        force_fingerprint: bool,
    ) -> Self {
        Self {
            provider,
            resolver,
            cover_fetcher,
            exporter,
            force_fingerprint,
        }
    }

    /// Run the full pipeline over one directory's worth of audio files.
    pub async fn process_directory(&self, dir_name: &str, files: &[PathBuf]) -> Album {
        let mut album = Album::new(dir_name);

        for path in files {
            let mut song = match tag_reader::read_song(path) {
                Ok(song) => song,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "Skipping unreadable file"
                    );
                    continue;
                }
            };

            self.resolver
                .identify(&mut song, self.force_fingerprint)
                .await;
            self.attach_song(&mut album, song).await;
        }

        self.finalize(&mut album).await;
        album
    }

    /// Add an identified song to the album, resolving the album against the
    /// provider on the first song that carries an artist. When the directory
    /// name finds nothing, the song's own album tag becomes the new candidate
    /// name and gets one retry.
    pub async fn attach_song(&self, album: &mut Album, song: Song) {
        if !album.lookup_done {
            if let Some(artist) = non_empty(song.artist.as_deref()) {
                let found = self.lookup_album(album, artist).await;
                if !found {
                    if let Some(tagged_album) = non_empty(song.album.as_deref()) {
                        album.name = tagged_album.to_string();
                        self.lookup_album(album, artist).await;
                    }
                }
                album.lookup_done = true;
            }
        }

        album.songs.push(song);
    }

    async fn lookup_album(&self, album: &mut Album, artist: &str) -> bool {
        let candidate = clean_title(&album.name);

        match self.provider.album_by_title(artist, &candidate).await {
            Ok(Some(record)) => {
                album.apply_record(&record);
                tracing::info!(
                    artist = %artist,
                    album = %album.name,
                    tracks = album.tracks.len(),
                    "Album resolved"
                );
                true
            }
            Ok(None) => {
                tracing::debug!(artist = %artist, album = %candidate, "Album not found");
                false
            }
            Err(err) => {
                tracing::warn!(
                    artist = %artist,
                    album = %candidate,
                    error = %err,
                    "Album lookup failed"
                );
                false
            }
        }
    }

    /// Fold the resolved album over every member song and export the final
    /// tag sets.
    pub async fn finalize(&self, album: &mut Album) {
        let mut songs = mem::take(&mut album.songs);

        for song in &mut songs {
            reconcile::apply_album(album, song);

            let cover = match song.cover.as_deref() {
                Some(url) => match self.cover_fetcher.fetch(url).await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        tracing::warn!(
                            path = %song.path.display(),
                            error = %err,
                            "Cover fetch failed, exporting without art"
                        );
                        None
                    }
                },
                None => None,
            };

            if let Err(err) = self
                .exporter
                .export(song, &song.export_tags(), cover.as_deref())
            {
                tracing::warn!(
                    path = %song.path.display(),
                    error = %err,
                    "Tag export failed"
                );
            }
        }

        album.songs = songs;
    }
}
