//! Shared test doubles for the integration tests.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use tagforge::export::{ExportError, TagExporter};
use tagforge::services::fingerprint::{FingerprintError, FingerprintMatch, Fingerprinter};
use tagforge::services::provider::{LookupError, MetadataProvider};
use tagforge::types::{AlbumRecord, Song, SongRecord, TagValue};

/// Provider backed by in-memory fixtures, counting lookups per category.
#[derive(Default)]
pub struct FakeProvider {
    pub songs_by_title: HashMap<(String, String), SongRecord>,
    pub albums_by_title: HashMap<(String, String), AlbumRecord>,
    pub song_title_calls: AtomicUsize,
    pub album_title_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_song(mut self, artist: &str, title: &str, record: SongRecord) -> Self {
        self.songs_by_title
            .insert((artist.to_string(), title.to_string()), record);
        self
    }

    pub fn with_album(mut self, artist: &str, album: &str, record: AlbumRecord) -> Self {
        self.albums_by_title
            .insert((artist.to_string(), album.to_string()), record);
        self
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    async fn song_by_id(&self, _mbid: &str) -> Result<Option<SongRecord>, LookupError> {
        Ok(None)
    }

    async fn song_by_title(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<SongRecord>, LookupError> {
        self.song_title_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .songs_by_title
            .get(&(artist.to_string(), title.to_string()))
            .cloned())
    }

    async fn album_by_id(&self, _mbid: &str) -> Result<Option<AlbumRecord>, LookupError> {
        Ok(None)
    }

    async fn album_by_title(
        &self,
        artist: &str,
        album: &str,
    ) -> Result<Option<AlbumRecord>, LookupError> {
        self.album_title_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .albums_by_title
            .get(&(artist.to_string(), album.to_string()))
            .cloned())
    }
}

/// Fingerprinter returning a fixed match list.
pub struct FakeFingerprinter {
    pub matches: Vec<FingerprintMatch>,
    pub calls: AtomicUsize,
}

impl FakeFingerprinter {
    pub fn returning(matches: Vec<FingerprintMatch>) -> Self {
        Self {
            matches,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fingerprinter for FakeFingerprinter {
    async fn identify(&self, _path: &Path) -> Result<Vec<FingerprintMatch>, FingerprintError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.matches.clone())
    }
}

/// Exporter that records every exported tag set for assertion.
#[derive(Default)]
pub struct CapturingExporter {
    pub exports: Mutex<Vec<(String, BTreeMap<String, TagValue>)>>,
}

impl CapturingExporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TagExporter for CapturingExporter {
    fn export(
        &self,
        song: &Song,
        tags: &BTreeMap<String, TagValue>,
        _cover: Option<&[u8]>,
    ) -> Result<(), ExportError> {
        self.exports
            .lock()
            .unwrap()
            .push((song.path.display().to_string(), tags.clone()));
        Ok(())
    }
}
