//! Process-lifetime memoization of remote lookups
//!
//! Explicit cache objects injected into the remote client and the cover
//! fetcher - no ambient global state, so tests can run against fresh caches.
//! Entries never expire and there is no eviction; a run's working set is a
//! music library's worth of album lookups, which is small.
//!
//! A lookup that completed but produced no data is memoized as `None` so the
//! same miss is not re-issued against the provider. Transport errors are not
//! memoized: a later pass may retry them.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use tokio::sync::Mutex;

use crate::services::provider::LookupError;
use crate::types::{AlbumRecord, SongRecord};

/// Memoization for remote metadata lookups, one namespace per lookup shape.
#[derive(Default)]
pub struct MetadataCache {
    songs_by_id: Mutex<HashMap<String, Option<SongRecord>>>,
    albums_by_id: Mutex<HashMap<String, Option<AlbumRecord>>>,
    albums_by_title: Mutex<HashMap<(String, String), Option<AlbumRecord>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Song lookup keyed by provider identifier.
    pub async fn song_by_id<F, Fut>(
        &self,
        mbid: &str,
        fetch: F,
    ) -> Result<Option<SongRecord>, LookupError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<SongRecord>, LookupError>>,
    {
        get_or_fetch(&self.songs_by_id, mbid.to_string(), fetch).await
    }

    /// Album lookup keyed by provider identifier.
    pub async fn album_by_id<F, Fut>(
        &self,
        mbid: &str,
        fetch: F,
    ) -> Result<Option<AlbumRecord>, LookupError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<AlbumRecord>, LookupError>>,
    {
        get_or_fetch(&self.albums_by_id, mbid.to_string(), fetch).await
    }

    /// Album lookup keyed by (artist, album title).
    pub async fn album_by_title<F, Fut>(
        &self,
        artist: &str,
        album: &str,
        fetch: F,
    ) -> Result<Option<AlbumRecord>, LookupError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<AlbumRecord>, LookupError>>,
    {
        get_or_fetch(
            &self.albums_by_title,
            (artist.to_string(), album.to_string()),
            fetch,
        )
        .await
    }

    /// Store an album under its identifier outside of a by-id lookup.
    ///
    /// Response parsing calls this for every album it parses, so an album
    /// first seen through a by-title lookup is already warm when a later
    /// by-id lookup (e.g. a song's nested album reference) asks for it.
    pub async fn insert_album_by_id(&self, mbid: String, record: AlbumRecord) {
        self.albums_by_id.lock().await.insert(mbid, Some(record));
    }
}

/// Hit: return the memoized value (including memoized no-data) without
/// invoking `fetch`. Miss: invoke `fetch`, memoize its `Ok` result, return it.
/// `Err` results pass through unmemoized.
async fn get_or_fetch<K, V, F, Fut>(
    map: &Mutex<HashMap<K, Option<V>>>,
    key: K,
    fetch: F,
) -> Result<Option<V>, LookupError>
where
    K: Eq + Hash,
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<V>, LookupError>>,
{
    if let Some(cached) = map.lock().await.get(&key) {
        return Ok(cached.clone());
    }

    // Lock released while the fetch is in flight.
    let fetched = fetch().await?;
    map.lock().await.insert(key, fetched.clone());
    Ok(fetched)
}

/// Fetched cover-art bytes, keyed by source URL.
#[derive(Default)]
pub struct CoverCache {
    covers: Mutex<HashMap<String, Vec<u8>>>,
}

impl CoverCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.covers.lock().await.get(url).cloned()
    }

    pub async fn insert(&self, url: String, bytes: Vec<u8>) {
        self.covers.lock().await.insert(url, bytes);
    }
}
