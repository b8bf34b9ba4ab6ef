//! Last.fm API client
//!
//! Implements [`MetadataProvider`] against the audioscrobbler 2.0 JSON API
//! (`track.getInfo` / `album.getinfo`). Lookups are memoized in the injected
//! [`MetadataCache`]; requests are rate limited and transport failures get a
//! bounded retry before surfacing as [`LookupError::Network`].
//!
//! A provider response counts as data only when the request returned HTTP 200
//! and the body carries no `error` field; anything else is the no-data
//! outcome, not a failure. Missing fields inside an otherwise valid response
//! parse as absent, never as an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::cache::MetadataCache;
use crate::normalize::title_case;
use crate::services::provider::{LookupError, MetadataProvider};
use crate::types::{AlbumRecord, SongRecord};

const LASTFM_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";
const USER_AGENT: &str = "tagforge/0.1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RATE_LIMIT_MS: u64 = 250; // Last.fm tolerates ~5 req/sec; stay under
const RETRY_LIMIT: u32 = 2;
const RETRY_BACKOFF_MS: u64 = 250;

/// Rate limiter enforcing a minimum interval between requests.
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit.
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

// --- Response shapes -------------------------------------------------------
// Every field optional: the provider omits fields freely and a malformed
// response must degrade to "absent", not abort the parse.

#[derive(Debug, Deserialize)]
struct TrackResponse {
    track: Option<TrackInfo>,
}

#[derive(Debug, Deserialize)]
struct TrackInfo {
    name: Option<String>,
    mbid: Option<String>,
    artist: Option<TrackArtist>,
    album: Option<TrackAlbumRef>,
}

#[derive(Debug, Deserialize)]
struct TrackArtist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackAlbumRef {
    mbid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlbumResponse {
    album: Option<AlbumInfo>,
}

#[derive(Debug, Deserialize)]
struct AlbumInfo {
    name: Option<String>,
    artist: Option<String>,
    mbid: Option<String>,
    #[serde(default)]
    image: Vec<AlbumImage>,
    tags: Option<AlbumTags>,
    tracks: Option<AlbumTracks>,
}

#[derive(Debug, Deserialize)]
struct AlbumImage {
    #[serde(rename = "#text")]
    url: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlbumTags {
    #[serde(default)]
    tag: Vec<AlbumTag>,
}

#[derive(Debug, Deserialize)]
struct AlbumTag {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlbumTracks {
    #[serde(default)]
    track: Vec<AlbumTrack>,
}

#[derive(Debug, Deserialize)]
struct AlbumTrack {
    name: Option<String>,
    #[serde(rename = "@attr")]
    attr: Option<AlbumTrackAttr>,
}

#[derive(Debug, Deserialize)]
struct AlbumTrackAttr {
    // Rank arrives as a JSON number or a string depending on API vintage.
    rank: Option<Value>,
}

/// Last.fm API client.
pub struct LastFmClient {
    http_client: reqwest::Client,
    api_key: String,
    cache: Arc<MetadataCache>,
    rate_limiter: RateLimiter,
}

impl LastFmClient {
    pub fn new(api_key: String, cache: Arc<MetadataCache>) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            cache,
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    /// Issue one provider request with rate limiting and bounded retry.
    ///
    /// `Ok(Some(body))` is a usable response; `Ok(None)` is no-data (non-200
    /// status, unparseable body, or an `error` field in the body). Transport
    /// failures are retried `RETRY_LIMIT` times with doubling backoff, then
    /// returned as `Err`.
    async fn request(&self, params: &[(&str, &str)]) -> Result<Option<Value>, LookupError> {
        let mut backoff = Duration::from_millis(RETRY_BACKOFF_MS);
        let mut attempt = 0u32;

        loop {
            self.rate_limiter.wait().await;

            match self.try_request(params).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < RETRY_LIMIT => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        error = %err,
                        "Last.fm request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_request(&self, params: &[(&str, &str)]) -> Result<Option<Value>, LookupError> {
        let response = self
            .http_client
            .get(LASTFM_BASE_URL)
            .query(&[("api_key", self.api_key.as_str()), ("format", "json")])
            .query(params)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Last.fm returned non-success status");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "Unparseable Last.fm response body");
                return Ok(None);
            }
        };

        if value.get("error").is_some() {
            tracing::debug!(
                error = %value.get("message").and_then(|v| v.as_str()).unwrap_or("unknown"),
                "Last.fm reported an error; treating as no data"
            );
            return Ok(None);
        }

        Ok(Some(value))
    }

    /// Parse a song out of a `track.getInfo` body, resolving a referenced
    /// album through the cache. A failed nested lookup leaves the album
    /// fields absent without failing the song parse.
    async fn song_from_info(&self, info: TrackInfo) -> SongRecord {
        let album_ref = info.album.and_then(|a| a.mbid).filter(|m| !m.is_empty());

        let mut record = SongRecord {
            title: info.name,
            artist: info.artist.and_then(|a| a.name),
            mbid: info.mbid,
            ..Default::default()
        };

        if let Some(album_mbid) = album_ref {
            match self.cached_album_by_id(&album_mbid).await {
                Ok(Some(album)) => {
                    record.album = album.name;
                    record.cover = album.cover;
                    record.tags = Some(album.tags);
                }
                Ok(None) => {
                    tracing::debug!(album_mbid = %album_mbid, "Referenced album not found");
                }
                Err(err) => {
                    tracing::warn!(
                        album_mbid = %album_mbid,
                        error = %err,
                        "Nested album lookup failed; continuing without album fields"
                    );
                }
            }
        }

        record
    }

    async fn cached_album_by_id(&self, mbid: &str) -> Result<Option<AlbumRecord>, LookupError> {
        self.cache
            .album_by_id(mbid, || self.fetch_album_by_id(mbid))
            .await
    }

    async fn fetch_album_by_id(&self, mbid: &str) -> Result<Option<AlbumRecord>, LookupError> {
        let Some(value) = self
            .request(&[("method", "album.getinfo"), ("mbid", mbid)])
            .await?
        else {
            return Ok(None);
        };
        Ok(self.album_from_value(value).await)
    }

    /// Parse an album body and unconditionally warm the by-id cache with the
    /// result, so by-title and by-id lookups share one record.
    async fn album_from_value(&self, value: Value) -> Option<AlbumRecord> {
        let response: AlbumResponse = match serde_json::from_value(value) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "Malformed album response");
                return None;
            }
        };
        let record = parse_album_info(response.album?);

        if let Some(mbid) = record.mbid.clone().filter(|m| !m.is_empty()) {
            self.cache.insert_album_by_id(mbid, record.clone()).await;
        }

        Some(record)
    }

    async fn song_from_value(&self, value: Value) -> Option<SongRecord> {
        let response: TrackResponse = match serde_json::from_value(value) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "Malformed track response");
                return None;
            }
        };
        Some(self.song_from_info(response.track?).await)
    }
}

#[async_trait]
impl MetadataProvider for LastFmClient {
    async fn song_by_id(&self, mbid: &str) -> Result<Option<SongRecord>, LookupError> {
        self.cache
            .song_by_id(mbid, || async {
                let Some(value) = self
                    .request(&[("method", "track.getInfo"), ("mbid", mbid)])
                    .await?
                else {
                    return Ok(None);
                };
                Ok(self.song_from_value(value).await)
            })
            .await
    }

    async fn song_by_title(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<SongRecord>, LookupError> {
        let Some(value) = self
            .request(&[
                ("method", "track.getInfo"),
                ("artist", artist),
                ("track", title),
            ])
            .await?
        else {
            return Ok(None);
        };

        let record = self.song_from_value(value).await;
        if let Some(record) = &record {
            tracing::info!(
                artist = %artist,
                title = %record.title.as_deref().unwrap_or(title),
                "Retrieved song from Last.fm"
            );
        }
        Ok(record)
    }

    async fn album_by_id(&self, mbid: &str) -> Result<Option<AlbumRecord>, LookupError> {
        self.cached_album_by_id(mbid).await
    }

    async fn album_by_title(
        &self,
        artist: &str,
        album: &str,
    ) -> Result<Option<AlbumRecord>, LookupError> {
        self.cache
            .album_by_title(artist, album, || async {
                let Some(value) = self
                    .request(&[
                        ("method", "album.getinfo"),
                        ("artist", artist),
                        ("album", album),
                    ])
                    .await?
                else {
                    return Ok(None);
                };

                let record = self.album_from_value(value).await;
                if let Some(record) = &record {
                    tracing::info!(
                        artist = %artist,
                        album = %record.name.as_deref().unwrap_or(album),
                        "Retrieved album from Last.fm"
                    );
                }
                Ok(record)
            })
            .await
    }
}

/// Map a provider album payload onto an [`AlbumRecord`].
///
/// Cover is the URL carrying the `"large"` size descriptor, last one winning.
/// Tags are title-cased; track names stay verbatim (cleaning happens when an
/// [`crate::types::Album`] adopts the record) and keep provider order.
fn parse_album_info(info: AlbumInfo) -> AlbumRecord {
    let mut cover = None;
    for image in &info.image {
        if image.size.as_deref() == Some("large") {
            cover = image.url.clone().filter(|url| !url.is_empty());
        }
    }

    let tags = info
        .tags
        .map(|tags| tags.tag)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|tag| tag.name)
        .map(|name| title_case(&name))
        .collect();

    let tracks = info
        .tracks
        .map(|tracks| tracks.track)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|track| {
            let name = track.name?;
            let rank = track.attr.and_then(|attr| attr.rank).and_then(parse_rank)?;
            Some((name, rank))
        })
        .collect();

    AlbumRecord {
        name: info.name,
        artist: info.artist,
        mbid: info.mbid,
        cover,
        tags,
        tracks,
    }
}

fn parse_rank(rank: Value) -> Option<u32> {
    match rank {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
