//! Remote metadata provider seam
//!
//! The identification and album code talks to the provider through this trait
//! so tests can inject counting fakes. The shipped implementation is
//! [`crate::services::lastfm::LastFmClient`].

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{AlbumRecord, SongRecord};

/// Transport-level lookup failure.
///
/// Deliberately distinct from the no-data outcome: a provider that answered
/// "nothing found" yields `Ok(None)`, while a request that never got a usable
/// answer off the wire yields this. Callers treat both as "try the next
/// strategy", but only transport failures are retried and never memoized.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("network error: {0}")]
    Network(String),
}

/// The four lookup operations the engine needs from a metadata provider.
///
/// `Ok(None)` is the recoverable no-data outcome; `Err` is a transport
/// failure that already exhausted the client's bounded retries.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Lookup a song by its stable provider identifier.
    async fn song_by_id(&self, mbid: &str) -> Result<Option<SongRecord>, LookupError>;

    /// Lookup a song by free-text artist and title.
    async fn song_by_title(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<SongRecord>, LookupError>;

    /// Lookup an album by its stable provider identifier.
    async fn album_by_id(&self, mbid: &str) -> Result<Option<AlbumRecord>, LookupError>;

    /// Lookup an album by free-text artist and album title.
    async fn album_by_title(
        &self,
        artist: &str,
        album: &str,
    ) -> Result<Option<AlbumRecord>, LookupError>;
}
