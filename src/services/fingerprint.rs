//! Audio fingerprinting seam
//!
//! Content-based identification is an external collaborator; the engine only
//! consumes its result. When no fingerprinter is wired in, identification
//! degrades to tag-based lookups alone.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Fingerprinting backend failure.
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("fingerprint lookup failed: {0}")]
    Backend(String),
}

/// One candidate identification for a file, best matches first.
#[derive(Debug, Clone)]
pub struct FingerprintMatch {
    /// Match confidence reported by the backend, 0.0 to 1.0.
    pub score: f64,
    /// Stable recording identifier (MusicBrainz ID).
    pub recording_id: String,
    pub title: String,
    pub artist: String,
}

/// Identifies an audio file from its content.
///
/// Returns candidates ordered best-match-first; an empty sequence means the
/// backend had nothing, which the resolver treats as "fall back to tags".
#[async_trait]
pub trait Fingerprinter: Send + Sync {
    async fn identify(&self, path: &Path) -> Result<Vec<FingerprintMatch>, FingerprintError>;
}
