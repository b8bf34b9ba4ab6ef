//! Song identification
//!
//! Resolves a song read from disk against the metadata provider. Two
//! strategies exist: a tag-based title lookup, and an acoustic fingerprint
//! match that rewrites the candidate title and artist before the next tag
//! lookup. The walk is bounded: each strategy runs at most once per song,
//! so a song that fails both comes back [`IdentifyOutcome::Unidentified`]
//! with its file-derived tags intact.

use std::sync::Arc;

use crate::normalize::title_case;
use crate::services::fingerprint::Fingerprinter;
use crate::services::provider::MetadataProvider;
use crate::services::reconcile;
use crate::types::Song;

/// Result of an identification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyOutcome {
    /// A provider record was retrieved and merged into the song.
    Identified,
    /// Both strategies were exhausted; the song keeps its file tags.
    Unidentified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    FingerprintLookup,
    TagLookup,
}

/// Drives the identification strategies for one song at a time.
pub struct IdentificationResolver {
    provider: Arc<dyn MetadataProvider>,
    fingerprinter: Option<Arc<dyn Fingerprinter>>,
}

impl IdentificationResolver {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        fingerprinter: Option<Arc<dyn Fingerprinter>>,
    ) -> Self {
        Self {
            provider,
            fingerprinter,
        }
    }

    /// Identify `song` against the provider, merging the retrieved record on
    /// success. `force_fingerprint` makes the fingerprint strategy run first
    /// instead of being the fallback after a failed tag lookup.
    pub async fn identify(&self, song: &mut Song, force_fingerprint: bool) -> IdentifyOutcome {
        let mut strategy = if force_fingerprint {
            Strategy::FingerprintLookup
        } else {
            Strategy::TagLookup
        };

        for _pass in 0..2 {
            let fingerprint_ran = strategy == Strategy::FingerprintLookup;
            if fingerprint_ran {
                self.fingerprint_step(song).await;
            }

            if self.tag_step(song).await {
                return IdentifyOutcome::Identified;
            }

            if fingerprint_ran {
                break;
            }
            strategy = Strategy::FingerprintLookup;
        }

        tracing::warn!(path = %song.path.display(), "Song could not be identified");
        IdentifyOutcome::Unidentified
    }

    /// Rewrite the song's candidate title and artist from the best acoustic
    /// fingerprint match. Failures and empty match lists fall through to the
    /// tag lookup with the candidates unchanged.
    async fn fingerprint_step(&self, song: &mut Song) {
        let Some(fingerprinter) = &self.fingerprinter else {
            tracing::debug!(
                path = %song.path.display(),
                "No fingerprinter configured, skipping acoustic lookup"
            );
            return;
        };

        match fingerprinter.identify(&song.path).await {
            Ok(matches) => match matches.into_iter().next() {
                Some(best) => {
                    tracing::debug!(
                        path = %song.path.display(),
                        score = best.score,
                        title = %best.title,
                        "Fingerprint match"
                    );
                    song.title = Some(title_case(&best.title));
                    song.artist = Some(title_case(&best.artist));
                    song.mbid = Some(best.recording_id);
                }
                None => {
                    tracing::debug!(
                        path = %song.path.display(),
                        "No fingerprint matches"
                    );
                }
            },
            Err(err) => {
                tracing::warn!(
                    path = %song.path.display(),
                    error = %err,
                    "Fingerprint lookup failed"
                );
            }
        }
    }

    /// Look the song up by its candidate title and artist. Returns true when
    /// a record was retrieved and merged.
    async fn tag_step(&self, song: &mut Song) -> bool {
        let (Some(title), Some(artist)) = (song.title.clone(), song.artist.clone()) else {
            tracing::debug!(
                path = %song.path.display(),
                "Missing title or artist, cannot run tag lookup"
            );
            return false;
        };
        if title.is_empty() || artist.is_empty() {
            return false;
        }

        match self.provider.song_by_title(&artist, &title).await {
            Ok(Some(record)) => {
                reconcile::apply_song_record(song, &record);
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(
                    path = %song.path.display(),
                    error = %err,
                    "Song lookup failed"
                );
                false
            }
        }
    }
}
