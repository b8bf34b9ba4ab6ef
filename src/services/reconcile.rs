//! Tag reconciliation
//!
//! Merges provider records into songs and folds a resolved album back over
//! its member songs. Merge direction is fixed: a remote value only replaces
//! a local one when the remote value is non-empty, so a sparse provider
//! response never erases tags read from the file.

use std::collections::BTreeSet;

use crate::normalize::{clean_title, title_case};
use crate::types::{non_empty, Album, Song, SongRecord};

/// Merge a provider song record into `song`.
///
/// Scalar fields overwrite only when the remote side is non-empty. A
/// non-empty remote tag list replaces the local genres wholesale, minus any
/// tag whose title-cased form duplicates the merged title, artist, or album;
/// a missing or empty list leaves the local genres alone.
pub fn apply_song_record(song: &mut Song, record: &SongRecord) {
    overwrite(&mut song.title, record.title.as_deref());
    overwrite(&mut song.artist, record.artist.as_deref());
    overwrite(&mut song.album, record.album.as_deref());
    overwrite(&mut song.cover, record.cover.as_deref());
    overwrite(&mut song.mbid, record.mbid.as_deref());
    if record.track.is_some() {
        song.track = record.track;
    }

    if let Some(tags) = record.tags.as_ref().filter(|tags| !tags.is_empty()) {
        song.genres = tags
            .iter()
            .map(|tag| title_case(tag))
            .filter(|tag| !duplicates_identity(tag, song))
            .collect();
    }
}

/// Fold a resolved album over one of its member songs.
///
/// Album name, cover, and artist win when the album carries them. Genres are
/// the deduplicated union of both sides. The track number is re-resolved from
/// the album listing and may come back absent when no listed track matches.
pub fn apply_album(album: &Album, song: &mut Song) {
    if !album.name.is_empty() {
        song.album = Some(album.name.clone());
    }
    if album.cover.is_some() {
        song.cover = album.cover.clone();
    }
    if album.artist.is_some() {
        song.albumartist = album.artist.clone();
    }

    let genres: BTreeSet<String> = album
        .tags
        .iter()
        .chain(song.genres.iter())
        .map(|tag| title_case(tag))
        .collect();
    song.genres = genres.into_iter().collect();

    let cleaned = clean_title(song.title.as_deref().unwrap_or(""));
    song.track = album.track_number_for(&cleaned);
    if song.track.is_none() {
        tracing::warn!(
            path = %song.path.display(),
            album = %album.name,
            title = %cleaned,
            "No album track matches this song, dropping track number"
        );
    }
}

fn overwrite(local: &mut Option<String>, remote: Option<&str>) {
    if let Some(value) = non_empty(remote) {
        *local = Some(value.to_string());
    }
}

fn duplicates_identity(tag: &str, song: &Song) -> bool {
    let matches = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|value| title_case(value) == tag)
    };
    matches(&song.title) || matches(&song.artist) || matches(&song.album)
}
