//! Audio file tag extraction
//!
//! Reads the embedded tags of an audio file into a [`Song`]. An untagged but
//! readable file yields a song with only its path set; unreadable files are
//! errors the caller isolates per file.

use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, ItemValue, Tag};
use thiserror::Error;

use crate::normalize::extract_year;
use crate::types::Song;

#[derive(Debug, Error)]
pub enum TagReadError {
    #[error("Failed to read tags: {0}")]
    Read(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read `path` into a [`Song`] populated from its embedded tags.
pub fn read_song(path: &Path) -> Result<Song, TagReadError> {
    let tagged_file = Probe::open(path)
        .map_err(|e| TagReadError::Read(e.to_string()))?
        .read()
        .map_err(|e| TagReadError::Read(e.to_string()))?;

    let mut song = Song::new(path.to_path_buf());

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        tracing::debug!(path = %path.display(), "File carries no tags");
        return Ok(song);
    };

    song.title = tag.title().map(|s| s.to_string());
    song.artist = tag.artist().map(|s| s.to_string());
    song.album = tag.album().map(|s| s.to_string());
    song.track = tag.track();
    song.albumartist = tag
        .get_string(&ItemKey::AlbumArtist)
        .map(|s| s.to_string());
    song.date = read_date(tag);
    song.genres = tag
        .get_strings(&ItemKey::Genre)
        .map(|s| s.to_string())
        .collect();

    for item in tag.items() {
        if let (ItemKey::Unknown(key), ItemValue::Text(value)) = (item.key(), item.value()) {
            song.extras.insert(key.clone(), value.clone());
        }
    }

    Ok(song)
}

/// Reduce the file's date tag to a four-digit year when one is present
/// anywhere in it; otherwise keep the raw value.
fn read_date(tag: &Tag) -> Option<String> {
    let raw = tag
        .get_string(&ItemKey::RecordingDate)
        .map(|s| s.to_string())
        .or_else(|| tag.year().map(|y| y.to_string()))?;

    Some(extract_year(&raw).unwrap_or(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_nonexistent_file_is_an_error() {
        let result = read_song(&PathBuf::from("/nonexistent/file.mp3"));
        assert!(result.is_err());
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-audio.mp3");
        std::fs::write(&path, b"this is not an audio stream").unwrap();

        let result = read_song(&path);
        assert!(result.is_err());
    }
}
