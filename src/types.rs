//! Core data model: songs, albums, and parsed remote records
//!
//! A [`Song`] is one local audio file's resolved state; an [`Album`] aggregates
//! the songs of one directory under shared metadata. [`SongRecord`] and
//! [`AlbumRecord`] are what the remote provider's responses parse into - every
//! field optional, since the provider may omit any of them.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::normalize::{clean_title, is_bare_year, title_case};

/// One local audio file's resolved descriptive tags.
///
/// Created from on-disk tags, mutated in place during identification and
/// album-level reconciliation. Fields are explicit `Option`s: "absent" and
/// "empty" are distinguishable, and merge precedence never relies on
/// truthiness.
#[derive(Debug, Clone)]
pub struct Song {
    /// File path. Immutable identity.
    pub path: PathBuf,
    /// Stable provider identifier (MusicBrainz ID), once known.
    pub mbid: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub albumartist: Option<String>,
    /// Four-digit year where one could be extracted from the file's date tag,
    /// otherwise the raw date string.
    pub date: Option<String>,
    pub track: Option<u32>,
    /// Resolved genre tags, ordered.
    pub genres: Vec<String>,
    /// Cover art URL, once known. Bytes are fetched separately at export time.
    pub cover: Option<String>,
    /// Unrecognized tag key/value pairs carried over verbatim from the file.
    pub extras: BTreeMap<String, String>,
}

impl Song {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            mbid: None,
            title: None,
            artist: None,
            album: None,
            albumartist: None,
            date: None,
            track: None,
            genres: Vec::new(),
            cover: None,
            extras: BTreeMap::new(),
        }
    }

    /// Build the flat tag map handed to the export collaborator.
    ///
    /// Only fields that are actually present appear in the map. The cover is
    /// deliberately excluded - its bytes travel alongside the map, not inside
    /// it. Extras are appended without displacing resolved fields.
    pub fn export_tags(&self) -> BTreeMap<String, TagValue> {
        let mut tags = BTreeMap::new();

        let text_fields = [
            ("title", &self.title),
            ("artist", &self.artist),
            ("album", &self.album),
            ("albumartist", &self.albumartist),
            ("date", &self.date),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                tags.insert(name.to_string(), TagValue::Text(value.clone()));
            }
        }

        if let Some(track) = self.track {
            tags.insert("tracknumber".to_string(), TagValue::Number(track));
        }
        if !self.genres.is_empty() {
            tags.insert("genre".to_string(), TagValue::List(self.genres.clone()));
        }

        for (key, value) in &self.extras {
            tags.entry(key.clone())
                .or_insert_with(|| TagValue::Text(value.clone()));
        }

        tags
    }
}

/// A single exportable tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    Number(u32),
    List(Vec<String>),
}

/// One directory's aggregate metadata and its member songs.
#[derive(Debug)]
pub struct Album {
    /// Directory base name this album was created from. Immutable.
    pub directory: String,
    /// Current album name: starts as the directory name, replaced by the
    /// resolved canonical name once a lookup succeeds.
    pub name: String,
    pub artist: Option<String>,
    pub cover: Option<String>,
    /// Deduped, normalized provider tags (candidate genres).
    pub tags: Vec<String>,
    /// Cleaned track title -> track number, in provider order. Order matters:
    /// the substring fallback takes the first entry that matches.
    pub tracks: Vec<(String, u32)>,
    /// Set once a provider lookup has been attempted for this album,
    /// successful or not. No further attempts happen afterwards.
    pub lookup_done: bool,
    /// Member songs in filesystem enumeration order.
    pub songs: Vec<Song>,
}

impl Album {
    pub fn new(directory: impl Into<String>) -> Self {
        let directory = directory.into();
        Self {
            name: directory.clone(),
            directory,
            artist: None,
            cover: None,
            tags: Vec::new(),
            tracks: Vec::new(),
            lookup_done: false,
            songs: Vec::new(),
        }
    }

    /// Adopt a fetched album record: canonical name and artist (title-cased),
    /// cover URL, provider tags minus bare-year entries, and the track listing
    /// with titles cleaned for matching.
    pub fn apply_record(&mut self, record: &AlbumRecord) {
        if let Some(name) = non_empty(record.name.as_deref()) {
            self.name = title_case(name);
        }
        if let Some(artist) = non_empty(record.artist.as_deref()) {
            self.artist = Some(title_case(artist));
        }
        if let Some(cover) = non_empty(record.cover.as_deref()) {
            self.cover = Some(cover.to_string());
        }
        self.tags = record
            .tags
            .iter()
            .filter(|tag| !is_bare_year(tag))
            .map(|tag| title_case(tag))
            .collect();
        self.tracks = record
            .tracks
            .iter()
            .map(|(title, rank)| (clean_title(title), *rank))
            .collect();
    }

    /// Resolve a track number for a cleaned song title: exact key match first,
    /// then the first stored-order entry whose key is contained in the title
    /// (gets around `(HD)` / `(cover)` suffixes the cleaner left behind).
    pub fn track_number_for(&self, cleaned_title: &str) -> Option<u32> {
        if let Some((_, rank)) = self
            .tracks
            .iter()
            .find(|(title, _)| title == cleaned_title)
        {
            return Some(*rank);
        }
        self.tracks
            .iter()
            .find(|(title, _)| !title.is_empty() && cleaned_title.contains(title.as_str()))
            .map(|(_, rank)| *rank)
    }
}

/// A song as parsed from a provider response. All fields optional; a missing
/// field in the response is simply absent here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongRecord {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub mbid: Option<String>,
    pub album: Option<String>,
    pub track: Option<u32>,
    pub cover: Option<String>,
    /// Provider tags from the song's album, already title-cased. `None` when
    /// the response carried no album reference or its lookup failed.
    pub tags: Option<Vec<String>>,
}

/// An album as parsed from a provider response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumRecord {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub mbid: Option<String>,
    pub cover: Option<String>,
    /// Provider tag names, title-cased. Year-only tags are filtered later, at
    /// album application time.
    pub tags: Vec<String>,
    /// Provider track name -> provider rank, verbatim and in provider order.
    pub tracks: Vec<(String, u32)>,
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
