//! End-to-end identification behavior against fake backends.

mod common;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{FakeFingerprinter, FakeProvider};
use tagforge::services::fingerprint::FingerprintMatch;
use tagforge::services::identifier::{IdentificationResolver, IdentifyOutcome};
use tagforge::types::{Song, SongRecord};

fn tagged_song(title: &str, artist: &str) -> Song {
    let mut song = Song::new(PathBuf::from("/music/album/01.mp3"));
    song.title = Some(title.to_string());
    song.artist = Some(artist.to_string());
    song
}

#[tokio::test]
async fn identification_walk_is_bounded_when_all_lookups_fail() {
    let provider = Arc::new(FakeProvider::new());
    let fingerprinter = Arc::new(FakeFingerprinter::returning(vec![]));
    let resolver = IdentificationResolver::new(provider.clone(), Some(fingerprinter.clone()));

    let mut song = tagged_song("Unknown Song", "Unknown Artist");
    let outcome = resolver.identify(&mut song, false).await;

    assert_eq!(outcome, IdentifyOutcome::Unidentified);
    // One tag pass, one fingerprint-then-tag pass, then stop.
    assert_eq!(provider.song_title_calls.load(Ordering::SeqCst), 2);
    assert_eq!(fingerprinter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fingerprint_match_rescues_a_garbled_tag_lookup() {
    let provider = Arc::new(
        FakeProvider::new().with_song(
            "Real Artist",
            "Real Song",
            SongRecord {
                title: Some("Real Song".to_string()),
                artist: Some("Real Artist".to_string()),
                mbid: Some("tr-1".to_string()),
                ..Default::default()
            },
        ),
    );
    let fingerprinter = Arc::new(FakeFingerprinter::returning(vec![FingerprintMatch {
        score: 0.95,
        recording_id: "rec-1".to_string(),
        title: "real song".to_string(),
        artist: "real artist".to_string(),
    }]));
    let resolver = IdentificationResolver::new(provider.clone(), Some(fingerprinter));

    let mut song = tagged_song("trck01_final", "unknwn");
    let outcome = resolver.identify(&mut song, false).await;

    assert_eq!(outcome, IdentifyOutcome::Identified);
    // The fingerprint candidates were title-cased before the second lookup,
    // then the provider record was merged over them.
    assert_eq!(song.title.as_deref(), Some("Real Song"));
    assert_eq!(song.artist.as_deref(), Some("Real Artist"));
    assert_eq!(song.mbid.as_deref(), Some("tr-1"));
}

#[tokio::test]
async fn merged_record_keeps_local_values_for_empty_remote_fields() {
    let provider = Arc::new(
        FakeProvider::new().with_song(
            "Band",
            "Intro",
            SongRecord {
                title: Some("Intro".to_string()),
                album: Some(String::new()),
                track: Some(1),
                ..Default::default()
            },
        ),
    );
    let resolver = IdentificationResolver::new(provider, None);

    let mut song = tagged_song("Intro", "Band");
    song.album = Some("Tagged Album".to_string());
    let outcome = resolver.identify(&mut song, false).await;

    assert_eq!(outcome, IdentifyOutcome::Identified);
    assert_eq!(song.album.as_deref(), Some("Tagged Album"));
    assert_eq!(song.track, Some(1));
}

#[tokio::test]
async fn untagged_song_without_fingerprinter_never_hits_the_provider() {
    let provider = Arc::new(FakeProvider::new());
    let resolver = IdentificationResolver::new(provider.clone(), None);

    let mut song = Song::new(PathBuf::from("/music/album/untagged.mp3"));
    let outcome = resolver.identify(&mut song, false).await;

    assert_eq!(outcome, IdentifyOutcome::Unidentified);
    assert_eq!(provider.song_title_calls.load(Ordering::SeqCst), 0);
}
