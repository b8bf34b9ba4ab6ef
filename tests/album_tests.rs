//! Album aggregation pipeline behavior against fake backends.

mod common;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{CapturingExporter, FakeProvider};
use tagforge::cache::CoverCache;
use tagforge::services::aggregator::AlbumAggregator;
use tagforge::services::cover::CoverFetcher;
use tagforge::services::identifier::IdentificationResolver;
use tagforge::types::{Album, AlbumRecord, Song, TagValue};

fn aggregator(provider: Arc<FakeProvider>, exporter: Arc<CapturingExporter>) -> AlbumAggregator {
    let resolver = IdentificationResolver::new(provider.clone(), None);
    let cover_fetcher = CoverFetcher::new(Arc::new(CoverCache::new())).unwrap();
    AlbumAggregator::new(provider, resolver, cover_fetcher, exporter, false)
}

fn member_song(file: &str, title: &str, artist: &str) -> Song {
    let mut song = Song::new(PathBuf::from(format!("/music/album/{}", file)));
    song.title = Some(title.to_string());
    song.artist = Some(artist.to_string());
    song
}

fn album_record() -> AlbumRecord {
    AlbumRecord {
        name: Some("Real Album".to_string()),
        artist: Some("Band".to_string()),
        tags: vec!["Rock".to_string(), "1999".to_string()],
        tracks: vec![
            ("Intro".to_string(), 1),
            ("Outro".to_string(), 2),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn album_lookup_happens_at_most_once_per_album() {
    let provider =
        Arc::new(FakeProvider::new().with_album("Band", "Real Album", album_record()));
    let agg = aggregator(provider.clone(), Arc::new(CapturingExporter::new()));

    let mut album = Album::new("real album");
    for n in 0..5 {
        agg.attach_song(&mut album, member_song(&format!("{n}.mp3"), "Intro", "Band"))
            .await;
    }

    assert!(album.lookup_done);
    assert_eq!(album.name, "Real Album");
    assert_eq!(provider.album_title_calls.load(Ordering::SeqCst), 1);
    assert_eq!(album.songs.len(), 5);
}

#[tokio::test]
async fn failed_lookup_retries_once_with_the_songs_album_tag() {
    let provider =
        Arc::new(FakeProvider::new().with_album("Band", "Real Album", album_record()));
    let agg = aggregator(provider.clone(), Arc::new(CapturingExporter::new()));

    let mut album = Album::new("2003 - rip_by_someone");
    let mut song = member_song("01.mp3", "Intro", "Band");
    song.album = Some("Real Album".to_string());
    agg.attach_song(&mut album, song).await;

    // Directory-derived candidate missed, the song's own album tag hit.
    assert_eq!(provider.album_title_calls.load(Ordering::SeqCst), 2);
    assert_eq!(album.name, "Real Album");
    assert!(album.lookup_done);

    // Later songs never trigger another attempt, resolved or not.
    agg.attach_song(&mut album, member_song("02.mp3", "Outro", "Band"))
        .await;
    assert_eq!(provider.album_title_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unresolved_album_attempts_only_while_undone() {
    let provider = Arc::new(FakeProvider::new());
    let agg = aggregator(provider.clone(), Arc::new(CapturingExporter::new()));

    let mut album = Album::new("obscure bootleg");
    agg.attach_song(&mut album, member_song("01.mp3", "Intro", "Band"))
        .await;
    agg.attach_song(&mut album, member_song("02.mp3", "Outro", "Band"))
        .await;

    // One failed attempt on the first artist-bearing song, then done.
    assert_eq!(provider.album_title_calls.load(Ordering::SeqCst), 1);
    assert!(album.lookup_done);
    assert!(album.tracks.is_empty());
}

#[tokio::test]
async fn artistless_songs_defer_the_lookup_to_a_later_member() {
    let provider =
        Arc::new(FakeProvider::new().with_album("Band", "Real Album", album_record()));
    let agg = aggregator(provider.clone(), Arc::new(CapturingExporter::new()));

    let mut album = Album::new("real album");
    let mut untagged = Song::new(PathBuf::from("/music/album/00.mp3"));
    untagged.title = Some("Hidden Intro".to_string());
    agg.attach_song(&mut album, untagged).await;

    assert!(!album.lookup_done);
    assert_eq!(provider.album_title_calls.load(Ordering::SeqCst), 0);

    agg.attach_song(&mut album, member_song("01.mp3", "Intro", "Band"))
        .await;
    assert!(album.lookup_done);
    assert_eq!(album.name, "Real Album");
}

#[tokio::test]
async fn finalize_reconciles_and_exports_every_member() {
    let provider =
        Arc::new(FakeProvider::new().with_album("Band", "Real Album", album_record()));
    let exporter = Arc::new(CapturingExporter::new());
    let agg = aggregator(provider.clone(), exporter.clone());

    let mut album = Album::new("real album");
    let mut first = member_song("01.mp3", "Intro", "Band");
    first.genres = vec!["Live".to_string()];
    first.track = Some(9);
    agg.attach_song(&mut album, first).await;
    agg.attach_song(&mut album, member_song("02.mp3", "Banter", "Band"))
        .await;

    agg.finalize(&mut album).await;

    let exports = exporter.exports.lock().unwrap();
    assert_eq!(exports.len(), 2);

    let (_, first_tags) = &exports[0];
    assert_eq!(
        first_tags.get("album"),
        Some(&TagValue::Text("Real Album".to_string()))
    );
    assert_eq!(
        first_tags.get("albumartist"),
        Some(&TagValue::Text("Band".to_string()))
    );
    // Track re-resolved from the album listing, replacing the file's 9.
    assert_eq!(first_tags.get("tracknumber"), Some(&TagValue::Number(1)));
    // Union of album tags and file genres; the year-only tag was dropped
    // when the album adopted the record.
    assert_eq!(
        first_tags.get("genre"),
        Some(&TagValue::List(vec!["Live".to_string(), "Rock".to_string()]))
    );

    let (_, second_tags) = &exports[1];
    // "Banter" is not in the album listing, so its track number is dropped.
    assert_eq!(second_tags.get("tracknumber"), None);
    assert_eq!(
        second_tags.get("album"),
        Some(&TagValue::Text("Real Album".to_string()))
    );

    // The album retains its member songs after finalize.
    assert_eq!(album.songs.len(), 2);
}

#[tokio::test]
async fn unreadable_files_are_skipped_without_sinking_the_album() {
    let provider = Arc::new(FakeProvider::new());
    let exporter = Arc::new(CapturingExporter::new());
    let agg = aggregator(provider, exporter.clone());

    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("broken.mp3");
    std::fs::write(&bad, b"not actually audio").unwrap();

    let album = agg.process_directory("garbage", &[bad]).await;
    assert!(album.songs.is_empty());
    assert!(exporter.exports.lock().unwrap().is_empty());
}
