//! Integration tests for duplicate-play suppression against a real
//! (in-memory) analytics database.

use airlog_common::db::init::init_schema;
use airlog_common::db::samples::{insert_sample, SampleRow};
use airlog_common::Channel;
use airlog_sc::services::duplicate_guard::{DuplicatePlayGuard, REPEAT_SENTINEL};
use sqlx::SqlitePool;

async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_schema(&pool).await.expect("schema init");
    pool
}

fn some(text: &str) -> Option<String> {
    Some(text.to_string())
}

async fn seed_row(pool: &SqlitePool, main: (&str, &str), second: (&str, &str)) {
    let row = SampleRow {
        date: "2026-08-07".to_string(),
        time: "14:30".to_string(),
        main_artist: some(main.0),
        main_song: some(main.1),
        second_artist: some(second.0),
        second_song: some(second.1),
        ..Default::default()
    };
    insert_sample(pool, &row).await.expect("seed row");
}

#[tokio::test]
async fn test_repeat_of_prior_sample_is_suppressed() {
    let pool = test_pool().await;
    seed_row(&pool, ("Band A", "Song X"), ("Band C", "Song Z")).await;

    let guard = DuplicatePlayGuard::new(&pool);
    let artist = guard
        .artist_to_record(Channel::Main, &some("Band A"), &some("Song X"))
        .await;

    assert_eq!(artist.as_deref(), Some(REPEAT_SENTINEL));
}

#[tokio::test]
async fn test_new_track_passes_through() {
    let pool = test_pool().await;
    seed_row(&pool, ("Band A", "Song X"), ("Band C", "Song Z")).await;

    let guard = DuplicatePlayGuard::new(&pool);
    let artist = guard
        .artist_to_record(Channel::Main, &some("Band B"), &some("Song Y"))
        .await;

    assert_eq!(artist.as_deref(), Some("Band B"));
}

#[tokio::test]
async fn test_channels_are_independent() {
    let pool = test_pool().await;
    seed_row(&pool, ("Band A", "Song X"), ("Band C", "Song Z")).await;

    let guard = DuplicatePlayGuard::new(&pool);

    // Main's prior track playing on the comparison channel is not a repeat
    let artist = guard
        .artist_to_record(Channel::Comparison, &some("Band A"), &some("Song X"))
        .await;
    assert_eq!(artist.as_deref(), Some("Band A"));

    // But the second channel's own prior track is
    let artist = guard
        .artist_to_record(Channel::Second, &some("Band C"), &some("Song Z"))
        .await;
    assert_eq!(artist.as_deref(), Some(REPEAT_SENTINEL));
}

#[tokio::test]
async fn test_empty_table_passes_through() {
    let pool = test_pool().await;

    let guard = DuplicatePlayGuard::new(&pool);
    let artist = guard
        .artist_to_record(Channel::Main, &some("Band A"), &some("Song X"))
        .await;

    assert_eq!(artist.as_deref(), Some("Band A"));
}

#[tokio::test]
async fn test_prior_sentinel_still_suppresses_same_song() {
    let pool = test_pool().await;
    // A long track already suppressed once: artist is the sentinel but the
    // song column still names it
    seed_row(&pool, ("-", "Song X"), ("", "")).await;

    let guard = DuplicatePlayGuard::new(&pool);
    let artist = guard
        .artist_to_record(Channel::Main, &some("Band A"), &some("Song X"))
        .await;

    assert_eq!(artist.as_deref(), Some(REPEAT_SENTINEL));
}

#[tokio::test]
async fn test_placeholder_candidates_skip_the_check() {
    let pool = test_pool().await;
    seed_row(&pool, ("Unknown Artist", "Jingle"), ("Band C", "-")).await;

    let guard = DuplicatePlayGuard::new(&pool);

    let artist = guard
        .artist_to_record(Channel::Main, &some("Unknown Artist"), &some("Jingle"))
        .await;
    assert_eq!(artist.as_deref(), Some("Unknown Artist"));

    let artist = guard
        .artist_to_record(Channel::Second, &some("Band C"), &some("-"))
        .await;
    assert_eq!(artist.as_deref(), Some("Band C"));

    let artist = guard.artist_to_record(Channel::Main, &None, &None).await;
    assert_eq!(artist, None);
}
