//! Duplicate-play suppression
//!
//! A five-minute polling interval samples long tracks twice. When a
//! channel's candidate track matches the channel's most recently persisted
//! one, the artist is recorded as the "-" sentinel so downstream
//! aggregation skips the repeat row. Each channel is compared only against
//! its own prior sample.

use crate::utils::text::UNKNOWN_ARTIST;
use airlog_common::db::samples::{self, LastSample};
use airlog_common::Channel;
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Artist value marking a row as a repeat of an in-progress play
pub const REPEAT_SENTINEL: &str = "-";

/// Suppresses double counting of tracks sampled across polling cycles
pub struct DuplicatePlayGuard<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DuplicatePlayGuard<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Decide which artist to record for this channel's sample.
    ///
    /// Returns the candidate unchanged unless the channel's previous row
    /// holds the same song, in which case the sentinel is returned. A
    /// failed lookup never suppresses.
    pub async fn artist_to_record(
        &self,
        channel: Channel,
        artist: &Option<String>,
        song: &Option<String>,
    ) -> Option<String> {
        let (Some(candidate_artist), Some(candidate_song)) = (artist, song) else {
            return artist.clone();
        };

        if candidate_artist.is_empty()
            || candidate_song.is_empty()
            || candidate_artist == UNKNOWN_ARTIST
            || candidate_song == REPEAT_SENTINEL
        {
            return artist.clone();
        }

        let prior = match samples::last_sample(self.pool, channel).await {
            Ok(Some(prior)) => prior,
            Ok(None) => return artist.clone(),
            Err(e) => {
                warn!(channel = %channel, error = %e, "duplicate check query failed");
                return artist.clone();
            }
        };

        if is_repeat(&prior, candidate_artist, candidate_song) {
            debug!(
                channel = %channel,
                artist = %candidate_artist,
                song = %candidate_song,
                "duplicate play detected; recording sentinel artist"
            );
            return Some(REPEAT_SENTINEL.to_string());
        }

        artist.clone()
    }
}

/// Same song, and either the same artist or a prior sentinel (which marks
/// an already-suppressed repeat of the same play)
fn is_repeat(prior: &LastSample, candidate_artist: &str, candidate_song: &str) -> bool {
    match (&prior.artist, &prior.song) {
        (Some(prior_artist), Some(prior_song)) => {
            prior_song == candidate_song
                && (prior_artist == candidate_artist || prior_artist == REPEAT_SENTINEL)
        }
        _ => false,
    }
}
