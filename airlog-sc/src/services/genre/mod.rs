//! Genre resolution cascade
//!
//! Three metadata sources are tried strictly in order; the first validated
//! genre wins. Each source is a strategy value behind `GenreSource`, so the
//! driver is a plain loop and a station can reorder or stub sources in
//! tests without touching the cascade.

pub mod heuristics;
pub mod lastfm;
pub mod musicbrainz;
pub mod wikipedia;

pub use heuristics::{best_genre_from_tags, is_valid_genre, is_valid_infobox_genre, GenreCandidate};
pub use lastfm::LastFmSource;
pub use musicbrainz::MusicBrainzSource;
pub use wikipedia::WikipediaSource;

use crate::utils::text::UNKNOWN_ARTIST;
use airlog_common::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// One genre lookup strategy
#[async_trait]
pub trait GenreSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Try to resolve a validated genre for this artist/song pair.
    ///
    /// Unavailable, unparseable and invalid-candidate outcomes all come
    /// back as None.
    async fn genre_for(&self, artist: &str, song: &str) -> Option<String>;
}

/// Ordered cascade over the configured genre sources
pub struct GenreResolver {
    sources: Vec<Box<dyn GenreSource>>,
}

impl GenreResolver {
    /// Build the standard cascade: MusicBrainz, then Last.fm (when an API
    /// key is configured), then Wikipedia.
    pub fn new(user_agent: &str, lastfm_api_key: Option<String>) -> Result<Self> {
        let mut sources: Vec<Box<dyn GenreSource>> =
            vec![Box::new(MusicBrainzSource::new(user_agent)?)];

        if let Some(api_key) = lastfm_api_key {
            sources.push(Box::new(LastFmSource::new(user_agent, api_key)?));
        } else {
            debug!("no Last.fm API key configured; source disabled");
        }

        sources.push(Box::new(WikipediaSource::new(user_agent)?));

        Ok(Self { sources })
    }

    /// Build a cascade over arbitrary sources (used by tests)
    pub fn with_sources(sources: Vec<Box<dyn GenreSource>>) -> Self {
        Self { sources }
    }

    /// Resolve a genre for an artist/song pair.
    ///
    /// Empty fields and the "Unknown Artist" placeholder short-circuit to
    /// None without querying any source. The winning genre is title-cased.
    pub async fn resolve(&self, artist: &str, song: &str) -> Option<String> {
        if artist.is_empty() || song.is_empty() || artist == UNKNOWN_ARTIST {
            return None;
        }

        for source in &self.sources {
            debug!(source = source.name(), artist = %artist, song = %song, "trying genre source");

            if let Some(genre) = source.genre_for(artist, song).await {
                info!(
                    source = source.name(),
                    artist = %artist,
                    song = %song,
                    genre = %genre,
                    "genre resolved"
                );
                return Some(title_case(&genre));
            }
        }

        debug!(artist = %artist, song = %song, "no genre found");
        None
    }
}

/// Capitalize the first letter of each word.
///
/// Word boundaries are whitespace, apostrophes and hyphens, so "rock 'n'
/// roll" and "post-punk" come out as "Rock 'N' Roll" and "Post-Punk".
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_boundary = true;

    for c in text.chars() {
        if at_boundary {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        at_boundary = matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{0B}' | '\u{0C}' | '\'' | '-');
    }

    result
}
