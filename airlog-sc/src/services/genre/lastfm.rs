//! Last.fm tag lookups
//!
//! Second source in the cascade; only active when an API key is
//! configured. Track top-tags are checked first, then the artist's tags.
//! The API returns `tag` as either a single object or a list depending on
//! how many tags exist, so deserialization accepts both shapes.

use super::heuristics::{best_genre_from_tags, GenreCandidate};
use super::GenreSource;
use airlog_common::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const LASTFM_BASE_URL: &str = "http://ws.audioscrobbler.com/2.0/";

#[derive(Debug, Deserialize)]
struct TrackInfoResponse {
    track: Option<TrackBody>,
}

#[derive(Debug, Deserialize)]
struct TrackBody {
    toptags: Option<TagList>,
    artist: Option<TrackArtist>,
}

#[derive(Debug, Deserialize)]
struct TrackArtist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistInfoResponse {
    artist: Option<ArtistBody>,
}

#[derive(Debug, Deserialize)]
struct ArtistBody {
    tags: Option<TagList>,
}

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tag: OneOrMany<LastFmTag>,
}

/// Last.fm collapses single-element lists to a bare object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LastFmTag {
    #[serde(default)]
    name: String,
    count: Option<i64>,
}

fn to_candidates(tags: Vec<LastFmTag>) -> Vec<GenreCandidate> {
    tags.into_iter()
        .map(|tag| GenreCandidate::new(tag.name, tag.count))
        .collect()
}

/// Last.fm web-service client
pub struct LastFmSource {
    client: reqwest::Client,
    api_key: String,
}

impl LastFmSource {
    pub fn new(user_agent: &str, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self { client, api_key })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let response = self.client.get(url).send().await.ok()?;
        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "Last.fm request failed");
            return None;
        }
        response.json().await.ok()
    }

    /// Artist-level tag fallback when the track has no usable tags
    async fn artist_genre(&self, artist: &str) -> Option<String> {
        let url = format!(
            "{}?method=artist.getInfo&api_key={}&artist={}&format=json",
            LASTFM_BASE_URL,
            self.api_key,
            urlencoding::encode(artist.trim())
        );

        let data: ArtistInfoResponse = self.get_json(&url).await?;
        let tags = data.artist?.tags?.tag.into_vec();
        best_genre_from_tags(&to_candidates(tags), artist)
    }
}

#[async_trait]
impl GenreSource for LastFmSource {
    fn name(&self) -> &'static str {
        "lastfm"
    }

    async fn genre_for(&self, artist: &str, song: &str) -> Option<String> {
        let url = format!(
            "{}?method=track.getInfo&api_key={}&artist={}&track={}&format=json",
            LASTFM_BASE_URL,
            self.api_key,
            urlencoding::encode(artist.trim()),
            urlencoding::encode(song.trim())
        );

        let data: TrackInfoResponse = self.get_json(&url).await?;
        let track = data.track?;

        if let Some(toptags) = track.toptags {
            let tags = toptags.tag.into_vec();
            if let Some(genre) = best_genre_from_tags(&to_candidates(tags), artist) {
                return Some(genre);
            }
        }

        let artist_name = track.artist?.name?;
        self.artist_genre(&artist_name).await
    }
}
