//! MusicBrainz genre lookups
//!
//! Primary genre source: no API key required and the tag data is
//! community-curated. Recordings matching artist+title are inspected
//! first (inline tags, then each credited artist's tags); when the
//! recording search draws a blank the same walk runs over an artist-only
//! search. MusicBrainz asks clients to pace themselves, so every call is
//! preceded by a fixed delay.

use super::heuristics::{best_genre_from_tags, GenreCandidate};
use super::GenreSource;
use airlog_common::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const CALL_DELAY_MS: u64 = 100;
const RECORDING_SEARCH_LIMIT: u32 = 5;
const ARTIST_SEARCH_LIMIT: u32 = 3;

#[derive(Debug, Deserialize)]
struct RecordingSearchResponse {
    #[serde(default)]
    recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ArtistCredit>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    artist: Option<CreditedArtist>,
}

#[derive(Debug, Deserialize)]
struct CreditedArtist {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<ArtistEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtistEntry {
    id: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct ArtistLookupResponse {
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    #[serde(default)]
    name: String,
    count: Option<i64>,
}

fn to_candidates(tags: &[Tag]) -> Vec<GenreCandidate> {
    tags.iter()
        .map(|tag| GenreCandidate::new(tag.name.clone(), tag.count))
        .collect()
}

/// MusicBrainz web-service client
pub struct MusicBrainzSource {
    client: reqwest::Client,
}

impl MusicBrainzSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self { client })
    }

    /// GET + JSON decode with the politeness delay; any failure is None
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        tokio::time::sleep(Duration::from_millis(CALL_DELAY_MS)).await;

        let response = self.client.get(url).send().await.ok()?;
        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = %status, "MusicBrainz request failed");
            return None;
        }

        response.json().await.ok()
    }

    /// Resolve one artist's full tag list by MBID
    async fn artist_genre_by_id(&self, artist_id: &str) -> Option<String> {
        let url = format!(
            "{}/artist/{}?inc=tags&fmt=json",
            MUSICBRAINZ_BASE_URL, artist_id
        );
        let data: ArtistLookupResponse = self.get_json(&url).await?;
        // The artist is unknown at this point; skip the name-overlap check
        best_genre_from_tags(&to_candidates(&data.tags), "")
    }

    /// Artist-only search fallback when no recording matches
    async fn genre_by_artist_search(&self, artist: &str) -> Option<String> {
        let query = urlencoding::encode(&format!("artist:\"{}\"", artist)).into_owned();
        let url = format!(
            "{}/artist?query={}&fmt=json&limit={}",
            MUSICBRAINZ_BASE_URL, query, ARTIST_SEARCH_LIMIT
        );

        let data: ArtistSearchResponse = self.get_json(&url).await?;

        for entry in &data.artists {
            if let Some(genre) = best_genre_from_tags(&to_candidates(&entry.tags), artist) {
                return Some(genre);
            }
            if let Some(genre) = self.artist_genre_by_id(&entry.id).await {
                return Some(genre);
            }
        }

        None
    }
}

#[async_trait]
impl GenreSource for MusicBrainzSource {
    fn name(&self) -> &'static str {
        "musicbrainz"
    }

    async fn genre_for(&self, artist: &str, song: &str) -> Option<String> {
        let artist = artist.trim();
        let song = song.trim();

        let query = urlencoding::encode(&format!(
            "artist:\"{}\" AND recording:\"{}\"",
            artist, song
        ))
        .into_owned();
        let url = format!(
            "{}/recording?query={}&fmt=json&limit={}",
            MUSICBRAINZ_BASE_URL, query, RECORDING_SEARCH_LIMIT
        );

        let recordings = self
            .get_json::<RecordingSearchResponse>(&url)
            .await
            .map(|data| data.recordings)
            .unwrap_or_default();

        if recordings.is_empty() {
            return self.genre_by_artist_search(artist).await;
        }

        for recording in &recordings {
            if let Some(genre) = best_genre_from_tags(&to_candidates(&recording.tags), artist) {
                return Some(genre);
            }

            for credit in &recording.artist_credit {
                if let Some(credited) = &credit.artist {
                    if let Some(genre) = self.artist_genre_by_id(&credited.id).await {
                        return Some(genre);
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing_with_tags() {
        let body = r#"{
            "recordings": [{
                "tags": [
                    {"name": "new wave", "count": 4},
                    {"name": "british", "count": 9}
                ],
                "artist-credit": [{"artist": {"id": "abc-123"}}]
            }]
        }"#;
        let data: RecordingSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(data.recordings.len(), 1);

        let genre = best_genre_from_tags(&to_candidates(&data.recordings[0].tags), "Blondie");
        assert_eq!(genre.as_deref(), Some("new wave"));
    }

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let data: RecordingSearchResponse = serde_json::from_str(r#"{"recordings": [{}]}"#).unwrap();
        assert!(data.recordings[0].tags.is_empty());
        assert!(data.recordings[0].artist_credit.is_empty());

        let data: ArtistSearchResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(data.artists.is_empty());
    }

    #[test]
    fn test_tag_count_defaults_to_one() {
        let tag: Tag = serde_json::from_str(r#"{"name": "ska"}"#).unwrap();
        let candidates = to_candidates(&[tag]);
        assert_eq!(candidates[0].weight, 1);
    }

    #[test]
    fn test_client_creation() {
        let source = MusicBrainzSource::new("Test Radio Listener Analysis/0.1.0 (example.org)");
        assert!(source.is_ok());
    }
}
