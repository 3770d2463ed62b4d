//! Wikipedia infobox genre lookups
//!
//! Last-resort source: finds the best-matching article for the artist,
//! pulls its raw wikitext, and reads the genre field out of a musician or
//! band infobox. Only gives an artist-level genre, never a per-track one,
//! which is why it sits at the end of the cascade.

use super::heuristics::is_valid_infobox_genre;
use super::GenreSource;
use airlog_common::{Error, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";

lazy_static! {
    // Only articles that declare a person/musician/band infobox are
    // trusted; anything else risks reading a genre off a film or album
    static ref INFOBOX_RE: Regex = Regex::new(
        r"(?i)\{\{Infobox\s+(?:musical artist|musician|singer|band|person)"
    )
    .expect("infobox pattern");
    // Field values run to end of line; pipes inside [[..|..]] links are
    // part of the value and get split off after link resolution
    static ref GENRE_FIELD_RES: Vec<Regex> = [
        r"(?i)\|\s*genres?\s*=\s*([^\n}]+)",
        r"(?i)\|\s*styles?\s*=\s*([^\n}]+)",
        r"(?i)\|\s*music[_\s]?styles?\s*=\s*([^\n}]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("genre field pattern"))
    .collect();
    // [[Rock music|Rock]] -> Rock
    static ref WIKILINK_RE: Regex =
        Regex::new(r"\[\[([^|\]]+)(?:\|[^\]]+)?\]\]").expect("wikilink pattern");
    static ref TEMPLATE_RE: Regex = Regex::new(r"\{\{[^}]+\}\}").expect("template pattern");
    static ref COMMENT_RE: Regex = Regex::new(r"(?s)<!--.*?-->").expect("comment pattern");
    static ref HTML_TAG_RE: Regex = Regex::new(r"<[^>]+>").expect("html tag pattern");
    static ref REF_RE: Regex = Regex::new(r"(?is)<ref[^>]*>.*?</ref>").expect("ref pattern");
    static ref NATIONALITY_PREFIX_RE: Regex = Regex::new(
        r"(?i)^(?:American|British|English|Irish|Scottish|Welsh|Canadian|Australian)\s+"
    )
    .expect("nationality prefix pattern");
    static ref BULLET_RE: Regex = Regex::new(r"^\*\s*").expect("bullet pattern");
    static ref MUSIC_SUFFIX_RE: Regex = Regex::new(r"(?i)\s+music$").expect("music suffix pattern");
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").expect("whitespace pattern");
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    query: Option<ContentQuery>,
}

#[derive(Debug, Deserialize)]
struct ContentQuery {
    #[serde(default)]
    pages: HashMap<String, ContentPage>,
}

#[derive(Debug, Deserialize)]
struct ContentPage {
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    slots: Option<RevisionSlots>,
}

#[derive(Debug, Deserialize)]
struct RevisionSlots {
    main: Option<MainSlot>,
}

#[derive(Debug, Deserialize)]
struct MainSlot {
    #[serde(rename = "*")]
    content: Option<String>,
}

/// Wikipedia search + raw-content client
pub struct WikipediaSource {
    client: reqwest::Client,
}

impl WikipediaSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self { client })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let response = self.client.get(url).send().await.ok()?;
        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "Wikipedia request failed");
            return None;
        }
        response.json().await.ok()
    }

    /// Best-matching article title for the artist
    async fn search_article(&self, artist: &str) -> Option<String> {
        let url = format!(
            "{}?action=query&format=json&list=search&srsearch={}&srlimit=1",
            WIKIPEDIA_API_URL,
            urlencoding::encode(artist)
        );

        let data: SearchResponse = self.get_json(&url).await?;
        data.query?.search.into_iter().next().map(|hit| hit.title)
    }

    /// Raw wikitext of an article's main revision slot
    async fn fetch_wikitext(&self, title: &str) -> Option<String> {
        let url = format!(
            "{}?action=query&format=json&prop=revisions&rvprop=content&rvslots=main&titles={}",
            WIKIPEDIA_API_URL,
            urlencoding::encode(title)
        );

        let data: ContentResponse = self.get_json(&url).await?;
        data.query?
            .pages
            .into_values()
            .next()?
            .revisions
            .into_iter()
            .next()?
            .slots?
            .main?
            .content
    }
}

#[async_trait]
impl GenreSource for WikipediaSource {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    async fn genre_for(&self, artist: &str, _song: &str) -> Option<String> {
        let search_name = clean_artist_for_search(artist);
        let title = self.search_article(&search_name).await?;
        let wikitext = self.fetch_wikitext(&title).await?;
        extract_infobox_genre(&wikitext, artist)
    }
}

/// Conjunctions confuse the article search; collapse them to spaces
fn clean_artist_for_search(artist: &str) -> String {
    artist
        .replace(" & ", " ")
        .replace(" and ", " ")
        .replace('&', " ")
        .trim()
        .to_string()
}

/// Extract and validate a genre from an article's infobox
fn extract_infobox_genre(wikitext: &str, artist: &str) -> Option<String> {
    if !INFOBOX_RE.is_match(wikitext) {
        return None;
    }

    for field_re in GENRE_FIELD_RES.iter() {
        let Some(cap) = field_re.captures(wikitext) else {
            continue;
        };
        let raw = cap[1].trim();
        if raw.is_empty() {
            continue;
        }

        let genre = clean_infobox_genre(raw);
        if is_valid_infobox_genre(&genre, artist) {
            return Some(genre);
        }
    }

    None
}

/// Strip wiki markup from a genre field and keep the first listed value
fn clean_infobox_genre(raw: &str) -> String {
    let text = WIKILINK_RE.replace_all(raw, "$1");
    let text = TEMPLATE_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");
    let text = REF_RE.replace_all(&text, "");
    let text = HTML_TAG_RE.replace_all(&text, "");

    // Multi-genre fields list values separated by commas, newlines or
    // pipes; the first one is the primary genre
    let first = text
        .split(|c| c == ',' || c == '\n' || c == '|')
        .next()
        .unwrap_or("")
        .trim()
        .to_string();

    let first = NATIONALITY_PREFIX_RE.replace(&first, "");
    let first = WHITESPACE_RE.replace_all(&first, " ");
    let first = BULLET_RE.replace(&first, "");
    let first = MUSIC_SUFFIX_RE.replace(&first, "");

    first.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_artist_for_search() {
        assert_eq!(clean_artist_for_search("Simon & Garfunkel"), "Simon Garfunkel");
        assert_eq!(clean_artist_for_search("Hall and Oates"), "Hall Oates");
        assert_eq!(clean_artist_for_search("AC&DC"), "AC DC");
    }

    #[test]
    fn test_extract_genre_from_infobox() {
        let wikitext = r#"
{{Infobox musical artist
| name = Blondie
| genre = [[New wave music|New wave]], [[punk rock]], [[pop rock]]
}}
Blondie is an American rock band..."#;

        let genre = extract_infobox_genre(wikitext, "Blondie");
        assert_eq!(genre.as_deref(), Some("New wave"));
    }

    #[test]
    fn test_non_musician_article_rejected() {
        let wikitext = r#"
{{Infobox film
| name = Blondie
| genre = [[Comedy film|Comedy]]
}}"#;
        assert_eq!(extract_infobox_genre(wikitext, "Blondie"), None);
    }

    #[test]
    fn test_nationality_prefix_and_music_suffix_stripped() {
        assert_eq!(clean_infobox_genre("American folk music"), "folk");
        assert_eq!(clean_infobox_genre("[[British blues]]"), "blues");
    }

    #[test]
    fn test_templates_comments_and_refs_stripped() {
        let raw = "{{hlist|rock}}<!-- disputed -->[[Hard rock]]<ref>source</ref>";
        assert_eq!(clean_infobox_genre(raw), "Hard rock");
    }

    #[test]
    fn test_first_listed_value_kept() {
        assert_eq!(clean_infobox_genre("[[synth-pop]]\n[[new wave music|new wave]]"), "synth-pop");
    }

    #[test]
    fn test_style_field_used_when_genre_missing() {
        let wikitext = r#"
{{Infobox band
| style = [[Ska]]
}}"#;
        assert_eq!(extract_infobox_genre(wikitext, "The Specials").as_deref(), Some("Ska"));
    }

    #[test]
    fn test_content_response_shape() {
        let body = r#"{
            "query": {"pages": {"12345": {"revisions": [
                {"slots": {"main": {"*": "{{Infobox musical artist}}"}}}
            ]}}}
        }"#;
        let data: ContentResponse = serde_json::from_str(body).unwrap();
        let content = data
            .query
            .unwrap()
            .pages
            .into_values()
            .next()
            .unwrap()
            .revisions
            .into_iter()
            .next()
            .unwrap()
            .slots
            .unwrap()
            .main
            .unwrap()
            .content;
        assert!(content.unwrap().contains("Infobox"));
    }
}
