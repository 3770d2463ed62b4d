//! Genre tag validity heuristics
//!
//! Metadata sources tag artists with everything from genres to decades,
//! nationalities and marketing copy. The filter here is recall-biased: it
//! exists to reject biographical and promotional tags, not to accept every
//! true genre. The word lists are fixed and matched by substring
//! containment; changing them shifts what whole years of collected data
//! mean, so they stay as they are.

use lazy_static::lazy_static;
use regex::Regex;

/// Terms that disqualify a tag outright (exact or substring match)
const NON_GENRE_TERMS: &[&str] = &[
    // Years and decades
    "1960s", "1970s", "1980s", "1990s", "2000s", "2010s", "2020s",
    "1960", "1970", "1980", "1990", "2000", "2010", "2020",
    // Pure nationalities
    "american", "british", "english", "irish", "scottish", "welsh",
    "canadian", "australian", "german", "french", "italian", "spanish",
    // Non-musical terms
    "actor", "actress", "politician", "author", "writer", "director",
    "band", "group", "artist", "musician", "singer", "songwriter",
    // Vague terms
    "music", "song", "album", "single", "track", "popular", "famous",
    "hit", "favorite", "chart", "number one", "top", "best",
];

/// Genre families that qualify a tag (substring match)
const GENRE_FAMILIES: &[&str] = &[
    "rock", "pop", "jazz", "blues", "folk", "country", "electronic", "dance",
    "hip hop", "rap", "r&b", "soul", "funk", "disco", "house", "techno",
    "ambient", "classical", "opera", "reggae", "ska", "punk", "metal",
    "grunge", "alternative", "indie", "new wave", "synthpop", "psychedelic",
    "progressive", "experimental", "industrial", "gothic", "emo", "hardcore",
    "world music", "latin", "african", "celtic", "bluegrass", "gospel",
    "spiritual", "soundtrack", "instrumental", "acoustic", "fusion",
];

/// Exact nationality values rejected by the infobox heuristic
const PURE_NATIONALITIES: &[&str] = &[
    "american", "british", "english", "irish", "scottish", "welsh",
    "canadian", "australian",
];

/// Role words rejected by the infobox heuristic (substring match)
const ROLE_TERMS: &[&str] = &["actor", "actress", "politician", "author", "writer", "director"];

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"^\d{4}s?$").expect("year pattern");
    static ref COMPOUND_GENRE_RE: Regex = Regex::new(
        r"\b(?:hard|soft|heavy|death|black|power|symphonic|melodic)\s+(?:rock|metal|jazz|blues)\b"
    )
    .expect("compound genre pattern");
    static ref GENRE_SUFFIX_RE: Regex =
        Regex::new(r"\w+(?:core|step|wave|beat|bass|punk)$").expect("genre suffix pattern");
}

/// A tag/count candidate from a metadata source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreCandidate {
    pub name: String,
    /// Occurrence count from the source; 1 when the source provides none
    pub weight: i64,
}

impl GenreCandidate {
    pub fn new(name: impl Into<String>, weight: Option<i64>) -> Self {
        Self {
            name: name.into(),
            weight: weight.unwrap_or(1),
        }
    }
}

/// Is this tag plausibly a musical genre for this artist?
pub fn is_valid_genre(genre: &str, artist: &str) -> bool {
    if genre.chars().count() < 2 {
        return false;
    }

    let genre_lower = genre.to_lowercase();
    let artist_lower = artist.to_lowercase();

    // Tags that restate the artist name are biographical, not genres
    if !artist_lower.is_empty()
        && (genre_lower.contains(&artist_lower) || artist_lower.contains(&genre_lower))
    {
        return false;
    }

    if NON_GENRE_TERMS.iter().any(|term| genre_lower.contains(term)) {
        return false;
    }

    if YEAR_RE.is_match(genre) {
        return false;
    }

    if GENRE_FAMILIES.iter().any(|family| genre_lower.contains(family)) {
        return true;
    }

    COMPOUND_GENRE_RE.is_match(&genre_lower) || GENRE_SUFFIX_RE.is_match(&genre_lower)
}

/// Validity check for genre text scraped from a wiki infobox
pub fn is_valid_infobox_genre(genre: &str, artist: &str) -> bool {
    if genre.is_empty() || genre.chars().count() > 50 {
        return false;
    }

    let genre_lower = genre.to_lowercase();
    let artist_lower = artist.to_lowercase();

    if !artist_lower.is_empty()
        && (genre_lower.contains(&artist_lower) || artist_lower.contains(&genre_lower))
    {
        return false;
    }

    if PURE_NATIONALITIES.contains(&genre_lower.as_str()) {
        return false;
    }

    !ROLE_TERMS.iter().any(|term| genre_lower.contains(term))
}

/// Pick the best valid candidate: highest weight, first seen wins ties
pub fn best_genre_from_tags(tags: &[GenreCandidate], artist: &str) -> Option<String> {
    let mut best: Option<&GenreCandidate> = None;

    for tag in tags {
        let name = tag.name.trim();
        if name.is_empty() || !is_valid_genre(name, artist) {
            continue;
        }
        match best {
            Some(current) if current.weight >= tag.weight => {}
            _ => best = Some(tag),
        }
    }

    best.map(|tag| tag.name.trim().to_string())
}
