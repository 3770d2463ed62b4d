//! Text cleanup for scraped strings
//!
//! Status pages and schedule feeds hand back HTML-escaped, entity-ridden
//! text with stray control and zero-width characters; everything persisted
//! goes through `normalize` first.

use crate::models::TrackInfo;

/// Artist recorded when a now-playing title has no artist/song separator
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Separator between artist and song in combined now-playing titles
const TRACK_SEPARATOR: &str = " - ";

/// Decode character references and strip invisible characters.
///
/// Named and numeric (decimal and hex) references become their UTF-8 form;
/// control characters, soft hyphen, zero-width characters and the BOM are
/// dropped; non-breaking/narrow/hair spaces become ordinary spaces; the
/// result is trimmed. None passes through unchanged.
pub fn normalize(text: Option<&str>) -> Option<String> {
    let text = text?;

    let decoded = html_escape::decode_html_entities(text);

    let cleaned: String = decoded
        .chars()
        .filter_map(|c| match c {
            // Control characters, DEL, soft hyphen, zero-width range, BOM
            '\u{0000}'..='\u{001F}'
            | '\u{007F}'
            | '\u{00AD}'
            | '\u{200B}'..='\u{200D}'
            | '\u{FEFF}' => None,
            // Non-breaking, narrow no-break and hair spaces
            '\u{00A0}' | '\u{202F}' | '\u{200A}' => Some(' '),
            other => Some(other),
        })
        .collect();

    Some(cleaned.trim().to_string())
}

/// Split a combined "Artist - Song" title into its parts.
///
/// Splits on the first `" - "` only; a title with no separator is recorded
/// as a song by "Unknown Artist". The `"-"` sentinel and empty input yield
/// an empty TrackInfo.
pub fn split_track(track: Option<&str>) -> TrackInfo {
    let raw = match track {
        Some(t) => t.trim(),
        None => return TrackInfo::default(),
    };

    if raw.is_empty() || raw == "-" {
        return TrackInfo::default();
    }

    match raw.split_once(TRACK_SEPARATOR) {
        Some((artist, song)) => TrackInfo {
            artist: non_empty(artist.trim()),
            song: non_empty(song.trim()),
        },
        None => TrackInfo {
            artist: Some(UNKNOWN_ARTIST.to_string()),
            song: Some(raw.to_string()),
        },
    }
}

/// Truncate to at most `max` characters, respecting char boundaries
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
