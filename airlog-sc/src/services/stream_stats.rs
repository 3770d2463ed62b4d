//! Stream listener statistics extraction
//!
//! Listener counts and now-playing titles are reported in at least three
//! shapes depending on the server software and version: a JSON stats
//! endpoint, an XML stats endpoint, or only the human-facing HTML page.
//! Structured formats are tried first; the HTML fallback works through
//! ordered pattern tables so a new station quirk is a table row, not a new
//! branch. Icecast status pages (.xsl) skip straight to the HTML path and
//! get extra plausibility filtering, because their pages surround listener
//! numbers with bitrate labels that match the generic patterns.

use crate::models::{StreamSample, StreamStatus};
use crate::services::fetch::PageFetcher;
use crate::utils::text::{normalize, split_track, truncate_chars};
use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::debug;

/// Persisted track titles are capped at the analytics column width
const TRACK_TITLE_MAX_CHARS: usize = 90;

/// Highest believable single-stream listener count
const MAX_PLAUSIBLE_LISTENERS: u32 = 10_000;

/// Common stream bitrates that the generic patterns mistake for listener
/// counts on Icecast status pages
const BITRATE_CONSTANTS: [u32; 7] = [32, 64, 96, 128, 192, 256, 320];

/// Bitrate labels keyed on by the table-shaped Icecast extraction
const TABLE_BITRATES: [&str; 4] = ["256", "128", "64", "32"];

/// Single-value listener patterns, most specific first: unique-listener
/// phrasings, then labelled totals, then loose "number near 'listener'"
/// catch-alls.
const LISTENER_PATTERN_SOURCES: &[&str] = &[
    // "listeners (45 of 5000)" - take the current figure
    r"listeners\s*\(\s*(\d+)(?:\s|$)",
    // Unique listeners beat total listeners on Shoutcast pages
    r"(?i)(\d+)\s*unique listeners?",
    r"(?i)Stream is up[^>]*with (\d+) of \d+ listeners",
    r"(?i)(\d+) of \d+ listeners",
    // Standard Shoutcast phrasings
    r"(?i)(\d+)\s*listeners?\s*\(",
    r"(?i)Current Listeners:\s*(\d+)",
    r"(?i)Listeners:\s*(\d+)",
    // Status banners with the number buried mid-sentence
    r"(?is)Stream is up.*?(\d+).*?listener",
    r"(?is)Status.*?(\d+).*?listener",
    r"(?is)Online.*?(\d+).*?listener",
    // "listening" / "tuned in" / "connected" variants
    r"(?i)(\d+)\s*(?:currently\s*)?listening",
    r"(?i)(\d+)\s*(?:people\s*)?tuned\s*in",
    r"(?i)(\d+)\s*connected",
    // Shoutcast v2 XML-ish fragments embedded in pages
    r"(?is)streamstatus[^>]*>.*?(\d+).*?</streamstatus>",
    r"(?i)listenercount[^>]*>(\d+)</listenercount>",
    r"(?i)<CURRENTLISTENERS>(\d+)</CURRENTLISTENERS>",
    // JSON embedded in HTML
    r#"(?i)\{[^}]*"(?:listeners?|currentlisteners?)"\s*:\s*(\d+)"#,
    // Last-resort generic forms
    r"(?i)(\d+)[^0-9]*listener",
    r"(?i)listener[^0-9]*(\d+)",
];

/// Now-playing title patterns, format-specific first
const TRACK_PATTERN_SOURCES: &[&str] = &[
    r#"<a href="currentsong\?sid=1">([^<]+)</a>"#,
    r"(?is)Current Song:.*?<[^>]*>([^<]+)<",
    r"(?is)Now Playing:.*?<[^>]*>([^<]+)<",
    r"(?is)Track:.*?<[^>]*>([^<]+)<",
    r"<SONGTITLE>([^<]+)</SONGTITLE>",
    r#""(?:song|track|title)"\s*:\s*"([^"]+)""#,
    r#"(?i)<meta[^>]*content="([^"]*)"[^>]*song"#,
    r#"(?i)song[^>]*content="([^"]*)"[^>]*>"#,
];

lazy_static! {
    static ref LISTENER_PATTERNS: Vec<Regex> = LISTENER_PATTERN_SOURCES
        .iter()
        .map(|p| Regex::new(p).expect("listener pattern"))
        .collect();
    static ref TRACK_PATTERNS: Vec<Regex> = TRACK_PATTERN_SOURCES
        .iter()
        .map(|p| Regex::new(p).expect("track pattern"))
        .collect();
    static ref MULTI_STREAM_RE: Regex =
        Regex::new(r"Current Listeners:\s*<[^>]*>\s*(\d+)\s*<").expect("multi-stream pattern");
    static ref BITRATE_TABLE_PATTERNS: Vec<Regex> = TABLE_BITRATES
        .iter()
        .map(|bitrate| {
            let pattern = format!(
                r#"<td class="streamdata">{}</td></tr><tr><td>Current Listeners:</td><td class="streamdata">(\d+)</td>"#,
                bitrate
            );
            Regex::new(&pattern).expect("bitrate table pattern")
        })
        .collect();
    // Placeholder titles some encoders emit between tracks
    static ref PLACEHOLDER_TRACK_RE: Regex = Regex::new(r"^RC-\d+-?$").expect("placeholder pattern");
}

/// Extracts listener counts and now-playing tracks from stream endpoints
pub struct StreamStatsResolver {
    fetcher: Box<dyn PageFetcher>,
}

impl StreamStatsResolver {
    pub fn new(fetcher: Box<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve one endpoint's statistics for this cycle.
    ///
    /// An empty URL or a failed fetch yields the offline sample; no error
    /// escapes to the caller.
    pub async fn resolve(&self, url: &str) -> StreamSample {
        if url.is_empty() {
            return StreamSample::offline();
        }

        let html = match self.fetcher.fetch(url).await {
            Some(body) => body,
            None => {
                debug!(url = %url, "stream page unavailable");
                return StreamSample::offline();
            }
        };

        // Icecast status pages have no stats API siblings; everything else
        // tries the structured endpoints before falling back to HTML.
        let mut sample = if is_status_page(url) {
            parse_html(url, &html)
        } else {
            match self.try_json(url).await {
                Some(sample) => sample,
                None => match self.try_xml(url).await {
                    Some(sample) => sample,
                    None => parse_html(url, &html),
                },
            }
        };

        sample.track = normalize(sample.track.as_deref()).filter(|t| !t.is_empty());
        let info = split_track(sample.track.as_deref());
        sample.artist = info.artist;
        sample.song = info.song;

        debug!(
            url = %url,
            listeners = sample.listeners,
            track = sample.track.as_deref().unwrap_or("-"),
            "stream stats resolved"
        );

        sample
    }

    /// Shoutcast v2 JSON stats endpoint, derived from the page URL
    async fn try_json(&self, url: &str) -> Option<StreamSample> {
        let json_url = url.replace("/index.html", "/stats?json=1");
        let body = self.fetcher.fetch(&json_url).await?;
        let data: serde_json::Value = serde_json::from_str(&body).ok()?;

        let listeners = parse_count(data.get("currentlisteners")?)?;
        let track = data
            .get("songtitle")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| truncate_chars(t, TRACK_TITLE_MAX_CHARS));

        debug!(url = %json_url, listeners, "JSON stats endpoint succeeded");

        Some(StreamSample {
            listeners,
            track,
            status: StreamStatus::Online,
            artist: None,
            song: None,
        })
    }

    /// Shoutcast v1 XML stats endpoint, derived from the page URL
    async fn try_xml(&self, url: &str) -> Option<StreamSample> {
        let xml_url = url.replace("/index.html", "/stats");
        let body = self.fetcher.fetch(&xml_url).await?;
        let (listeners, track) = parse_stats_xml(&body)?;

        debug!(url = %xml_url, listeners, "XML stats endpoint succeeded");

        Some(StreamSample {
            listeners,
            track: track.map(|t| truncate_chars(&t, TRACK_TITLE_MAX_CHARS)),
            status: StreamStatus::Online,
            artist: None,
            song: None,
        })
    }
}

/// Icecast-style static status page?
fn is_status_page(url: &str) -> bool {
    url.ends_with(".xsl")
}

/// Shape-agnostic integer: accepts both `5` and `"5"`
fn parse_count(value: &serde_json::Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    value.as_str()?.trim().parse().ok()
}

/// Parse the Shoutcast XML stats document.
///
/// Success requires a CURRENTLISTENERS element; a non-numeric value counts
/// as zero listeners rather than a failure.
fn parse_stats_xml(body: &str) -> Option<(u32, Option<String>)> {
    let mut reader = Reader::from_str(body);
    let mut current_tag: Option<Vec<u8>> = None;
    let mut listeners: Option<u32> = None;
    let mut track: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => current_tag = Some(e.name().as_ref().to_vec()),
            Ok(Event::Text(t)) => {
                if let Some(tag) = current_tag.as_deref() {
                    let text = t.unescape().map(|c| c.into_owned()).unwrap_or_default();
                    match tag {
                        b"CURRENTLISTENERS" => {
                            listeners = Some(text.trim().parse().unwrap_or(0));
                        }
                        b"SONGTITLE" => {
                            let trimmed = text.trim();
                            if !trimmed.is_empty() {
                                track = Some(trimmed.to_string());
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => current_tag = None,
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }

    listeners.map(|l| (l, track))
}

/// HTML heuristic extraction, shared by the fallback path and .xsl pages
fn parse_html(url: &str, html: &str) -> StreamSample {
    let status_page = is_status_page(url);
    let mut listeners = 0u32;

    if status_page {
        // Multi-stream pages list one "Current Listeners" entry per
        // mountpoint; sum them all
        listeners = sum_multi_stream(html);
        if listeners == 0 {
            listeners = sum_bitrate_table(html);
        }
    }

    if listeners == 0 {
        listeners = scan_listener_patterns(html, status_page).unwrap_or(0);
    }

    let track = extract_track(html);

    StreamSample {
        listeners,
        track,
        status: if listeners > 0 {
            StreamStatus::Online
        } else {
            StreamStatus::Offline
        },
        artist: None,
        song: None,
    }
}

/// Sum every label-value "Current Listeners" match, rejecting values
/// outside [1, 999] as bitrate noise
fn sum_multi_stream(html: &str) -> u32 {
    MULTI_STREAM_RE
        .captures_iter(html)
        .filter_map(|cap| cap[1].parse::<u32>().ok())
        .filter(|count| (1..1000).contains(count))
        .sum()
}

/// Table-shaped extraction keyed by known bitrate labels, one match each
fn sum_bitrate_table(html: &str) -> u32 {
    BITRATE_TABLE_PATTERNS
        .iter()
        .filter_map(|re| re.captures(html))
        .filter_map(|cap| cap[1].parse::<u32>().ok())
        .sum()
}

/// First single-value pattern producing a plausible count wins.
///
/// On status pages, structurally matched values that equal a common
/// bitrate are rejected and the search continues.
fn scan_listener_patterns(html: &str, status_page: bool) -> Option<u32> {
    for re in LISTENER_PATTERNS.iter() {
        let Some(cap) = re.captures(html) else {
            continue;
        };
        let Ok(value) = cap[1].parse::<u32>() else {
            continue;
        };

        if status_page && BITRATE_CONSTANTS.contains(&value) {
            debug!(value, "skipping bitrate-looking listener count");
            continue;
        }

        if value <= MAX_PLAUSIBLE_LISTENERS {
            return Some(value);
        }
    }

    None
}

/// First track pattern whose value is non-empty, not the "-" sentinel and
/// not an encoder placeholder wins
fn extract_track(html: &str) -> Option<String> {
    for re in TRACK_PATTERNS.iter() {
        let Some(cap) = re.captures(html) else {
            continue;
        };
        let track = cap[1].trim();
        if !track.is_empty() && track != "-" && !PLACEHOLDER_TRACK_RE.is_match(track) {
            return Some(truncate_chars(track, TRACK_TITLE_MAX_CHARS));
        }
    }

    None
}
