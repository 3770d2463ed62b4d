//! Integration tests for the stream statistics cascade
//!
//! A canned-page fetcher stands in for the network so the tests can pin
//! down cascade ordering (JSON before XML before HTML), the .xsl bypass,
//! and the normalize-then-split handoff.

use airlog_sc::models::StreamStatus;
use airlog_sc::services::fetch::PageFetcher;
use airlog_sc::services::stream_stats::StreamStatsResolver;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

struct CannedFetcher {
    pages: HashMap<String, String>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl PageFetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned()
    }
}

#[tokio::test]
async fn test_json_endpoint_preferred_over_html() {
    let fetcher = CannedFetcher::new(&[
        (
            "http://radio.example/index.html",
            "<html>Current Listeners: 5</html>",
        ),
        (
            "http://radio.example/stats?json=1",
            r#"{"currentlisteners": 42, "songtitle": "Blondie - Atomic"}"#,
        ),
    ]);

    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("http://radio.example/index.html").await;

    assert_eq!(sample.listeners, 42);
    assert_eq!(sample.status, StreamStatus::Online);
    assert_eq!(sample.artist.as_deref(), Some("Blondie"));
    assert_eq!(sample.song.as_deref(), Some("Atomic"));
}

#[tokio::test]
async fn test_xml_fallback_when_json_unavailable() {
    let fetcher = CannedFetcher::new(&[
        (
            "http://radio.example/index.html",
            "<html>Current Listeners: 5</html>",
        ),
        (
            "http://radio.example/stats",
            "<SHOUTCASTSERVER><CURRENTLISTENERS>17</CURRENTLISTENERS>\
             <SONGTITLE>New Order - Blue Monday</SONGTITLE></SHOUTCASTSERVER>",
        ),
    ]);

    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("http://radio.example/index.html").await;

    assert_eq!(sample.listeners, 17);
    assert_eq!(sample.artist.as_deref(), Some("New Order"));
    assert_eq!(sample.song.as_deref(), Some("Blue Monday"));
}

#[tokio::test]
async fn test_html_fallback_when_structured_endpoints_fail() {
    let fetcher = CannedFetcher::new(&[(
        "http://radio.example/index.html",
        r#"<html>Stream is up at 128 kbps with 45 of 5000 listeners
           <a href="currentsong?sid=1">Heart - Barracuda</a></html>"#,
    )]);

    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("http://radio.example/index.html").await;

    assert_eq!(sample.listeners, 45);
    assert_eq!(sample.artist.as_deref(), Some("Heart"));
    assert_eq!(sample.song.as_deref(), Some("Barracuda"));
}

#[tokio::test]
async fn test_xsl_page_skips_structured_endpoints() {
    let fetcher = CannedFetcher::new(&[(
        "http://radio.example/status.xsl",
        "Current Listeners: <td class=\"streamdata\"> 7 </td>\
         Current Listeners: <td class=\"streamdata\"> 3 </td>",
    )]);

    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("http://radio.example/status.xsl").await;

    assert_eq!(sample.listeners, 10);
    assert_eq!(sample.status, StreamStatus::Online);
}

#[tokio::test]
async fn test_xsl_page_makes_exactly_one_request() {
    let fetcher = CannedFetcher::new(&[(
        "http://radio.example/status.xsl",
        "Current Listeners: <td class=\"streamdata\"> 4 </td>",
    )]);
    let requests = fetcher.requests_handle();

    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let _ = resolver.resolve("http://radio.example/status.xsl").await;

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0], "http://radio.example/status.xsl");
}

#[tokio::test]
async fn test_xsl_bitrate_number_not_accepted() {
    let fetcher = CannedFetcher::new(&[(
        "http://radio.example/status.xsl",
        "<td>128</td> listener data pending",
    )]);

    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("http://radio.example/status.xsl").await;

    assert_eq!(sample.listeners, 0);
    assert_eq!(sample.status, StreamStatus::Offline);
}

#[tokio::test]
async fn test_empty_url_yields_offline_sample() {
    let fetcher = CannedFetcher::new(&[]);
    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("").await;

    assert_eq!(sample.listeners, 0);
    assert_eq!(sample.status, StreamStatus::Offline);
    assert_eq!(sample.artist, None);
    assert_eq!(sample.song, None);
}

#[tokio::test]
async fn test_fetch_failure_yields_offline_sample() {
    let fetcher = CannedFetcher::new(&[]);
    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("http://gone.example/index.html").await;

    assert_eq!(sample.listeners, 0);
    assert_eq!(sample.status, StreamStatus::Offline);
}

#[tokio::test]
async fn test_track_is_normalized_before_splitting() {
    let fetcher = CannedFetcher::new(&[
        ("http://radio.example/index.html", "<html>status page</html>"),
        (
            "http://radio.example/stats?json=1",
            r#"{"currentlisteners": 3, "songtitle": "Guns N&#39; Roses - Sweet Child O&#39; Mine"}"#,
        ),
    ]);

    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("http://radio.example/index.html").await;

    assert_eq!(sample.artist.as_deref(), Some("Guns N' Roses"));
    assert_eq!(sample.song.as_deref(), Some("Sweet Child O' Mine"));
}

#[tokio::test]
async fn test_sentinel_track_yields_no_artist_or_song() {
    let fetcher = CannedFetcher::new(&[
        ("http://radio.example/index.html", "<html>status page</html>"),
        (
            "http://radio.example/stats?json=1",
            r#"{"currentlisteners": 8, "songtitle": "-"}"#,
        ),
    ]);

    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("http://radio.example/index.html").await;

    assert_eq!(sample.listeners, 8);
    assert_eq!(sample.artist, None);
    assert_eq!(sample.song, None);
}

#[tokio::test]
async fn test_single_title_gets_unknown_artist() {
    let fetcher = CannedFetcher::new(&[
        ("http://radio.example/index.html", "<html>status page</html>"),
        (
            "http://radio.example/stats?json=1",
            r#"{"currentlisteners": 2, "songtitle": "Station Jingle"}"#,
        ),
    ]);

    let resolver = StreamStatsResolver::new(Box::new(fetcher));
    let sample = resolver.resolve("http://radio.example/index.html").await;

    assert_eq!(sample.artist.as_deref(), Some("Unknown Artist"));
    assert_eq!(sample.song.as_deref(), Some("Station Jingle"));
}
