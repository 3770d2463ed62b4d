//! Current-show lookup
//!
//! Every station publishes its schedule differently, so show resolution is
//! a pluggable capability: each implementation parses one feed layout into
//! the common ShowInfo shape. Failures and missing URLs fall back to the
//! default "Unknown" show rather than erroring.

use crate::models::ShowInfo;
use crate::services::fetch::PageFetcher;
use async_trait::async_trait;
use chrono::{Local, NaiveTime};
use serde::Deserialize;
use tracing::debug;

/// Station schedule capability
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn current_show(&self, schedule_url: &str) -> ShowInfo;
}

/// Is this presenter covering for the regular host?
///
/// Station-specific; the default assumes no cover slots.
pub fn is_stand_in(_presenter: &str) -> bool {
    false
}

// ---------------------------------------------------------------------------
// Programme-feed schedule (whole-day JSON listing)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProgrammeFeed {
    #[serde(default)]
    shows: Vec<ProgrammeEntry>,
}

#[derive(Debug, Deserialize)]
struct ProgrammeEntry {
    #[serde(default)]
    showname: String,
    #[serde(default)]
    presenter: String,
    /// "HH:MM" local start
    #[serde(default)]
    start: String,
    /// "HH:MM" local end
    #[serde(default)]
    end: String,
    /// "1" for pre-recorded, "0" for live
    #[serde(default)]
    recorded: String,
}

/// Parses a whole-day programme feed and picks the show on air now
pub struct ProgrammeFeedSchedule {
    fetcher: Box<dyn PageFetcher>,
}

impl ProgrammeFeedSchedule {
    pub fn new(fetcher: Box<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ScheduleSource for ProgrammeFeedSchedule {
    async fn current_show(&self, schedule_url: &str) -> ShowInfo {
        if schedule_url.is_empty() {
            return ShowInfo::default();
        }

        let Some(body) = self.fetcher.fetch(schedule_url).await else {
            debug!(url = %schedule_url, "programme feed unavailable");
            return ShowInfo::default();
        };

        let Ok(feed) = serde_json::from_str::<ProgrammeFeed>(&body) else {
            debug!(url = %schedule_url, "programme feed unparseable");
            return ShowInfo::default();
        };

        let now = Local::now().time();
        match feed.shows.iter().find(|entry| on_air(entry, now)) {
            Some(entry) => ShowInfo {
                showname: entry.showname.clone(),
                presenter: if entry.presenter.is_empty() {
                    "Various".to_string()
                } else {
                    entry.presenter.clone()
                },
                recorded: entry.recorded == "1",
                stand_in: false,
            },
            None => ShowInfo::default(),
        }
    }
}

/// Does the entry's start/end window contain this time of day?
///
/// Windows wrapping midnight (end before start) are handled.
fn on_air(entry: &ProgrammeEntry, now: NaiveTime) -> bool {
    let (Ok(start), Ok(end)) = (
        NaiveTime::parse_from_str(&entry.start, "%H:%M"),
        NaiveTime::parse_from_str(&entry.end, "%H:%M"),
    ) else {
        return false;
    };

    if start <= end {
        start <= now && now < end
    } else {
        now >= start || now < end
    }
}

// ---------------------------------------------------------------------------
// Now-playing feed schedule (flat current-show JSON)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NowPlayingFeed {
    #[serde(default)]
    showname: String,
    #[serde(default)]
    presenter: String,
    #[serde(default)]
    recorded: String,
}

/// Parses a feed that reports only the show on air right now
pub struct NowPlayingFeedSchedule {
    fetcher: Box<dyn PageFetcher>,
}

impl NowPlayingFeedSchedule {
    pub fn new(fetcher: Box<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ScheduleSource for NowPlayingFeedSchedule {
    async fn current_show(&self, schedule_url: &str) -> ShowInfo {
        if schedule_url.is_empty() {
            return ShowInfo::default();
        }

        let Some(body) = self.fetcher.fetch(schedule_url).await else {
            debug!(url = %schedule_url, "now-playing feed unavailable");
            return ShowInfo::default();
        };

        let Ok(feed) = serde_json::from_str::<NowPlayingFeed>(&body) else {
            debug!(url = %schedule_url, "now-playing feed unparseable");
            return ShowInfo::default();
        };

        ShowInfo {
            showname: feed.showname,
            presenter: feed.presenter,
            recorded: feed.recorded == "1",
            stand_in: false,
        }
    }
}
