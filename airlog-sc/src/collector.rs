//! One collection cycle
//!
//! Runs the whole pipeline for a single polling cycle, strictly
//! sequentially: show lookups, stream statistics, environment lookups,
//! duplicate suppression, genre enrichment, and finally one row appended
//! to the analytics table. Every lookup degrades to "no data" on failure;
//! only the final database write can fail the cycle.

use crate::config::CollectorConfig;
use crate::models::{ShowInfo, StreamSample};
use crate::services::duplicate_guard::{DuplicatePlayGuard, REPEAT_SENTINEL};
use crate::services::fetch::HttpPageFetcher;
use crate::services::genre::GenreResolver;
use crate::services::schedule::{
    is_stand_in, NowPlayingFeedSchedule, ProgrammeFeedSchedule, ScheduleSource,
};
use crate::services::stream_stats::StreamStatsResolver;
use crate::services::sun_times::SunTimesClient;
use crate::services::weather::WeatherClient;
use crate::services::holiday::HolidayCalendar;
use crate::utils::text::{normalize, UNKNOWN_ARTIST};
use airlog_common::db::samples::{self, SampleRow};
use airlog_common::{Channel, Result};
use chrono::Local;
use sqlx::SqlitePool;
use tracing::info;

/// Owns the services for one run of the collector
pub struct Collector {
    config: CollectorConfig,
    pool: SqlitePool,
    stream_stats: StreamStatsResolver,
    genre: GenreResolver,
    main_schedule: ProgrammeFeedSchedule,
    second_schedule: NowPlayingFeedSchedule,
    comparison_schedule: ProgrammeFeedSchedule,
    holidays: HolidayCalendar,
    weather: WeatherClient,
    sun_times: SunTimesClient,
}

impl Collector {
    pub fn new(config: CollectorConfig, pool: SqlitePool) -> Result<Self> {
        let user_agent = config.user_agent();
        let coordinates = config.coordinates();

        Ok(Self {
            stream_stats: StreamStatsResolver::new(Box::new(HttpPageFetcher::new()?)),
            genre: GenreResolver::new(&user_agent, config.lastfm_api_key())?,
            main_schedule: ProgrammeFeedSchedule::new(Box::new(HttpPageFetcher::new()?)),
            second_schedule: NowPlayingFeedSchedule::new(Box::new(HttpPageFetcher::new()?)),
            comparison_schedule: ProgrammeFeedSchedule::new(Box::new(HttpPageFetcher::new()?)),
            holidays: HolidayCalendar::new(&user_agent)?,
            weather: WeatherClient::new(&user_agent, config.openweather_api_key(), coordinates)?,
            sun_times: SunTimesClient::new(&user_agent, coordinates)?,
            config,
            pool,
        })
    }

    /// Run one polling cycle and persist the enriched record
    pub async fn run_cycle(&mut self) -> Result<()> {
        let now = Local::now();
        let date = now.format("%Y-%m-%d").to_string();
        let time = now.format("%H:%M").to_string();

        info!(date = %date, time = %time, "collecting statistics");

        // Current shows per channel
        let main_show = clean_show(
            self.main_schedule
                .current_show(&self.config.schedules.main)
                .await,
        );
        let second_show = clean_show(
            self.second_schedule
                .current_show(&self.config.schedules.second)
                .await,
        );
        let comparison_show = clean_show(
            self.comparison_schedule
                .current_show(&self.config.schedules.comparison)
                .await,
        );

        info!(
            main = %main_show.showname,
            second = %second_show.showname,
            comparison = %comparison_show.showname,
            "current shows resolved"
        );

        // Stream statistics; the now-playing track comes from each
        // channel's first stream
        let main1 = self.stream_stats.resolve(&self.config.streams.main1).await;
        let main2 = self.stream_stats.resolve(&self.config.streams.main2).await;
        let second1 = self.stream_stats.resolve(&self.config.streams.second1).await;
        let second2 = self.stream_stats.resolve(&self.config.streams.second2).await;
        let comparison = self
            .stream_stats
            .resolve(&self.config.streams.comparison)
            .await;

        // Environment lookups (holiday list and sun times cache per run)
        let public_holiday = self.holidays.is_holiday(&date).await;
        let weather = self.weather.current().await;
        let sun = self.sun_times.for_date(&date).await;

        // Duplicate suppression, each channel against its own prior row
        let guard = DuplicatePlayGuard::new(&self.pool);
        let main_artist = guard
            .artist_to_record(Channel::Main, &main1.artist, &main1.song)
            .await;
        let second_artist = guard
            .artist_to_record(Channel::Second, &second1.artist, &second1.song)
            .await;
        let comparison_artist = guard
            .artist_to_record(Channel::Comparison, &comparison.artist, &comparison.song)
            .await;

        // Genre enrichment for non-suppressed tracks
        let main_genre = self.channel_genre(&main_artist, &main1.song).await;
        let second_genre = self.channel_genre(&second_artist, &second1.song).await;
        let comparison_genre = self
            .channel_genre(&comparison_artist, &comparison.song)
            .await;

        let row = SampleRow {
            date,
            time,
            main_stream1: listeners(&main1),
            main_stream2: listeners(&main2),
            main_showname: Some(main_show.showname),
            main_presenter: Some(main_show.presenter),
            main_stand_in: main_show.stand_in,
            main_recorded: main_show.recorded,
            main_artist,
            main_song: main1.song,
            main_genre: Some(main_genre),
            second_stream1: listeners(&second1),
            second_stream2: listeners(&second2),
            second_showname: Some(second_show.showname),
            second_presenter: Some(second_show.presenter),
            second_stand_in: second_show.stand_in,
            second_recorded: second_show.recorded,
            second_artist,
            second_song: second1.song,
            second_genre: Some(second_genre),
            comparison_stream: listeners(&comparison),
            comparison_showname: Some(comparison_show.showname),
            comparison_presenter: Some(comparison_show.presenter),
            comparison_stand_in: comparison_show.stand_in,
            comparison_recorded: comparison_show.recorded,
            comparison_artist,
            comparison_song: comparison.song,
            comparison_genre: Some(comparison_genre),
            public_holiday,
            weather_temp: weather.temp,
            weather_condition: weather.condition,
            weather_rain: weather.rain,
            // No event feed is wired up; the column exists for manual use
            major_event: None,
            sunrise_time: sun.sunrise,
            sunset_time: sun.sunset,
        };

        samples::insert_sample(&self.pool, &row).await?;
        info!("sample recorded");

        Ok(())
    }

    /// Genre for one channel's track, or the "-" placeholder.
    ///
    /// Suppressed repeats and unidentified artists are never looked up.
    async fn channel_genre(&self, artist: &Option<String>, song: &Option<String>) -> String {
        let (Some(artist), Some(song)) = (artist, song) else {
            return REPEAT_SENTINEL.to_string();
        };

        if artist == REPEAT_SENTINEL || artist == UNKNOWN_ARTIST {
            return REPEAT_SENTINEL.to_string();
        }

        match self.genre.resolve(artist, song).await {
            Some(genre) => normalize(Some(&genre))
                .filter(|g| !g.is_empty())
                .unwrap_or_else(|| REPEAT_SENTINEL.to_string()),
            None => REPEAT_SENTINEL.to_string(),
        }
    }
}

fn listeners(sample: &StreamSample) -> i64 {
    i64::from(sample.listeners)
}

/// Decode entities in show fields and fill gaps with "Unknown"
fn clean_show(show: ShowInfo) -> ShowInfo {
    let showname = normalize(Some(&show.showname))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let presenter = normalize(Some(&show.presenter))
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let stand_in = is_stand_in(&presenter);

    ShowInfo {
        showname,
        presenter,
        recorded: show.recorded,
        stand_in,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_show_fills_gaps() {
        let show = clean_show(ShowInfo {
            showname: "".to_string(),
            presenter: "  ".to_string(),
            recorded: true,
            stand_in: false,
        });
        assert_eq!(show.showname, "Unknown");
        assert_eq!(show.presenter, "Unknown");
        assert!(show.recorded);
    }

    #[test]
    fn test_clean_show_decodes_entities() {
        let show = clean_show(ShowInfo {
            showname: "Rock &amp; Roll Hour".to_string(),
            presenter: "DJ\u{00A0}Sam".to_string(),
            recorded: false,
            stand_in: false,
        });
        assert_eq!(show.showname, "Rock & Roll Hour");
        assert_eq!(show.presenter, "DJ Sam");
    }
}
