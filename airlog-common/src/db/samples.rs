//! Sample row persistence
//!
//! One row per polling cycle, with a column family per channel. The
//! duplicate-play guard reads back the most recent row's artist/song for a
//! single channel; everything else is write-only from the collector's
//! point of view.

use crate::{Channel, Result};
use sqlx::{Row, SqlitePool};

/// Fully enriched record for one polling cycle
#[derive(Debug, Clone, Default)]
pub struct SampleRow {
    pub date: String,
    pub time: String,
    pub main_stream1: i64,
    pub main_stream2: i64,
    pub main_showname: Option<String>,
    pub main_presenter: Option<String>,
    pub main_stand_in: bool,
    pub main_recorded: bool,
    pub main_artist: Option<String>,
    pub main_song: Option<String>,
    pub main_genre: Option<String>,
    pub second_stream1: i64,
    pub second_stream2: i64,
    pub second_showname: Option<String>,
    pub second_presenter: Option<String>,
    pub second_stand_in: bool,
    pub second_recorded: bool,
    pub second_artist: Option<String>,
    pub second_song: Option<String>,
    pub second_genre: Option<String>,
    pub comparison_stream: i64,
    pub comparison_showname: Option<String>,
    pub comparison_presenter: Option<String>,
    pub comparison_stand_in: bool,
    pub comparison_recorded: bool,
    pub comparison_artist: Option<String>,
    pub comparison_song: Option<String>,
    pub comparison_genre: Option<String>,
    pub public_holiday: bool,
    pub weather_temp: Option<f64>,
    pub weather_condition: Option<String>,
    pub weather_rain: Option<f64>,
    pub major_event: Option<String>,
    pub sunrise_time: Option<String>,
    pub sunset_time: Option<String>,
}

/// Artist/song pair from the most recently written row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSample {
    pub artist: Option<String>,
    pub song: Option<String>,
}

/// Append one cycle's record to the analytics table
pub async fn insert_sample(pool: &SqlitePool, row: &SampleRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO analytics (
            date, time,
            main_stream1, main_stream2, main_showname, main_presenter,
            main_stand_in, main_recorded, main_artist, main_song, main_genre,
            second_stream1, second_stream2, second_showname, second_presenter,
            second_stand_in, second_recorded, second_artist, second_song, second_genre,
            comparison_stream, comparison_showname, comparison_presenter,
            comparison_stand_in, comparison_recorded, comparison_artist,
            comparison_song, comparison_genre,
            public_holiday, weather_temp, weather_condition, weather_rain,
            major_event, sunrise_time, sunset_time
        ) VALUES (
            ?, ?,
            ?, ?, ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?, ?
        )
        "#,
    )
    .bind(&row.date)
    .bind(&row.time)
    .bind(row.main_stream1)
    .bind(row.main_stream2)
    .bind(&row.main_showname)
    .bind(&row.main_presenter)
    .bind(row.main_stand_in)
    .bind(row.main_recorded)
    .bind(&row.main_artist)
    .bind(&row.main_song)
    .bind(&row.main_genre)
    .bind(row.second_stream1)
    .bind(row.second_stream2)
    .bind(&row.second_showname)
    .bind(&row.second_presenter)
    .bind(row.second_stand_in)
    .bind(row.second_recorded)
    .bind(&row.second_artist)
    .bind(&row.second_song)
    .bind(&row.second_genre)
    .bind(row.comparison_stream)
    .bind(&row.comparison_showname)
    .bind(&row.comparison_presenter)
    .bind(row.comparison_stand_in)
    .bind(row.comparison_recorded)
    .bind(&row.comparison_artist)
    .bind(&row.comparison_song)
    .bind(&row.comparison_genre)
    .bind(row.public_holiday)
    .bind(row.weather_temp)
    .bind(&row.weather_condition)
    .bind(row.weather_rain)
    .bind(&row.major_event)
    .bind(&row.sunrise_time)
    .bind(&row.sunset_time)
    .execute(pool)
    .await?;

    Ok(())
}

/// Read the most recent row's artist/song for one channel
pub async fn last_sample(pool: &SqlitePool, channel: Channel) -> Result<Option<LastSample>> {
    // Column names come from the Channel enum, never from user input
    let select_sql = format!(
        "SELECT {}, {} FROM analytics ORDER BY stamp DESC LIMIT 1",
        channel.artist_column(),
        channel.song_column()
    );

    let row = sqlx::query(&select_sql).fetch_optional(pool).await?;

    Ok(row.map(|r| LastSample {
        artist: r.get(0),
        song: r.get(1),
    }))
}
