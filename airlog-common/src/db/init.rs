//! Database initialization and schema maintenance
//!
//! The analytics table is created on first run and kept up to date
//! automatically: any column present in the expected schema but missing
//! from the database is added via ALTER TABLE, so upgrading the collector
//! never requires a manual migration.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::Path;
use tracing::info;

/// Expected analytics columns, minus the autoincrement primary key.
///
/// Order matters for new-table creation; appended entries are picked up by
/// the column sync on existing databases.
const ANALYTICS_COLUMNS: &[(&str, &str)] = &[
    ("date", "TEXT NOT NULL DEFAULT ''"),
    ("time", "TEXT NOT NULL DEFAULT ''"),
    ("main_stream1", "INTEGER"),
    ("main_stream2", "INTEGER"),
    ("main_showname", "TEXT"),
    ("main_presenter", "TEXT"),
    ("main_stand_in", "INTEGER"),
    ("main_recorded", "INTEGER"),
    ("main_artist", "TEXT"),
    ("main_song", "TEXT"),
    ("main_genre", "TEXT"),
    ("second_stream1", "INTEGER"),
    ("second_stream2", "INTEGER"),
    ("second_showname", "TEXT"),
    ("second_presenter", "TEXT"),
    ("second_stand_in", "INTEGER"),
    ("second_recorded", "INTEGER"),
    ("second_artist", "TEXT"),
    ("second_song", "TEXT"),
    ("second_genre", "TEXT"),
    ("comparison_stream", "INTEGER"),
    ("comparison_showname", "TEXT"),
    ("comparison_presenter", "TEXT"),
    ("comparison_stand_in", "INTEGER"),
    ("comparison_recorded", "INTEGER"),
    ("comparison_artist", "TEXT"),
    ("comparison_song", "TEXT"),
    ("comparison_genre", "TEXT"),
    ("public_holiday", "INTEGER DEFAULT 0"),
    ("weather_temp", "REAL"),
    ("weather_condition", "TEXT"),
    ("weather_rain", "REAL"),
    ("major_event", "TEXT"),
    ("sunrise_time", "TEXT"),
    ("sunset_time", "TEXT"),
];

/// Indexes covering the columns the companion analysis queries filter on.
const ANALYTICS_INDEXES: &[(&str, &str)] = &[
    ("idx_date", "date"),
    ("idx_date_time", "date, time"),
    ("idx_main_artist", "main_artist"),
    ("idx_main_song", "main_song"),
    ("idx_main_artist_song", "main_artist, main_song"),
    ("idx_main_genre", "main_genre"),
    ("idx_main_showname", "main_showname"),
    ("idx_main_dj", "main_presenter"),
    ("idx_second_artist", "second_artist"),
    ("idx_second_song", "second_song"),
    ("idx_second_artist_song", "second_artist, second_song"),
    ("idx_second_genre", "second_genre"),
    ("idx_second_showname", "second_showname"),
    ("idx_second_dj", "second_presenter"),
    ("idx_public_holiday", "public_holiday"),
    ("idx_weather", "weather_condition"),
];

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_analytics_table(&pool).await?;
    sync_analytics_columns(&pool).await?;
    create_analytics_indexes(&pool).await?;

    Ok(pool)
}

/// Create the analytics table if it does not exist
pub async fn create_analytics_table(pool: &SqlitePool) -> Result<()> {
    let columns = ANALYTICS_COLUMNS
        .iter()
        .map(|(name, decl)| format!("{} {}", name, decl))
        .collect::<Vec<_>>()
        .join(",\n            ");

    let create_sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS analytics (
            stamp INTEGER PRIMARY KEY AUTOINCREMENT,
            {}
        )
        "#,
        columns
    );

    sqlx::query(&create_sql).execute(pool).await?;

    Ok(())
}

/// Add any expected column missing from an existing analytics table
pub async fn sync_analytics_columns(pool: &SqlitePool) -> Result<()> {
    let rows = sqlx::query("PRAGMA table_info(analytics)")
        .fetch_all(pool)
        .await?;

    let existing: Vec<String> = rows
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

    for (name, decl) in ANALYTICS_COLUMNS {
        if existing.iter().any(|c| c == name) {
            continue;
        }

        let alter_sql = format!("ALTER TABLE analytics ADD COLUMN {} {}", name, decl);
        sqlx::query(&alter_sql).execute(pool).await?;
        info!("Added missing analytics column: {}", name);
    }

    Ok(())
}

/// Create analytics indexes if they do not exist
pub async fn create_analytics_indexes(pool: &SqlitePool) -> Result<()> {
    for (index_name, columns) in ANALYTICS_INDEXES {
        let index_sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON analytics ({})",
            index_name, columns
        );
        sqlx::query(&index_sql).execute(pool).await?;
    }

    Ok(())
}

/// Create all analytics schema objects on an already-open pool.
///
/// Used by tests running against in-memory databases.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_analytics_table(pool).await?;
    sync_analytics_columns(pool).await?;
    create_analytics_indexes(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        init_schema(&pool).await.expect("first init");
        init_schema(&pool).await.expect("second init");

        let rows = sqlx::query("PRAGMA table_info(analytics)")
            .fetch_all(&pool)
            .await
            .unwrap();
        // stamp plus every declared column
        assert_eq!(rows.len(), ANALYTICS_COLUMNS.len() + 1);
    }

    #[tokio::test]
    async fn test_missing_column_is_added() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        // Simulate a database created by an older collector release
        sqlx::query(
            r#"
            CREATE TABLE analytics (
                stamp INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL DEFAULT '',
                time TEXT NOT NULL DEFAULT '',
                main_stream1 INTEGER
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        sync_analytics_columns(&pool).await.expect("column sync");

        let rows = sqlx::query("PRAGMA table_info(analytics)")
            .fetch_all(&pool)
            .await
            .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get::<String, _>("name")).collect();
        assert!(names.iter().any(|n| n == "sunset_time"));
        assert!(names.iter().any(|n| n == "comparison_genre"));
    }
}
