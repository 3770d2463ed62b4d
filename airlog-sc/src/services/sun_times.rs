//! Sunrise/sunset lookup
//!
//! Daylight shifts listening habits, so each row records the day's sunrise
//! and sunset. Results are cached per date for the process lifetime;
//! without coordinates a fixed placeholder is recorded instead.

use crate::models::SunTimes;
use airlog_common::{Error, Result};
use chrono::{DateTime, Local};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const SUNRISE_SUNSET_URL: &str = "https://api.sunrise-sunset.org/json";

#[derive(Debug, Deserialize)]
struct SunTimesResponse {
    results: Option<SunResults>,
}

#[derive(Debug, Deserialize)]
struct SunResults {
    /// ISO 8601 timestamps (formatted=0)
    sunrise: Option<String>,
    sunset: Option<String>,
}

/// sunrise-sunset.org client with a per-date cache
pub struct SunTimesClient {
    client: reqwest::Client,
    coordinates: Option<(f64, f64)>,
    cache: HashMap<String, SunTimes>,
}

impl SunTimesClient {
    pub fn new(user_agent: &str, coordinates: Option<(f64, f64)>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            coordinates,
            cache: HashMap::new(),
        })
    }

    /// Sunrise/sunset for an ISO date at the station's location
    pub async fn for_date(&mut self, date: &str) -> SunTimes {
        if let Some(cached) = self.cache.get(date) {
            return cached.clone();
        }

        let times = match self.coordinates {
            Some((lat, lng)) => self.fetch(lat, lng, date).await,
            None => SunTimes {
                sunrise: Some("00:00:00".to_string()),
                sunset: Some("00:00:00".to_string()),
            },
        };

        self.cache.insert(date.to_string(), times.clone());
        times
    }

    async fn fetch(&self, lat: f64, lng: f64, date: &str) -> SunTimes {
        let url = format!(
            "{}?lat={}&lng={}&date={}&formatted=0",
            SUNRISE_SUNSET_URL, lat, lng, date
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "sun times request failed");
                return SunTimes::default();
            }
            Err(e) => {
                debug!(error = %e, "sun times request failed");
                return SunTimes::default();
            }
        };

        let Ok(data) = response.json::<SunTimesResponse>().await else {
            return SunTimes::default();
        };

        match data.results {
            Some(results) => SunTimes {
                sunrise: results.sunrise.as_deref().and_then(to_local_time),
                sunset: results.sunset.as_deref().and_then(to_local_time),
            },
            None => SunTimes::default(),
        }
    }
}

/// ISO timestamp to local wall-clock HH:MM:SS
fn to_local_time(timestamp: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(timestamp).ok()?;
    Some(
        parsed
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "results": {
                "sunrise": "2026-08-07T04:35:12+00:00",
                "sunset": "2026-08-07T19:42:55+00:00",
                "day_length": 54463
            },
            "status": "OK"
        }"#;
        let data: SunTimesResponse = serde_json::from_str(body).unwrap();
        let results = data.results.unwrap();
        assert!(results.sunrise.unwrap().starts_with("2026-08-07T04:35:12"));
    }

    #[test]
    fn test_to_local_time_formats_wall_clock() {
        let formatted = to_local_time("2026-08-07T04:35:12+00:00").unwrap();
        // HH:MM:SS regardless of host timezone
        assert_eq!(formatted.len(), 8);
        assert_eq!(formatted.as_bytes()[2], b':');
        assert_eq!(formatted.as_bytes()[5], b':');
    }

    #[test]
    fn test_to_local_time_rejects_garbage() {
        assert_eq!(to_local_time("not a timestamp"), None);
    }
}
