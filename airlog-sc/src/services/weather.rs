//! Current weather lookup
//!
//! Single-call OpenWeatherMap wrapper. Listener numbers track the weather
//! closely enough that it earns a column; with no API key or coordinates
//! configured the report stays all-None.

use crate::models::WeatherReport;
use airlog_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: Option<MainBlock>,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    rain: Option<RainBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RainBlock {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

/// OpenWeatherMap client
pub struct WeatherClient {
    client: reqwest::Client,
    api_key: Option<String>,
    coordinates: Option<(f64, f64)>,
}

impl WeatherClient {
    pub fn new(
        user_agent: &str,
        api_key: Option<String>,
        coordinates: Option<(f64, f64)>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            coordinates,
        })
    }

    /// Current conditions at the station's location
    pub async fn current(&self) -> WeatherReport {
        let (Some(api_key), Some((lat, lng))) = (&self.api_key, self.coordinates) else {
            return WeatherReport::default();
        };

        let url = format!(
            "{}?lat={}&lon={}&appid={}&units=metric",
            OPENWEATHER_URL, lat, lng, api_key
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "weather request failed");
                return WeatherReport::default();
            }
            Err(e) => {
                debug!(error = %e, "weather request failed");
                return WeatherReport::default();
            }
        };

        let Ok(data) = response.json::<WeatherResponse>().await else {
            return WeatherReport::default();
        };

        WeatherReport {
            temp: data
                .main
                .and_then(|m| m.temp)
                .map(|t| (t * 10.0).round() / 10.0),
            condition: data.weather.into_iter().next().and_then(|w| w.main),
            rain: Some(
                data.rain
                    .and_then(|r| r.one_hour)
                    .unwrap_or(0.0),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "main": {"temp": 17.26, "humidity": 82},
            "weather": [{"main": "Rain", "description": "light rain"}],
            "rain": {"1h": 0.4}
        }"#;
        let data: WeatherResponse = serde_json::from_str(body).unwrap();
        assert_eq!(data.main.unwrap().temp, Some(17.26));
        assert_eq!(data.weather[0].main.as_deref(), Some("Rain"));
        assert_eq!(data.rain.unwrap().one_hour, Some(0.4));
    }

    #[test]
    fn test_response_without_rain_block() {
        let body = r#"{"main": {"temp": 21.0}, "weather": []}"#;
        let data: WeatherResponse = serde_json::from_str(body).unwrap();
        assert!(data.rain.is_none());
    }

    #[tokio::test]
    async fn test_missing_key_yields_empty_report() {
        let client = WeatherClient::new("Test/0.1.0", None, Some((51.5, -0.1))).unwrap();
        assert_eq!(client.current().await, WeatherReport::default());
    }
}
