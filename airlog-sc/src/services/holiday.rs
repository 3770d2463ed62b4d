//! UK public holiday lookup
//!
//! The gov.uk bank-holiday feed is fetched at most once per run; the
//! England-and-Wales dates are cached for the lifetime of the process and
//! matched by ISO date. A failed fetch caches an empty list so the feed is
//! not hammered on every channel.

use airlog_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BANK_HOLIDAYS_URL: &str = "https://www.gov.uk/bank-holidays.json";

#[derive(Debug, Deserialize)]
struct BankHolidaysResponse {
    #[serde(rename = "england-and-wales")]
    england_and_wales: Option<Division>,
}

#[derive(Debug, Deserialize)]
struct Division {
    #[serde(default)]
    events: Vec<HolidayEvent>,
}

#[derive(Debug, Deserialize)]
struct HolidayEvent {
    date: String,
}

/// Bank-holiday calendar with a process-lifetime cache
pub struct HolidayCalendar {
    client: reqwest::Client,
    dates: Option<Vec<String>>,
}

impl HolidayCalendar {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            dates: None,
        })
    }

    /// Is this ISO date a public holiday?
    pub async fn is_holiday(&mut self, date: &str) -> bool {
        if self.dates.is_none() {
            self.dates = Some(self.fetch_dates().await.unwrap_or_default());
        }

        self.dates
            .as_ref()
            .map(|dates| dates.iter().any(|d| d == date))
            .unwrap_or(false)
    }

    async fn fetch_dates(&self) -> Option<Vec<String>> {
        let response = self.client.get(BANK_HOLIDAYS_URL).send().await.ok()?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "bank holiday feed unavailable");
            return None;
        }

        let data: BankHolidaysResponse = response.json().await.ok()?;
        let dates: Vec<String> = data
            .england_and_wales?
            .events
            .into_iter()
            .map(|event| event.date)
            .collect();

        debug!(count = dates.len(), "bank holiday calendar loaded");
        Some(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "england-and-wales": {"division": "england-and-wales", "events": [
                {"title": "New Year's Day", "date": "2026-01-01", "bunting": true},
                {"title": "Good Friday", "date": "2026-04-03", "bunting": false}
            ]},
            "scotland": {"events": [{"title": "2nd January", "date": "2026-01-02"}]}
        }"#;
        let data: BankHolidaysResponse = serde_json::from_str(body).unwrap();
        let events = data.england_and_wales.unwrap().events;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].date, "2026-01-01");
    }
}
