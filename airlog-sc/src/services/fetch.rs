//! Status-page fetching
//!
//! Stream status pages are served by a zoo of Shoutcast/Icecast versions,
//! some behind redirects and some with broken TLS; the fetcher follows
//! redirects, presents a browser user-agent, and folds every transport or
//! HTTP failure into None so a dead endpoint simply records as offline.

use airlog_common::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux i686; rv:83.0) Gecko/20100101 Firefox/83.0";
const FETCH_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Generic page-fetch capability
///
/// Failure (non-2xx, transport error, timeout) is represented as None,
/// never as an error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// reqwest-backed fetcher used outside of tests
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(10))
            // Several station status pages serve expired certificates
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "page fetch failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = %status, "page fetch returned error status");
            return None;
        }

        response.text().await.ok()
    }
}
