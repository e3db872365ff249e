//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with bounded timeouts
//! - Waiting for the rate governor before every request
//! - Rotating the User-Agent across the configured identity pool
//! - Classifying responses into pages and fetch errors

use crate::config::{CrawlerConfig, IdentityConfig};
use crate::crawler::governor::RateGovernor;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code (always 2xx)
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Final URL after redirects
    pub final_url: Url,
    /// Page body
    pub body: String,
}

/// Ways a single fetch can fail
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The site signalled rate limiting (HTTP 429), or the governor had already halted
    #[error("Rate limited while fetching {url}")]
    RateLimited { url: String },

    /// A non-success status other than 429 or 5xx
    #[error("HTTP {status} for {url}")]
    ClientError { url: String, status: u16 },

    /// HTTP 5xx
    #[error("Server error HTTP {status} for {url}")]
    ServerError { url: String, status: u16 },

    /// Connection failure, timeout or body read error
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    /// True when this error means the whole run must halt
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// The User-Agent is not fixed on the client; each request picks one from the
/// identity pool.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages on behalf of every worker in a run
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    governor: Arc<RateGovernor>,
    user_agents: Arc<Vec<String>>,
}

impl PageFetcher {
    /// Creates a fetcher sharing the given governor
    pub fn new(
        crawler: &CrawlerConfig,
        identity: &IdentityConfig,
        governor: Arc<RateGovernor>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(crawler)?,
            governor,
            user_agents: Arc::new(identity.user_agents.clone()),
        })
    }

    /// The governor this fetcher reports to
    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    /// Fetches a URL
    ///
    /// # Request Flow
    ///
    /// 1. Refuse immediately if the governor has halted
    /// 2. Wait for a request slot
    /// 3. Re-check the governor (it may have halted while waiting)
    /// 4. Send a GET with a randomly chosen User-Agent
    /// 5. Report status and latency to the governor
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Ok(FetchedPage)` |
    /// | 429 | `RateLimited` (the governor halts) |
    /// | 5xx | `ServerError` |
    /// | any other status | `ClientError` |
    /// | timeout, connect, body read | `Network` |
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if !self.governor.should_proceed() {
            return Err(FetchError::RateLimited {
                url: url.to_string(),
            });
        }

        self.governor.wait_turn().await;

        if !self.governor.should_proceed() {
            return Err(FetchError::RateLimited {
                url: url.to_string(),
            });
        }

        let mut request = self.client.get(url);
        if let Some(agent) = self.user_agents.choose(&mut rand::thread_rng()) {
            request = request.header(USER_AGENT, agent.as_str());
        }

        tracing::debug!("GET {}", url);
        let started = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    "Connection refused".to_string()
                } else {
                    e.to_string()
                };
                return Err(FetchError::Network {
                    url: url.to_string(),
                    message,
                });
            }
        };

        let status = response.status();
        self.governor
            .record_response(status.as_u16(), started.elapsed());

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                url: url.to_string(),
            });
        }

        if status.is_server_error() {
            return Err(FetchError::ServerError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::ClientError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        match response.text().await {
            Ok(body) => Ok(FetchedPage {
                status: status.as_u16(),
                headers,
                final_url,
                body,
            }),
            Err(e) => Err(FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
