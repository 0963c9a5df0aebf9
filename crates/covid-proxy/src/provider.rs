//! Upstream statistics sources.

use async_trait::async_trait;
use std::fmt;

use crate::error::UpstreamError;
use crate::models::{UpstreamCountryRecord, UpstreamStatRecord};

/// Common functionality shared across all providers
pub mod common {
    use reqwest::header::{HeaderMap, HeaderValue};

    use crate::config::{Config, ConfigError};
    use crate::error::UpstreamError;

    /// Header carrying the RapidAPI key.
    pub const API_KEY_HEADER: &str = "x-rapidapi-key";
    /// Header naming the RapidAPI host.
    pub const API_HOST_HEADER: &str = "x-rapidapi-host";

    /// Create the upstream HTTP client.
    ///
    /// Credential headers are installed as default headers so every request
    /// carries them; the key is flagged sensitive to keep it out of debug
    /// output.
    pub fn create_client(config: &Config) -> Result<reqwest::Client, ConfigError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ConfigError::InvalidHeader(API_KEY_HEADER))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        headers.insert(
            API_HOST_HEADER,
            HeaderValue::from_str(&config.upstream.api_host)
                .map_err(|_| ConfigError::InvalidHeader(API_HOST_HEADER))?,
        );

        let mut client_builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.upstream.timeout));

        // Add proxy configuration if specified
        if let Some(proxies) = &config.upstream.proxies {
            if let Some(http_proxy) = proxies.get("http") {
                client_builder = client_builder.proxy(reqwest::Proxy::http(http_proxy)?);
            }
            if let Some(https_proxy) = proxies.get("https") {
                client_builder = client_builder.proxy(reqwest::Proxy::https(https_proxy)?);
            }
        }

        Ok(client_builder.build()?)
    }

    /// Sort a transport-level failure into an upstream error kind.
    ///
    /// A body cut off mid-stream is a transport failure, not a malformed
    /// response.
    pub fn classify(err: &reqwest::Error, timeout_secs: u64) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout_secs)
        } else if err.is_decode() && !body_interrupted(err) {
            UpstreamError::MalformedResponse(err.to_string())
        } else {
            UpstreamError::Unreachable(err.to_string())
        }
    }

    // `Response::bytes` reports a lost connection as a decode error wrapping
    // the body error.
    fn body_interrupted(err: &reqwest::Error) -> bool {
        let mut source = std::error::Error::source(err);
        while let Some(e) = source {
            if e.downcast_ref::<reqwest::Error>().is_some_and(reqwest::Error::is_body) {
                return true;
            }
            source = std::error::Error::source(e);
        }
        err.is_body()
    }
}

/// Source of COVID statistics.
///
/// Every method performs exactly one upstream call and returns the decoded
/// records; reshaping into the outbound schema is left to the handlers.
#[async_trait]
pub trait StatsProvider: Send + Sync + fmt::Debug {
    /// Names of every country the upstream knows about, in upstream order.
    async fn countries(&self) -> Result<Vec<String>, UpstreamError>;

    /// First record for `country` on `day`.
    ///
    /// Fails with [`UpstreamError::EmptyResult`] when the upstream has none.
    async fn history(&self, country: &str, day: &str)
        -> Result<UpstreamCountryRecord, UpstreamError>;

    /// Current snapshot for every country.
    async fn statistics(&self) -> Result<Vec<UpstreamStatRecord>, UpstreamError>;
}

/// Provider for the RapidAPI covid-193 API.
pub mod covid193;
