use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::{Config, ConfigError};
use crate::error::UpstreamError;
use crate::models::{UpstreamCountryRecord, UpstreamEnvelope, UpstreamStatRecord};
use crate::provider::{common, StatsProvider};

/// RapidAPI covid-193 provider
/// API reference: https://rapidapi.com/api-sports/api/covid-193
#[derive(Debug, Clone)]
pub struct Covid193Provider {
    client: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
}

impl Covid193Provider {
    /// Build the provider and its HTTP client from `config`.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            client: common::create_client(config)?,
            endpoint: config.upstream.endpoint.trim_end_matches('/').to_string(),
            timeout_secs: config.upstream.timeout,
        })
    }

    /// GET `<endpoint>/<path>` and return the decoded `response` array.
    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, UpstreamError> {
        let url = format!("{}/{}", self.endpoint, path);
        tracing::debug!("Calling upstream {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                let err = common::classify(&e, self.timeout_secs);
                tracing::error!("Failed to send request to {}: {}", url, e);
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Upstream {} returned error {}: {}", path, status, body);
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!("Failed to read upstream {} body: {}", path, e);
            common::classify(&e, self.timeout_secs)
        })?;

        // Invalid UTF-8 is rejected here rather than replaced.
        let envelope: UpstreamEnvelope<T> = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("Failed to parse upstream {} response: {}", path, e);
            UpstreamError::MalformedResponse(e.to_string())
        })?;

        tracing::debug!("Upstream {} returned {} records", path, envelope.response.len());
        Ok(envelope.response)
    }
}

#[async_trait]
impl StatsProvider for Covid193Provider {
    async fn countries(&self) -> Result<Vec<String>, UpstreamError> {
        self.fetch("countries", &[]).await
    }

    async fn history(
        &self,
        country: &str,
        day: &str,
    ) -> Result<UpstreamCountryRecord, UpstreamError> {
        self.fetch("history", &[("country", country), ("day", day)])
            .await?
            .into_iter()
            .next()
            .ok_or(UpstreamError::EmptyResult)
    }

    async fn statistics(&self) -> Result<Vec<UpstreamStatRecord>, UpstreamError> {
        self.fetch("statistics", &[]).await
    }
}
