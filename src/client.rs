use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::model::{GuideQuery, GuideResult, HealthReport, PlaceRequest};
use crate::GuideError;

/// Anything that can turn a place query into a guide
#[async_trait]
pub trait GuideService: Send + Sync {
    async fn tourist_guide(&self, query: &GuideQuery) -> Result<GuideResult, GuideError>;
}

/// HTTP client for the guide service
#[derive(Debug, Clone)]
pub struct GuideClient {
    client: Client,
    base_url: String,
}

impl GuideClient {
    /// Create a client from loaded configuration
    pub fn new(config: &ClientConfig) -> Result<Self, GuideError> {
        let mut builder = GuideClient::builder().base_url(&config.base_url);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    pub fn builder() -> GuideClientBuilder {
        GuideClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe `GET /health`
    pub async fn health(&self) -> Result<HealthReport, GuideError> {
        let url = format!("{}/health", self.base_url);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl GuideService for GuideClient {
    async fn tourist_guide(&self, query: &GuideQuery) -> Result<GuideResult, GuideError> {
        let url = format!("{}/tourist-guide", self.base_url);
        debug!("POST {} place={:?}", url, query.as_str());

        let response = self
            .client
            .post(&url)
            .json(&PlaceRequest::from(query))
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GuideError> {
    let status = response.status();
    let body = response.text().await?;
    debug!("Response {}: {}", status, body);

    if !status.is_success() {
        return Err(GuideError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

/// Builder for [`GuideClient`]
#[derive(Debug, Default)]
pub struct GuideClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GuideClientBuilder {
    /// Set the service base URL
    ///
    /// # Example
    /// ```
    /// use tourist_guide::GuideClient;
    ///
    /// let client = GuideClient::builder()
    ///     .base_url("http://localhost:8000/")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(client.base_url(), "http://localhost:8000");
    /// ```
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Give up on a request after `duration`. Requests never time out unless set.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn build(self) -> Result<GuideClient, GuideError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| ClientConfig::default().base_url)
            .trim_end_matches('/')
            .to_string();

        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GuideError::Client(e.to_string()))?;

        Ok(GuideClient { client, base_url })
    }
}
