//! Rate-limited JSON over HTTP.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use stockscope_core::error::DataError;
use tracing::debug;

use crate::rate_limiter::RateLimiter;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stockscope/0.1";

/// HTTP client paced by a [`RateLimiter`]. One per upstream host.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    limiter: RateLimiter,
}

impl HttpClient {
    pub fn new(
        timeout: Duration,
        min_interval: Duration,
        user_agent: Option<&str>,
    ) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .build()
            .map_err(|e| DataError::Http(e.to_string()))?;
        Ok(Self {
            client,
            limiter: RateLimiter::new(min_interval),
        })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Wait for a rate-limit permit, send, check the status and decode JSON.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, DataError> {
        let body = self.send_text(builder).await?;
        serde_json::from_str(&body).map_err(|e| DataError::ParseError(e.to_string()))
    }

    pub async fn send_text(&self, builder: RequestBuilder) -> Result<String, DataError> {
        self.limiter.acquire().await;

        let request = builder.build().map_err(|e| DataError::Http(e.to_string()))?;
        debug!(url = %request.url(), "Requesting");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| DataError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DataError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(DataError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(body)
    }
}
