//! HTTP client for the upstream origin.
//!
//! # Responsibilities
//! - Resolve identifiers against the configured base
//! - Retrieve bodies and declared content types
//! - Enforce connect and fetch timeouts
//!
//! # Design Decisions
//! - No retries: an upstream failure is the final answer for the request
//! - Bodies are buffered; derivation needs the whole image anyway

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::config::OriginConfig;
use crate::origin::{resolve, ImageResource, OriginError, UpstreamReply};

/// Fetches original resources from the upstream origin.
#[derive(Clone)]
pub struct OriginFetcher {
    client: reqwest::Client,
    base: Url,
}

impl OriginFetcher {
    /// Build a fetcher for the configured origin.
    pub fn new(config: &OriginConfig) -> Result<Self, OriginError> {
        let base = Url::parse(&config.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(concat!("progressive-edge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(OriginError::Client)?;

        Ok(Self { client, base })
    }

    /// Fetch whatever the origin answers, success or not.
    pub async fn fetch_reply(&self, identifier: &str) -> Result<UpstreamReply, OriginError> {
        let url = resolve(&self.base, identifier)?;

        tracing::debug!(url = %url, "Fetching from origin");

        let unreachable = |source: reqwest::Error| OriginError::Unreachable {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(unreachable)?;

        tracing::debug!(
            url = %url,
            status = %status,
            bytes = body.len(),
            "Origin replied"
        );

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }

    /// Fetch an original image; non-success replies come back as `OriginError::Status`.
    pub async fn fetch(&self, identifier: &str) -> Result<ImageResource, OriginError> {
        let reply = self.fetch_reply(identifier).await?;
        ImageResource::from_reply(reply)
    }
}
