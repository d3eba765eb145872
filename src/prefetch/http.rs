//! HTTP image fetcher.
//!
//! Absolute `http(s)://` media refs are fetched as-is; anything else is
//! joined onto the configured base URL.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use super::fetcher::{FetchResult, ImageFetcher, Resource, ResourceUnavailable};
use crate::core::slide::MediaRef;

pub struct HttpFetcher {
    base_url: Option<String>,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self { base_url, client }
    }

    /// Turns a media ref into a URL.
    pub fn resolve_url(&self, media_ref: &MediaRef) -> Result<String, ResourceUnavailable> {
        let raw = media_ref.as_str();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(raw.to_string());
        }
        match &self.base_url {
            Some(base) => Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                raw.trim_start_matches('/')
            )),
            None => Err(ResourceUnavailable::InvalidRef(raw.to_string())),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, media_ref: &MediaRef) -> FetchResult {
        let url = self.resolve_url(media_ref)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResourceUnavailable::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Image request failed: {} - {}", url, status);
            return Err(ResourceUnavailable::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ResourceUnavailable::Network(e.to_string()))?;

        if bytes.is_empty() {
            return Err(ResourceUnavailable::Empty);
        }

        debug!("Loaded {} ({} bytes, {:?})", url, bytes.len(), content_type);
        Ok(Resource::new(media_ref.clone(), bytes.to_vec(), content_type))
    }
}
