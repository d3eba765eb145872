use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::slide::MediaRef;

/// Why an image could not be produced. Never fatal: the presentation layer
/// shows a placeholder instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUnavailable {
    /// Transport failure (timeout, DNS, connection refused).
    Network(String),
    /// The server answered with a non-success status.
    Status(u16),
    /// The response carried no bytes.
    Empty,
    /// The media ref cannot be turned into a location.
    InvalidRef(String),
}

impl fmt::Display for ResourceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceUnavailable::Network(msg) => write!(f, "network error: {msg}"),
            ResourceUnavailable::Status(status) => write!(f, "HTTP {status}"),
            ResourceUnavailable::Empty => write!(f, "empty response body"),
            ResourceUnavailable::InvalidRef(media) => write!(f, "invalid media ref: {media}"),
        }
    }
}

impl std::error::Error for ResourceUnavailable {}

/// A loaded image. Bytes are shared, so clones are cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub media_ref: MediaRef,
    pub bytes: Arc<[u8]>,
    pub content_type: Option<String>,
}

impl Resource {
    pub fn new(media_ref: MediaRef, bytes: impl Into<Arc<[u8]>>, content_type: Option<String>) -> Self {
        Self {
            media_ref,
            bytes: bytes.into(),
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub type FetchResult = Result<Resource, ResourceUnavailable>;

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Returns the name of the fetcher.
    fn name(&self) -> &str;

    /// Loads the bytes behind `media_ref`.
    async fn fetch(&self, media_ref: &MediaRef) -> FetchResult;
}
