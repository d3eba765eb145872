//! # Image Prefetcher
//!
//! "Get or load" cache in front of an `ImageFetcher`. Every media ref maps
//! to one shared future, so concurrent callers for the same ref await the
//! same fetch and see the same outcome.
//!
//! ```text
//! request(ref) ──▶ entry? ── no ──▶ fetcher.fetch(ref) ──▶ Shared future
//!                    │                                        ▲
//!                    ├─ pending / ready ─────── clone ────────┘
//!                    └─ failed ──▶ fresh fetch (retry on next request)
//! ```
//!
//! Successful results are kept for the life of the prefetcher; nothing is
//! revalidated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use log::{debug, warn};

use super::fetcher::{FetchResult, ImageFetcher, Resource, ResourceUnavailable};
use crate::core::slide::MediaRef;

/// Awaitable handle for one media ref. Clones resolve to the same outcome.
pub type FetchFuture = Shared<BoxFuture<'static, FetchResult>>;

/// Cache state of a media ref, as seen without awaiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    Absent,
    Pending,
    Ready(Resource),
    Unavailable(ResourceUnavailable),
}

#[derive(Default)]
struct Inner {
    entries: HashMap<MediaRef, FetchFuture>,
    fetches_started: usize,
}

pub struct ImagePrefetcher {
    fetcher: Arc<dyn ImageFetcher>,
    inner: Mutex<Inner>,
}

impl ImagePrefetcher {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Returns the in-flight or completed fetch for `media_ref`, starting one
    /// if there is none or the last attempt failed.
    ///
    /// Nothing runs until the returned future is polled.
    pub fn request(&self, media_ref: &MediaRef) -> FetchFuture {
        let mut inner = self.lock();

        if let Some(existing) = inner.entries.get(media_ref) {
            match existing.peek() {
                Some(Err(e)) => {
                    debug!("Retrying {} after earlier failure: {}", media_ref, e);
                }
                _ => return existing.clone(),
            }
        }

        let fetcher = Arc::clone(&self.fetcher);
        let key = media_ref.clone();
        let future = async move {
            let result = fetcher.fetch(&key).await;
            if let Err(ref e) = result {
                warn!("{} failed to load {}: {}", fetcher.name(), key, e);
            }
            result
        }
        .boxed()
        .shared();

        inner.fetches_started += 1;
        inner.entries.insert(media_ref.clone(), future.clone());
        debug!("Started fetch #{} for {}", inner.fetches_started, media_ref);
        future
    }

    pub fn peek(&self, media_ref: &MediaRef) -> CacheEntry {
        let inner = self.lock();
        match inner.entries.get(media_ref) {
            None => CacheEntry::Absent,
            Some(future) => match future.peek() {
                None => CacheEntry::Pending,
                Some(Ok(resource)) => CacheEntry::Ready(resource.clone()),
                Some(Err(e)) => CacheEntry::Unavailable(e.clone()),
            },
        }
    }

    /// Drops the entry for `media_ref`. Callers already awaiting it still
    /// get their result.
    pub fn evict(&self, media_ref: &MediaRef) -> bool {
        self.lock().entries.remove(media_ref).is_some()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Number of underlying fetches started so far.
    pub fn fetches_started(&self) -> usize {
        self.lock().fetches_started
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The map stays consistent even if a holder panicked mid-call.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ImagePrefetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePrefetcher")
            .field("fetcher", &self.fetcher.name())
            .field("entries", &self.len())
            .finish()
    }
}
