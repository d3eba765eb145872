//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::controller::{CarouselController, CarouselEvent, ControllerOptions};
use crate::core::slide::{MediaRef, Sequence, SequenceId, Slide};
use crate::prefetch::{FetchResult, ImageFetcher, ImagePrefetcher, Resource, ResourceUnavailable};

/// Resolves every media ref to a resource whose bytes are the ref itself.
pub struct StubFetcher {
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for StubFetcher {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch(&self, media_ref: &MediaRef) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Resource::new(
            media_ref.clone(),
            media_ref.as_str().as_bytes(),
            Some("image/jpeg".to_string()),
        ))
    }
}

/// Fails every fetch with the given HTTP status.
pub struct FailingFetcher {
    status: u16,
}

impl FailingFetcher {
    pub fn new(status: u16) -> Self {
        Self { status }
    }
}

#[async_trait]
impl ImageFetcher for FailingFetcher {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self, _media_ref: &MediaRef) -> FetchResult {
        Err(ResourceUnavailable::Status(self.status))
    }
}

pub fn media(index: usize) -> MediaRef {
    MediaRef::new(format!("img/{index}.jpg"))
}

/// A sequence of `len` five-second slides with media `img/<i>.jpg`.
pub fn sequence_of(len: usize) -> Sequence {
    sequence_with_durations(&vec![5.0; len])
}

pub fn sequence_with_durations(seconds: &[f64]) -> Sequence {
    let slides = seconds
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Slide::new(format!("slide-{i}"), Some(media(i)), Duration::from_secs_f64(*s))
                .with_title(format!("Slide {i}"))
        })
        .collect();
    Sequence::new(SequenceId::new("test-sequence"), slides).expect("non-empty test sequence")
}

/// Controller over `sequence` that records its events into a `Vec`.
pub fn recording_controller(sequence: Sequence) -> CarouselController<Vec<CarouselEvent>> {
    let prefetcher = Arc::new(ImagePrefetcher::new(Arc::new(StubFetcher::new())));
    CarouselController::new(sequence, prefetcher, Vec::new(), ControllerOptions::default())
}
