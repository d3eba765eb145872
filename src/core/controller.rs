//! # Carousel Controller
//!
//! Glues the engine, the progress track and the image prefetcher together.
//! Input comes in as method calls (or `Input` values via `handle`), output
//! leaves as `CarouselEvent`s pushed into an `EventSink`.
//!
//! ```text
//!  tap / pause / tick ──▶ Controller ──▶ Engine transition
//!                            │
//!                            ├──▶ ProgressTrack: retarget / pause / resume
//!                            ├──▶ Prefetcher: current + next slide
//!                            └──▶ EventSink: Header, SlideChanged, Image, ...
//! ```
//!
//! The controller never awaits. Fetches it wants are queued and handed to
//! the driver via `drain_fetches()`; the driver reports back with
//! `image_loaded()`. A result for anything but the current slide's media is
//! not shown (staleness check).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::engine::{CarouselEngine, Phase, PlaybackState, Transition};
use super::progress::ProgressTrack;
use super::slide::{MediaRef, Sequence, Slide};
use crate::prefetch::{CacheEntry, FetchFuture, FetchResult, ImagePrefetcher, Resource};

/// What the presentation layer should show for a slide's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    /// Placeholder while the fetch is outstanding.
    Loading,
    Ready(Resource),
    /// Placeholder for good: no media, or the fetch failed.
    Unavailable,
}

/// Requests to leave the carousel, routed by the host app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateAction {
    /// The story header was tapped.
    OpenSearch,
    /// Swipe up or call-to-action on the slide at this index.
    OpenSlide(usize),
    ToggleFavorite(usize),
    Share(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CarouselEvent {
    /// Story title and icon, sent when playback starts and again when the
    /// icon finishes loading.
    Header {
        title: Option<String>,
        icon: ImageState,
    },
    SlideChanged {
        index: usize,
        slide: Slide,
        favorite: bool,
    },
    Image { index: usize, state: ImageState },
    /// Follows `Navigate(ToggleFavorite)` with the slide's new state.
    FavoriteChanged { index: usize, favorite: bool },
    SequenceFinished,
    DismissRequested,
    Navigate(NavigateAction),
}

/// Receives controller output.
pub trait EventSink {
    fn emit(&mut self, event: CarouselEvent);
}

impl EventSink for Vec<CarouselEvent> {
    fn emit(&mut self, event: CarouselEvent) {
        self.push(event);
    }
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<CarouselEvent> {
    fn emit(&mut self, event: CarouselEvent) {
        if self.send(event).is_err() {
            warn!("Failed to emit carousel event: receiver dropped");
        }
    }
}

/// External input, for drivers that forward events over a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Start,
    StartAt(usize),
    /// Horizontal tap at `x` on a display `width` wide.
    Tap { x: f32, width: f32 },
    TapHeader,
    OpenSlide,
    ToggleFavorite,
    Share,
    Pause,
    Resume,
    Reset,
    Dismiss,
}

/// A fetch the driver should await and report back through `image_loaded`.
pub struct PendingFetch {
    pub media_ref: MediaRef,
    pub future: FetchFuture,
}

impl std::fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingFetch")
            .field("media_ref", &self.media_ref)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    /// Warm the next slide's image after every index change.
    pub prefetch: bool,
    /// Used by the progress track when a counter is started without an
    /// explicit duration.
    pub default_slide_duration: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            prefetch: true,
            default_slide_duration: Duration::from_secs(5),
        }
    }
}

pub struct CarouselController<S: EventSink> {
    engine: CarouselEngine,
    progress: ProgressTrack,
    prefetcher: Arc<ImagePrefetcher>,
    sink: S,
    options: ControllerOptions,
    /// Media refs with a fetch handed out and not yet reported back.
    in_flight: HashSet<MediaRef>,
    outbox: Vec<PendingFetch>,
    /// Media of the slide on screen, used for the staleness check.
    displayed: Option<MediaRef>,
    /// Story icon while the header is shown.
    header_icon: Option<MediaRef>,
    favorites: Vec<bool>,
    dismissed: bool,
}

impl<S: EventSink> CarouselController<S> {
    pub fn new(
        sequence: Sequence,
        prefetcher: Arc<ImagePrefetcher>,
        sink: S,
        options: ControllerOptions,
    ) -> Self {
        let mut progress = ProgressTrack::new(options.default_slide_duration);
        progress.configure(sequence.len());
        let favorites = sequence.slides().iter().map(|s| s.favorite).collect();
        Self {
            engine: CarouselEngine::load(sequence),
            progress,
            prefetcher,
            sink,
            options,
            in_flight: HashSet::new(),
            outbox: Vec::new(),
            displayed: None,
            header_icon: None,
            favorites,
            dismissed: false,
        }
    }

    pub fn handle(&mut self, input: Input) {
        match input {
            Input::Start => self.start(),
            Input::StartAt(index) => self.start_at(index),
            Input::Tap { x, width } => self.tap(x, width),
            Input::TapHeader => self.tap_header(),
            Input::OpenSlide => self.open_slide(),
            Input::ToggleFavorite => self.toggle_favorite(),
            Input::Share => self.share(),
            Input::Pause => self.pause(),
            Input::Resume => self.resume(),
            Input::Reset => self.reset(),
            Input::Dismiss => self.dismiss(),
        }
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub fn start(&mut self) {
        self.start_at(0);
    }

    pub fn start_at(&mut self, index: usize) {
        if self.dismissed {
            return;
        }
        if let Some(Transition::Started { index }) = self.engine.start_at(index) {
            info!(
                "Playing sequence {} from slide {}",
                self.engine.state().sequence_id,
                index
            );
            self.enter_slide(index);
            self.show_header();
        }
    }

    /// Right half advances, left half retreats.
    pub fn tap(&mut self, x: f32, width: f32) {
        if !(width.is_finite() && width > 0.0 && x.is_finite()) {
            debug!("Ignoring tap at {} on width {}", x, width);
            return;
        }
        if x > width / 2.0 {
            self.advance();
        } else {
            self.retreat();
        }
    }

    pub fn advance(&mut self) {
        if self.dismissed {
            return;
        }
        let transition = self.engine.advance();
        self.apply(transition);
    }

    pub fn retreat(&mut self) {
        if self.dismissed {
            return;
        }
        let transition = self.engine.retreat();
        self.apply(transition);
    }

    /// Suspends playback without touching the index. Idempotent.
    pub fn pause(&mut self) {
        if self.dismissed {
            return;
        }
        if self.engine.pause().is_some() {
            self.progress.pause();
            debug!("Paused at slide {}", self.engine.current_index());
        }
    }

    /// Continues from where `pause()` left the progress. Idempotent.
    pub fn resume(&mut self) {
        if self.dismissed {
            return;
        }
        if self.engine.resume().is_some() {
            self.progress.resume();
            debug!("Resumed at slide {}", self.engine.current_index());
        }
    }

    /// Back to idle; `start()` plays the sequence again.
    pub fn reset(&mut self) {
        if self.dismissed {
            return;
        }
        self.engine.reset();
        self.progress.reset();
        self.displayed = None;
        self.header_icon = None;
    }

    /// Advances time for the progress track. A completed counter advances
    /// the carousel just like a right-hand tap.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.dismissed {
            return;
        }
        let Some(done) = self.progress.tick(elapsed) else {
            return;
        };
        if done.index != self.engine.current_index() {
            debug!(
                "Ignoring completion for slide {} while on {}",
                done.index,
                self.engine.current_index()
            );
            return;
        }
        let transition = self.engine.advance();
        self.apply(transition);
    }

    /// Stops everything and asks the host to close the carousel. Every later
    /// call is ignored.
    pub fn dismiss(&mut self) {
        if self.dismissed {
            return;
        }
        info!("Dismissing sequence {}", self.engine.state().sequence_id);
        self.engine.reset();
        self.progress.reset();
        self.in_flight.clear();
        self.outbox.clear();
        self.displayed = None;
        self.header_icon = None;
        self.dismissed = true;
        self.sink.emit(CarouselEvent::DismissRequested);
    }

    // ========================================================================
    // Navigate-away actions
    // ========================================================================

    pub fn tap_header(&mut self) {
        self.navigate(NavigateAction::OpenSearch);
    }

    pub fn open_slide(&mut self) {
        self.navigate(NavigateAction::OpenSlide(self.engine.current_index()));
    }

    /// Flips the current slide's favorite state and reports both the
    /// action and the new state.
    pub fn toggle_favorite(&mut self) {
        if self.dismissed {
            return;
        }
        let index = self.engine.current_index();
        self.navigate(NavigateAction::ToggleFavorite(index));
        if let Some(favorite) = self.favorites.get_mut(index) {
            *favorite = !*favorite;
            let favorite = *favorite;
            self.sink.emit(CarouselEvent::FavoriteChanged { index, favorite });
        }
    }

    pub fn share(&mut self) {
        self.navigate(NavigateAction::Share(self.engine.current_index()));
    }

    fn navigate(&mut self, action: NavigateAction) {
        if self.dismissed {
            return;
        }
        debug!("Navigate: {:?}", action);
        self.sink.emit(CarouselEvent::Navigate(action));
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Reports a finished fetch. Only the current slide's media and the
    /// story icon are shown.
    pub fn image_loaded(&mut self, media_ref: MediaRef, result: FetchResult) {
        self.in_flight.remove(&media_ref);
        if self.dismissed {
            return;
        }
        let is_icon = self.header_icon.as_ref() == Some(&media_ref);
        let is_slide = self.displayed.as_ref() == Some(&media_ref);
        if !is_icon && !is_slide {
            debug!("Discarding stale image for {}", media_ref);
            return;
        }
        let state = match result {
            Ok(resource) => ImageState::Ready(resource),
            Err(e) => {
                warn!("Showing placeholder for {}: {}", media_ref, e);
                ImageState::Unavailable
            }
        };
        if is_icon {
            self.sink.emit(CarouselEvent::Header {
                title: self.engine.sequence().title().map(str::to_string),
                icon: state.clone(),
            });
        }
        if is_slide {
            let index = self.engine.current_index();
            self.sink.emit(CarouselEvent::Image { index, state });
        }
    }

    /// Takes the fetches queued since the last call.
    pub fn drain_fetches(&mut self) -> Vec<PendingFetch> {
        std::mem::take(&mut self.outbox)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &PlaybackState {
        self.engine.state()
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn current_index(&self) -> usize {
        self.engine.current_index()
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.engine.sequence().get(self.engine.current_index())
    }

    pub fn sequence(&self) -> &Sequence {
        self.engine.sequence()
    }

    pub fn progress(&self) -> &ProgressTrack {
        &self.progress
    }

    pub fn prefetcher(&self) -> &Arc<ImagePrefetcher> {
        &self.prefetcher
    }

    pub fn is_favorite(&self, index: usize) -> bool {
        self.favorites.get(index).copied().unwrap_or(false)
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn apply(&mut self, transition: Option<Transition>) {
        match transition {
            Some(Transition::Moved { to, .. }) => self.enter_slide(to),
            Some(Transition::Finished) => {
                self.progress.stop();
                info!("Sequence {} finished", self.engine.state().sequence_id);
                self.sink.emit(CarouselEvent::SequenceFinished);
            }
            _ => {}
        }
    }

    /// Shows `index`: fresh timer, slide event, image, then lookahead.
    fn enter_slide(&mut self, index: usize) {
        let Some(slide) = self.engine.sequence().get(index).cloned() else {
            return;
        };
        self.progress.set_active(index, false);
        self.progress.start(slide.duration);
        debug!("Slide {} ({}) for {:?}", index, slide.id, slide.duration);

        let media_ref = slide.media_ref.clone();
        let favorite = self.is_favorite(index);
        self.sink.emit(CarouselEvent::SlideChanged {
            index,
            slide,
            favorite,
        });
        self.show_image(index, media_ref);
        self.prefetch_next();
    }

    fn show_image(&mut self, index: usize, media_ref: Option<MediaRef>) {
        let Some(media_ref) = media_ref else {
            self.displayed = None;
            self.sink.emit(CarouselEvent::Image {
                index,
                state: ImageState::Unavailable,
            });
            return;
        };

        self.displayed = Some(media_ref.clone());
        let state = match self.prefetcher.peek(&media_ref) {
            CacheEntry::Ready(resource) => ImageState::Ready(resource),
            CacheEntry::Absent | CacheEntry::Pending | CacheEntry::Unavailable(_) => {
                self.issue(media_ref);
                ImageState::Loading
            }
        };
        self.sink.emit(CarouselEvent::Image { index, state });
    }

    /// Emits the story header, loading the icon through the prefetcher.
    fn show_header(&mut self) {
        let title = self.engine.sequence().title().map(str::to_string);
        let icon = match self.engine.sequence().icon().cloned() {
            None => {
                self.header_icon = None;
                ImageState::Unavailable
            }
            Some(icon) => {
                self.header_icon = Some(icon.clone());
                match self.prefetcher.peek(&icon) {
                    CacheEntry::Ready(resource) => ImageState::Ready(resource),
                    _ => {
                        self.issue(icon);
                        ImageState::Loading
                    }
                }
            }
        };
        self.sink.emit(CarouselEvent::Header { title, icon });
    }

    fn prefetch_next(&mut self) {
        if !self.options.prefetch {
            return;
        }
        let Some(next) = self.engine.prefetch_target() else {
            return;
        };
        let Some(media_ref) = self
            .engine
            .sequence()
            .get(next)
            .and_then(|s| s.media_ref.clone())
        else {
            return;
        };
        if matches!(self.prefetcher.peek(&media_ref), CacheEntry::Ready(_)) {
            return;
        }
        debug!("Prefetching slide {} ({})", next, media_ref);
        self.issue(media_ref);
    }

    /// Queues a fetch unless one for the same media is already out.
    fn issue(&mut self, media_ref: MediaRef) {
        if self.in_flight.contains(&media_ref) {
            debug!("Fetch for {} already pending", media_ref);
            return;
        }
        let future = self.prefetcher.request(&media_ref);
        self.in_flight.insert(media_ref.clone());
        self.outbox.push(PendingFetch { media_ref, future });
    }
}

impl<S: EventSink> std::fmt::Debug for CarouselController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarouselController")
            .field("state", self.engine.state())
            .field("in_flight", &self.in_flight.len())
            .field("dismissed", &self.dismissed)
            .finish_non_exhaustive()
    }
}
