//! # Player
//!
//! Drives a `CarouselController` on tokio. This is the only module that
//! knows about timers and tasks; the controller itself stays synchronous.
//!
//! ```text
//!   interval.tick() ─────▶ controller.tick(dt)
//!   input channel ───────▶ controller.handle(input)
//!   fetch completions ───▶ controller.image_loaded(ref, result)
//!                               │
//!                               └── drain_fetches() ──▶ tokio::spawn(await)
//! ```
//!
//! Every controller call happens on the task running `run`, so fetch results
//! come back through a channel instead of touching the controller directly.

use log::{debug, info, warn};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::controller::{CarouselController, EventSink, Input};
use crate::core::engine::Phase;
use crate::core::slide::MediaRef;
use crate::prefetch::FetchResult;

#[derive(Debug, Clone, Copy)]
pub struct PlayerOptions {
    pub tick_interval: Duration,
    pub start_index: usize,
    /// Return as soon as the sequence finishes.
    pub exit_on_finish: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            start_index: 0,
            exit_on_finish: true,
        }
    }
}

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Dismissed,
}

/// Plays the controller's sequence until it finishes or is dismissed.
///
/// When the input channel closes, playback continues on the timer alone.
/// With `exit_on_finish` off, a finished carousel keeps waiting for input
/// (e.g. `Reset` and `Start`) until the channel closes.
pub async fn run<S: EventSink>(
    controller: &mut CarouselController<S>,
    mut inputs: mpsc::UnboundedReceiver<Input>,
    options: PlayerOptions,
) -> PlaybackOutcome {
    let (loaded_tx, mut loaded_rx) = mpsc::unbounded_channel::<(MediaRef, FetchResult)>();

    let mut interval = tokio::time::interval(options.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();
    let mut inputs_open = true;

    controller.start_at(options.start_index);
    spawn_fetches(controller, &loaded_tx);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                controller.tick(now - last_tick);
                last_tick = now;
            }
            input = inputs.recv(), if inputs_open => match input {
                Some(input) => {
                    debug!("Player received input: {:?}", input);
                    controller.handle(input);
                }
                None => {
                    info!("Input channel closed, continuing on timer");
                    inputs_open = false;
                }
            },
            Some((media_ref, result)) = loaded_rx.recv() => {
                controller.image_loaded(media_ref, result);
            }
        }

        spawn_fetches(controller, &loaded_tx);

        if controller.is_dismissed() {
            return PlaybackOutcome::Dismissed;
        }
        if controller.phase() == Phase::Finished && (options.exit_on_finish || !inputs_open) {
            return PlaybackOutcome::Finished;
        }
    }
}

fn spawn_fetches<S: EventSink>(
    controller: &mut CarouselController<S>,
    tx: &mpsc::UnboundedSender<(MediaRef, FetchResult)>,
) {
    for fetch in controller.drain_fetches() {
        let tx = tx.clone();
        debug!("Spawning fetch for {}", fetch.media_ref);
        tokio::spawn(async move {
            let result = fetch.future.await;
            if tx.send((fetch.media_ref.clone(), result)).is_err() {
                warn!(
                    "Failed to report fetch for {}: player stopped",
                    fetch.media_ref
                );
            }
        });
    }
}

/// Parses one line of the player's text command protocol.
///
/// `n`/`next` and `p`/`prev` are taps on the right and left halves.
pub fn parse_command(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?.to_ascii_lowercase();
    match command.as_str() {
        "n" | "next" => Some(Input::Tap { x: 0.75, width: 1.0 }),
        "p" | "prev" => Some(Input::Tap { x: 0.25, width: 1.0 }),
        "tap" => {
            let x = parts.next()?.parse().ok()?;
            let width = parts.next()?.parse().ok()?;
            Some(Input::Tap { x, width })
        }
        "pause" => Some(Input::Pause),
        "resume" => Some(Input::Resume),
        "search" => Some(Input::TapHeader),
        "open" => Some(Input::OpenSlide),
        "fav" => Some(Input::ToggleFavorite),
        "share" => Some(Input::Share),
        "reset" => Some(Input::Reset),
        "start" => Some(Input::Start),
        "q" | "quit" => Some(Input::Dismiss),
        _ => None,
    }
}
