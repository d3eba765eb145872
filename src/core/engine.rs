//! # Carousel Engine
//!
//! The playback state machine. It only knows indices and phases; timers,
//! images and presentation belong to the controller.
//!
//! ```text
//!            start()                 advance() on last
//!   Idle ───────────────▶ Playing ─────────────────────▶ Finished
//!    ▲                    │  ▲  ⟲ advance()/retreat()        │
//!    │            pause() ▼  │ resume()                      │
//!    │                   Paused                              │
//!    └────────────────── reset() from anywhere ◀─────────────┘
//! ```
//!
//! Events that a state does not define return `None` and leave the state
//! untouched. Rapid repeated input is common, so these are not errors.

use log::debug;

use super::slide::{Sequence, SequenceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Playing,
    Paused,
    Finished,
}

/// Snapshot of where playback is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub sequence_id: SequenceId,
    pub current_index: usize,
    pub phase: Phase,
}

/// What a successful engine call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Playback began at `index`.
    Started { index: usize },
    /// The current slide moved from `from` to `to`.
    Moved { from: usize, to: usize },
    /// Advanced past the last slide. Emitted once per playthrough.
    Finished,
    Paused,
    Resumed,
    Reset,
}

#[derive(Debug)]
pub struct CarouselEngine {
    sequence: Sequence,
    state: PlaybackState,
}

impl CarouselEngine {
    /// Loads a sequence. The engine starts `Idle` at index 0.
    pub fn load(sequence: Sequence) -> Self {
        let state = PlaybackState {
            sequence_id: sequence.id().clone(),
            current_index: 0,
            phase: Phase::Idle,
        };
        Self { sequence, state }
    }

    pub fn start(&mut self) -> Option<Transition> {
        self.start_at(0)
    }

    /// Starts playback at `index`, e.g. to resume a story where it was left.
    pub fn start_at(&mut self, index: usize) -> Option<Transition> {
        if self.state.phase != Phase::Idle {
            return self.reject("start");
        }
        if index >= self.sequence.len() {
            debug!(
                "start_at({}) out of range for {} slides",
                index,
                self.sequence.len()
            );
            return None;
        }
        self.state.current_index = index;
        self.state.phase = Phase::Playing;
        debug!("Engine started at {}", index);
        Some(Transition::Started { index })
    }

    pub fn advance(&mut self) -> Option<Transition> {
        if self.state.phase != Phase::Playing {
            return self.reject("advance");
        }
        let from = self.state.current_index;
        if from == self.sequence.last_index() {
            self.state.phase = Phase::Finished;
            debug!("Engine finished sequence {}", self.state.sequence_id);
            return Some(Transition::Finished);
        }
        self.state.current_index = from + 1;
        Some(Transition::Moved { from, to: from + 1 })
    }

    pub fn retreat(&mut self) -> Option<Transition> {
        if self.state.phase != Phase::Playing {
            return self.reject("retreat");
        }
        let from = self.state.current_index;
        if from == 0 {
            debug!("retreat() at first slide");
            return None;
        }
        self.state.current_index = from - 1;
        Some(Transition::Moved { from, to: from - 1 })
    }

    pub fn pause(&mut self) -> Option<Transition> {
        if self.state.phase != Phase::Playing {
            return self.reject("pause");
        }
        self.state.phase = Phase::Paused;
        Some(Transition::Paused)
    }

    pub fn resume(&mut self) -> Option<Transition> {
        if self.state.phase != Phase::Paused {
            return self.reject("resume");
        }
        self.state.phase = Phase::Playing;
        Some(Transition::Resumed)
    }

    /// Back to `Idle` at index 0. Valid from every phase.
    pub fn reset(&mut self) -> Transition {
        self.state.current_index = 0;
        self.state.phase = Phase::Idle;
        Transition::Reset
    }

    /// The only slide worth warming: the one right after the current one.
    pub fn prefetch_target(&self) -> Option<usize> {
        let next = self.state.current_index + 1;
        (next < self.sequence.len()).then_some(next)
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    fn reject(&self, event: &str) -> Option<Transition> {
        debug!("Ignoring {}() while {:?}", event, self.state.phase);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sequence_of;

    fn engine(len: usize) -> CarouselEngine {
        CarouselEngine::load(sequence_of(len))
    }

    #[test]
    fn test_load_is_idle_at_zero() {
        let e = engine(3);
        assert_eq!(e.phase(), Phase::Idle);
        assert_eq!(e.current_index(), 0);
        assert_eq!(e.state().sequence_id.as_str(), "test-sequence");
    }

    #[test]
    fn test_start_plays_first_slide() {
        let mut e = engine(3);
        assert_eq!(e.start(), Some(Transition::Started { index: 0 }));
        assert_eq!(e.phase(), Phase::Playing);
        assert_eq!(e.prefetch_target(), Some(1));
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut e = engine(3);
        e.start();
        e.advance();
        assert_eq!(e.start(), None);
        assert_eq!(e.current_index(), 1);
    }

    #[test]
    fn test_start_at_index() {
        let mut e = engine(3);
        assert_eq!(e.start_at(2), Some(Transition::Started { index: 2 }));
        assert_eq!(e.prefetch_target(), None);
    }

    #[test]
    fn test_start_at_out_of_range() {
        let mut e = engine(3);
        assert_eq!(e.start_at(3), None);
        assert_eq!(e.phase(), Phase::Idle);
    }

    #[test]
    fn test_advance_reaches_finished_once() {
        for len in 1..=6 {
            let mut e = engine(len);
            e.start();
            for _ in 0..len - 1 {
                assert!(matches!(e.advance(), Some(Transition::Moved { .. })));
            }
            assert_eq!(e.advance(), Some(Transition::Finished));
            assert_eq!(e.phase(), Phase::Finished);
            assert_eq!(e.current_index(), len - 1);

            // Further advances are no-ops
            assert_eq!(e.advance(), None);
            assert_eq!(e.advance(), None);
        }
    }

    #[test]
    fn test_retreat_at_zero_is_noop() {
        let mut e = engine(3);
        e.start();
        assert_eq!(e.retreat(), None);
        assert_eq!(e.current_index(), 0);
        assert_eq!(e.phase(), Phase::Playing);
    }

    #[test]
    fn test_retreat_moves_back() {
        let mut e = engine(3);
        e.start();
        e.advance();
        e.advance();
        assert_eq!(e.retreat(), Some(Transition::Moved { from: 2, to: 1 }));
        assert_eq!(e.prefetch_target(), Some(2));
    }

    #[test]
    fn test_pause_resume_cycle() {
        let mut e = engine(2);
        e.start();
        assert_eq!(e.pause(), Some(Transition::Paused));
        assert_eq!(e.pause(), None);
        assert_eq!(e.advance(), None);
        assert_eq!(e.retreat(), None);
        assert_eq!(e.resume(), Some(Transition::Resumed));
        assert_eq!(e.resume(), None);
        assert_eq!(e.current_index(), 0);
    }

    #[test]
    fn test_resume_while_idle_is_noop() {
        let mut e = engine(2);
        assert_eq!(e.resume(), None);
        assert_eq!(e.pause(), None);
        assert_eq!(e.phase(), Phase::Idle);
    }

    #[test]
    fn test_reset_from_finished() {
        let mut e = engine(1);
        e.start();
        e.advance();
        assert_eq!(e.phase(), Phase::Finished);
        assert_eq!(e.reset(), Transition::Reset);
        assert_eq!(e.phase(), Phase::Idle);
        assert_eq!(e.start(), Some(Transition::Started { index: 0 }));
    }
}
