//! # Progress Track
//!
//! One timed progress counter per slide. Only the active counter ever runs;
//! counters before it read 100%, counters after it read 0%.
//!
//! ```text
//!   [██████][██████][███░░░][░░░░░░][░░░░░░]
//!     done    done   active   todo    todo
//! ```
//!
//! The track owns no clock. The driver calls `tick(elapsed)` from its timer,
//! which keeps it deterministic under test.

use log::debug;
use std::time::Duration;

/// Timer phase of the active counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackPhase {
    Idle,
    Running,
    Paused,
}

/// Fired once when the active counter reaches 100% on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressComplete {
    pub index: usize,
    pub is_last: bool,
}

#[derive(Debug)]
pub struct ProgressTrack {
    fractions: Vec<f64>,
    active: Option<usize>,
    elapsed: Duration,
    duration: Duration,
    default_duration: Duration,
    phase: TrackPhase,
}

impl ProgressTrack {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            fractions: Vec::new(),
            active: None,
            elapsed: Duration::ZERO,
            duration: default_duration,
            default_duration,
            phase: TrackPhase::Idle,
        }
    }

    /// Resets to `count` counters, all at 0%, timer idle.
    pub fn configure(&mut self, count: usize) {
        self.fractions = vec![0.0; count];
        self.active = None;
        self.elapsed = Duration::ZERO;
        self.phase = TrackPhase::Idle;
    }

    /// Makes `index` the active counter. Earlier counters are forced to 100%
    /// without firing completion; later ones drop back to 0%.
    pub fn set_active(&mut self, index: usize, start_immediately: bool) {
        if index >= self.fractions.len() {
            debug!(
                "Ignoring set_active({}) on a track of {} counters",
                index,
                self.fractions.len()
            );
            return;
        }
        for (i, fraction) in self.fractions.iter_mut().enumerate() {
            *fraction = if i < index { 1.0 } else { 0.0 };
        }
        self.active = Some(index);
        self.elapsed = Duration::ZERO;
        self.phase = TrackPhase::Idle;

        if start_immediately {
            self.start(self.default_duration);
        }
    }

    /// Starts the active counter from 0% with the given duration.
    pub fn start(&mut self, duration: Duration) {
        let Some(index) = self.active else {
            debug!("start() with no active counter");
            return;
        };
        self.fractions[index] = 0.0;
        self.elapsed = Duration::ZERO;
        self.duration = duration;
        self.phase = TrackPhase::Running;
    }

    /// Freezes the active counter. No-op unless running.
    pub fn pause(&mut self) {
        if self.phase == TrackPhase::Running {
            self.phase = TrackPhase::Paused;
        }
    }

    /// Continues from the fraction preserved by `pause()`. No-op unless paused.
    pub fn resume(&mut self) {
        if self.phase == TrackPhase::Paused {
            self.phase = TrackPhase::Running;
        }
    }

    /// Stops the timer without touching the counters.
    pub fn stop(&mut self) {
        self.phase = TrackPhase::Idle;
    }

    /// Clears every counter to 0% and stops the timer.
    pub fn reset(&mut self) {
        self.fractions.iter_mut().for_each(|f| *f = 0.0);
        self.active = None;
        self.elapsed = Duration::ZERO;
        self.phase = TrackPhase::Idle;
    }

    /// Advances the running counter by `elapsed`.
    pub fn tick(&mut self, elapsed: Duration) -> Option<ProgressComplete> {
        if self.phase != TrackPhase::Running {
            return None;
        }
        let index = self.active?;

        self.elapsed = (self.elapsed + elapsed).min(self.duration);
        let fraction = if self.duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };
        self.fractions[index] = fraction.min(1.0);

        if self.elapsed < self.duration {
            return None;
        }

        self.phase = TrackPhase::Idle;
        let is_last = index + 1 == self.fractions.len();
        debug!("Progress {} complete (last={})", index, is_last);
        Some(ProgressComplete { index, is_last })
    }

    pub fn phase(&self) -> TrackPhase {
        self.phase
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    /// Fraction in `0.0..=1.0` for the counter at `index`.
    pub fn fraction(&self, index: usize) -> Option<f64> {
        self.fractions.get(index).copied()
    }

    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn track(count: usize) -> ProgressTrack {
        let mut track = ProgressTrack::new(secs(5.0));
        track.configure(count);
        track
    }

    #[test]
    fn test_configure_resets_counters() {
        let mut t = track(3);
        t.set_active(1, true);
        t.tick(secs(1.0));
        t.configure(4);
        assert_eq!(t.fractions(), &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(t.phase(), TrackPhase::Idle);
        assert_eq!(t.active(), None);
    }

    #[test]
    fn test_set_active_fills_earlier_counters() {
        let mut t = track(4);
        t.set_active(2, false);
        assert_eq!(t.fractions(), &[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(t.phase(), TrackPhase::Idle);

        t.set_active(0, true);
        assert_eq!(t.fractions(), &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(t.phase(), TrackPhase::Running);
    }

    #[test]
    fn test_set_active_out_of_range_ignored() {
        let mut t = track(2);
        t.set_active(5, true);
        assert_eq!(t.active(), None);
        assert_eq!(t.phase(), TrackPhase::Idle);
    }

    #[test]
    fn test_tick_completes_once() {
        let mut t = track(2);
        t.set_active(0, false);
        t.start(secs(2.0));

        assert_eq!(t.tick(secs(1.0)), None);
        assert_eq!(t.fraction(0), Some(0.5));

        let done = t.tick(secs(1.5));
        assert_eq!(done, Some(ProgressComplete { index: 0, is_last: false }));
        assert_eq!(t.fraction(0), Some(1.0));

        // Stopped after completing, so further ticks fire nothing
        assert_eq!(t.tick(secs(5.0)), None);
    }

    #[test]
    fn test_last_counter_reports_is_last() {
        let mut t = track(2);
        t.set_active(1, true);
        let done = t.tick(secs(5.0));
        assert_eq!(done, Some(ProgressComplete { index: 1, is_last: true }));
    }

    #[test]
    fn test_pause_resume_preserves_fraction() {
        let mut t = track(1);
        t.set_active(0, false);
        t.start(secs(5.0));
        t.tick(secs(2.0));
        t.pause();

        // Time passing while paused changes nothing
        assert_eq!(t.tick(secs(10.0)), None);
        assert!((t.fraction(0).unwrap() - 0.4).abs() < 1e-9);

        t.resume();
        assert_eq!(t.tick(secs(2.0)), None);
        assert!((t.fraction(0).unwrap() - 0.8).abs() < 1e-9);
        assert!(t.tick(secs(1.0)).is_some());
    }

    #[test]
    fn test_pause_and_resume_are_idempotent() {
        let mut t = track(1);
        t.set_active(0, true);
        t.tick(secs(1.0));

        t.pause();
        t.pause();
        assert_eq!(t.phase(), TrackPhase::Paused);

        t.resume();
        t.resume();
        assert_eq!(t.phase(), TrackPhase::Running);
        assert!((t.fraction(0).unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_resume_without_pause_is_noop() {
        let mut t = track(1);
        t.set_active(0, false);
        t.resume();
        assert_eq!(t.phase(), TrackPhase::Idle);
    }

    #[test]
    fn test_reset_stops_timer() {
        let mut t = track(3);
        t.set_active(2, true);
        t.tick(secs(1.0));
        t.reset();
        assert_eq!(t.fractions(), &[0.0, 0.0, 0.0]);
        assert_eq!(t.phase(), TrackPhase::Idle);
        assert_eq!(t.tick(secs(10.0)), None);
    }

    #[test]
    fn test_skipped_counters_never_complete() {
        let mut t = track(3);
        t.set_active(0, true);
        t.tick(secs(1.0));
        // Jump past counter 1 entirely
        t.set_active(2, true);
        let done = t.tick(secs(5.0));
        assert_eq!(done, Some(ProgressComplete { index: 2, is_last: true }));
    }
}
