// SPDX-License-Identifier: MIT OR Apache-2.0
//! Live clock for timer objects.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Direction a timer counts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Counts from the configured duration down to zero
    #[default]
    Countdown,
    /// Counts up from zero
    Countup,
}

/// Start/pause/reset clock with accumulated elapsed time
#[derive(Debug, Clone)]
pub struct TimerClock {
    /// Configured length in seconds
    pub duration: f64,
    /// Counting direction
    pub mode: TimerMode,
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl TimerClock {
    /// Create a stopped timer
    pub fn new(duration: f64, mode: TimerMode) -> Self {
        Self {
            duration: duration.max(0.0),
            mode,
            accumulated: Duration::ZERO,
            started_at: None,
        }
    }

    /// Whether the timer is running
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start, or resume keeping the elapsed time
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Pause, folding the running span into the elapsed total
    pub fn pause(&mut self, now: Instant) {
        if let Some(started) = self.started_at.take() {
            self.accumulated += now.saturating_duration_since(started);
        }
    }

    /// Stop and zero the elapsed time
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = None;
    }

    /// Seconds elapsed at `now`
    pub fn elapsed(&self, now: Instant) -> f64 {
        let running = self
            .started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default();
        (self.accumulated + running).as_secs_f64()
    }

    /// Seconds to display at `now`
    pub fn display_seconds(&self, now: Instant) -> f64 {
        let elapsed = self.elapsed(now);
        match self.mode {
            TimerMode::Countdown => (self.duration - elapsed).max(0.0),
            TimerMode::Countup => elapsed,
        }
    }

    /// Whether a countdown has run out
    pub fn is_finished(&self, now: Instant) -> bool {
        self.mode == TimerMode::Countdown && self.elapsed(now) >= self.duration
    }
}

/// Format whole seconds as `MM:SS`
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_accumulates_across_pauses() {
        let t0 = Instant::now();
        let mut timer = TimerClock::new(300.0, TimerMode::Countdown);
        timer.start(t0);
        timer.pause(t0 + Duration::from_secs(10));
        timer.start(t0 + Duration::from_secs(20));
        let now = t0 + Duration::from_secs(25);
        assert_eq!(timer.elapsed(now), 15.0);
        assert_eq!(timer.display_seconds(now), 285.0);
        assert_eq!(format_clock(timer.display_seconds(now)), "04:45");
    }

    #[test]
    fn test_countdown_clamps_at_zero() {
        let t0 = Instant::now();
        let mut timer = TimerClock::new(5.0, TimerMode::Countdown);
        timer.start(t0);
        let later = t0 + Duration::from_secs(9);
        assert_eq!(timer.display_seconds(later), 0.0);
        assert!(timer.is_finished(later));
    }

    #[test]
    fn test_countup_and_reset() {
        let t0 = Instant::now();
        let mut timer = TimerClock::new(60.0, TimerMode::Countup);
        timer.start(t0);
        assert_eq!(timer.display_seconds(t0 + Duration::from_secs(61)), 61.0);
        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed(t0 + Duration::from_secs(100)), 0.0);
    }

    #[test]
    fn test_mode_serde() {
        let mode: TimerMode = serde_json::from_str("\"countup\"").unwrap();
        assert_eq!(mode, TimerMode::Countup);
        assert_eq!(format_clock(3599.9), "59:59");
    }
}
