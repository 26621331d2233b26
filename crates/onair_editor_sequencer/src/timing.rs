// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timing windows for scene objects.

use serde::{Deserialize, Serialize};

/// Default scene duration in seconds
pub const DEFAULT_SCENE_DURATION: f64 = 10.0;

/// Interval during which an object is eligible to be visible.
///
/// All values are in seconds. `duration` is the length of the scene the
/// object lives in and is only used to map timeline handles to time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingWindow {
    /// Start of the window
    #[serde(default)]
    pub start_time: f64,
    /// End of the window
    #[serde(default = "default_end")]
    pub end_time: f64,
    /// Scene duration context
    #[serde(default = "default_end")]
    pub duration: f64,
}

fn default_end() -> f64 {
    DEFAULT_SCENE_DURATION
}

impl Default for TimingWindow {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: DEFAULT_SCENE_DURATION,
            duration: DEFAULT_SCENE_DURATION,
        }
    }
}

/// Which end of the timing bar is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingHandle {
    /// Start (entrance) handle
    Start,
    /// End (exit) handle
    End,
}

impl TimingWindow {
    /// Create a window spanning `[start, end]` inside a scene of `duration`
    pub fn new(start_time: f64, end_time: f64, duration: f64) -> Self {
        Self {
            start_time,
            end_time,
            duration,
        }
    }

    /// Whether `time` lies inside the window (both ends inclusive)
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    /// Whether `time` lies inside the entrance window of a motion lasting `motion_duration`
    pub fn in_entrance(&self, time: f64, motion_duration: f64) -> bool {
        time >= self.start_time && time <= self.start_time + motion_duration
    }

    /// Whether `time` lies inside the exit window of a motion lasting `motion_duration`
    pub fn in_exit(&self, time: f64, motion_duration: f64) -> bool {
        time >= self.end_time - motion_duration && time <= self.end_time
    }

    /// Length of the window
    pub fn span(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether the window satisfies `start <= end`
    pub fn is_valid(&self) -> bool {
        self.start_time <= self.end_time
    }

    /// Map a pointer fraction along the timeline bar to a time value.
    ///
    /// The fraction is clamped to `[0, 1]` and the result rounded to
    /// hundredths of a second.
    pub fn time_at_fraction(&self, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        (fraction * self.duration * 100.0).round() / 100.0
    }

    /// Move one of the handles to the time under `fraction`.
    ///
    /// Returns `None` when the move would make the handles meet or cross.
    pub fn drag_handle(&self, handle: TimingHandle, fraction: f64) -> Option<Self> {
        let time = self.time_at_fraction(fraction);
        match handle {
            TimingHandle::Start if time < self.end_time => Some(Self {
                start_time: time,
                ..*self
            }),
            TimingHandle::End if time > self.start_time => Some(Self {
                end_time: time,
                ..*self
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let window = TimingWindow::new(1.0, 4.0, 10.0);
        assert!(window.contains(1.0));
        assert!(window.contains(4.0));
        assert!(!window.contains(0.99));
        assert!(!window.contains(4.01));
    }

    #[test]
    fn test_motion_windows() {
        let window = TimingWindow::new(2.0, 8.0, 10.0);
        assert!(window.in_entrance(2.5, 1.0));
        assert!(!window.in_entrance(3.5, 1.0));
        assert!(window.in_exit(7.5, 1.0));
        assert!(!window.in_exit(6.5, 1.0));
    }

    #[test]
    fn test_handle_drag_rounds_and_clamps() {
        let window = TimingWindow::new(0.0, 10.0, 10.0);
        assert_eq!(window.time_at_fraction(0.123_456), 1.23);
        assert_eq!(window.time_at_fraction(-1.0), 0.0);
        assert_eq!(window.time_at_fraction(2.0), 10.0);

        let moved = window.drag_handle(TimingHandle::Start, 0.25).unwrap();
        assert_eq!(moved.start_time, 2.5);
        assert_eq!(moved.end_time, 10.0);
    }

    #[test]
    fn test_handles_cannot_cross() {
        let window = TimingWindow::new(3.0, 5.0, 10.0);
        assert!(window.drag_handle(TimingHandle::Start, 0.5).is_none());
        assert!(window.drag_handle(TimingHandle::End, 0.3).is_none());
        assert!(window.drag_handle(TimingHandle::End, 0.2).is_none());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let window: TimingWindow = serde_json::from_str(r#"{"startTime": 2}"#).unwrap();
        assert_eq!(window.start_time, 2.0);
        assert_eq!(window.end_time, DEFAULT_SCENE_DURATION);
        assert!(window.is_valid());
    }
}
