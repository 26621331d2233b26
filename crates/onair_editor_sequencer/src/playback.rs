// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback clock driving the scene timeline.

use crate::timing::DEFAULT_SCENE_DURATION;
use std::time::Instant;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped (initial state, or reached the end)
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

/// Wall-clock anchored playback clock.
///
/// While playing, the current time is derived from the wall clock rather
/// than accumulated from frame deltas, so dropped frames never skew it.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    current_time: f64,
    duration: f64,
    state: PlaybackState,
    /// Wall-clock instant and timeline time it corresponds to
    anchor: Option<(Instant, f64)>,
}

impl PlaybackClock {
    /// Create a stopped clock at `0` over a timeline of `duration` seconds
    pub fn new(duration: f64) -> Self {
        Self {
            current_time: 0.0,
            duration: duration.max(0.0),
            state: PlaybackState::Stopped,
            anchor: None,
        }
    }

    /// Current timeline position in seconds
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Timeline length in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Start playing from the current position
    pub fn play(&mut self, now: Instant) {
        if self.is_playing() {
            return;
        }
        if self.current_time >= self.duration {
            self.current_time = 0.0;
        }
        self.anchor = Some((now, self.current_time));
        self.state = PlaybackState::Playing;
        tracing::debug!("Playback started at {:.2}s", self.current_time);
    }

    /// Pause playback, keeping the current position
    pub fn pause(&mut self) {
        if self.is_playing() {
            self.state = PlaybackState::Paused;
            self.anchor = None;
            tracing::debug!("Playback paused at {:.2}s", self.current_time);
        }
    }

    /// Toggle play/pause
    pub fn toggle(&mut self, now: Instant) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Advance to wall-clock `now`. Returns the new current time.
    ///
    /// Reaching the end clamps to `duration` and stops.
    pub fn tick(&mut self, now: Instant) -> f64 {
        if let (PlaybackState::Playing, Some((instant, base))) = (self.state, self.anchor) {
            let elapsed = now.saturating_duration_since(instant).as_secs_f64();
            let time = base + elapsed;
            if time >= self.duration {
                self.current_time = self.duration;
                self.state = PlaybackState::Stopped;
                self.anchor = None;
                tracing::debug!("Playback reached the end");
            } else {
                self.current_time = time;
            }
        }
        self.current_time
    }

    /// Scrub to `time`, clamped to `[0, duration]`.
    ///
    /// While playing the clock is re-anchored so playback continues from the
    /// new position.
    pub fn set_current_time(&mut self, time: f64, now: Instant) {
        self.current_time = time.clamp(0.0, self.duration);
        if self.is_playing() {
            self.anchor = Some((now, self.current_time));
        }
    }

    /// Scrub while not playing; use [`Self::set_current_time`] while playing
    pub fn seek(&mut self, time: f64) {
        self.current_time = time.clamp(0.0, self.duration);
    }

    /// Jump to `0` and pause
    pub fn go_to_start(&mut self) {
        self.current_time = 0.0;
        self.force_pause();
    }

    /// Jump to the end and pause
    pub fn go_to_end(&mut self) {
        self.current_time = self.duration;
        self.force_pause();
    }

    fn force_pause(&mut self) {
        self.state = PlaybackState::Paused;
        self.anchor = None;
    }

    /// Change the timeline length, clamping the current position
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        self.current_time = self.current_time.min(self.duration);
    }

    /// Seek to `time` when not playing. Used when a scene is opened.
    pub fn auto_seek(&mut self, time: Option<f64>) {
        if let (false, Some(time)) = (self.is_playing(), time) {
            self.seek(time);
        }
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(DEFAULT_SCENE_DURATION)
    }
}

/// Format a timeline position as `MM:SS.cc`
pub fn format_timecode(seconds: f64) -> String {
    let centis = (seconds.max(0.0) * 100.0).floor() as u64;
    let minutes = centis / 6000;
    let secs = (centis / 100) % 60;
    let hundredths = centis % 100;
    format!("{minutes:02}:{secs:02}.{hundredths:02}")
}
