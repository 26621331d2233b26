// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline and motion evaluation for the OnAir scene editor.
//!
//! This crate owns everything that depends on time:
//! - Timing windows and timeline handle mapping
//! - Entrance/exit motion descriptors and presets
//! - The motion style registry
//! - Pure time to visual state evaluation
//! - The playback clock and timer clocks
//!
//! ## Architecture
//!
//! Scenes are not known here. Anything implementing [`Timed`] can be
//! evaluated, which keeps the editing domain and the time domain apart.

pub mod evaluate;
pub mod frame;
pub mod motion;
pub mod playback;
pub mod registry;
pub mod timer;
pub mod timing;

pub use evaluate::{earliest_exit_start, BaseGeometry, Evaluator, SpriteTiming, Timed, VisualState};
pub use frame::FrameSlot;
pub use motion::{MotionDescriptor, MotionPhase, DEFAULT_EASING, MOTION_NONE};
pub use playback::{format_timecode, PlaybackClock, PlaybackState};
pub use registry::{
    AnimationDescriptor, MotionRegistry, MotionStyleFn, StyleOverride, TransformOverride,
};
pub use timer::{format_clock, TimerClock, TimerMode};
pub use timing::{TimingHandle, TimingWindow, DEFAULT_SCENE_DURATION};
