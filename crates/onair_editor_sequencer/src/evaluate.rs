// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time to visual state evaluation.
//!
//! `Evaluator::evaluate` is a pure function of an object's timing window,
//! its motions and the playhead. It never mutates its input, so calling it
//! twice with the same arguments yields equal results.

use crate::motion::{MotionDescriptor, MotionPhase};
use crate::registry::{AnimationDescriptor, MotionRegistry, StyleOverride, TransformOverride};
use crate::timing::TimingWindow;
use serde::{Deserialize, Serialize};

/// Static geometry of an object in virtual canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseGeometry {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
    /// Rotation in degrees
    pub rotation: f64,
    /// Opacity in `[0, 1]`
    pub opacity: f64,
}

impl Default for BaseGeometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 100.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

/// Sprite-sheet playback parameters of a sequence object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteTiming {
    /// Number of frames in the sheet
    pub frame_count: u32,
    /// Frames per second
    pub fps: f64,
    /// Wrap around after the last frame
    pub looping: bool,
    /// Frame shown at the start of the window
    pub first_frame: u32,
}

impl SpriteTiming {
    /// Frame index shown `elapsed` seconds after the window opened
    pub fn frame_at(&self, elapsed: f64) -> u32 {
        if self.frame_count == 0 {
            return 0;
        }
        let last = self.frame_count - 1;
        if self.fps <= 0.0 || elapsed <= 0.0 {
            return self.first_frame.min(last);
        }
        let advanced = (elapsed * self.fps).floor() as u64 + u64::from(self.first_frame);
        if self.looping {
            (advanced % u64::from(self.frame_count)) as u32
        } else {
            advanced.min(u64::from(last)) as u32
        }
    }
}

/// Anything the evaluator can place on the timeline
pub trait Timed {
    /// Window during which the object may be visible
    fn timing(&self) -> &TimingWindow;

    /// Entrance motion
    fn in_motion(&self) -> &MotionDescriptor;

    /// Exit motion
    fn out_motion(&self) -> &MotionDescriptor;

    /// Visibility toggle; `false` hides the object regardless of timing
    fn is_shown(&self) -> bool;

    /// Static geometry
    fn base_geometry(&self) -> BaseGeometry;

    /// Sprite playback, for sequence objects
    fn sprite(&self) -> Option<SpriteTiming> {
        None
    }
}

/// Declarative visual state handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualState {
    /// Whether the object takes part in the rendered scene
    pub visible: bool,
    /// Playhead is inside the entrance window
    pub in_entrance: bool,
    /// Playhead is inside the exit window
    pub in_exit: bool,
    /// Static geometry
    pub geometry: BaseGeometry,
    /// Merged motion style
    pub style: StyleOverride,
    /// Current sprite frame, for sequence objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_frame: Option<u32>,
}

impl VisualState {
    /// Opacity after motion overrides
    pub fn effective_opacity(&self) -> f64 {
        self.style.opacity.unwrap_or(self.geometry.opacity)
    }

    /// Transform after motion overrides
    pub fn effective_transform(&self) -> TransformOverride {
        self.style
            .transform
            .unwrap_or(TransformOverride::Rotate(self.geometry.rotation))
    }

    /// Animation to play, if any
    pub fn animation(&self) -> Option<&AnimationDescriptor> {
        self.style.animation.as_ref()
    }
}

/// Timing & motion evaluator
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    registry: MotionRegistry,
}

impl Evaluator {
    /// Create an evaluator over a motion registry
    pub fn new(registry: MotionRegistry) -> Self {
        Self { registry }
    }

    /// The motion registry in use
    pub fn registry(&self) -> &MotionRegistry {
        &self.registry
    }

    /// Mutable access for registering extra effects
    pub fn registry_mut(&mut self) -> &mut MotionRegistry {
        &mut self.registry
    }

    /// Evaluate `object` at `time`
    pub fn evaluate<T: Timed + ?Sized>(&self, object: &T, time: f64) -> VisualState {
        let timing = object.timing();
        let in_motion = object.in_motion();
        let out_motion = object.out_motion();

        let visible = timing.contains(time) && object.is_shown();
        let in_entrance = timing.in_entrance(time, in_motion.duration);
        let in_exit = timing.in_exit(time, out_motion.duration);

        let mut style = StyleOverride::default();
        if in_entrance {
            style = style.merge(self.registry.style(in_motion, MotionPhase::Entrance));
        }
        if in_exit {
            style = style.merge(self.registry.style(out_motion, MotionPhase::Exit));
        }

        let sprite_frame = object
            .sprite()
            .map(|sprite| sprite.frame_at(time - timing.start_time));

        VisualState {
            visible,
            in_entrance,
            in_exit,
            geometry: object.base_geometry(),
            style,
            sprite_frame,
        }
    }

    /// Evaluate a batch, keeping only visible objects
    pub fn visible_states<'a, T, I>(&self, objects: I, time: f64) -> Vec<(&'a T, VisualState)>
    where
        T: Timed + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        objects
            .into_iter()
            .map(|object| (object, self.evaluate(object, time)))
            .filter(|(_, state)| state.visible)
            .collect()
    }
}

/// Earliest exit-motion start across `objects`.
///
/// Used to park the playhead where exits begin when a scene is opened.
pub fn earliest_exit_start<'a, T, I>(objects: I) -> Option<f64>
where
    T: Timed + 'a,
    I: IntoIterator<Item = &'a T>,
{
    objects
        .into_iter()
        .map(|object| object.timing().end_time - object.out_motion().duration)
        .fold(None, |min, start| match min {
            Some(current) if current <= start => Some(current),
            _ => Some(start),
        })
}
