// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion style registry.
//!
//! Maps a motion type name to a pure style function. The evaluator looks
//! motions up here instead of matching on the type, so new effects can be
//! registered without touching evaluation.

use crate::motion::{MotionDescriptor, MotionPhase};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Transform applied on top of an object's static geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum TransformOverride {
    /// Horizontal translation, in percent of the object's width
    TranslateX(f64),
    /// Vertical translation, in percent of the object's height
    TranslateY(f64),
    /// Uniform scale factor
    Scale(f64),
    /// Rotation in degrees
    Rotate(f64),
}

impl TransformOverride {
    /// The identity transform
    pub const IDENTITY: Self = Self::Scale(1.0);

    /// CSS rendering of this transform
    pub fn to_css(&self) -> String {
        match self {
            Self::TranslateX(v) => format!("translateX({v}%)"),
            Self::TranslateY(v) => format!("translateY({v}%)"),
            Self::Scale(v) => format!("scale({v})"),
            Self::Rotate(v) => format!("rotate({v}deg)"),
        }
    }
}

/// Animation to be played by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDescriptor {
    /// Keyframe set name
    pub name: String,
    /// Duration in seconds
    pub duration: f64,
    /// Delay in seconds
    pub delay: f64,
    /// Timing function name
    pub easing: String,
}

/// Style keys a motion may override
///
/// Every field is optional; merging two overrides keeps the later value for
/// each key that the later override sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOverride {
    /// Animation to play
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationDescriptor>,
    /// Opacity override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Transform override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformOverride>,
}

impl StyleOverride {
    /// Whether this override changes nothing
    pub fn is_empty(&self) -> bool {
        self.animation.is_none() && self.opacity.is_none() && self.transform.is_none()
    }

    /// Merge `later` on top of `self`, last write wins per key
    pub fn merge(mut self, later: StyleOverride) -> Self {
        if later.animation.is_some() {
            self.animation = later.animation;
        }
        if later.opacity.is_some() {
            self.opacity = later.opacity;
        }
        if later.transform.is_some() {
            self.transform = later.transform;
        }
        self
    }
}

/// Pure function computing the style of a motion
pub type MotionStyleFn = Arc<dyn Fn(&MotionDescriptor, MotionPhase) -> StyleOverride + Send + Sync>;

/// Registry of motion style functions keyed by motion type
#[derive(Clone)]
pub struct MotionRegistry {
    styles: IndexMap<String, MotionStyleFn>,
}

impl fmt::Debug for MotionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionRegistry")
            .field("kinds", &self.styles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MotionRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            styles: IndexMap::new(),
        }
    }

    /// Create a registry with the built-in effects
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("fade", |m, phase| base_style(m, "fade", phase, None));
        registry.register("slideUp", |m, phase| {
            base_style(m, "slideUp", phase, Some(TransformOverride::TranslateY(100.0)))
        });
        registry.register("slideDown", |m, phase| {
            base_style(m, "slideDown", phase, Some(TransformOverride::TranslateY(-100.0)))
        });
        registry.register("slideLeft", |m, phase| {
            base_style(m, "slideLeft", phase, Some(TransformOverride::TranslateX(100.0)))
        });
        registry.register("slideRight", |m, phase| {
            base_style(m, "slideRight", phase, Some(TransformOverride::TranslateX(-100.0)))
        });
        registry.register("scale", |m, phase| {
            base_style(m, "scale", phase, Some(TransformOverride::Scale(1.2)))
        });
        registry.register("rotate", |m, phase| {
            base_style(m, "rotate", phase, Some(TransformOverride::Rotate(360.0)))
        });
        registry.register("bounce", |m, phase| base_style(m, "bounce", phase, None));
        registry.register("elastic", |m, phase| base_style(m, "elastic", phase, None));
        registry
    }

    /// Register (or replace) the style function for a motion type
    pub fn register<F>(&mut self, kind: impl Into<String>, style: F)
    where
        F: Fn(&MotionDescriptor, MotionPhase) -> StyleOverride + Send + Sync + 'static,
    {
        self.styles.insert(kind.into(), Arc::new(style));
    }

    /// Whether a motion type is known
    pub fn contains(&self, kind: &str) -> bool {
        self.styles.contains_key(kind)
    }

    /// Registered motion type names, in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    /// Style of `motion` in the given phase.
    ///
    /// `none` and unknown types produce an empty override.
    pub fn style(&self, motion: &MotionDescriptor, phase: MotionPhase) -> StyleOverride {
        if motion.is_none() {
            return StyleOverride::default();
        }
        match self.styles.get(&motion.kind) {
            Some(style) => style(motion, phase),
            None => {
                tracing::debug!("Unknown motion type {:?}, no override", motion.kind);
                StyleOverride::default()
            }
        }
    }
}

impl Default for MotionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Shared shape of the built-in effects.
///
/// Entrances start hidden and displaced by `initial`; exits report the
/// settled state they animate away from.
fn base_style(
    motion: &MotionDescriptor,
    name: &str,
    phase: MotionPhase,
    initial: Option<TransformOverride>,
) -> StyleOverride {
    let animation = AnimationDescriptor {
        name: name.to_string(),
        duration: motion.duration,
        delay: motion.delay,
        easing: motion.easing.clone(),
    };
    let (opacity, transform) = match phase {
        MotionPhase::Entrance => (0.0, initial),
        MotionPhase::Exit => (1.0, initial.map(settled)),
    };
    StyleOverride {
        animation: Some(animation),
        opacity: Some(opacity),
        transform,
    }
}

fn settled(initial: TransformOverride) -> TransformOverride {
    match initial {
        TransformOverride::TranslateX(_) => TransformOverride::TranslateX(0.0),
        TransformOverride::TranslateY(_) => TransformOverride::TranslateY(0.0),
        TransformOverride::Scale(_) => TransformOverride::IDENTITY,
        TransformOverride::Rotate(_) => TransformOverride::Rotate(0.0),
    }
}
