// SPDX-License-Identifier: MIT OR Apache-2.0
//! Entrance and exit motion descriptors.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Motion type meaning "no effect"
pub const MOTION_NONE: &str = "none";

/// Default CSS-style easing name
pub const DEFAULT_EASING: &str = "ease";

/// Whether a motion plays on the way in or on the way out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionPhase {
    /// Entrance: the style describes the initial (hidden) state
    Entrance,
    /// Exit: the style describes the settled state
    Exit,
}

/// A declarative entrance/exit animation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotionDescriptor {
    /// Motion type name (`fade`, `slideUp`, ... or `none`)
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    /// Animation length in seconds
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Delay before the animation starts, in seconds
    #[serde(default)]
    pub delay: f64,
    /// Timing function name
    #[serde(default = "default_easing")]
    pub easing: String,
    /// Type-specific parameters (`scale`, `angle`, `intensity`, ...)
    #[serde(flatten)]
    pub params: IndexMap<String, Value>,
}

fn default_kind() -> String {
    MOTION_NONE.to_string()
}

fn default_duration() -> f64 {
    1.0
}

fn default_easing() -> String {
    DEFAULT_EASING.to_string()
}

// Written by hand so the map length is known up front; length-prefixed
// formats reject the unsized maps `flatten` produces.
impl Serialize for MotionDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4 + self.params.len()))?;
        map.serialize_entry("type", &self.kind)?;
        map.serialize_entry("duration", &self.duration)?;
        map.serialize_entry("delay", &self.delay)?;
        map.serialize_entry("easing", &self.easing)?;
        for (key, value) in &self.params {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Default for MotionDescriptor {
    fn default() -> Self {
        Self::none()
    }
}

impl MotionDescriptor {
    /// The "no effect" motion attached to newly created objects
    pub fn none() -> Self {
        Self {
            kind: default_kind(),
            duration: default_duration(),
            delay: 0.0,
            easing: default_easing(),
            params: IndexMap::new(),
        }
    }

    /// Create a motion of the given type with explicit timing
    pub fn new(kind: impl Into<String>, duration: f64, delay: f64) -> Self {
        Self {
            kind: kind.into(),
            duration,
            delay,
            easing: default_easing(),
            params: IndexMap::new(),
        }
    }

    /// Settings used when a motion type is first picked in the timeline
    pub fn preset(kind: &str) -> Self {
        let mut motion = Self::new(kind, 0.5, 0.0);
        match kind {
            "scale" => motion.set_param("scale", 1.2),
            "rotate" => motion.set_param("angle", 360),
            "bounce" => motion.set_param("intensity", 0.3),
            "elastic" => motion.set_param("intensity", 0.5),
            _ => {}
        }
        motion
    }

    /// Set the easing name
    pub fn with_easing(mut self, easing: impl Into<String>) -> Self {
        self.easing = easing.into();
        self
    }

    /// Set a type-specific parameter
    pub fn set_param(&mut self, key: &str, value: impl Into<Value>) {
        self.params.insert(key.to_string(), value.into());
    }

    /// Read a numeric parameter
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_f64)
    }

    /// Whether this motion produces no effect
    pub fn is_none(&self) -> bool {
        self.kind == MOTION_NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let scale = MotionDescriptor::preset("scale");
        assert_eq!(scale.duration, 0.5);
        assert_eq!(scale.delay, 0.0);
        assert_eq!(scale.easing, "ease");
        assert_eq!(scale.param_f64("scale"), Some(1.2));

        let rotate = MotionDescriptor::preset("rotate");
        assert_eq!(rotate.param_f64("angle"), Some(360.0));

        let fade = MotionDescriptor::preset("fade");
        assert!(fade.params.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let motion: MotionDescriptor = serde_json::from_str(
            r#"{"type": "elastic", "duration": 2, "delay": 0.5, "easing": "linear", "intensity": 0.5}"#,
        )
        .unwrap();
        assert_eq!(motion.kind, "elastic");
        assert_eq!(motion.duration, 2.0);
        assert_eq!(motion.param_f64("intensity"), Some(0.5));

        let json = serde_json::to_value(&motion).unwrap();
        assert_eq!(json["type"], "elastic");
        assert_eq!(json["intensity"], 0.5);
    }

    #[test]
    fn test_missing_fields_mean_none() {
        let motion: MotionDescriptor = serde_json::from_str("{}").unwrap();
        assert!(motion.is_none());
        assert_eq!(motion.duration, 1.0);
    }
}
