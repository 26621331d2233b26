// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene and object data model.
//!
//! Objects keep their visual attributes in a free-form `properties` map so
//! that type-specific fields survive untouched; geometry is read from and
//! written back to that map through [`Geometry`] and [`GeometryPatch`].

use indexmap::IndexMap;
use onair_editor_sequencer::{
    BaseGeometry, MotionDescriptor, SpriteTiming, Timed, TimingWindow, DEFAULT_SCENE_DURATION,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Free-form visual attributes of an object
pub type Properties = IndexMap<String, Value>;

/// Session identity of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Create a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Session identity of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(pub Uuid);

impl SceneId {
    /// Create a new random scene ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

/// Object variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Text label
    #[default]
    Text,
    /// Bitmap image
    Image,
    /// Vector shape
    Shape,
    /// Countdown/count-up clock
    Timer,
    /// Sprite-sheet sequence
    Sequence,
}

impl ObjectKind {
    /// All object kinds
    pub fn all() -> &'static [ObjectKind] {
        &[
            Self::Text,
            Self::Image,
            Self::Shape,
            Self::Timer,
            Self::Sequence,
        ]
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Shape => "Shape",
            Self::Timer => "Timer",
            Self::Sequence => "Sequence",
        }
    }

    /// Properties given to a freshly added object of this kind
    pub fn default_properties(&self) -> Properties {
        match self {
            Self::Text => text_defaults(),
            Self::Timer => {
                let mut props = text_defaults();
                props.extend(props_from([
                    ("duration", Value::from(300)),
                    ("mode", Value::from("countdown")),
                    ("timeFormat", Value::from("MM:SS")),
                    ("isRunning", Value::from(false)),
                ]));
                props
            }
            Self::Image => props_from([
                ("src", Value::from("https://via.placeholder.com/150")),
                ("x", Value::from(50)),
                ("y", Value::from(50)),
                ("width", Value::from(150)),
                ("height", Value::from(150)),
            ]),
            Self::Shape => props_from([
                ("shapeType", Value::from("box")),
                ("color", Value::from("#FF0000")),
                ("x", Value::from(75)),
                ("y", Value::from(75)),
                ("width", Value::from(100)),
                ("height", Value::from(100)),
            ]),
            Self::Sequence => props_from([
                ("spriteUrl", Value::from("")),
                ("frameCount", Value::from(1)),
                ("fps", Value::from(24)),
                ("loop", Value::from(false)),
                ("currentFrame", Value::from(0)),
                ("x", Value::from(50)),
                ("y", Value::from(50)),
                ("width", Value::from(320)),
                ("height", Value::from(180)),
            ]),
        }
    }
}

fn text_defaults() -> Properties {
    props_from([
        ("content", Value::from("New Text")),
        ("fontSize", Value::from(48)),
        ("color", Value::from("#FFFFFF")),
        ("fontFamily", Value::from("Arial")),
        ("fontWeight", Value::from("bold")),
        ("textAlign", Value::from("center")),
        ("x", Value::from(50)),
        ("y", Value::from(100)),
        ("width", Value::from(200)),
        ("height", Value::from(60)),
    ])
}

/// Build a property map from literal entries
pub fn props_from<const N: usize>(entries: [(&str, Value); N]) -> Properties {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn default_true() -> bool {
    true
}

/// A positioned visual element of a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Session identity
    #[serde(default)]
    pub id: ObjectId,
    /// Identity assigned by the persistence backend, once confirmed
    #[serde(default)]
    pub remote_id: Option<i64>,
    /// Display name
    pub name: String,
    /// Variant
    #[serde(rename = "type", default)]
    pub kind: ObjectKind,
    /// Dense z-order rank within the scene
    #[serde(default)]
    pub order: usize,
    /// Locked objects cannot be selected or transformed
    #[serde(default)]
    pub locked: bool,
    /// Hidden objects are never rendered
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Visual attributes
    #[serde(default)]
    pub properties: Properties,
    /// Visibility window
    #[serde(default)]
    pub timing: TimingWindow,
    /// Entrance motion
    #[serde(default)]
    pub in_motion: MotionDescriptor,
    /// Exit motion
    #[serde(default)]
    pub out_motion: MotionDescriptor,
}

impl SceneObject {
    /// Create an object of `kind` with its default properties, timing and motions
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::new(),
            remote_id: None,
            name: format!("New {}", kind.display_name()),
            kind,
            order: 0,
            locked: false,
            visible: true,
            properties: kind.default_properties(),
            timing: TimingWindow::default(),
            in_motion: MotionDescriptor::none(),
            out_motion: MotionDescriptor::none(),
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the timing window
    pub fn with_timing(mut self, timing: TimingWindow) -> Self {
        self.timing = timing;
        self
    }

    /// Overwrite the geometry properties
    pub fn with_geometry(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        GeometryPatch {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            rotation: None,
        }
        .apply(&mut self.properties);
        self
    }

    /// Read a numeric property
    pub fn number(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    /// Read a boolean property
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.properties.get(key).and_then(Value::as_bool)
    }

    /// Current geometry, with defaults for missing properties
    pub fn geometry(&self) -> Geometry {
        Geometry::read(&self.properties)
    }

    /// Deep copy for paste/duplicate: fresh identity, no backend id,
    /// offset position
    pub fn clone_for_paste(&self, offset: f64) -> Self {
        let mut copy = self.clone();
        copy.id = ObjectId::new();
        copy.remote_id = None;
        let geometry = self.geometry();
        GeometryPatch::position(geometry.x + offset, geometry.y + offset).apply(&mut copy.properties);
        copy
    }
}

impl Timed for SceneObject {
    fn timing(&self) -> &TimingWindow {
        &self.timing
    }

    fn in_motion(&self) -> &MotionDescriptor {
        &self.in_motion
    }

    fn out_motion(&self) -> &MotionDescriptor {
        &self.out_motion
    }

    fn is_shown(&self) -> bool {
        self.visible
    }

    fn base_geometry(&self) -> BaseGeometry {
        let geometry = Geometry::read(&self.properties);
        BaseGeometry {
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
            rotation: geometry.rotation,
            opacity: self.number("opacity").unwrap_or(1.0),
        }
    }

    fn sprite(&self) -> Option<SpriteTiming> {
        if self.kind != ObjectKind::Sequence {
            return None;
        }
        let whole = |key: &str, default: u32| {
            self.number(key)
                .filter(|value| *value >= 0.0)
                .map_or(default, |value| value as u32)
        };
        Some(SpriteTiming {
            frame_count: whole("frameCount", 1),
            fps: self.number("fps").unwrap_or(24.0),
            looping: self.flag("loop").unwrap_or(false),
            first_frame: whole("currentFrame", 0),
        })
    }
}

/// Object geometry in virtual canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
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
}

impl Geometry {
    /// Read geometry from properties, defaulting missing keys
    pub fn read(properties: &Properties) -> Self {
        let get = |key: &str, default: f64| {
            properties
                .get(key)
                .and_then(Value::as_f64)
                .unwrap_or(default)
        };
        Self {
            x: get("x", 0.0),
            y: get("y", 0.0),
            width: get("width", 200.0),
            height: get("height", 100.0),
            rotation: get("rotation", 0.0),
        }
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Partial geometry update
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryPatch {
    /// New left edge
    pub x: Option<f64>,
    /// New top edge
    pub y: Option<f64>,
    /// New width
    pub width: Option<f64>,
    /// New height
    pub height: Option<f64>,
    /// New rotation
    pub rotation: Option<f64>,
}

impl GeometryPatch {
    /// Patch that moves to `(x, y)`
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.rotation.is_none()
    }

    /// Write the set fields into `properties`
    pub fn apply(&self, properties: &mut Properties) {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("rotation", self.rotation),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                properties.insert(key.to_string(), number_value(value));
            }
        }
    }

    /// Geometry keys of `properties` as a patch
    pub fn from_properties(properties: &Properties) -> Result<Self, GeometryError> {
        let read = |field: &'static str| match properties.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or(GeometryError::NotANumber { field }),
        };
        Ok(Self {
            x: read("x")?,
            y: read("y")?,
            width: read("width")?,
            height: read("height")?,
            rotation: read("rotation")?,
        })
    }

    /// Reject non-finite fields, raise width and height to `min_size` and
    /// normalize rotation
    pub fn validated(self, min_size: f64) -> Result<Self, GeometryError> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("rotation", self.rotation),
        ];
        for (field, value) in fields {
            if let Some(value) = value.filter(|value| !value.is_finite()) {
                return Err(GeometryError::NonFinite { field, value });
            }
        }
        Ok(Self {
            width: self.width.map(|width| width.max(min_size)),
            height: self.height.map(|height| height.max(min_size)),
            rotation: self.rotation.map(normalize_rotation),
            ..self
        })
    }

    /// Apply to a geometry value
    pub fn applied_to(&self, geometry: Geometry) -> Geometry {
        Geometry {
            x: self.x.unwrap_or(geometry.x),
            y: self.y.unwrap_or(geometry.y),
            width: self.width.unwrap_or(geometry.width),
            height: self.height.unwrap_or(geometry.height),
            rotation: self.rotation.unwrap_or(geometry.rotation),
        }
    }
}

/// Property keys that hold geometry
pub const GEOMETRY_KEYS: [&str; 5] = ["x", "y", "width", "height", "rotation"];

/// Invalid geometry values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// NaN or infinite value
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Geometry key holding something other than a number
    #[error("{field} must be a number")]
    NotANumber { field: &'static str },
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalize into `[0, 360)` rounded to 2 decimals
pub fn normalize_rotation(degrees: f64) -> f64 {
    let wrapped = round2(((degrees % 360.0) + 360.0) % 360.0);
    if wrapped >= 360.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// JSON number for `value`, integral when it has no fractional part.
///
/// Non-finite values have no JSON form and become null; patches are
/// checked with [`GeometryPatch::validated`] before they get here.
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// A timed, layered composition of objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Session identity
    #[serde(default)]
    pub id: SceneId,
    /// Identity assigned by the persistence backend, once confirmed
    #[serde(default)]
    pub remote_id: Option<i64>,
    /// Display name
    pub name: String,
    /// Position in the scene list
    #[serde(default)]
    pub order: usize,
    /// Objects from back (index 0) to front
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SceneId::new(),
            remote_id: None,
            name: name.into(),
            order: 0,
            objects: Vec::new(),
        }
    }

    /// Find an object
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    /// Find an object mutably
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    /// Array position of an object
    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id == id)
    }

    /// Timeline length: the longest scene duration any object was timed against
    pub fn duration(&self) -> f64 {
        self.objects
            .iter()
            .map(|object| object.timing.duration)
            .filter(|duration| *duration > 0.0)
            .fold(None, |longest: Option<f64>, d| Some(longest.map_or(d, |l| l.max(d))))
            .unwrap_or(DEFAULT_SCENE_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_validation() {
        let patch = GeometryPatch {
            width: Some(2.0),
            height: Some(40.0),
            rotation: Some(-90.0),
            ..GeometryPatch::default()
        };
        let validated = patch.validated(10.0).unwrap();
        assert_eq!(validated.width, Some(10.0));
        assert_eq!(validated.height, Some(40.0));
        assert_eq!(validated.rotation, Some(270.0));
        assert_eq!(validated.x, None);

        let infinite = GeometryPatch {
            height: Some(f64::INFINITY),
            ..GeometryPatch::default()
        };
        assert!(matches!(
            infinite.validated(10.0),
            Err(GeometryError::NonFinite { field: "height", .. })
        ));
    }

    #[test]
    fn test_patch_from_properties() {
        let mut properties = Properties::new();
        properties.insert("x".to_string(), Value::from(12));
        properties.insert("fill".to_string(), Value::from("#fff"));
        let patch = GeometryPatch::from_properties(&properties).unwrap();
        assert_eq!(patch, GeometryPatch {
            x: Some(12.0),
            ..GeometryPatch::default()
        });

        properties.insert("width".to_string(), Value::from("wide"));
        assert_eq!(
            GeometryPatch::from_properties(&properties),
            Err(GeometryError::NotANumber { field: "width" })
        );
    }

    #[test]
    fn test_default_objects() {
        let text = SceneObject::new(ObjectKind::Text);
        assert_eq!(text.name, "New Text");
        assert_eq!(text.geometry(), Geometry {
            x: 50.0,
            y: 100.0,
            width: 200.0,
            height: 60.0,
            rotation: 0.0,
        });
        assert!(text.in_motion.is_none());
        assert_eq!(text.timing, TimingWindow::new(0.0, 10.0, 10.0));

        let timer = SceneObject::new(ObjectKind::Timer);
        assert_eq!(timer.number("duration"), Some(300.0));
        assert_eq!(timer.properties["content"], "New Text");

        let shape = SceneObject::new(ObjectKind::Shape);
        assert_eq!(shape.geometry().x, 75.0);
        assert_eq!(shape.properties["color"], "#FF0000");
    }

    #[test]
    fn test_geometry_defaults_for_missing_keys() {
        let geometry = Geometry::read(&Properties::new());
        assert_eq!(geometry.width, 200.0);
        assert_eq!(geometry.height, 100.0);
        assert_eq!(geometry.rotation, 0.0);
    }

    #[test]
    fn test_patch_keeps_integers_integral() {
        let mut props = Properties::new();
        GeometryPatch {
            x: Some(12.0),
            rotation: Some(45.5),
            ..Default::default()
        }
        .apply(&mut props);
        assert!(props["x"].is_i64());
        assert_eq!(props["rotation"], 45.5);
    }

    #[test]
    fn test_clone_for_paste() {
        let mut original = SceneObject::new(ObjectKind::Image);
        original.remote_id = Some(7);
        let copy = original.clone_for_paste(10.0);
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.remote_id, None);
        assert_eq!(copy.geometry().x, 60.0);
        assert_eq!(copy.geometry().y, 60.0);
        assert_eq!(copy.properties["src"], original.properties["src"]);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "name": "Lower third",
            "type": "shape",
            "properties": {"x": 10, "y": 20, "width": 300, "height": 80},
            "timing": {"startTime": 1, "endTime": 6, "duration": 12},
            "in_motion": {"type": "fade", "duration": 0.5}
        }"#;
        let object: SceneObject = serde_json::from_str(json).unwrap();
        assert_eq!(object.kind, ObjectKind::Shape);
        assert!(object.visible);
        assert!(!object.locked);
        assert_eq!(object.in_motion.kind, "fade");
        assert!(object.out_motion.is_none());
        assert_eq!(object.geometry().width, 300.0);
    }

    #[test]
    fn test_sprite_timing_from_properties() {
        let mut object = SceneObject::new(ObjectKind::Sequence);
        object.properties.insert("frameCount".into(), Value::from(12));
        object.properties.insert("loop".into(), Value::from(true));
        let sprite = object.sprite().unwrap();
        assert_eq!(sprite.frame_count, 12);
        assert_eq!(sprite.fps, 24.0);
        assert!(sprite.looping);
        assert!(SceneObject::new(ObjectKind::Text).sprite().is_none());
    }

    #[test]
    fn test_scene_duration() {
        let mut scene = Scene::new("Intro");
        assert_eq!(scene.duration(), DEFAULT_SCENE_DURATION);
        scene.objects.push(
            SceneObject::new(ObjectKind::Text).with_timing(TimingWindow::new(0.0, 4.0, 30.0)),
        );
        assert_eq!(scene.duration(), 30.0);
    }
}
