// SPDX-License-Identifier: MIT OR Apache-2.0
//! Direct-manipulation tools: move, resize and rotate handles.
//!
//! Pointer positions arrive in rendering-surface coordinates and are mapped
//! into the virtual canvas by dividing by the canvas scale. The tool keeps a
//! transient preview while the pointer moves and produces exactly one
//! [`GeometryPatch`] when the pointer is released.

use crate::config::EditorConfig;
use crate::model::{normalize_rotation, Geometry, GeometryPatch, ObjectId, SceneObject};
use onair_editor_sequencer::FrameSlot;
use serde::{Deserialize, Serialize};

/// One of the eight resize handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    /// Top edge
    N,
    /// Bottom edge
    S,
    /// Right edge
    E,
    /// Left edge
    W,
    /// Top-left corner
    NW,
    /// Top-right corner
    NE,
    /// Bottom-left corner
    SW,
    /// Bottom-right corner
    SE,
}

impl ResizeHandle {
    /// All handles
    pub fn all() -> &'static [ResizeHandle] {
        &[
            Self::N,
            Self::S,
            Self::E,
            Self::W,
            Self::NW,
            Self::NE,
            Self::SW,
            Self::SE,
        ]
    }

    /// Handle name as used by the presentation layer
    pub fn name(&self) -> &'static str {
        match self {
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::NW => "nw",
            Self::NE => "ne",
            Self::SW => "sw",
            Self::SE => "se",
        }
    }

    /// Moves the top edge
    pub fn north(&self) -> bool {
        matches!(self, Self::N | Self::NW | Self::NE)
    }

    /// Moves the bottom edge
    pub fn south(&self) -> bool {
        matches!(self, Self::S | Self::SW | Self::SE)
    }

    /// Moves the right edge
    pub fn east(&self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    /// Moves the left edge
    pub fn west(&self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }
}

/// Axis a constrained drag is locked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisLock {
    /// Not decided yet
    #[default]
    None,
    /// Only X changes
    Horizontal,
    /// Only Y changes
    Vertical,
}

impl AxisLock {
    /// Movement mask `[x, y]` (1.0 = free, 0.0 = locked)
    pub fn mask(&self) -> [f64; 2] {
        match self {
            Self::None => [1.0, 1.0],
            Self::Horizontal => [1.0, 0.0],
            Self::Vertical => [0.0, 1.0],
        }
    }
}

/// Bounding rectangle of the rendering surface in pointer coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl SurfaceRect {
    /// Surface at the origin
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Map a pointer position into virtual canvas space
    pub fn to_virtual(&self, pointer: [f64; 2], scale: f64) -> [f64; 2] {
        [(pointer[0] - self.left) / scale, (pointer[1] - self.top) / scale]
    }
}

/// A pointer position with the constrain modifier (Shift) state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Position in surface coordinates
    pub position: [f64; 2],
    /// Constrain modifier held
    pub constrain: bool,
}

/// Decide the drag axis once the displacement passes `threshold`.
///
/// Below `angle` degrees from the horizontal the drag locks horizontally,
/// otherwise vertically.
pub fn decide_axis_lock(delta: [f64; 2], threshold: f64, angle: f64) -> Option<AxisLock> {
    let [dx, dy] = delta;
    if dx.hypot(dy) <= threshold {
        return None;
    }
    let degrees = dy.abs().atan2(dx.abs()).to_degrees();
    if degrees < angle {
        Some(AxisLock::Horizontal)
    } else {
        Some(AxisLock::Vertical)
    }
}

/// Dragged position from the gesture start
pub fn drag_position(initial: [f64; 2], delta: [f64; 2], lock: AxisLock) -> [f64; 2] {
    let [mx, my] = lock.mask();
    [initial[0] + delta[0] * mx, initial[1] + delta[1] * my]
}

/// Resized geometry for a handle moved by `delta` virtual pixels.
///
/// With `keep_ratio` the initial aspect ratio is kept: horizontal handles
/// drive the height and vertical handles drive the width, with the anchor
/// edge held in place. Width and height never go below `min_size`; the
/// opposite edge stays fixed when clamping. All values are rounded.
pub fn resize_geometry(
    initial: Geometry,
    handle: ResizeHandle,
    delta: [f64; 2],
    keep_ratio: bool,
    min_size: f64,
) -> Geometry {
    let [dx, dy] = delta;
    let mut x = initial.x;
    let mut y = initial.y;
    let mut width = initial.width;
    let mut height = initial.height;

    if handle.east() {
        width = initial.width + dx;
    }
    if handle.west() {
        width = initial.width - dx;
        x = initial.x + dx;
    }
    if handle.south() {
        height = initial.height + dy;
    }
    if handle.north() {
        height = initial.height - dy;
        y = initial.y + dy;
    }

    // A degenerate start geometry has no ratio to keep.
    if keep_ratio && initial.width > 0.0 && initial.height > 0.0 {
        let ratio = initial.width / initial.height;
        if handle.east() || handle.west() {
            height = width / ratio;
            if handle.north() {
                y = initial.y + (initial.height - height);
            }
        } else {
            width = height * ratio;
            if handle.west() {
                x = initial.x + (initial.width - width);
            }
        }
    }

    if width < min_size {
        if handle.west() {
            x += width - min_size;
        }
        width = min_size;
    }
    if height < min_size {
        if handle.north() {
            y += height - min_size;
        }
        height = min_size;
    }

    Geometry {
        x: x.round(),
        y: y.round(),
        width: width.round().max(min_size.ceil()),
        height: height.round().max(min_size.ceil()),
        rotation: initial.rotation,
    }
}

/// Angle of `pointer` around `center`, in degrees
pub fn pointer_angle(center: [f64; 2], pointer: [f64; 2]) -> f64 {
    (pointer[1] - center[1]).atan2(pointer[0] - center[0]).to_degrees()
}

/// Rotation for the current pointer angle, keeping the start offset and
/// snapping to `snap` degrees when given
pub fn rotation_at(angle: f64, start_offset: f64, snap: Option<f64>) -> f64 {
    let mut rotation = angle - start_offset;
    if let Some(step) = snap.filter(|step| *step > 0.0) {
        rotation = (rotation / step).round() * step;
    }
    normalize_rotation(rotation)
}

/// Active gesture
#[derive(Debug, Clone, PartialEq)]
pub enum ToolState {
    /// No gesture
    Idle,
    /// Moving an object
    Dragging {
        /// Target object
        object_id: ObjectId,
        /// Geometry at gesture start
        initial: Geometry,
        /// Pointer at gesture start, virtual space
        start: [f64; 2],
        /// Axis chosen for constrained movement
        lock: AxisLock,
    },
    /// Resizing through a handle
    Resizing {
        /// Target object
        object_id: ObjectId,
        /// Active handle
        handle: ResizeHandle,
        /// Geometry at gesture start
        initial: Geometry,
        /// Pointer at gesture start, virtual space
        start: [f64; 2],
    },
    /// Rotating around the object center
    Rotating {
        /// Target object
        object_id: ObjectId,
        /// Geometry at gesture start
        initial: Geometry,
        /// Object center at gesture start, virtual space
        center: [f64; 2],
        /// Pointer angle minus the initial rotation
        start_offset: f64,
    },
}

/// Final result of a gesture
#[derive(Debug, Clone, PartialEq)]
pub struct GestureCommit {
    /// Target object
    pub object_id: ObjectId,
    /// History description
    pub description: &'static str,
    /// Values to write
    pub patch: GeometryPatch,
}

/// Move/resize/rotate tool
#[derive(Debug)]
pub struct TransformTool {
    state: ToolState,
    surface: Option<SurfaceRect>,
    scale: f64,
    min_size: f64,
    lock_threshold: f64,
    lock_angle: f64,
    rotation_snap: f64,
    pending: FrameSlot<PointerSample>,
    preview: Option<GeometryPatch>,
}

impl TransformTool {
    /// Create an idle tool using the canvas settings of `config`
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: ToolState::Idle,
            surface: None,
            scale: config.canvas_scale,
            min_size: config.min_object_size,
            lock_threshold: config.drag_lock_threshold,
            lock_angle: config.drag_lock_angle,
            rotation_snap: config.rotation_snap,
            pending: FrameSlot::new(),
            preview: None,
        }
    }

    /// Current display scale
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Change the display scale; values outside `(0, 2]` are ignored
    pub fn set_scale(&mut self, scale: f64) -> bool {
        if scale > 0.0 && scale <= 2.0 {
            self.scale = scale;
            true
        } else {
            tracing::debug!("Ignoring canvas scale {}", scale);
            false
        }
    }

    /// Current gesture state
    pub fn state(&self) -> &ToolState {
        &self.state
    }

    /// Whether a gesture is in progress
    pub fn is_active(&self) -> bool {
        self.state != ToolState::Idle
    }

    /// Object being manipulated
    pub fn active_object(&self) -> Option<ObjectId> {
        match &self.state {
            ToolState::Idle => None,
            ToolState::Dragging { object_id, .. }
            | ToolState::Resizing { object_id, .. }
            | ToolState::Rotating { object_id, .. } => Some(*object_id),
        }
    }

    /// Transient geometry of the last processed frame
    pub fn preview(&self) -> Option<&GeometryPatch> {
        self.preview.as_ref()
    }

    /// Pointer moves dropped in favour of a newer one
    pub fn coalesced_moves(&self) -> u64 {
        self.pending.replaced()
    }

    fn start(&mut self, object: &SceneObject, surface: Option<SurfaceRect>, pointer: [f64; 2]) -> Option<[f64; 2]> {
        if object.locked {
            tracing::debug!("Object {:?} is locked, gesture ignored", object.id);
            return None;
        }
        let Some(surface) = surface else {
            tracing::debug!("No rendering surface, gesture ignored");
            return None;
        };
        self.surface = Some(surface);
        self.pending.cancel();
        self.preview = None;
        Some(surface.to_virtual(pointer, self.scale))
    }

    /// Start moving `object`. Returns false when the gesture cannot start.
    pub fn begin_drag(&mut self, object: &SceneObject, surface: Option<SurfaceRect>, pointer: [f64; 2]) -> bool {
        let Some(start) = self.start(object, surface, pointer) else {
            return false;
        };
        self.state = ToolState::Dragging {
            object_id: object.id,
            initial: object.geometry(),
            start,
            lock: AxisLock::None,
        };
        true
    }

    /// Start resizing `object` through `handle`
    pub fn begin_resize(
        &mut self,
        object: &SceneObject,
        handle: ResizeHandle,
        surface: Option<SurfaceRect>,
        pointer: [f64; 2],
    ) -> bool {
        let Some(start) = self.start(object, surface, pointer) else {
            return false;
        };
        self.state = ToolState::Resizing {
            object_id: object.id,
            handle,
            initial: object.geometry(),
            start,
        };
        true
    }

    /// Start rotating `object` around its center
    pub fn begin_rotate(&mut self, object: &SceneObject, surface: Option<SurfaceRect>, pointer: [f64; 2]) -> bool {
        let Some(start) = self.start(object, surface, pointer) else {
            return false;
        };
        let initial = object.geometry();
        let (cx, cy) = initial.center();
        let center = [cx, cy];
        self.state = ToolState::Rotating {
            object_id: object.id,
            initial,
            center,
            start_offset: pointer_angle(center, start) - initial.rotation,
        };
        true
    }

    /// Queue a pointer move; only the latest one per frame is processed
    pub fn pointer_move(&mut self, sample: PointerSample) {
        if self.is_active() {
            self.pending.schedule(sample);
        }
    }

    /// Process the pending pointer move, if any, and return the preview
    pub fn frame(&mut self) -> Option<&GeometryPatch> {
        if let Some(sample) = self.pending.take() {
            self.preview = self.compute(sample, false);
        }
        self.preview.as_ref()
    }

    /// Finish the gesture at `sample` and return the values to commit
    pub fn pointer_up(&mut self, sample: PointerSample) -> Option<GestureCommit> {
        let object_id = self.active_object()?;
        let description = match self.state {
            ToolState::Dragging { .. } => "Move",
            ToolState::Resizing { .. } => "Resize",
            ToolState::Rotating { .. } => "Rotate",
            ToolState::Idle => return None,
        };
        let patch = self.compute(sample, true);
        self.reset();
        patch.map(|patch| GestureCommit {
            object_id,
            description,
            patch,
        })
    }

    /// Abandon the gesture without committing
    pub fn cancel(&mut self) {
        if self.is_active() {
            tracing::debug!("Gesture cancelled");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.state = ToolState::Idle;
        self.surface = None;
        self.pending.cancel();
        self.preview = None;
    }

    fn compute(&mut self, sample: PointerSample, commit: bool) -> Option<GeometryPatch> {
        let pointer = self.surface?.to_virtual(sample.position, self.scale);
        match &mut self.state {
            ToolState::Idle => None,
            ToolState::Dragging {
                initial, start, lock, ..
            } => {
                let delta = [pointer[0] - start[0], pointer[1] - start[1]];
                if sample.constrain && *lock == AxisLock::None {
                    if let Some(decided) = decide_axis_lock(delta, self.lock_threshold, self.lock_angle) {
                        tracing::debug!("Drag locked {:?}", decided);
                        *lock = decided;
                    }
                }
                let active = if sample.constrain { *lock } else { AxisLock::None };
                let [mut x, mut y] = drag_position([initial.x, initial.y], delta, active);
                if commit {
                    x = x.round();
                    y = y.round();
                }
                Some(GeometryPatch::position(x, y))
            }
            ToolState::Resizing {
                handle, initial, start, ..
            } => {
                let delta = [pointer[0] - start[0], pointer[1] - start[1]];
                let geometry = resize_geometry(*initial, *handle, delta, sample.constrain, self.min_size);
                Some(GeometryPatch {
                    x: Some(geometry.x),
                    y: Some(geometry.y),
                    width: Some(geometry.width),
                    height: Some(geometry.height),
                    rotation: None,
                })
            }
            ToolState::Rotating {
                center, start_offset, ..
            } => {
                let snap = sample.constrain.then_some(self.rotation_snap);
                let rotation = rotation_at(pointer_angle(*center, pointer), *start_offset, snap);
                Some(GeometryPatch {
                    rotation: Some(rotation),
                    ..GeometryPatch::default()
                })
            }
        }
    }
}

impl Default for TransformTool {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}
