// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session.
//!
//! `EditorSession` is the entry point a presentation layer talks to. It
//! routes pointer and keyboard input to the transform tool and the store,
//! drives the playback clock, and produces the per-frame visual states.
//! Starting any object gesture pauses playback so the playhead and the
//! geometry never change in the same frame.

use crate::align::{self, Alignment, NudgeDirection, Placement};
use crate::commands::{
    CommandError, DeleteObjectsCommand, DuplicateCommand, EditorCommand, GeometryCommand, PasteCommand,
    SetMotionCommand, SetTimingCommand,
};
use crate::config::{ConfigError, EditorConfig};
use crate::model::{GeometryPatch, ObjectId, ObjectKind, Scene, SceneId, SceneObject};
use crate::persistence::{PersistenceDispatcher, PersistenceError, SceneBackend};
use crate::state::{EditorState, Reconciliation};
use crate::tools::{PointerSample, ResizeHandle, SurfaceRect, TransformTool};
use onair_editor_sequencer::{
    earliest_exit_start, format_clock, format_timecode, Evaluator, MotionDescriptor, MotionPhase, PlaybackClock,
    TimerClock, TimerMode, TimingHandle, VisualState,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// A command was rejected
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Requests could not be handed to the backend
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Scene file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Keyboard modifier state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Control (Command on macOS)
    pub ctrl: bool,
    /// Shift
    pub shift: bool,
    /// Alt (Option on macOS)
    pub alt: bool,
}

/// Keyboard actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Ctrl+Z
    Undo,
    /// Ctrl+Y or Ctrl+Shift+Z
    Redo,
    /// Ctrl+C
    Copy,
    /// Ctrl+V
    Paste,
    /// Ctrl+D
    Duplicate,
    /// Delete or Backspace
    Delete,
    /// Arrow keys, Shift for the large step
    Nudge {
        /// Arrow direction
        direction: NudgeDirection,
        /// Shift held
        large: bool,
    },
    /// Alt+C
    CenterCanvas,
    /// Alt+H
    CenterHorizontal,
    /// Alt+D
    MoveToBottom,
    /// PageDown
    NextScene,
    /// PageUp
    PreviousScene,
    /// Space
    TogglePlayback,
    /// Home
    GoToStart,
    /// End
    GoToEnd,
}

impl Shortcut {
    /// Map a key name (case-insensitive) and modifiers to an action
    pub fn from_key(key: &str, modifiers: Modifiers) -> Option<Self> {
        let key = key.to_lowercase();
        let Modifiers { ctrl, shift, alt } = modifiers;
        let shortcut = match key.as_str() {
            "z" if ctrl && shift => Self::Redo,
            "z" if ctrl => Self::Undo,
            "y" if ctrl => Self::Redo,
            "c" if ctrl => Self::Copy,
            "v" if ctrl => Self::Paste,
            "d" if ctrl => Self::Duplicate,
            "c" if alt => Self::CenterCanvas,
            "h" if alt => Self::CenterHorizontal,
            "d" if alt => Self::MoveToBottom,
            "delete" | "backspace" => Self::Delete,
            "arrowleft" => Self::nudge(NudgeDirection::Left, shift),
            "arrowright" => Self::nudge(NudgeDirection::Right, shift),
            "arrowup" => Self::nudge(NudgeDirection::Up, shift),
            "arrowdown" => Self::nudge(NudgeDirection::Down, shift),
            "pagedown" => Self::NextScene,
            "pageup" => Self::PreviousScene,
            " " | "space" => Self::TogglePlayback,
            "home" => Self::GoToStart,
            "end" => Self::GoToEnd,
            _ => return None,
        };
        Some(shortcut)
    }

    fn nudge(direction: NudgeDirection, large: bool) -> Self {
        Self::Nudge { direction, large }
    }
}

/// Visual state of one object for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectFrame {
    /// Object identity
    pub object_id: ObjectId,
    /// Display name
    pub name: String,
    /// Variant
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Evaluated state
    pub state: VisualState,
    /// Clock text of timer objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_text: Option<String>,
}

/// Evaluate the visible objects of `scene` at `time`, back to front
pub fn evaluate_scene(evaluator: &Evaluator, scene: &Scene, time: f64) -> Vec<ObjectFrame> {
    evaluator
        .visible_states(&scene.objects, time)
        .into_iter()
        .map(|(object, state)| ObjectFrame {
            object_id: object.id,
            name: object.name.clone(),
            kind: object.kind,
            state,
            timer_text: None,
        })
        .collect()
}

/// Read a scene JSON document
pub fn read_scene(path: &Path) -> Result<Scene> {
    let content = std::fs::read_to_string(path)?;
    let scene = serde_json::from_str(&content)?;
    Ok(scene)
}

fn timer_for(object: &SceneObject) -> TimerClock {
    let mode = object
        .properties
        .get("mode")
        .and_then(|mode| serde_json::from_value::<TimerMode>(mode.clone()).ok())
        .unwrap_or_default();
    TimerClock::new(object.number("duration").unwrap_or(0.0), mode)
}

/// One editing session over a set of scenes
pub struct EditorSession {
    state: EditorState,
    tool: TransformTool,
    clock: PlaybackClock,
    evaluator: Evaluator,
    timers: HashMap<ObjectId, TimerClock>,
    surface: Option<SurfaceRect>,
    dispatcher: Option<PersistenceDispatcher>,
}

impl EditorSession {
    /// Create a session without a backend
    pub fn new(config: EditorConfig) -> Self {
        Self {
            tool: TransformTool::new(&config),
            clock: PlaybackClock::new(config.scene_duration),
            state: EditorState::new(config),
            evaluator: Evaluator::default(),
            timers: HashMap::new(),
            surface: None,
            dispatcher: None,
        }
    }

    /// Create a session with the configuration stored at `path`
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(EditorConfig::load(path)?))
    }

    /// Send persistence requests to `backend` through a worker on `handle`
    pub fn attach_backend(&mut self, handle: &tokio::runtime::Handle, backend: Arc<dyn SceneBackend>) {
        self.dispatcher = Some(PersistenceDispatcher::spawn(handle, backend));
        tracing::info!("Persistence backend attached");
    }

    /// Scene graph store
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Playback clock
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Transform tool
    pub fn tool(&self) -> &TransformTool {
        &self.tool
    }

    /// Evaluator, for registering extra motion effects
    pub fn evaluator_mut(&mut self) -> &mut Evaluator {
        &mut self.evaluator
    }

    /// Update the rendering surface rectangle; `None` while detached
    pub fn set_surface(&mut self, surface: Option<SurfaceRect>) {
        self.surface = surface;
    }

    /// Change the canvas display scale
    pub fn set_canvas_scale(&mut self, scale: f64) -> bool {
        self.tool.set_scale(scale)
    }

    /// Replace all scenes and open the first
    pub fn load_scenes(&mut self, scenes: Vec<Scene>) {
        self.tool.cancel();
        self.timers.clear();
        self.state.load_scenes(scenes);
        self.scene_opened();
    }

    fn scene_opened(&mut self) {
        let Some(scene) = self.state.selected_scene() else {
            return;
        };
        self.clock.set_duration(scene.duration());
        self.clock.auto_seek(earliest_exit_start(&scene.objects));
    }

    /// Follow timing edits of the selected scene, keeping the playhead
    fn sync_duration(&mut self) {
        if let Some(scene) = self.state.selected_scene() {
            self.clock.set_duration(scene.duration());
        }
    }

    // ---- mutations ----

    /// Run a command and forward its persistence requests
    pub fn apply(&mut self, command: &dyn EditorCommand) -> Result<()> {
        self.state.apply(command)?;
        self.sync_duration();
        self.flush()?;
        Ok(())
    }

    fn apply_optional(&mut self, command: Option<GeometryCommand>) -> Result<bool> {
        match command {
            Some(command) => {
                self.apply(&command)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Hand queued persistence requests to the backend
    pub fn flush(&mut self) -> Result<usize> {
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            return Ok(0);
        };
        let requests = self.state.take_outbox();
        if requests.is_empty() {
            return Ok(0);
        }
        Ok(dispatcher.dispatch(requests)?)
    }

    /// Undo the last step
    pub fn undo(&mut self) -> Result<bool> {
        self.tool.cancel();
        let undone = self.state.undo();
        if undone {
            self.sync_duration();
            self.flush()?;
        }
        Ok(undone)
    }

    /// Redo the last undone step
    pub fn redo(&mut self) -> Result<bool> {
        self.tool.cancel();
        let redone = self.state.redo();
        if redone {
            self.sync_duration();
            self.flush()?;
        }
        Ok(redone)
    }

    /// Reload the selected scene from the backend. Local edits made before
    /// the copy arrives are kept.
    pub fn refresh_scene(&mut self) -> Result<bool> {
        let Some(scene_id) = self.state.selected_scene_id() else {
            return Ok(false);
        };
        if !self.state.request_refresh(scene_id) {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Copy the selected object
    pub fn copy(&mut self) -> bool {
        self.state.copy_selected()
    }

    /// Paste the clipboard into the selected scene
    pub fn paste(&mut self) -> Result<bool> {
        if self.state.clipboard().is_none() {
            return Ok(false);
        }
        self.apply(&PasteCommand { scene_id: None })?;
        Ok(true)
    }

    /// Duplicate the selected object
    pub fn duplicate_selected(&mut self) -> Result<bool> {
        let Some(object_id) = self.state.selection().primary() else {
            return Ok(false);
        };
        self.apply(&DuplicateCommand { object_id })?;
        Ok(true)
    }

    /// Delete every selected object
    pub fn delete_selected(&mut self) -> Result<bool> {
        let object_ids = self.state.selection().ids().to_vec();
        if object_ids.is_empty() {
            return Ok(false);
        }
        self.tool.cancel();
        self.apply(&DeleteObjectsCommand { object_ids })?;
        Ok(true)
    }

    /// Align the selection to its first object
    pub fn align_selected(&mut self, alignment: Alignment) -> Result<bool> {
        let command = align::align(&self.state.selected_objects(), alignment);
        self.apply_optional(command)
    }

    /// Move the selection on the canvas
    pub fn place_selected(&mut self, placement: Placement) -> Result<bool> {
        let command = align::place(&self.state.selected_objects(), placement, self.state.config());
        self.apply_optional(command)
    }

    /// Nudge the selection with the arrow keys
    pub fn nudge_selected(&mut self, direction: NudgeDirection, large: bool) -> Result<bool> {
        let command = align::nudge(&self.state.selected_objects(), direction, large, self.state.config());
        self.apply_optional(command)
    }

    /// Drag a timing handle to `fraction` of the timeline bar.
    ///
    /// Moves that would make the handles meet or cross are ignored.
    pub fn drag_timing_handle(&mut self, object_id: ObjectId, handle: TimingHandle, fraction: f64) -> Result<bool> {
        let object = self
            .state
            .object(object_id)
            .ok_or(CommandError::ObjectNotFound(object_id))?;
        let Some(timing) = object.timing.drag_handle(handle, fraction) else {
            tracing::debug!("Timing handle move rejected");
            return Ok(false);
        };
        self.apply(&SetTimingCommand { object_id, timing })?;
        Ok(true)
    }

    /// Pick a motion type for an object, using the preset settings
    pub fn set_motion_type(&mut self, object_id: ObjectId, phase: MotionPhase, kind: &str) -> Result<()> {
        let motion = if kind == onair_editor_sequencer::MOTION_NONE {
            MotionDescriptor::none()
        } else {
            MotionDescriptor::preset(kind)
        };
        self.apply(&SetMotionCommand {
            object_id,
            phase,
            motion,
        })
    }

    // ---- selection ----

    /// Open a scene
    pub fn select_scene(&mut self, scene_id: SceneId) -> bool {
        let changed = self.state.selected_scene_id() != Some(scene_id);
        if !self.state.select_scene(scene_id) {
            return false;
        }
        if changed {
            self.tool.cancel();
            self.scene_opened();
        }
        true
    }

    fn step_scene(&mut self, step: isize) -> bool {
        let before = self.state.selected_scene_id();
        if !self.state.step_scene(step) {
            return false;
        }
        if self.state.selected_scene_id() != before {
            self.tool.cancel();
            self.scene_opened();
        }
        true
    }

    /// Select one object, or clear with `None`
    pub fn select_object(&mut self, object_id: Option<ObjectId>) -> bool {
        self.state.select_object(object_id)
    }

    /// Add or remove an object from the selection
    pub fn toggle_object(&mut self, object_id: ObjectId) -> bool {
        self.state.toggle_object(object_id)
    }

    // ---- pointer ----

    fn gesture_target(&mut self, object_id: ObjectId) -> Option<SceneObject> {
        if self.state.selection().primary() != Some(object_id) && !self.state.select_object(Some(object_id)) {
            return None;
        }
        let object = self.state.object(object_id).cloned()?;
        self.clock.pause();
        Some(object)
    }

    /// Press on an object body to move it
    pub fn begin_drag(&mut self, object_id: ObjectId, pointer: [f64; 2]) -> bool {
        let Some(object) = self.gesture_target(object_id) else {
            return false;
        };
        self.tool.begin_drag(&object, self.surface, pointer)
    }

    /// Press on a resize handle
    pub fn begin_resize(&mut self, object_id: ObjectId, handle: ResizeHandle, pointer: [f64; 2]) -> bool {
        let Some(object) = self.gesture_target(object_id) else {
            return false;
        };
        self.tool.begin_resize(&object, handle, self.surface, pointer)
    }

    /// Press on the rotate handle
    pub fn begin_rotate(&mut self, object_id: ObjectId, pointer: [f64; 2]) -> bool {
        let Some(object) = self.gesture_target(object_id) else {
            return false;
        };
        self.tool.begin_rotate(&object, self.surface, pointer)
    }

    /// Pointer moved; processed on the next frame
    pub fn pointer_move(&mut self, sample: PointerSample) {
        self.tool.pointer_move(sample);
    }

    /// Pointer released: commit the gesture as one undo step
    pub fn pointer_up(&mut self, sample: PointerSample) -> Result<bool> {
        let Some(commit) = self.tool.pointer_up(sample) else {
            return Ok(false);
        };
        self.apply(&GeometryCommand::single(commit.description, commit.object_id, commit.patch))?;
        Ok(true)
    }

    /// Abandon the current gesture
    pub fn cancel_gesture(&mut self) {
        self.tool.cancel();
    }

    // ---- keyboard ----

    /// Run a keyboard action. Returns whether it did anything.
    pub fn handle_shortcut(&mut self, shortcut: Shortcut, now: Instant) -> Result<bool> {
        match shortcut {
            Shortcut::Undo => self.undo(),
            Shortcut::Redo => self.redo(),
            Shortcut::Copy => Ok(self.copy()),
            Shortcut::Paste => self.paste(),
            Shortcut::Duplicate => self.duplicate_selected(),
            Shortcut::Delete => self.delete_selected(),
            Shortcut::Nudge { direction, large } => self.nudge_selected(direction, large),
            Shortcut::CenterCanvas => self.place_selected(Placement::CenterCanvas),
            Shortcut::CenterHorizontal => self.place_selected(Placement::CenterHorizontal),
            Shortcut::MoveToBottom => self.place_selected(Placement::Bottom),
            Shortcut::NextScene => Ok(self.step_scene(1)),
            Shortcut::PreviousScene => Ok(self.step_scene(-1)),
            Shortcut::TogglePlayback => {
                self.toggle_playback(now);
                Ok(true)
            }
            Shortcut::GoToStart => {
                self.clock.go_to_start();
                Ok(true)
            }
            Shortcut::GoToEnd => {
                self.clock.go_to_end();
                Ok(true)
            }
        }
    }

    // ---- playback ----

    /// Start playback
    pub fn play(&mut self, now: Instant) {
        self.tool.cancel();
        self.clock.play(now);
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Toggle between playing and paused
    pub fn toggle_playback(&mut self, now: Instant) {
        if self.clock.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Move the playhead
    pub fn scrub(&mut self, time: f64, now: Instant) {
        self.clock.set_current_time(time, now);
    }

    /// Transport display text
    pub fn timecode(&self) -> String {
        format_timecode(self.clock.current_time())
    }

    // ---- timers ----

    /// Start or resume a timer object's clock
    pub fn start_timer(&mut self, object_id: ObjectId, now: Instant) -> bool {
        self.timer_mut(object_id).map(|timer| timer.start(now)).is_some()
    }

    /// Pause a timer object's clock
    pub fn pause_timer(&mut self, object_id: ObjectId, now: Instant) -> bool {
        self.timer_mut(object_id).map(|timer| timer.pause(now)).is_some()
    }

    /// Reset a timer object's clock
    pub fn reset_timer(&mut self, object_id: ObjectId) -> bool {
        self.timer_mut(object_id).map(TimerClock::reset).is_some()
    }

    fn timer_mut(&mut self, object_id: ObjectId) -> Option<&mut TimerClock> {
        let object = self
            .state
            .object(object_id)
            .filter(|object| object.kind == ObjectKind::Timer)?;
        let fresh = timer_for(object);
        Some(self.timers.entry(object_id).or_insert(fresh))
    }

    // ---- frame ----

    /// Advance one animation frame.
    ///
    /// Ticks the clock while playing, recomputes the pending gesture
    /// preview, folds in persistence outcomes, and returns the visible
    /// objects of the selected scene back to front.
    pub fn frame(&mut self, now: Instant) -> Vec<ObjectFrame> {
        let time = self.clock.tick(now);
        let preview = self.tool.frame().copied();
        let active = self.tool.active_object();
        self.reconcile_outcomes();

        let Some(scene) = self.state.selected_scene() else {
            return Vec::new();
        };
        let mut frames = evaluate_scene(&self.evaluator, scene, time);
        for frame in &mut frames {
            if let (Some(patch), Some(active)) = (preview, active) {
                if frame.object_id == active {
                    apply_preview(&mut frame.state, &patch);
                }
            }
            if frame.kind == ObjectKind::Timer {
                let seconds = match self.timers.get(&frame.object_id) {
                    Some(timer) => timer.display_seconds(now),
                    None => scene
                        .object(frame.object_id)
                        .map_or(0.0, |object| timer_for(object).display_seconds(now)),
                };
                frame.timer_text = Some(format_clock(seconds));
            }
        }
        frames
    }

    fn reconcile_outcomes(&mut self) {
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            return;
        };
        for outcome in dispatcher.drain() {
            if self.state.reconcile(outcome) == Reconciliation::Stale {
                tracing::debug!("Stale persistence outcome ignored");
            }
        }
        self.sync_duration();
    }

    /// Requests sent to the backend and not yet reconciled
    pub fn in_flight(&self) -> usize {
        self.dispatcher.as_ref().map_or(0, PersistenceDispatcher::in_flight)
    }
}

fn apply_preview(state: &mut VisualState, patch: &GeometryPatch) {
    let geometry = &mut state.geometry;
    geometry.x = patch.x.unwrap_or(geometry.x);
    geometry.y = patch.y.unwrap_or(geometry.y);
    geometry.width = patch.width.unwrap_or(geometry.width);
    geometry.height = patch.height.unwrap_or(geometry.height);
    geometry.rotation = patch.rotation.unwrap_or(geometry.rotation);
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::AddObjectCommand;
    use std::time::Duration;

    fn session_with_shape() -> (EditorSession, ObjectId) {
        let mut session = EditorSession::default();
        session.load_scenes(vec![Scene::new("Scene 1")]);
        session
            .apply(&AddObjectCommand {
                scene_id: None,
                kind: ObjectKind::Shape,
            })
            .unwrap();
        let id = session.state().selection().primary().unwrap();
        (session, id)
    }

    #[test]
    fn test_shortcut_mapping() {
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        let ctrl_shift = Modifiers {
            ctrl: true,
            shift: true,
            alt: false,
        };
        let alt = Modifiers {
            alt: true,
            ..Default::default()
        };
        assert_eq!(Shortcut::from_key("Z", ctrl), Some(Shortcut::Undo));
        assert_eq!(Shortcut::from_key("z", ctrl_shift), Some(Shortcut::Redo));
        assert_eq!(Shortcut::from_key("y", ctrl), Some(Shortcut::Redo));
        assert_eq!(Shortcut::from_key("c", alt), Some(Shortcut::CenterCanvas));
        assert_eq!(Shortcut::from_key("PageDown", Modifiers::default()), Some(Shortcut::NextScene));
        assert_eq!(
            Shortcut::from_key("ArrowUp", Modifiers {
                shift: true,
                ..Default::default()
            }),
            Some(Shortcut::Nudge {
                direction: NudgeDirection::Up,
                large: true,
            })
        );
        assert_eq!(Shortcut::from_key("q", Modifiers::default()), None);
    }

    #[test]
    fn test_gesture_pauses_playback() {
        let (mut session, id) = session_with_shape();
        session.set_surface(Some(SurfaceRect::new(1036.8, 583.2)));
        let now = Instant::now();
        session.play(now);
        assert!(session.clock().is_playing());
        assert!(session.begin_drag(id, [100.0, 100.0]));
        assert!(!session.clock().is_playing());
    }

    #[test]
    fn test_detached_surface_is_noop() {
        let (mut session, id) = session_with_shape();
        assert!(!session.begin_drag(id, [0.0, 0.0]));
        let sample = PointerSample {
            position: [50.0, 50.0],
            constrain: false,
        };
        assert!(!session.pointer_up(sample).unwrap());
    }

    #[test]
    fn test_drag_commit_is_one_undo_step() {
        let (mut session, id) = session_with_shape();
        session.set_canvas_scale(1.0);
        session.set_surface(Some(SurfaceRect::new(1920.0, 1080.0)));
        let undo_before = session.state().history_stats().undo_count;

        assert!(session.begin_drag(id, [100.0, 100.0]));
        for step in 1..=5 {
            let offset = f64::from(step) * 10.0;
            session.pointer_move(PointerSample {
                position: [100.0 + offset, 100.0 + offset],
                constrain: false,
            });
        }
        let frames = session.frame(Instant::now());
        let preview = frames.iter().find(|f| f.object_id == id).unwrap();
        assert_eq!(preview.state.geometry.x, 125.0);
        assert_eq!(session.state().object(id).unwrap().geometry().x, 75.0);

        let done = session
            .pointer_up(PointerSample {
                position: [150.4, 149.6],
                constrain: false,
            })
            .unwrap();
        assert!(done);
        let geometry = session.state().object(id).unwrap().geometry();
        assert_eq!((geometry.x, geometry.y), (125.0, 125.0));
        assert_eq!(session.state().history_stats().undo_count, undo_before + 1);

        assert!(session.undo().unwrap());
        assert_eq!(session.state().object(id).unwrap().geometry().x, 75.0);
    }

    #[test]
    fn test_nudge_and_place_shortcuts() {
        let (mut session, id) = session_with_shape();
        let now = Instant::now();
        let right = Shortcut::Nudge {
            direction: NudgeDirection::Right,
            large: true,
        };
        assert!(session.handle_shortcut(right, now).unwrap());
        assert_eq!(session.state().object(id).unwrap().geometry().x, 85.0);

        assert!(session.handle_shortcut(Shortcut::MoveToBottom, now).unwrap());
        assert_eq!(session.state().object(id).unwrap().geometry().y, 960.0);
    }

    #[test]
    fn test_scene_open_seeks_to_first_exit() {
        let mut scene = Scene::new("Scene 1");
        let mut object = SceneObject::new(ObjectKind::Text)
            .with_timing(onair_editor_sequencer::TimingWindow::new(0.0, 8.0, 12.0));
        object.out_motion = MotionDescriptor::new("fade", 1.5, 0.0);
        scene.objects.push(object);
        let mut session = EditorSession::default();
        session.load_scenes(vec![scene]);
        assert_eq!(session.clock().duration(), 12.0);
        assert_eq!(session.clock().current_time(), 6.5);
        assert_eq!(session.timecode(), "00:06.50");
    }

    #[test]
    fn test_clock_duration_follows_timing_edits() {
        let (mut session, id) = session_with_shape();
        let now = Instant::now();
        assert_eq!(session.clock().duration(), 10.0);

        session
            .apply(&SetTimingCommand {
                object_id: id,
                timing: onair_editor_sequencer::TimingWindow::new(0.0, 25.0, 30.0),
            })
            .unwrap();
        assert_eq!(session.clock().duration(), 30.0);
        assert!(session.handle_shortcut(Shortcut::GoToEnd, now).unwrap());
        assert_eq!(session.clock().current_time(), 30.0);

        assert!(session.undo().unwrap());
        assert_eq!(session.clock().duration(), 10.0);
        assert_eq!(session.clock().current_time(), 10.0);

        assert!(session.redo().unwrap());
        assert_eq!(session.clock().duration(), 30.0);
        assert_eq!(session.clock().current_time(), 10.0);
    }

    #[test]
    fn test_timing_handle_drag() {
        let (mut session, id) = session_with_shape();
        assert!(session.drag_timing_handle(id, TimingHandle::Start, 0.25).unwrap());
        assert_eq!(session.state().object(id).unwrap().timing.start_time, 2.5);
        assert!(!session.drag_timing_handle(id, TimingHandle::End, 0.1).unwrap());
        assert_eq!(session.state().object(id).unwrap().timing.end_time, 10.0);
    }

    #[test]
    fn test_timer_text() {
        let mut session = EditorSession::default();
        session.load_scenes(vec![Scene::new("Scene 1")]);
        session
            .apply(&AddObjectCommand {
                scene_id: None,
                kind: ObjectKind::Timer,
            })
            .unwrap();
        let id = session.state().selection().primary().unwrap();
        let start = Instant::now();
        assert!(session.start_timer(id, start));

        let frames = session.frame(start + Duration::from_secs(65));
        let timer = frames.iter().find(|f| f.object_id == id).unwrap();
        assert_eq!(timer.timer_text.as_deref(), Some("03:55"));
    }
}
