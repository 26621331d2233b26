// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor commands.
//!
//! Commands are the mutation entry points of the scene graph store. Each one
//! runs through [`EditorState::apply`], which records a single undo step for
//! it, and queues the persistence requests that mirror its change.

use crate::history::HistoryError;
use crate::model::{
    GeometryError, GeometryPatch, ObjectId, ObjectKind, Properties, Scene, SceneId, SceneObject, GEOMETRY_KEYS,
};
use crate::ordering::{renumber, renumber_scenes, OrderingError};
use crate::persistence::{PersistenceRequest, SceneRecord};
use crate::state::EditorState;
use onair_editor_sequencer::{MotionDescriptor, MotionPhase, TimingWindow};

/// Trait for editor commands that can be undone/redone
pub trait EditorCommand: Send + Sync {
    /// Get a description of this command
    fn description(&self) -> String;

    /// Execute the command
    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError>;
}

/// Error type for command execution
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// History error
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Ordering error
    #[error("Ordering error: {0}")]
    Ordering(#[from] OrderingError),

    /// Object not found
    #[error("Object not found: {0:?}")]
    ObjectNotFound(ObjectId),

    /// Scene not found
    #[error("Scene not found: {0:?}")]
    SceneNotFound(SceneId),

    /// The command needs a selected scene
    #[error("No scene selected")]
    NoSceneSelected,

    /// Locked objects cannot be transformed
    #[error("Object {0:?} is locked")]
    ObjectLocked(ObjectId),

    /// Geometry values the object cannot take
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

fn insert_object(state: &mut EditorState, scene_id: SceneId, mut object: SceneObject) -> Result<(), CommandError> {
    let scene = state.scene_mut(scene_id)?;
    object.order = scene.objects.len();
    let id = object.id;
    scene.objects.push(object.clone());
    *state.selection_mut() = crate::state::Selection::single(id);
    let revision = state.bump_revision(id);
    state.queue(PersistenceRequest::CreateObject {
        scene_id,
        object,
        revision,
    });
    Ok(())
}

fn unlocked_object(state: &mut EditorState, id: ObjectId) -> Result<&mut SceneObject, CommandError> {
    let object = state.object_mut(id)?;
    if object.locked {
        return Err(CommandError::ObjectLocked(id));
    }
    Ok(object)
}

/// Add a new object with the defaults of its kind
#[derive(Debug, Clone)]
pub struct AddObjectCommand {
    /// Target scene; the selected scene when `None`
    pub scene_id: Option<SceneId>,
    /// Object variant
    pub kind: ObjectKind,
}

impl EditorCommand for AddObjectCommand {
    fn description(&self) -> String {
        format!("Add {}", self.kind.display_name())
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let scene_id = state.target_scene(self.scene_id)?;
        let duration = state.config().scene_duration;
        let object = SceneObject::new(self.kind).with_timing(TimingWindow::new(0.0, duration, duration));
        insert_object(state, scene_id, object)
    }
}

/// Overwrite properties of an object (property panel edits)
#[derive(Debug, Clone)]
pub struct UpdatePropertiesCommand {
    /// Target object
    pub object_id: ObjectId,
    /// Keys to overwrite
    pub properties: Properties,
}

impl EditorCommand for UpdatePropertiesCommand {
    fn description(&self) -> String {
        "Edit properties".to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let min_size = state.config().min_object_size;
        let geometry = GeometryPatch::from_properties(&self.properties)?.validated(min_size)?;
        let object = unlocked_object(state, self.object_id)?;
        let before = object.properties.clone();
        for (key, value) in &self.properties {
            if !GEOMETRY_KEYS.contains(&key.as_str()) {
                object.properties.insert(key.clone(), value.clone());
            }
        }
        geometry.apply(&mut object.properties);
        if object.properties != before {
            state.object_changed(self.object_id)?;
        }
        Ok(())
    }
}

/// Geometry change of one or more objects, recorded as one step.
///
/// Produced by transform gestures, alignment and nudging.
#[derive(Debug, Clone)]
pub struct GeometryCommand {
    /// Description shown in the history
    pub description: String,
    /// Patch per object
    pub patches: Vec<(ObjectId, GeometryPatch)>,
}

impl GeometryCommand {
    /// Geometry change of a single object
    pub fn single(description: impl Into<String>, object_id: ObjectId, patch: GeometryPatch) -> Self {
        Self {
            description: description.into(),
            patches: vec![(object_id, patch)],
        }
    }
}

impl EditorCommand for GeometryCommand {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let min_size = state.config().min_object_size;
        for (object_id, patch) in &self.patches {
            if patch.is_empty() {
                continue;
            }
            let patch = patch.validated(min_size)?;
            let object = unlocked_object(state, *object_id)?;
            let before = object.properties.clone();
            patch.apply(&mut object.properties);
            if object.properties != before {
                state.object_changed(*object_id)?;
            }
        }
        Ok(())
    }
}

/// Delete objects; remaining objects are renumbered
#[derive(Debug, Clone)]
pub struct DeleteObjectsCommand {
    /// Objects to delete
    pub object_ids: Vec<ObjectId>,
}

impl EditorCommand for DeleteObjectsCommand {
    fn description(&self) -> String {
        match self.object_ids.len() {
            1 => "Delete object".to_string(),
            n => format!("Delete {n} objects"),
        }
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let mut touched = Vec::new();
        for object_id in &self.object_ids {
            let scene_id = state
                .scene_of(*object_id)
                .ok_or(CommandError::ObjectNotFound(*object_id))?;
            let scene = state.scene_mut(scene_id)?;
            scene.objects.retain(|object| object.id != *object_id);
            state.queue(PersistenceRequest::DeleteObject {
                object_id: *object_id,
            });
            if !touched.contains(&scene_id) {
                touched.push(scene_id);
            }
        }

        for scene_id in touched {
            let scene = state.scene_mut(scene_id)?;
            renumber(&mut scene.objects);
            state.orders_changed(scene_id)?;
        }

        let deleted = &self.object_ids;
        state.selection_mut().retain(|id| !deleted.contains(&id));
        Ok(())
    }
}

/// Paste the clipboard into a scene, offset from the original.
///
/// The pasted object becomes the selection and the clipboard is emptied.
#[derive(Debug, Clone)]
pub struct PasteCommand {
    /// Target scene; the selected scene when `None`
    pub scene_id: Option<SceneId>,
}

impl EditorCommand for PasteCommand {
    fn description(&self) -> String {
        "Paste".to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let scene_id = state.target_scene(self.scene_id)?;
        let offset = state.config().paste_offset;
        let copied = state
            .take_clipboard()
            .ok_or_else(|| CommandError::InvalidOperation("Clipboard is empty".to_string()))?;
        insert_object(state, scene_id, copied.clone_for_paste(offset))
    }
}

/// Copy an object in place, leaving the clipboard untouched
#[derive(Debug, Clone)]
pub struct DuplicateCommand {
    /// Object to duplicate
    pub object_id: ObjectId,
}

impl EditorCommand for DuplicateCommand {
    fn description(&self) -> String {
        "Duplicate".to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let scene_id = state
            .scene_of(self.object_id)
            .ok_or(CommandError::ObjectNotFound(self.object_id))?;
        let offset = state.config().paste_offset;
        let original = state
            .object(self.object_id)
            .ok_or(CommandError::ObjectNotFound(self.object_id))?;
        let mut copy = original.clone_for_paste(offset);
        copy.name = format!("{} (Copy)", original.name);
        insert_object(state, scene_id, copy)
    }
}

/// Replace the timing window of an object
#[derive(Debug, Clone)]
pub struct SetTimingCommand {
    /// Target object
    pub object_id: ObjectId,
    /// New window
    pub timing: TimingWindow,
}

impl EditorCommand for SetTimingCommand {
    fn description(&self) -> String {
        "Change timing".to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        if !self.timing.is_valid() {
            return Err(CommandError::InvalidOperation(format!(
                "start {} must not be after end {}",
                self.timing.start_time, self.timing.end_time
            )));
        }
        let object = state.object_mut(self.object_id)?;
        if object.timing == self.timing {
            return Ok(());
        }
        object.timing = self.timing;
        state.object_changed(self.object_id)
    }
}

/// Replace the entrance or exit motion of an object
#[derive(Debug, Clone)]
pub struct SetMotionCommand {
    /// Target object
    pub object_id: ObjectId,
    /// Which motion to replace
    pub phase: MotionPhase,
    /// New motion
    pub motion: MotionDescriptor,
}

impl EditorCommand for SetMotionCommand {
    fn description(&self) -> String {
        match self.phase {
            MotionPhase::Entrance => format!("Set in motion: {}", self.motion.kind),
            MotionPhase::Exit => format!("Set out motion: {}", self.motion.kind),
        }
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let object = state.object_mut(self.object_id)?;
        let slot = match self.phase {
            MotionPhase::Entrance => &mut object.in_motion,
            MotionPhase::Exit => &mut object.out_motion,
        };
        if *slot == self.motion {
            return Ok(());
        }
        *slot = self.motion.clone();
        state.object_changed(self.object_id)
    }
}

/// Lock or unlock an object. Locking deselects it.
#[derive(Debug, Clone)]
pub struct SetLockedCommand {
    /// Target object
    pub object_id: ObjectId,
    /// New lock state
    pub locked: bool,
}

impl EditorCommand for SetLockedCommand {
    fn description(&self) -> String {
        let label = if self.locked { "Lock object" } else { "Unlock object" };
        label.to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let object = state.object_mut(self.object_id)?;
        if object.locked == self.locked {
            return Ok(());
        }
        object.locked = self.locked;
        if self.locked {
            let locked = self.object_id;
            state.selection_mut().retain(|id| id != locked);
        }
        state.object_changed(self.object_id)
    }
}

/// Show or hide an object
#[derive(Debug, Clone)]
pub struct SetVisibleCommand {
    /// Target object
    pub object_id: ObjectId,
    /// New visibility
    pub visible: bool,
}

impl EditorCommand for SetVisibleCommand {
    fn description(&self) -> String {
        let label = if self.visible { "Show object" } else { "Hide object" };
        label.to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let object = state.object_mut(self.object_id)?;
        if object.visible == self.visible {
            return Ok(());
        }
        object.visible = self.visible;
        state.object_changed(self.object_id)
    }
}

fn validated_name(name: &str) -> Result<String, CommandError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CommandError::InvalidOperation("Name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Rename an object
#[derive(Debug, Clone)]
pub struct RenameObjectCommand {
    /// Target object
    pub object_id: ObjectId,
    /// New name, must not be blank
    pub name: String,
}

impl EditorCommand for RenameObjectCommand {
    fn description(&self) -> String {
        format!("Rename object to {}", self.name.trim())
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let name = validated_name(&self.name)?;
        let object = state.object_mut(self.object_id)?;
        if object.name == name {
            return Ok(());
        }
        object.name = name;
        state.object_changed(self.object_id)
    }
}

/// Append a scene named after its position and select it
#[derive(Debug, Clone, Default)]
pub struct AddSceneCommand;

impl EditorCommand for AddSceneCommand {
    fn description(&self) -> String {
        "Add scene".to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let count = state.scenes().len();
        let mut scene = Scene::new(format!("Scene {}", count + 1));
        scene.order = count;
        let record = SceneRecord::from(&scene);
        let id = scene.id;
        state.scenes_mut().push(scene);
        state.set_selected_scene(Some(id));
        state.selection_mut().clear();
        state.queue(PersistenceRequest::CreateScene(record));
        Ok(())
    }
}

/// Rename a scene
#[derive(Debug, Clone)]
pub struct RenameSceneCommand {
    /// Target scene
    pub scene_id: SceneId,
    /// New name, must not be blank
    pub name: String,
}

impl EditorCommand for RenameSceneCommand {
    fn description(&self) -> String {
        format!("Rename scene to {}", self.name.trim())
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let name = validated_name(&self.name)?;
        let scene = state.scene_mut(self.scene_id)?;
        if scene.name == name {
            return Ok(());
        }
        scene.name = name;
        let record = SceneRecord::from(&*scene);
        state.queue(PersistenceRequest::UpdateScene(record));
        Ok(())
    }
}

/// Delete a scene and its objects
#[derive(Debug, Clone)]
pub struct DeleteSceneCommand {
    /// Target scene
    pub scene_id: SceneId,
}

impl EditorCommand for DeleteSceneCommand {
    fn description(&self) -> String {
        "Delete scene".to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let index = state
            .scenes()
            .iter()
            .position(|scene| scene.id == self.scene_id)
            .ok_or(CommandError::SceneNotFound(self.scene_id))?;
        let scenes = state.scenes_mut();
        scenes.remove(index);
        renumber_scenes(scenes);
        state.queue(PersistenceRequest::DeleteScene {
            scene_id: self.scene_id,
        });
        let shifted: Vec<SceneRecord> = state.scenes()[index..].iter().map(SceneRecord::from).collect();
        for record in shifted {
            state.queue(PersistenceRequest::UpdateScene(record));
        }

        if state.selected_scene_id() == Some(self.scene_id) {
            let first = state.scenes().first().map(|scene| scene.id);
            state.set_selected_scene(first);
            state.selection_mut().clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn state_with_scene() -> (EditorState, SceneId) {
        let scene = Scene::new("Scene 1");
        let id = scene.id;
        let mut state = EditorState::default();
        state.load_scenes(vec![scene]);
        (state, id)
    }

    fn add(state: &mut EditorState, kind: ObjectKind) -> ObjectId {
        state
            .apply(&AddObjectCommand { scene_id: None, kind })
            .unwrap();
        state.selection().primary().unwrap()
    }

    #[test]
    fn test_add_object_appends_and_selects() {
        let (mut state, scene_id) = state_with_scene();
        let first = add(&mut state, ObjectKind::Text);
        let second = add(&mut state, ObjectKind::Image);
        let scene = state.scene(scene_id).unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.object(first).unwrap().order, 0);
        assert_eq!(scene.object(second).unwrap().order, 1);
        assert_eq!(state.selection().primary(), Some(second));
        assert_eq!(state.history_stats().undo_count, 2);
        assert!(matches!(
            state.outbox().last(),
            Some(PersistenceRequest::CreateObject { .. })
        ));
    }

    #[test]
    fn test_property_edit_undo_redo() {
        let (mut state, _) = state_with_scene();
        let id = add(&mut state, ObjectKind::Text);
        let mut properties = Properties::new();
        properties.insert("content".to_string(), Value::from("LIVE"));
        state
            .apply(&UpdatePropertiesCommand {
                object_id: id,
                properties,
            })
            .unwrap();
        assert_eq!(state.object(id).unwrap().properties["content"], "LIVE");

        assert!(state.undo());
        assert_eq!(state.object(id).unwrap().properties["content"], "New Text");
        assert!(state.redo());
        assert_eq!(state.object(id).unwrap().properties["content"], "LIVE");
    }

    #[test]
    fn test_geometry_rejects_locked_object() {
        let (mut state, _) = state_with_scene();
        let id = add(&mut state, ObjectKind::Shape);
        state
            .apply(&SetLockedCommand {
                object_id: id,
                locked: true,
            })
            .unwrap();
        assert!(state.selection().is_empty());

        let undo_count = state.history_stats().undo_count;
        let outbox = state.outbox().len();
        let result = state.apply(&GeometryCommand::single("Move", id, GeometryPatch::position(0.0, 0.0)));
        assert!(matches!(result, Err(CommandError::ObjectLocked(_))));
        assert_eq!(state.history_stats().undo_count, undo_count);
        assert_eq!(state.outbox().len(), outbox);
    }

    #[test]
    fn test_property_edit_rejects_locked_object() {
        let (mut state, _) = state_with_scene();
        let id = add(&mut state, ObjectKind::Shape);
        state
            .apply(&SetLockedCommand {
                object_id: id,
                locked: true,
            })
            .unwrap();
        let outbox = state.outbox().len();

        let mut properties = Properties::new();
        properties.insert("x".to_string(), Value::from(400));
        let result = state.apply(&UpdatePropertiesCommand {
            object_id: id,
            properties,
        });
        assert!(matches!(result, Err(CommandError::ObjectLocked(_))));
        assert_eq!(state.object(id).unwrap().geometry().x, 75.0);
        assert_eq!(state.outbox().len(), outbox);
    }

    #[test]
    fn test_property_edit_checks_geometry() {
        let (mut state, _) = state_with_scene();
        let id = add(&mut state, ObjectKind::Shape);
        let mut properties = Properties::new();
        properties.insert("width".to_string(), Value::from(2));
        properties.insert("rotation".to_string(), Value::from(-90));
        properties.insert("color".to_string(), Value::from("#00FF00"));
        state
            .apply(&UpdatePropertiesCommand {
                object_id: id,
                properties,
            })
            .unwrap();
        let object = state.object(id).unwrap();
        assert_eq!(object.geometry().width, 10.0);
        assert_eq!(object.geometry().rotation, 270.0);
        assert_eq!(object.properties["color"], "#00FF00");

        let mut properties = Properties::new();
        properties.insert("height".to_string(), Value::from("tall"));
        let result = state.apply(&UpdatePropertiesCommand {
            object_id: id,
            properties,
        });
        assert!(matches!(result, Err(CommandError::Geometry(GeometryError::NotANumber { .. }))));
    }

    #[test]
    fn test_geometry_rejects_non_finite_values() {
        let (mut state, _) = state_with_scene();
        let id = add(&mut state, ObjectKind::Shape);
        let before = state.object(id).unwrap().geometry();
        let undo_count = state.history_stats().undo_count;
        let patch = GeometryPatch {
            width: Some(f64::NAN),
            ..GeometryPatch::default()
        };
        let result = state.apply(&GeometryCommand::single("Resize", id, patch));
        assert!(matches!(result, Err(CommandError::Geometry(GeometryError::NonFinite { .. }))));
        assert_eq!(state.object(id).unwrap().geometry(), before);
        assert_eq!(state.history_stats().undo_count, undo_count);
    }

    #[test]
    fn test_noop_command_records_nothing() {
        let (mut state, _) = state_with_scene();
        let id = add(&mut state, ObjectKind::Shape);
        let undo_count = state.history_stats().undo_count;
        let geometry = state.object(id).unwrap().geometry();
        state
            .apply(&GeometryCommand::single(
                "Move",
                id,
                GeometryPatch::position(geometry.x, geometry.y),
            ))
            .unwrap();
        assert_eq!(state.history_stats().undo_count, undo_count);
    }

    #[test]
    fn test_delete_renumbers_and_deselects() {
        let (mut state, scene_id) = state_with_scene();
        let a = add(&mut state, ObjectKind::Text);
        let b = add(&mut state, ObjectKind::Shape);
        let c = add(&mut state, ObjectKind::Image);
        state.apply(&DeleteObjectsCommand { object_ids: vec![a] }).unwrap();
        let scene = state.scene(scene_id).unwrap();
        assert_eq!(scene.object(b).unwrap().order, 0);
        assert_eq!(scene.object(c).unwrap().order, 1);
        assert_eq!(state.selection().primary(), Some(c));

        state.apply(&DeleteObjectsCommand { object_ids: vec![c] }).unwrap();
        assert!(state.selection().is_empty());
        assert!(state.undo());
        assert!(state.object(c).is_some());
    }

    #[test]
    fn test_paste_offsets_and_clears_clipboard() {
        let (mut state, scene_id) = state_with_scene();
        let id = add(&mut state, ObjectKind::Shape);
        assert!(state.copy_selected());
        state.apply(&PasteCommand { scene_id: None }).unwrap();

        let pasted_id = state.selection().primary().unwrap();
        assert_ne!(pasted_id, id);
        let pasted = state.object(pasted_id).unwrap();
        assert_eq!(pasted.geometry().x, 85.0);
        assert_eq!(pasted.geometry().y, 85.0);
        assert_eq!(pasted.order, 1);
        assert!(state.clipboard().is_none());
        assert_eq!(state.scene(scene_id).unwrap().objects.len(), 2);

        assert!(state.apply(&PasteCommand { scene_id: None }).is_err());
    }

    #[test]
    fn test_failed_paste_keeps_clipboard() {
        let mut state = EditorState::default();
        let mut scene = Scene::new("Scene 1");
        scene.objects.push(SceneObject::new(ObjectKind::Text));
        let object_id = scene.objects[0].id;
        state.load_scenes(vec![scene]);
        state.select_object(Some(object_id));
        state.copy_selected();
        let missing = SceneId::new();
        assert!(state.apply(&PasteCommand { scene_id: Some(missing) }).is_err());
        assert!(state.clipboard().is_some());
    }

    #[test]
    fn test_duplicate_keeps_clipboard() {
        let (mut state, _) = state_with_scene();
        let id = add(&mut state, ObjectKind::Text);
        state.apply(&DuplicateCommand { object_id: id }).unwrap();
        let copy = state.selected_object().unwrap();
        assert_eq!(copy.name, "New Text (Copy)");
        assert_eq!(copy.geometry().x, 60.0);
        assert!(state.clipboard().is_none());
    }

    #[test]
    fn test_invalid_timing_rejected() {
        let (mut state, _) = state_with_scene();
        let id = add(&mut state, ObjectKind::Text);
        let result = state.apply(&SetTimingCommand {
            object_id: id,
            timing: TimingWindow::new(5.0, 2.0, 10.0),
        });
        assert!(matches!(result, Err(CommandError::InvalidOperation(_))));
    }

    #[test]
    fn test_set_motion() {
        let (mut state, _) = state_with_scene();
        let id = add(&mut state, ObjectKind::Text);
        state
            .apply(&SetMotionCommand {
                object_id: id,
                phase: MotionPhase::Exit,
                motion: MotionDescriptor::preset("fade"),
            })
            .unwrap();
        assert_eq!(state.object(id).unwrap().out_motion.kind, "fade");
        assert!(state.object(id).unwrap().in_motion.is_none());
    }

    #[test]
    fn test_blank_rename_rejected() {
        let (mut state, scene_id) = state_with_scene();
        let id = add(&mut state, ObjectKind::Text);
        assert!(state
            .apply(&RenameObjectCommand {
                object_id: id,
                name: "   ".to_string(),
            })
            .is_err());
        assert!(state
            .apply(&RenameSceneCommand {
                scene_id,
                name: String::new(),
            })
            .is_err());
        state
            .apply(&RenameSceneCommand {
                scene_id,
                name: " Opener ".to_string(),
            })
            .unwrap();
        assert_eq!(state.scene(scene_id).unwrap().name, "Opener");
    }

    #[test]
    fn test_scene_add_and_delete() {
        let (mut state, first) = state_with_scene();
        state.apply(&AddSceneCommand).unwrap();
        let second = state.selected_scene_id().unwrap();
        assert_eq!(state.scene(second).unwrap().name, "Scene 2");
        assert_eq!(state.scene(second).unwrap().order, 1);

        state.apply(&DeleteSceneCommand { scene_id: second }).unwrap();
        assert_eq!(state.selected_scene_id(), Some(first));
        assert_eq!(state.scenes().len(), 1);

        assert!(state.undo());
        assert_eq!(state.scenes().len(), 2);
        assert_eq!(state.selected_scene_id(), Some(second));
    }
}
