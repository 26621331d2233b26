// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor state management.
//!
//! `EditorState` is the scene graph store: the only owner of scenes,
//! selection, clipboard and undo/redo history. All mutations go through
//! [`EditorState::apply`], which captures the pre-mutation snapshot before
//! the command runs and records it once the command succeeds.

use crate::commands::{CommandError, EditorCommand};
use crate::config::EditorConfig;
use crate::history::{EditorSnapshot, History, HistoryError, HistoryStats};
use crate::model::{ObjectId, Scene, SceneId, SceneObject};
use crate::persistence::{
    diff_scenes, order_entries, PersistenceOutcome, PersistenceRequest, RevisionLedger, SceneRefresh,
};
use std::collections::HashMap;

/// Object selection: a primary object plus the multi-selection set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    primary: Option<ObjectId>,
    objects: Vec<ObjectId>,
}

impl Selection {
    /// Create a new empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection holding only `id`
    pub fn single(id: ObjectId) -> Self {
        Self {
            primary: Some(id),
            objects: vec![id],
        }
    }

    /// Primary selected object, target of transforms
    pub fn primary(&self) -> Option<ObjectId> {
        self.primary
    }

    /// Selected objects in selection order
    pub fn ids(&self) -> &[ObjectId] {
        &self.objects
    }

    /// Check if an object is selected
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }

    /// Add or remove `id`.
    ///
    /// Adding makes it primary. Removing leaves the last remaining object
    /// primary when exactly one is left, and no primary otherwise.
    pub fn toggle(&mut self, id: ObjectId) {
        if self.contains(id) {
            self.objects.retain(|selected| *selected != id);
            self.primary = match self.objects.as_slice() {
                [only] => Some(*only),
                _ => None,
            };
        } else {
            self.objects.push(id);
            self.primary = Some(id);
        }
    }

    /// Keep only objects for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(ObjectId) -> bool) {
        self.objects.retain(|id| keep(*id));
        if let Some(primary) = self.primary {
            if !self.objects.contains(&primary) {
                self.primary = match self.objects.as_slice() {
                    [only] => Some(*only),
                    _ => None,
                };
            }
        }
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.primary = None;
        self.objects.clear();
    }

    /// Check if the selection is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Get the number of selected objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }
}

/// How a persistence outcome was folded into local state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Backend copy or identity applied
    Applied,
    /// Outcome refers to an older local revision and was discarded
    Stale,
    /// Write confirmed, nothing to apply
    Acknowledged,
    /// Target no longer exists locally
    Unknown,
    /// Write failed; local state kept
    Failed,
}

/// Revisions and backend identities, rolled back together with a
/// rejected command
#[derive(Debug, Clone, Default)]
struct SyncState {
    ledger: RevisionLedger,
    remote_objects: HashMap<ObjectId, i64>,
    remote_scenes: HashMap<SceneId, i64>,
}

/// Main editor state
#[derive(Debug)]
pub struct EditorState {
    scenes: Vec<Scene>,
    selected_scene: Option<SceneId>,
    selection: Selection,
    clipboard: Option<SceneObject>,
    history: History,
    outbox: Vec<PersistenceRequest>,
    sync: SyncState,
    config: EditorConfig,
    dirty: bool,
}

impl EditorState {
    /// Create an empty editor state
    pub fn new(config: EditorConfig) -> Self {
        Self {
            scenes: Vec::new(),
            selected_scene: None,
            selection: Selection::new(),
            clipboard: None,
            history: History::with_max_depth(config.history_depth).with_snapshot_limit(config.history_snapshot_limit),
            outbox: Vec::new(),
            sync: SyncState::default(),
            config,
            dirty: false,
        }
    }

    /// Replace all scenes with loaded ones.
    ///
    /// Scenes and objects are sorted by their stored order and renumbered
    /// densely; history and selection are reset.
    pub fn load_scenes(&mut self, mut scenes: Vec<Scene>) {
        scenes.sort_by_key(|scene| scene.order);
        for (index, scene) in scenes.iter_mut().enumerate() {
            scene.order = index;
            scene.objects.sort_by_key(|object| object.order);
            crate::ordering::renumber(&mut scene.objects);
            if let Some(remote_id) = scene.remote_id {
                self.sync.remote_scenes.insert(scene.id, remote_id);
            }
            for object in &scene.objects {
                if let Some(remote_id) = object.remote_id {
                    self.sync.remote_objects.insert(object.id, remote_id);
                }
            }
        }
        self.selected_scene = scenes.first().map(|scene| scene.id);
        self.scenes = scenes;
        self.selection.clear();
        self.history.clear();
        self.outbox.clear();
        self.dirty = false;
        tracing::info!("Loaded {} scenes", self.scenes.len());
    }

    /// All scenes in list order
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Find a scene
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.id == id)
    }

    /// Selected scene ID
    pub fn selected_scene_id(&self) -> Option<SceneId> {
        self.selected_scene
    }

    /// Selected scene
    pub fn selected_scene(&self) -> Option<&Scene> {
        self.selected_scene.and_then(|id| self.scene(id))
    }

    /// Find an object in any scene
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.scenes.iter().find_map(|scene| scene.object(id))
    }

    /// Scene owning an object
    pub fn scene_of(&self, id: ObjectId) -> Option<SceneId> {
        self.scenes
            .iter()
            .find(|scene| scene.object(id).is_some())
            .map(|scene| scene.id)
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Primary selected object
    pub fn selected_object(&self) -> Option<&SceneObject> {
        self.selection.primary().and_then(|id| self.object(id))
    }

    /// Selected objects of the selected scene, in z-order
    pub fn selected_objects(&self) -> Vec<&SceneObject> {
        self.selected_scene()
            .map(|scene| {
                scene
                    .objects
                    .iter()
                    .filter(|object| self.selection.contains(object.id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Clipboard contents
    pub fn clipboard(&self) -> Option<&SceneObject> {
        self.clipboard.as_ref()
    }

    /// Editor configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// History statistics
    pub fn history_stats(&self) -> HistoryStats {
        self.history.stats()
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether anything changed since load
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Latest local revision of an object
    pub fn revision(&self, id: ObjectId) -> u64 {
        self.sync.ledger.object(id)
    }

    /// Latest local order revision of a scene
    pub fn order_revision(&self, scene_id: SceneId) -> u64 {
        self.sync.ledger.order(scene_id)
    }

    /// Capture scenes and selection
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            scenes: self.scenes.clone(),
            selected_scene: self.selected_scene,
            selected_object: self.selection.primary(),
        }
    }

    /// Run a command as one undoable step.
    ///
    /// A failing command leaves scenes, selection, outbox, revisions and
    /// history as they were. A command that changes nothing records no
    /// history entry and sends nothing.
    pub fn apply(&mut self, command: &dyn EditorCommand) -> Result<(), CommandError> {
        let description = command.description();
        let before = self.snapshot();
        let entry = self.history.begin_operation(&description, before.clone())?;
        let selection = self.selection.clone();
        let clipboard = self.clipboard.clone();
        let outbox_len = self.outbox.len();
        let sync = self.sync.clone();

        if let Err(err) = command.execute(self) {
            tracing::debug!("{} rejected: {}", description, err);
            self.scenes = before.scenes;
            self.selected_scene = before.selected_scene;
            self.selection = selection;
            self.clipboard = clipboard;
            self.outbox.truncate(outbox_len);
            self.sync = sync;
            return Err(err);
        }

        if self.scenes == before.scenes && self.selected_scene == before.selected_scene {
            tracing::debug!("{} changed nothing", description);
            self.outbox.truncate(outbox_len);
            self.sync = sync;
            return Ok(());
        }

        self.history.commit(entry);
        self.dirty = true;
        tracing::info!("{}", description);
        Ok(())
    }

    /// Restore the previous snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Ok(snapshot) => {
                self.restore(snapshot);
                true
            }
            Err(HistoryError::NothingToUndo) => {
                tracing::debug!("Nothing to undo");
                false
            }
            Err(err) => {
                tracing::warn!("Undo failed: {}", err);
                false
            }
        }
    }

    /// Re-apply the last undone step. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Ok(snapshot) => {
                self.restore(snapshot);
                true
            }
            Err(HistoryError::NothingToRedo) => {
                tracing::debug!("Nothing to redo");
                false
            }
            Err(err) => {
                tracing::warn!("Redo failed: {}", err);
                false
            }
        }
    }

    fn restore(&mut self, snapshot: EditorSnapshot) {
        // Backend identities are not part of history: a snapshot may predate
        // an identity, or carry one whose record has since been deleted.
        let mut scenes = snapshot.scenes;
        for scene in &mut scenes {
            scene.remote_id = self.sync.remote_scenes.get(&scene.id).copied();
            for object in &mut scene.objects {
                object.remote_id = self.sync.remote_objects.get(&object.id).copied();
            }
        }

        let before = std::mem::replace(&mut self.scenes, scenes);
        let requests = diff_scenes(&before, &self.scenes, &mut self.sync.ledger);
        tracing::debug!("Restore queued {} persistence requests", requests.len());
        for request in requests {
            self.queue(request);
        }

        self.selected_scene = snapshot
            .selected_scene
            .filter(|id| self.scene(*id).is_some())
            .or_else(|| self.scenes.first().map(|scene| scene.id));
        self.selection = match snapshot.selected_object {
            Some(id) if self.object(id).is_some() => Selection::single(id),
            _ => Selection::new(),
        };
        self.dirty = true;
    }

    // ---- selection (not undoable) ----

    /// Select a scene; clears the object selection
    pub fn select_scene(&mut self, id: SceneId) -> bool {
        if self.scene(id).is_none() {
            tracing::debug!("Select unknown scene {:?}", id);
            return false;
        }
        if self.selected_scene != Some(id) {
            self.selected_scene = Some(id);
            self.selection.clear();
        }
        true
    }

    /// Move the scene selection by `step` positions in the list.
    ///
    /// With no scene selected, the first scene is selected.
    pub fn step_scene(&mut self, step: isize) -> bool {
        let Some(first) = self.scenes.first().map(|scene| scene.id) else {
            return false;
        };
        let Some(index) = self
            .selected_scene
            .and_then(|id| self.scenes.iter().position(|scene| scene.id == id))
        else {
            return self.select_scene(first);
        };
        let target = index as isize + step;
        if target < 0 || target >= self.scenes.len() as isize {
            return false;
        }
        let id = self.scenes[target as usize].id;
        self.select_scene(id)
    }

    /// Select a single object, or clear with `None`.
    ///
    /// Locked objects and objects outside the selected scene are rejected.
    pub fn select_object(&mut self, id: Option<ObjectId>) -> bool {
        let Some(id) = id else {
            self.selection.clear();
            return true;
        };
        if !self.is_selectable(id) {
            return false;
        }
        self.selection = Selection::single(id);
        true
    }

    /// Add or remove an object from the multi-selection
    pub fn toggle_object(&mut self, id: ObjectId) -> bool {
        if !self.selection.contains(id) && !self.is_selectable(id) {
            return false;
        }
        self.selection.toggle(id);
        true
    }

    fn is_selectable(&self, id: ObjectId) -> bool {
        match self.selected_scene().and_then(|scene| scene.object(id)) {
            Some(object) if object.locked => {
                tracing::debug!("Object {:?} is locked, selection rejected", id);
                false
            }
            Some(_) => true,
            None => {
                tracing::debug!("Object {:?} not in selected scene", id);
                false
            }
        }
    }

    /// Clear the object selection
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Copy the primary selected object to the clipboard
    pub fn copy_selected(&mut self) -> bool {
        match self.selected_object().cloned() {
            Some(object) => {
                tracing::info!("Copied {}", object.name);
                self.clipboard = Some(object);
                true
            }
            None => false,
        }
    }

    // ---- mutation primitives used by commands ----

    /// Mutable scene list
    pub fn scenes_mut(&mut self) -> &mut Vec<Scene> {
        &mut self.scenes
    }

    /// Mutable scene
    pub fn scene_mut(&mut self, id: SceneId) -> Result<&mut Scene, CommandError> {
        self.scenes
            .iter_mut()
            .find(|scene| scene.id == id)
            .ok_or(CommandError::SceneNotFound(id))
    }

    /// `id`, or the selected scene when `None`
    pub fn target_scene(&self, id: Option<SceneId>) -> Result<SceneId, CommandError> {
        match id.or(self.selected_scene) {
            Some(id) if self.scene(id).is_some() => Ok(id),
            Some(id) => Err(CommandError::SceneNotFound(id)),
            None => Err(CommandError::NoSceneSelected),
        }
    }

    /// Mutable object in any scene
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject, CommandError> {
        self.scenes
            .iter_mut()
            .find_map(|scene| scene.object_mut(id))
            .ok_or(CommandError::ObjectNotFound(id))
    }

    /// Mutable selection
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Change the selected scene without validation
    pub fn set_selected_scene(&mut self, id: Option<SceneId>) {
        self.selected_scene = id;
    }

    /// Take the clipboard contents
    pub fn take_clipboard(&mut self) -> Option<SceneObject> {
        self.clipboard.take()
    }

    /// Allocate a new revision for an object
    pub fn bump_revision(&mut self, id: ObjectId) -> u64 {
        self.sync.ledger.bump_object(id)
    }

    /// Queue a write of an object's current content
    pub fn object_changed(&mut self, id: ObjectId) -> Result<(), CommandError> {
        let (scene_id, object) = self
            .scenes
            .iter()
            .find_map(|scene| scene.object(id).map(|object| (scene.id, object.clone())))
            .ok_or(CommandError::ObjectNotFound(id))?;
        let revision = self.bump_revision(id);
        self.queue(PersistenceRequest::UpdateObject {
            scene_id,
            object,
            revision,
        });
        Ok(())
    }

    /// Queue the current object order of a scene as one batch
    pub fn orders_changed(&mut self, scene_id: SceneId) -> Result<(), CommandError> {
        let scene = self.scene(scene_id).ok_or(CommandError::SceneNotFound(scene_id))?;
        if scene.objects.is_empty() {
            return Ok(());
        }
        let orders = order_entries(scene);
        let revision = self.sync.ledger.bump_order(scene_id);
        self.queue(PersistenceRequest::UpdateObjectOrders {
            scene_id,
            orders,
            revision,
        });
        Ok(())
    }

    /// Queue a persistence request.
    ///
    /// Deleting a record also forgets its backend identity, so a later
    /// re-create gets a fresh one.
    pub fn queue(&mut self, request: PersistenceRequest) {
        match &request {
            PersistenceRequest::DeleteObject { object_id } => {
                self.sync.remote_objects.remove(object_id);
            }
            PersistenceRequest::DeleteScene { scene_id } => {
                self.sync.remote_scenes.remove(scene_id);
                let scenes = &self.scenes;
                self.sync
                    .remote_objects
                    .retain(|id, _| scenes.iter().any(|scene| scene.object(*id).is_some()));
            }
            _ => {}
        }
        self.outbox.push(request);
    }

    /// Ask the backend for its copy of a scene.
    ///
    /// Not an undoable step; the copy is merged when it arrives, keeping
    /// local edits made after this call.
    pub fn request_refresh(&mut self, scene_id: SceneId) -> bool {
        if self.scene(scene_id).is_none() {
            return false;
        }
        let revision = self.sync.ledger.latest();
        self.queue(PersistenceRequest::FetchScene { scene_id, revision });
        true
    }

    /// Pending persistence requests
    pub fn outbox(&self) -> &[PersistenceRequest] {
        &self.outbox
    }

    /// Take pending persistence requests for dispatch
    pub fn take_outbox(&mut self) -> Vec<PersistenceRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Fold a backend outcome into local state.
    ///
    /// Object acknowledgements carry the revision they were sent at; one
    /// older than the object's latest revision is discarded so a slow reply
    /// can never overwrite a newer local edit.
    pub fn reconcile(&mut self, outcome: PersistenceOutcome) -> Reconciliation {
        match outcome {
            PersistenceOutcome::SceneCreated { scene_id, remote_id } => match self.scene_mut(scene_id) {
                Ok(scene) => {
                    scene.remote_id = Some(remote_id);
                    self.sync.remote_scenes.insert(scene_id, remote_id);
                    Reconciliation::Applied
                }
                Err(_) => Reconciliation::Unknown,
            },
            PersistenceOutcome::ObjectCreated { object, revision } => {
                let Some(remote_id) = object.remote_id else {
                    return Reconciliation::Acknowledged;
                };
                let stale = revision < self.revision(object.id);
                match self.object_mut(object.id) {
                    Ok(local) => {
                        local.remote_id = Some(remote_id);
                        self.sync.remote_objects.insert(object.id, remote_id);
                        if stale {
                            Reconciliation::Stale
                        } else {
                            Reconciliation::Applied
                        }
                    }
                    Err(_) => Reconciliation::Unknown,
                }
            }
            PersistenceOutcome::ObjectUpdated { object, revision } => {
                let current = self.revision(object.id);
                if revision < current {
                    tracing::warn!(
                        "Discarding stale update for {:?} (revision {} < {})",
                        object.id,
                        revision,
                        current
                    );
                    return Reconciliation::Stale;
                }
                match self.object_mut(object.id) {
                    Ok(local) => {
                        let order = local.order;
                        *local = object;
                        local.order = order;
                        Reconciliation::Applied
                    }
                    Err(_) => Reconciliation::Unknown,
                }
            }
            PersistenceOutcome::SceneFetched(refresh) => self.merge_refresh(refresh),
            PersistenceOutcome::Completed { .. } => Reconciliation::Acknowledged,
            PersistenceOutcome::Failed { label, error, refresh } => {
                tracing::warn!("{} failed: {}", label, error);
                if let Some(refresh) = refresh {
                    let merged = self.merge_refresh(refresh);
                    tracing::debug!("Stored scene read back after failure: {:?}", merged);
                }
                Reconciliation::Failed
            }
        }
    }

    /// Merge a stored copy of a scene.
    ///
    /// Objects written locally after `refresh.revision` keep their local
    /// content, and so does the object order when it was changed after it.
    /// Objects missing on either side are left alone.
    fn merge_refresh(&mut self, refresh: SceneRefresh) -> Reconciliation {
        let SceneRefresh { scene: stored, revision } = refresh;
        let ledger = &self.sync.ledger;
        let remote_objects = &mut self.sync.remote_objects;
        let Some(local) = self.scenes.iter_mut().find(|scene| scene.id == stored.id) else {
            return Reconciliation::Unknown;
        };

        let mut applied = 0;
        let mut kept = 0;
        for object in &mut local.objects {
            let Some(copy) = stored.object(object.id) else {
                continue;
            };
            if ledger.object(object.id) > revision {
                kept += 1;
                continue;
            }
            let mut merged = copy.clone();
            merged.order = object.order;
            if *object != merged {
                *object = merged;
                applied += 1;
            }
            if let Some(remote_id) = copy.remote_id {
                remote_objects.insert(object.id, remote_id);
            }
        }

        let same_members = local.objects.len() == stored.objects.len()
            && local.objects.iter().all(|object| stored.object(object.id).is_some());
        if same_members && ledger.order(local.id) <= revision {
            let rank = |id: ObjectId| stored.index_of(id).unwrap_or(usize::MAX);
            let before: Vec<ObjectId> = local.objects.iter().map(|object| object.id).collect();
            local.objects.sort_by_key(|object| rank(object.id));
            crate::ordering::renumber(&mut local.objects);
            if local.objects.iter().map(|object| object.id).ne(before) {
                applied += 1;
            }
        }

        match (applied, kept) {
            (0, 0) => Reconciliation::Acknowledged,
            (0, _) => Reconciliation::Stale,
            _ => Reconciliation::Applied,
        }
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AddObjectCommand, GeometryCommand, UpdatePropertiesCommand};
    use crate::model::{props_from, GeometryPatch, ObjectKind};
    use serde_json::Value;

    fn state_with_objects(count: usize) -> (EditorState, Vec<ObjectId>) {
        let mut scene = Scene::new("Scene 1");
        let mut ids = Vec::new();
        for order in 0..count {
            let mut object = SceneObject::new(ObjectKind::Shape);
            object.order = order;
            ids.push(object.id);
            scene.objects.push(object);
        }
        let mut state = EditorState::default();
        state.load_scenes(vec![scene]);
        (state, ids)
    }

    #[test]
    fn test_selection_toggle_rules() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let c = ObjectId::new();
        let mut selection = Selection::new();
        selection.toggle(a);
        selection.toggle(b);
        assert_eq!(selection.primary(), Some(b));
        selection.toggle(c);
        selection.toggle(c);
        assert_eq!(selection.primary(), None);
        selection.toggle(b);
        assert_eq!(selection.primary(), Some(a));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_locked_objects_cannot_be_selected() {
        let (mut state, ids) = state_with_objects(2);
        state.object_mut(ids[0]).unwrap().locked = true;
        assert!(!state.select_object(Some(ids[0])));
        assert!(!state.toggle_object(ids[0]));
        assert!(state.select_object(Some(ids[1])));
        assert_eq!(state.selection().primary(), Some(ids[1]));
    }

    #[test]
    fn test_scene_navigation() {
        let mut state = EditorState::default();
        let scenes: Vec<Scene> = (1..=3)
            .map(|i| {
                let mut scene = Scene::new(format!("Scene {i}"));
                scene.order = i;
                scene
            })
            .collect();
        let ids: Vec<SceneId> = scenes.iter().map(|s| s.id).collect();
        state.load_scenes(scenes);
        assert_eq!(state.selected_scene_id(), Some(ids[0]));
        assert!(state.step_scene(1));
        assert!(state.step_scene(1));
        assert!(!state.step_scene(1));
        assert_eq!(state.selected_scene_id(), Some(ids[2]));
        assert!(state.step_scene(-2));
        assert_eq!(state.selected_scene_id(), Some(ids[0]));
        assert!(!state.step_scene(-1));
    }

    #[test]
    fn test_load_renumbers_orders() {
        let mut scene = Scene::new("Loaded");
        for order in [5, 2, 9] {
            let mut object = SceneObject::new(ObjectKind::Text);
            object.order = order;
            scene.objects.push(object);
        }
        let mut state = EditorState::default();
        state.load_scenes(vec![scene]);
        let orders: Vec<usize> = state.scenes()[0].objects.iter().map(|o| o.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_stale_update_is_discarded() {
        let (mut state, ids) = state_with_objects(1);
        let id = ids[0];

        let mut first = state.object(id).unwrap().clone();
        first.name = "First".to_string();
        let first_revision = state.bump_revision(id);
        let second_revision = state.bump_revision(id);
        state.object_mut(id).unwrap().name = "Second".to_string();

        let outcome = PersistenceOutcome::ObjectUpdated {
            object: first,
            revision: first_revision,
        };
        assert_eq!(state.reconcile(outcome), Reconciliation::Stale);
        assert_eq!(state.object(id).unwrap().name, "Second");

        let mut echo = state.object(id).unwrap().clone();
        echo.remote_id = Some(11);
        let outcome = PersistenceOutcome::ObjectUpdated {
            object: echo,
            revision: second_revision,
        };
        assert_eq!(state.reconcile(outcome), Reconciliation::Applied);
        assert_eq!(state.object(id).unwrap().remote_id, Some(11));
    }

    #[test]
    fn test_created_ack_sets_remote_id() {
        let (mut state, ids) = state_with_objects(1);
        let mut stored = state.object(ids[0]).unwrap().clone();
        stored.remote_id = Some(42);
        let outcome = PersistenceOutcome::ObjectCreated {
            object: stored,
            revision: 0,
        };
        assert_eq!(state.reconcile(outcome), Reconciliation::Applied);
        assert_eq!(state.object(ids[0]).unwrap().remote_id, Some(42));
    }

    #[test]
    fn test_failure_keeps_local_state() {
        let (mut state, ids) = state_with_objects(1);
        let before = state.snapshot();
        let outcome = PersistenceOutcome::Failed {
            label: "updateObject",
            error: crate::persistence::PersistenceError::Unavailable,
            refresh: None,
        };
        assert_eq!(state.reconcile(outcome), Reconciliation::Failed);
        assert_eq!(state.snapshot(), before);
        assert!(state.object(ids[0]).is_some());
    }

    #[test]
    fn test_undo_with_empty_history_is_noop() {
        let (mut state, _) = state_with_objects(1);
        let before = state.snapshot();
        assert!(!state.undo());
        assert!(!state.redo());
        assert_eq!(state.snapshot(), before);
    }

    fn update_ack(state: &EditorState, id: ObjectId, revision: u64) -> PersistenceOutcome {
        PersistenceOutcome::ObjectUpdated {
            object: state.object(id).unwrap().clone(),
            revision,
        }
    }

    #[test]
    fn test_rejected_command_keeps_revisions() {
        let (mut state, ids) = state_with_objects(2);
        state.object_mut(ids[1]).unwrap().locked = true;

        state
            .apply(&GeometryCommand::single("Move", ids[0], GeometryPatch::position(5.0, 5.0)))
            .unwrap();
        let sent = state.revision(ids[0]);
        state.take_outbox();

        let rejected = GeometryCommand {
            description: "Align left".to_string(),
            patches: vec![
                (ids[0], GeometryPatch::position(9.0, 9.0)),
                (ids[1], GeometryPatch::position(9.0, 9.0)),
            ],
        };
        assert!(state.apply(&rejected).is_err());
        assert_eq!(state.revision(ids[0]), sent);
        assert!(state.outbox().is_empty());

        assert_eq!(state.reconcile(update_ack(&state, ids[0], sent)), Reconciliation::Applied);
    }

    #[test]
    fn test_noop_command_keeps_revisions() {
        let (mut state, ids) = state_with_objects(1);
        let color = state.object(ids[0]).unwrap().properties["color"].clone();
        state
            .apply(&GeometryCommand::single("Move", ids[0], GeometryPatch::position(5.0, 5.0)))
            .unwrap();
        let sent = state.revision(ids[0]);
        state.take_outbox();

        state
            .apply(&UpdatePropertiesCommand {
                object_id: ids[0],
                properties: props_from([("color", color)]),
            })
            .unwrap();
        assert_eq!(state.revision(ids[0]), sent);
        assert!(state.outbox().is_empty());
        assert_eq!(state.reconcile(update_ack(&state, ids[0], sent)), Reconciliation::Applied);
    }

    #[test]
    fn test_undone_add_forgets_remote_id() {
        let mut state = EditorState::default();
        state.load_scenes(vec![Scene::new("Scene 1")]);
        state
            .apply(&AddObjectCommand {
                scene_id: None,
                kind: ObjectKind::Shape,
            })
            .unwrap();
        let id = state.selection().primary().unwrap();
        let mut stored = state.object(id).unwrap().clone();
        stored.remote_id = Some(7);
        let outcome = PersistenceOutcome::ObjectCreated {
            object: stored,
            revision: state.revision(id),
        };
        assert_eq!(state.reconcile(outcome), Reconciliation::Applied);

        assert!(state.undo());
        assert!(state.redo());
        assert_eq!(state.object(id).unwrap().remote_id, None);
        assert!(state.outbox().iter().any(|request| matches!(
            request,
            PersistenceRequest::CreateObject { object, .. } if object.id == id && object.remote_id.is_none()
        )));
    }

    #[test]
    fn test_refresh_keeps_newer_local_writes() {
        let (mut state, ids) = state_with_objects(2);
        let scene_id = state.selected_scene_id().unwrap();
        let mut stored = state.selected_scene().unwrap().clone();
        for object in &mut stored.objects {
            object.name = "Stored".to_string();
        }

        assert!(state.request_refresh(scene_id));
        let revision = match state.outbox().last() {
            Some(PersistenceRequest::FetchScene { revision, .. }) => *revision,
            other => panic!("unexpected request {other:?}"),
        };
        state
            .apply(&UpdatePropertiesCommand {
                object_id: ids[1],
                properties: props_from([("color", Value::from("#00FF00"))]),
            })
            .unwrap();

        let outcome = PersistenceOutcome::SceneFetched(SceneRefresh { scene: stored, revision });
        assert_eq!(state.reconcile(outcome), Reconciliation::Applied);
        assert_eq!(state.object(ids[0]).unwrap().name, "Stored");
        assert_ne!(state.object(ids[1]).unwrap().name, "Stored");
        assert_eq!(state.object(ids[1]).unwrap().properties["color"], "#00FF00");
    }

    #[test]
    fn test_refresh_after_failed_batch_restores_stored_order() {
        let (mut state, ids) = state_with_objects(3);
        let scene_id = state.selected_scene_id().unwrap();
        let stored = state.selected_scene().unwrap().clone();
        state
            .apply(&crate::ordering::ReorderObjectsCommand {
                scene_id: None,
                source: 0,
                destination: 2,
            })
            .unwrap();
        let revision = state.order_revision(scene_id);

        let outcome = PersistenceOutcome::Failed {
            label: "updateObjectOrders",
            error: crate::persistence::PersistenceError::Unavailable,
            refresh: Some(SceneRefresh { scene: stored, revision }),
        };
        assert_eq!(state.reconcile(outcome), Reconciliation::Failed);
        let order: Vec<ObjectId> = state.selected_scene().unwrap().objects.iter().map(|o| o.id).collect();
        assert_eq!(order, ids);
        assert!(crate::ordering::is_dense(&state.selected_scene().unwrap().objects));
    }
}
