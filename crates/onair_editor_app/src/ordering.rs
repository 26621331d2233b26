// SPDX-License-Identifier: MIT OR Apache-2.0
//! Z-order management.
//!
//! Objects of a scene are stored back to front; `order` always equals the
//! array position. Every change forwards the full order list to
//! persistence as one batch.

use crate::commands::{CommandError, EditorCommand};
use crate::model::{ObjectId, Scene, SceneId, SceneObject};
use crate::persistence::{PersistenceRequest, SceneRecord};
use crate::state::EditorState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordering errors
#[derive(Debug, Error)]
pub enum OrderingError {
    /// Index past the end of the list
    #[error("Index {index} out of range for {len} items")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// List length
        len: usize,
    },

    /// A locked object cannot be moved by reordering
    #[error("Object {0:?} is locked")]
    Locked(ObjectId),
}

/// Direction of a neighbour swap, in array terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Towards the end of the array (front of the z-order)
    Up,
    /// Towards the start of the array (back of the z-order)
    Down,
}

/// Rewrite every `order` from its array position
pub fn renumber(objects: &mut [SceneObject]) {
    for (index, object) in objects.iter_mut().enumerate() {
        object.order = index;
    }
}

/// Rewrite every scene `order` from its list position
pub fn renumber_scenes(scenes: &mut [Scene]) {
    for (index, scene) in scenes.iter_mut().enumerate() {
        scene.order = index;
    }
}

/// Check that orders are exactly `0..N` in array order
pub fn is_dense(objects: &[SceneObject]) -> bool {
    objects
        .iter()
        .enumerate()
        .all(|(index, object)| object.order == index)
}

fn ensure_unlocked(objects: &[SceneObject], indices: [usize; 2]) -> Result<(), OrderingError> {
    for index in indices {
        if let Some(object) = objects.get(index).filter(|object| object.locked) {
            return Err(OrderingError::Locked(object.id));
        }
    }
    Ok(())
}

/// Swap the object at `index` with its neighbour.
///
/// Returns false at the boundary, leaving the list untouched. Rejected when
/// either object is locked.
pub fn swap(objects: &mut [SceneObject], index: usize, direction: OrderDirection) -> Result<bool, OrderingError> {
    let neighbour = match direction {
        OrderDirection::Up => index.checked_add(1),
        OrderDirection::Down => index.checked_sub(1),
    };
    let Some(neighbour) = neighbour.filter(|n| *n < objects.len() && index < objects.len()) else {
        return Ok(false);
    };
    ensure_unlocked(objects, [index, neighbour])?;
    objects.swap(index, neighbour);
    renumber(objects);
    Ok(true)
}

/// Remove the item at `source` and reinsert it at `destination`
pub fn move_item<T>(items: &mut Vec<T>, source: usize, destination: usize) -> Result<bool, OrderingError> {
    let len = items.len();
    for index in [source, destination] {
        if index >= len {
            return Err(OrderingError::IndexOutOfRange { index, len });
        }
    }
    if source == destination {
        return Ok(false);
    }
    let item = items.remove(source);
    items.insert(destination, item);
    Ok(true)
}

/// Drag-to-reorder: move `source` to `destination`, then renumber.
///
/// Rejected when either end of the move is locked.
pub fn reorder(objects: &mut Vec<SceneObject>, source: usize, destination: usize) -> Result<bool, OrderingError> {
    ensure_unlocked(objects, [source, destination])?;
    let moved = move_item(objects, source, destination)?;
    renumber(objects);
    Ok(moved)
}

/// Move an object one step up or down
#[derive(Debug, Clone)]
pub struct SwapObjectCommand {
    /// Object to move
    pub object_id: ObjectId,
    /// Direction in array terms
    pub direction: OrderDirection,
}

impl EditorCommand for SwapObjectCommand {
    fn description(&self) -> String {
        match self.direction {
            OrderDirection::Up => "Move forward".to_string(),
            OrderDirection::Down => "Move backward".to_string(),
        }
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let scene_id = state
            .scene_of(self.object_id)
            .ok_or(CommandError::ObjectNotFound(self.object_id))?;
        let scene = state.scene_mut(scene_id)?;
        let index = scene
            .index_of(self.object_id)
            .ok_or(CommandError::ObjectNotFound(self.object_id))?;
        if !swap(&mut scene.objects, index, self.direction)? {
            tracing::debug!("Object already at the boundary");
            return Ok(());
        }
        state.orders_changed(scene_id)
    }
}

/// Move an object to an arbitrary position in the z-order
#[derive(Debug, Clone)]
pub struct ReorderObjectsCommand {
    /// Scene to reorder; the selected scene when `None`
    pub scene_id: Option<SceneId>,
    /// Current array position
    pub source: usize,
    /// Target array position
    pub destination: usize,
}

impl EditorCommand for ReorderObjectsCommand {
    fn description(&self) -> String {
        "Reorder objects".to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let scene_id = state.target_scene(self.scene_id)?;
        let scene = state.scene_mut(scene_id)?;
        if !reorder(&mut scene.objects, self.source, self.destination)? {
            return Ok(());
        }
        state.orders_changed(scene_id)
    }
}

/// Move a scene to another position in the scene list
#[derive(Debug, Clone)]
pub struct ReorderScenesCommand {
    /// Current list position
    pub source: usize,
    /// Target list position
    pub destination: usize,
}

impl EditorCommand for ReorderScenesCommand {
    fn description(&self) -> String {
        "Reorder scenes".to_string()
    }

    fn execute(&self, state: &mut EditorState) -> Result<(), CommandError> {
        let before: Vec<(SceneId, usize)> = state.scenes().iter().map(|s| (s.id, s.order)).collect();
        let scenes = state.scenes_mut();
        if !move_item(scenes, self.source, self.destination)? {
            return Ok(());
        }
        renumber_scenes(scenes);
        let changed: Vec<SceneRecord> = state
            .scenes()
            .iter()
            .filter(|scene| !before.contains(&(scene.id, scene.order)))
            .map(SceneRecord::from)
            .collect();
        for record in changed {
            state.queue(PersistenceRequest::UpdateScene(record));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectKind;
    use proptest::prelude::*;

    fn objects(count: usize) -> Vec<SceneObject> {
        let mut objects: Vec<SceneObject> = (0..count)
            .map(|i| SceneObject::new(ObjectKind::Shape).with_name(format!("obj {i}")))
            .collect();
        renumber(&mut objects);
        objects
    }

    fn names(objects: &[SceneObject]) -> Vec<&str> {
        objects.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn test_reorder_first_to_last() {
        let mut list = objects(3);
        assert!(reorder(&mut list, 0, 2).unwrap());
        assert_eq!(names(&list), vec!["obj 1", "obj 2", "obj 0"]);
        assert!(is_dense(&list));
    }

    #[test]
    fn test_swap_boundaries_are_noops() {
        let mut list = objects(3);
        assert!(!swap(&mut list, 2, OrderDirection::Up).unwrap());
        assert!(!swap(&mut list, 0, OrderDirection::Down).unwrap());
        assert!(swap(&mut list, 0, OrderDirection::Up).unwrap());
        assert_eq!(names(&list), vec!["obj 1", "obj 0", "obj 2"]);
        assert!(is_dense(&list));
    }

    #[test]
    fn test_reorder_rejects_locked() {
        let mut list = objects(3);
        list[2].locked = true;
        assert!(matches!(reorder(&mut list, 0, 2), Err(OrderingError::Locked(_))));
        assert_eq!(names(&list), vec!["obj 0", "obj 1", "obj 2"]);
    }

    #[test]
    fn test_swap_rejects_locked() {
        let mut list = objects(3);
        list[1].locked = true;
        assert!(matches!(swap(&mut list, 0, OrderDirection::Up), Err(OrderingError::Locked(_))));
        assert!(matches!(swap(&mut list, 1, OrderDirection::Down), Err(OrderingError::Locked(_))));
        assert_eq!(names(&list), vec!["obj 0", "obj 1", "obj 2"]);
    }

    #[test]
    fn test_swap_command_keeps_locked_in_place() {
        let mut scene = Scene::new("Main");
        scene.objects = objects(2);
        scene.objects[0].locked = true;
        let locked = scene.objects[0].id;
        let mut state = EditorState::default();
        state.load_scenes(vec![scene]);

        let result = state.apply(&SwapObjectCommand {
            object_id: locked,
            direction: OrderDirection::Up,
        });
        assert!(matches!(
            result,
            Err(CommandError::Ordering(OrderingError::Locked(id))) if id == locked
        ));
        assert_eq!(state.selected_scene().unwrap().objects[0].id, locked);
        assert!(state.outbox().is_empty());
        assert!(!state.can_undo());
    }

    #[test]
    fn test_reorder_out_of_range() {
        let mut list = objects(2);
        assert!(matches!(
            reorder(&mut list, 0, 5),
            Err(OrderingError::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_reorder_command_queues_batch() {
        let mut scene = Scene::new("Main");
        scene.objects = objects(3);
        let mut state = EditorState::default();
        state.load_scenes(vec![scene]);

        state
            .apply(&ReorderObjectsCommand {
                scene_id: None,
                source: 0,
                destination: 2,
            })
            .unwrap();
        assert!(matches!(
            state.outbox().last(),
            Some(PersistenceRequest::UpdateObjectOrders { orders, revision, .. })
                if orders.len() == 3 && *revision == state.order_revision(state.selected_scene_id().unwrap())
        ));
        assert!(state.can_undo());
    }

    #[test]
    fn test_scene_reorder_renumbers() {
        let scenes: Vec<Scene> = (0..3).map(|i| Scene::new(format!("Scene {}", i + 1))).collect();
        let mut state = EditorState::default();
        state.load_scenes(scenes);
        state
            .apply(&ReorderScenesCommand {
                source: 2,
                destination: 0,
            })
            .unwrap();
        let order: Vec<(&str, usize)> = state.scenes().iter().map(|s| (s.name.as_str(), s.order)).collect();
        assert_eq!(order, vec![("Scene 3", 0), ("Scene 1", 1), ("Scene 2", 2)]);
    }

    proptest! {
        #[test]
        fn prop_orders_stay_dense(
            count in 1usize..12,
            moves in prop::collection::vec((0usize..12, 0usize..12, any::<bool>()), 0..20),
        ) {
            let mut list = objects(count);
            for (a, b, as_swap) in moves {
                if as_swap {
                    let direction = if b % 2 == 0 { OrderDirection::Up } else { OrderDirection::Down };
                    swap(&mut list, a % count, direction).unwrap();
                } else {
                    reorder(&mut list, a % count, b % count).unwrap();
                }
                prop_assert!(is_dense(&list));
            }
            prop_assert_eq!(list.len(), count);
        }
    }
}
