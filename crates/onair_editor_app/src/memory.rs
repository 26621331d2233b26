// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-process scene backend.

use crate::model::{ObjectId, Scene, SceneId, SceneObject};
use crate::persistence::{OrderEntry, PersistenceError, Result, SceneBackend, SceneRecord};
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Store {
    scenes: IndexMap<SceneId, Scene>,
    next_remote_id: i64,
    offline: bool,
    read_only: bool,
    calls: usize,
}

impl Store {
    fn assign_id(&mut self) -> i64 {
        self.next_remote_id += 1;
        self.next_remote_id
    }

    fn check_online(&mut self) -> Result<()> {
        self.calls += 1;
        if self.offline {
            Err(PersistenceError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn check_writable(&mut self) -> Result<()> {
        self.check_online()?;
        if self.read_only {
            Err(PersistenceError::Backend("store is read-only".to_string()))
        } else {
            Ok(())
        }
    }

    fn find_object(&mut self, id: ObjectId) -> Option<(&mut Scene, usize)> {
        self.scenes.values_mut().find_map(|scene| {
            let index = scene.index_of(id)?;
            Some((scene, index))
        })
    }
}

/// Backend keeping everything in memory; cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with [`PersistenceError::Unavailable`]
    pub fn set_offline(&self, offline: bool) {
        self.store.lock().offline = offline;
    }

    /// Make every following write fail while reads keep working
    pub fn set_read_only(&self, read_only: bool) {
        self.store.lock().read_only = read_only;
    }

    /// Number of calls received
    pub fn calls(&self) -> usize {
        self.store.lock().calls
    }

    /// Copy of a stored scene
    pub fn scene(&self, scene_id: SceneId) -> Option<Scene> {
        self.store.lock().scenes.get(&scene_id).cloned()
    }

    /// Copy of a stored object
    pub fn object(&self, object_id: ObjectId) -> Option<SceneObject> {
        let mut store = self.store.lock();
        let object = store
            .find_object(object_id)
            .map(|(scene, index)| scene.objects[index].clone());
        object
    }

    fn read<T: Send + 'static>(&self, call: impl FnOnce(&mut Store) -> Result<T>) -> BoxFuture<'static, Result<T>> {
        let mut store = self.store.lock();
        let result = store.check_online().and_then(|()| call(&mut *store));
        future::ready(result).boxed()
    }

    fn write<T: Send + 'static>(&self, call: impl FnOnce(&mut Store) -> Result<T>) -> BoxFuture<'static, Result<T>> {
        let mut store = self.store.lock();
        let result = store.check_writable().and_then(|()| call(&mut *store));
        future::ready(result).boxed()
    }
}

impl SceneBackend for MemoryBackend {
    fn create_scene(&self, record: SceneRecord) -> BoxFuture<'static, Result<i64>> {
        self.write(move |store| {
            let remote_id = store.assign_id();
            let mut scene = Scene::new(record.name);
            scene.id = record.id;
            scene.remote_id = Some(remote_id);
            scene.order = record.order;
            store.scenes.insert(record.id, scene);
            Ok(remote_id)
        })
    }

    fn update_scene(&self, record: SceneRecord) -> BoxFuture<'static, Result<()>> {
        self.write(move |store| {
            let scene = store
                .scenes
                .get_mut(&record.id)
                .ok_or_else(|| PersistenceError::NotFound(format!("scene {:?}", record.id)))?;
            scene.name = record.name;
            scene.order = record.order;
            Ok(())
        })
    }

    fn delete_scene(&self, scene_id: SceneId) -> BoxFuture<'static, Result<()>> {
        self.write(move |store| {
            store
                .scenes
                .shift_remove(&scene_id)
                .map(|_| ())
                .ok_or_else(|| PersistenceError::NotFound(format!("scene {scene_id:?}")))
        })
    }

    fn create_object(&self, scene_id: SceneId, object: SceneObject) -> BoxFuture<'static, Result<SceneObject>> {
        self.write(move |store| {
            let remote_id = store.assign_id();
            let scene = store
                .scenes
                .get_mut(&scene_id)
                .ok_or_else(|| PersistenceError::NotFound(format!("scene {scene_id:?}")))?;
            let mut stored = object;
            stored.remote_id = Some(remote_id);
            scene.objects.retain(|existing| existing.id != stored.id);
            scene.objects.push(stored.clone());
            Ok(stored)
        })
    }

    fn update_object(&self, object: SceneObject) -> BoxFuture<'static, Result<SceneObject>> {
        self.write(move |store| {
            let (scene, index) = store
                .find_object(object.id)
                .ok_or_else(|| PersistenceError::NotFound(format!("object {:?}", object.id)))?;
            let remote_id = scene.objects[index].remote_id;
            let mut stored = object;
            stored.remote_id = remote_id;
            scene.objects[index] = stored.clone();
            Ok(stored)
        })
    }

    fn delete_object(&self, object_id: ObjectId) -> BoxFuture<'static, Result<()>> {
        self.write(move |store| {
            let (scene, index) = store
                .find_object(object_id)
                .ok_or_else(|| PersistenceError::NotFound(format!("object {object_id:?}")))?;
            scene.objects.remove(index);
            Ok(())
        })
    }

    fn update_object_orders(&self, scene_id: SceneId, orders: Vec<OrderEntry>) -> BoxFuture<'static, Result<()>> {
        self.write(move |store| {
            let scene = store
                .scenes
                .get_mut(&scene_id)
                .ok_or_else(|| PersistenceError::NotFound(format!("scene {scene_id:?}")))?;
            for entry in &orders {
                if let Some(object) = scene.object_mut(entry.id) {
                    object.order = entry.order;
                }
            }
            scene.objects.sort_by_key(|object| object.order);
            Ok(())
        })
    }

    fn get_scene(&self, scene_id: SceneId) -> BoxFuture<'static, Result<Scene>> {
        self.read(move |store| {
            store
                .scenes
                .get(&scene_id)
                .cloned()
                .ok_or_else(|| PersistenceError::NotFound(format!("scene {scene_id:?}")))
        })
    }
}
