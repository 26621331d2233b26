// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistence collaborator contract.
//!
//! The editor never waits on storage. Mutations queue [`PersistenceRequest`]s;
//! a [`PersistenceDispatcher`] feeds them in order to a [`SceneBackend`] on a
//! tokio runtime and hands [`PersistenceOutcome`]s back for reconciliation.

use crate::model::{ObjectId, Scene, SceneId, SceneObject};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Persistence errors
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    /// Target does not exist on the backend
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend rejected or failed the call
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend cannot be reached
    #[error("Backend unavailable")]
    Unavailable,

    /// The dispatcher worker has shut down
    #[error("Dispatcher channel closed")]
    ChannelClosed,
}

/// Result type for persistence calls
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Scene fields the backend stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Session identity
    pub id: SceneId,
    /// Backend identity, if known
    pub remote_id: Option<i64>,
    /// Display name
    pub name: String,
    /// Position in the scene list
    pub order: usize,
}

impl From<&Scene> for SceneRecord {
    fn from(scene: &Scene) -> Self {
        Self {
            id: scene.id,
            remote_id: scene.remote_id,
            name: scene.name.clone(),
            order: scene.order,
        }
    }
}

/// One `{id, order}` pair of an order batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    /// Object
    pub id: ObjectId,
    /// Backend identity, if known
    pub remote_id: Option<i64>,
    /// New rank
    pub order: usize,
}

/// Order batch for every object of a scene, in array order
pub fn order_entries(scene: &Scene) -> Vec<OrderEntry> {
    scene
        .objects
        .iter()
        .map(|object| OrderEntry {
            id: object.id,
            remote_id: object.remote_id,
            order: object.order,
        })
        .collect()
}

/// Local write revisions, all drawn from one monotonic counter.
///
/// Objects and scene orders each remember the revision of their latest
/// queued write, so a backend reply can be compared against newer local
/// edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionLedger {
    counter: u64,
    objects: HashMap<ObjectId, u64>,
    orders: HashMap<SceneId, u64>,
}

impl RevisionLedger {
    /// Allocate a revision for a write of `id`
    pub fn bump_object(&mut self, id: ObjectId) -> u64 {
        self.counter += 1;
        self.objects.insert(id, self.counter);
        self.counter
    }

    /// Allocate a revision for an order batch of `scene_id`
    pub fn bump_order(&mut self, scene_id: SceneId) -> u64 {
        self.counter += 1;
        self.orders.insert(scene_id, self.counter);
        self.counter
    }

    /// Latest revision of an object, `0` when never written
    pub fn object(&self, id: ObjectId) -> u64 {
        self.objects.get(&id).copied().unwrap_or(0)
    }

    /// Latest order revision of a scene, `0` when never reordered
    pub fn order(&self, scene_id: SceneId) -> u64 {
        self.orders.get(&scene_id).copied().unwrap_or(0)
    }

    /// Most recently allocated revision
    pub fn latest(&self) -> u64 {
        self.counter
    }
}

/// A queued write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PersistenceRequest {
    /// Create a scene
    CreateScene(SceneRecord),
    /// Rename/reorder a scene
    UpdateScene(SceneRecord),
    /// Delete a scene and its objects
    DeleteScene {
        /// Scene
        scene_id: SceneId,
    },
    /// Create an object
    CreateObject {
        /// Owning scene
        scene_id: SceneId,
        /// Full object
        object: SceneObject,
        /// Local revision the object was sent at
        revision: u64,
    },
    /// Overwrite an object
    UpdateObject {
        /// Owning scene
        scene_id: SceneId,
        /// Full object
        object: SceneObject,
        /// Local revision the object was sent at
        revision: u64,
    },
    /// Delete an object
    DeleteObject {
        /// Object
        object_id: ObjectId,
    },
    /// Store a new object order
    UpdateObjectOrders {
        /// Scene
        scene_id: SceneId,
        /// Order batch
        orders: Vec<OrderEntry>,
        /// Local revision the batch was sent at
        revision: u64,
    },
    /// Read a scene back to pick up the stored state
    FetchScene {
        /// Scene
        scene_id: SceneId,
        /// Latest local revision when the read was requested
        revision: u64,
    },
}

impl PersistenceRequest {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateScene(_) => "createScene",
            Self::UpdateScene(_) => "updateScene",
            Self::DeleteScene { .. } => "deleteScene",
            Self::CreateObject { .. } => "createObject",
            Self::UpdateObject { .. } => "updateObject",
            Self::DeleteObject { .. } => "deleteObject",
            Self::UpdateObjectOrders { .. } => "updateObjectOrders",
            Self::FetchScene { .. } => "getScene",
        }
    }
}

/// Stored copy of a scene, read back after a write
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRefresh {
    /// Backend copy
    pub scene: Scene,
    /// Local revision of the request that triggered the read; objects with a
    /// newer local write keep their local content
    pub revision: u64,
}

/// Result of a dispatched request
#[derive(Debug, Clone)]
pub enum PersistenceOutcome {
    /// Scene stored; backend identity assigned
    SceneCreated {
        /// Scene
        scene_id: SceneId,
        /// Backend identity
        remote_id: i64,
    },
    /// Object stored; `object` is the backend's copy
    ObjectCreated {
        /// Backend copy, including its identity
        object: SceneObject,
        /// Revision the request was sent at
        revision: u64,
    },
    /// Object overwritten; `object` is the backend's copy
    ObjectUpdated {
        /// Backend copy
        object: SceneObject,
        /// Revision the request was sent at
        revision: u64,
    },
    /// Scene read back
    SceneFetched(SceneRefresh),
    /// Any other write succeeded
    Completed {
        /// Request label
        label: &'static str,
    },
    /// The write failed
    Failed {
        /// Request label
        label: &'static str,
        /// Cause
        error: PersistenceError,
        /// Stored scene read back after a failed object write or order batch
        refresh: Option<SceneRefresh>,
    },
}

/// Storage backend for scenes and objects.
///
/// Calls return boxed futures so implementations may be remote; the editor
/// core never awaits them itself.
pub trait SceneBackend: Send + Sync {
    /// Create a scene, returning its backend identity
    fn create_scene(&self, scene: SceneRecord) -> BoxFuture<'static, Result<i64>>;

    /// Update scene name/order
    fn update_scene(&self, scene: SceneRecord) -> BoxFuture<'static, Result<()>>;

    /// Delete a scene
    fn delete_scene(&self, scene_id: SceneId) -> BoxFuture<'static, Result<()>>;

    /// Create an object, returning the stored copy
    fn create_object(&self, scene_id: SceneId, object: SceneObject) -> BoxFuture<'static, Result<SceneObject>>;

    /// Overwrite an object, returning the stored copy
    fn update_object(&self, object: SceneObject) -> BoxFuture<'static, Result<SceneObject>>;

    /// Delete an object
    fn delete_object(&self, object_id: ObjectId) -> BoxFuture<'static, Result<()>>;

    /// Store a new object order
    fn update_object_orders(&self, scene_id: SceneId, orders: Vec<OrderEntry>) -> BoxFuture<'static, Result<()>>;

    /// Read a scene back
    fn get_scene(&self, scene_id: SceneId) -> BoxFuture<'static, Result<Scene>>;
}

/// Target of the read-back that follows a failed write
fn refresh_target(request: &PersistenceRequest) -> Option<(SceneId, u64)> {
    match request {
        PersistenceRequest::UpdateObject {
            scene_id, revision, ..
        }
        | PersistenceRequest::UpdateObjectOrders {
            scene_id, revision, ..
        } => Some((*scene_id, *revision)),
        _ => None,
    }
}

/// Run one request against `backend`.
///
/// When an object write or order batch fails the scene is read back, so
/// the editor can fall in line with what is actually stored.
pub async fn execute(backend: &dyn SceneBackend, request: PersistenceRequest) -> PersistenceOutcome {
    let label = request.label();
    let target = refresh_target(&request);
    let result = match request {
        PersistenceRequest::CreateScene(record) => {
            let scene_id = record.id;
            backend
                .create_scene(record)
                .await
                .map(|remote_id| PersistenceOutcome::SceneCreated { scene_id, remote_id })
        }
        PersistenceRequest::UpdateScene(record) => backend
            .update_scene(record)
            .await
            .map(|()| PersistenceOutcome::Completed { label }),
        PersistenceRequest::DeleteScene { scene_id } => backend
            .delete_scene(scene_id)
            .await
            .map(|()| PersistenceOutcome::Completed { label }),
        PersistenceRequest::CreateObject {
            scene_id,
            object,
            revision,
        } => backend
            .create_object(scene_id, object)
            .await
            .map(|object| PersistenceOutcome::ObjectCreated { object, revision }),
        PersistenceRequest::UpdateObject {
            object, revision, ..
        } => backend
            .update_object(object)
            .await
            .map(|object| PersistenceOutcome::ObjectUpdated { object, revision }),
        PersistenceRequest::DeleteObject { object_id } => backend
            .delete_object(object_id)
            .await
            .map(|()| PersistenceOutcome::Completed { label }),
        PersistenceRequest::UpdateObjectOrders {
            scene_id, orders, ..
        } => backend
            .update_object_orders(scene_id, orders)
            .await
            .map(|()| PersistenceOutcome::Completed { label }),
        PersistenceRequest::FetchScene { scene_id, revision } => backend
            .get_scene(scene_id)
            .await
            .map(|scene| PersistenceOutcome::SceneFetched(SceneRefresh { scene, revision })),
    };

    let error = match result {
        Ok(outcome) => return outcome,
        Err(error) => error,
    };
    tracing::warn!("Persistence {} failed: {}", label, error);

    let refresh = match target {
        Some((scene_id, revision)) => match backend.get_scene(scene_id).await {
            Ok(scene) => Some(SceneRefresh { scene, revision }),
            Err(err) => {
                tracing::warn!("Reading back scene {:?} failed: {}", scene_id, err);
                None
            }
        },
        None => None,
    };
    PersistenceOutcome::Failed { label, error, refresh }
}

/// Feeds queued requests to a backend on a tokio runtime.
///
/// Requests are executed one at a time in submission order, so a create is
/// always stored before the updates that follow it.
pub struct PersistenceDispatcher {
    requests: mpsc::UnboundedSender<PersistenceRequest>,
    outcomes: mpsc::UnboundedReceiver<PersistenceOutcome>,
    in_flight: usize,
}

impl PersistenceDispatcher {
    /// Spawn the worker task on `handle`
    pub fn spawn(handle: &tokio::runtime::Handle, backend: Arc<dyn SceneBackend>) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<PersistenceRequest>();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        handle.spawn(async move {
            while let Some(request) = request_rx.recv().await {
                let outcome = execute(backend.as_ref(), request).await;
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
            tracing::debug!("Persistence worker stopped");
        });

        Self {
            requests: request_tx,
            outcomes: outcome_rx,
            in_flight: 0,
        }
    }

    /// Queue requests without waiting
    pub fn dispatch(&mut self, requests: impl IntoIterator<Item = PersistenceRequest>) -> Result<usize> {
        let mut sent = 0;
        for request in requests {
            tracing::debug!("Dispatching {}", request.label());
            self.requests
                .send(request)
                .map_err(|_| PersistenceError::ChannelClosed)?;
            sent += 1;
        }
        self.in_flight += sent;
        Ok(sent)
    }

    /// Outcomes that have arrived so far
    pub fn drain(&mut self) -> Vec<PersistenceOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.outcomes.try_recv() {
            outcomes.push(outcome);
        }
        self.in_flight = self.in_flight.saturating_sub(outcomes.len());
        outcomes
    }

    /// Wait for the next outcome
    pub async fn next_outcome(&mut self) -> Option<PersistenceOutcome> {
        let outcome = self.outcomes.recv().await;
        if outcome.is_some() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        outcome
    }

    /// Requests sent whose outcome has not been drained yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

/// Requests that bring the backend from `before` to `after`.
///
/// Used after undo/redo, where whole scenes are swapped at once. Every
/// write is sent at a fresh revision from `ledger`.
pub fn diff_scenes(before: &[Scene], after: &[Scene], ledger: &mut RevisionLedger) -> Vec<PersistenceRequest> {
    let mut requests = Vec::new();

    for old in before {
        if !after.iter().any(|scene| scene.id == old.id) {
            requests.push(PersistenceRequest::DeleteScene { scene_id: old.id });
        }
    }

    for scene in after {
        let Some(old) = before.iter().find(|candidate| candidate.id == scene.id) else {
            requests.push(PersistenceRequest::CreateScene(SceneRecord::from(scene)));
            for object in &scene.objects {
                requests.push(PersistenceRequest::CreateObject {
                    scene_id: scene.id,
                    object: object.clone(),
                    revision: ledger.bump_object(object.id),
                });
            }
            continue;
        };

        if old.name != scene.name || old.order != scene.order {
            requests.push(PersistenceRequest::UpdateScene(SceneRecord::from(scene)));
        }

        for object in &old.objects {
            if scene.object(object.id).is_none() {
                requests.push(PersistenceRequest::DeleteObject { object_id: object.id });
            }
        }

        let mut reordered = old.objects.len() != scene.objects.len();
        for object in &scene.objects {
            match old.object(object.id) {
                None => {
                    reordered = true;
                    requests.push(PersistenceRequest::CreateObject {
                        scene_id: scene.id,
                        object: object.clone(),
                        revision: ledger.bump_object(object.id),
                    });
                }
                Some(previous) => {
                    if previous.order != object.order {
                        reordered = true;
                    }
                    if previous != object {
                        requests.push(PersistenceRequest::UpdateObject {
                            scene_id: scene.id,
                            object: object.clone(),
                            revision: ledger.bump_object(object.id),
                        });
                    }
                }
            }
        }

        if reordered && !scene.objects.is_empty() {
            requests.push(PersistenceRequest::UpdateObjectOrders {
                scene_id: scene.id,
                orders: order_entries(scene),
                revision: ledger.bump_order(scene.id),
            });
        }
    }

    requests
}
