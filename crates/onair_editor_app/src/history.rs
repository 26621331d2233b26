// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of full scene-graph snapshots.
//!
//! Each entry holds a deep copy of every scene plus the selection at the
//! moment before a mutation. Depth is bounded; the oldest entry is evicted
//! first.

use crate::model::{ObjectId, Scene, SceneId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Default maximum undo history depth
pub const MAX_HISTORY: usize = 50;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Snapshot exceeds the configured size limit
    #[error("Snapshot of {size} bytes exceeds the {limit} byte limit")]
    SnapshotTooLarge {
        /// Encoded size
        size: usize,
        /// Configured limit
        limit: u64,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Unique operation ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationID(u64);

impl OperationID {
    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Editor state captured for undo/redo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    /// Deep copy of all scenes
    pub scenes: Vec<Scene>,
    /// Selected scene
    pub selected_scene: Option<SceneId>,
    /// Primary selected object
    pub selected_object: Option<ObjectId>,
}

impl EditorSnapshot {
    /// Encoded size in bytes
    pub fn encoded_size(&self) -> Result<usize> {
        Ok(bincode::serialized_size(self)? as usize)
    }
}

/// One undoable step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Unique operation ID
    pub id: OperationID,
    /// Human-readable description
    pub description: String,
    /// State to go back to
    pub snapshot: EditorSnapshot,
    /// Encoded size of the snapshot
    pub size: usize,
    /// Seconds since the epoch when captured
    pub timestamp: u64,
}

/// History statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries in the undo stack
    pub undo_count: usize,
    /// Entries in the redo stack
    pub redo_count: usize,
    /// Total encoded size of all snapshots (bytes)
    pub memory_used: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    next_id: u64,
    max_depth: usize,
    max_snapshot_bytes: Option<u64>,
    memory_used: usize,
}

impl History {
    /// Create a history with the default depth
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            next_id: 1,
            max_depth: max_depth.max(1),
            max_snapshot_bytes: None,
            memory_used: 0,
        }
    }

    /// Refuse snapshots whose encoded size exceeds `limit` bytes
    pub fn with_snapshot_limit(mut self, limit: Option<u64>) -> Self {
        self.max_snapshot_bytes = limit;
        self
    }

    fn entry(&mut self, description: &str, snapshot: EditorSnapshot) -> Result<HistoryEntry> {
        let size = snapshot.encoded_size()?;
        if let Some(limit) = self.max_snapshot_bytes.filter(|limit| size as u64 > *limit) {
            return Err(HistoryError::SnapshotTooLarge { size, limit });
        }
        let id = OperationID(self.next_id);
        self.next_id += 1;
        Ok(HistoryEntry {
            id,
            description: description.to_string(),
            snapshot,
            size,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        })
    }

    /// Begin an operation from the state before a mutation.
    ///
    /// Nothing is recorded until the entry is passed to [`History::commit`].
    pub fn begin_operation(&mut self, description: &str, before: EditorSnapshot) -> Result<HistoryEntry> {
        self.entry(description, before)
    }

    /// Record a begun operation. Clears the redo stack.
    pub fn commit(&mut self, entry: HistoryEntry) -> OperationID {
        let id = entry.id;

        for dropped in self.redo_stack.drain(..) {
            self.memory_used = self.memory_used.saturating_sub(dropped.size);
        }

        tracing::debug!("History commit #{}: {}", id.value(), entry.description);
        self.memory_used += entry.size;
        self.undo_stack.push_back(entry);
        Self::enforce_limit(&mut self.undo_stack, self.max_depth, &mut self.memory_used);
        id
    }

    /// Record the state from before a mutation. Clears the redo stack.
    pub fn push(&mut self, description: &str, before: EditorSnapshot) -> Result<OperationID> {
        let entry = self.begin_operation(description, before)?;
        Ok(self.commit(entry))
    }

    /// Step back. `current` is kept for redo; the returned snapshot is the
    /// state to restore.
    ///
    /// When `current` cannot be recorded the undo stack is left untouched.
    pub fn undo(&mut self, current: EditorSnapshot) -> Result<EditorSnapshot> {
        let description = match self.undo_stack.back() {
            Some(entry) => entry.description.clone(),
            None => return Err(HistoryError::NothingToUndo),
        };
        let redo = self.entry(&description, current)?;
        let entry = self
            .undo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToUndo)?;
        self.memory_used = self.memory_used.saturating_sub(entry.size);

        self.memory_used += redo.size;
        self.redo_stack.push_back(redo);
        Self::enforce_limit(&mut self.redo_stack, self.max_depth, &mut self.memory_used);

        tracing::info!("Undo: {}", entry.description);
        Ok(entry.snapshot)
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, current: EditorSnapshot) -> Result<EditorSnapshot> {
        let description = match self.redo_stack.back() {
            Some(entry) => entry.description.clone(),
            None => return Err(HistoryError::NothingToRedo),
        };
        let undo = self.entry(&description, current)?;
        let entry = self
            .redo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToRedo)?;
        self.memory_used = self.memory_used.saturating_sub(entry.size);

        self.memory_used += undo.size;
        self.undo_stack.push_back(undo);
        Self::enforce_limit(&mut self.undo_stack, self.max_depth, &mut self.memory_used);

        tracing::info!("Redo: {}", entry.description);
        Ok(entry.snapshot)
    }

    fn enforce_limit(stack: &mut VecDeque<HistoryEntry>, max_depth: usize, memory_used: &mut usize) {
        while stack.len() > max_depth {
            if let Some(old) = stack.pop_front() {
                *memory_used = memory_used.saturating_sub(old.size);
            }
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.memory_used = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            memory_used: self.memory_used,
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
