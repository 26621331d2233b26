// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OnAir` Editor - broadcast overlay scene editor core
//!
//! Everything between raw input and the presentation layer:
//! - Scene graph store with a command-based mutation API
//! - Snapshot undo/redo with bounded depth
//! - Move/resize/rotate tools working in virtual canvas space
//! - Z-order management, alignment and placement helpers
//! - Persistence contract with revision-checked reconciliation
//! - Session facade wiring input, playback and evaluation together
//!
//! ## Architecture
//!
//! The time domain (timing windows, motions, playback) lives in
//! `onair_editor_sequencer`. This crate owns the editing domain. All
//! mutation is synchronous; storage runs on a tokio worker and is folded
//! back in on the next frame.

pub mod align;
pub mod commands;
pub mod config;
pub mod history;
pub mod memory;
pub mod model;
pub mod ordering;
pub mod persistence;
pub mod session;
pub mod state;
pub mod tools;

pub use commands::{CommandError, EditorCommand};
pub use config::EditorConfig;
pub use history::{EditorSnapshot, History, HistoryError};
pub use model::{Geometry, GeometryPatch, ObjectId, ObjectKind, Scene, SceneId, SceneObject};
pub use session::{EditorSession, Modifiers, ObjectFrame, SessionError, Shortcut};
pub use state::{EditorState, Reconciliation, Selection};
pub use tools::{PointerSample, ResizeHandle, SurfaceRect, TransformTool};
