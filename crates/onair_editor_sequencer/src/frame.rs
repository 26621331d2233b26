// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame work coalescing.

/// Holds at most one pending unit of work for the next animation frame.
///
/// Scheduling while work is already pending replaces it, so a burst of
/// pointer moves between two frames costs one recomputation.
#[derive(Debug, Clone)]
pub struct FrameSlot<T> {
    pending: Option<T>,
    replaced: u64,
}

impl<T> FrameSlot<T> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self {
            pending: None,
            replaced: 0,
        }
    }

    /// Schedule `work`, replacing anything still pending
    pub fn schedule(&mut self, work: T) {
        if self.pending.replace(work).is_some() {
            self.replaced += 1;
        }
    }

    /// Take the pending work when the frame fires
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Drop pending work
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether work is pending
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// How many scheduled items were superseded before running
    pub fn replaced(&self) -> u64 {
        self.replaced
    }
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
