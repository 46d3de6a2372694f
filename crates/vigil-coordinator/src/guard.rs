//! The unsaved-work guard: shared dirty state across editing surfaces.
//!
//! Editing components mark individual fields dirty as the user types and
//! clean again on save or discard. The coordinator consults the guard
//! before a forced logout and clears it wholesale right before one, so
//! no per-field flag survives the navigation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Ambient dirty-state context. Cheap to clone; all clones share the
/// same underlying set, so any editing surface and the coordinator see
/// the same answer.
#[derive(Debug, Clone, Default)]
pub struct UnsavedWorkGuard {
    dirty: Arc<Mutex<HashSet<String>>>,
}

impl UnsavedWorkGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one field (or document section) as having unsaved edits.
    pub fn mark_dirty(&self, field: impl Into<String>) {
        self.fields().insert(field.into());
    }

    /// Marks one field as saved/discarded.
    pub fn mark_clean(&self, field: &str) {
        self.fields().remove(field);
    }

    /// Whether any editing surface currently has uncommitted edits.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.fields().is_empty()
    }

    /// Number of dirty fields. Mostly for logging.
    pub fn dirty_count(&self) -> usize {
        self.fields().len()
    }

    /// Drops every dirty flag. Invoked by the coordinator immediately
    /// before a forced logout.
    pub fn clear_all(&self) {
        let mut fields = self.fields();
        if !fields.is_empty() {
            tracing::debug!(count = fields.len(), "clearing unsaved-change flags");
            fields.clear();
        }
    }

    /// A poisoned lock only means an editor task panicked mid-update;
    /// the set itself is still usable.
    fn fields(&self) -> MutexGuard<'_, HashSet<String>> {
        self.dirty.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =========================================================================
// Tests
// =========================================================================
