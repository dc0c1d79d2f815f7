//! Per-record history stack.
//!
//! An ordered chain of archived snapshots, newest at the head,
//! earliest at the tail. The stack is acyclic, appends and pops only
//! at the head, and never shares nodes with another stack. A separate
//! cursor may reference a position in a *different* record's stack:
//! it drives the cross-record undo preview where an EDIT record steps
//! through its CORE base's own history.

/// History stack for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History<V> {
    /// Archived snapshots; head (newest) at the back.
    stack: Vec<V>,
    /// Preview position in the base record's stack, counted from the
    /// head: `Some(0)` is the base's newest archived entry. `None`
    /// means the record shows live values.
    cursor: Option<usize>,
}

impl<V: Clone + PartialEq> History<V> {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stack: Vec::new(),
            cursor: None,
        }
    }

    /// Archives a snapshot as the new head.
    pub fn push(&mut self, snapshot: V) {
        self.stack.push(snapshot);
    }

    /// Discards the head if `current` equals it, keeping the stack
    /// free of no-op entries.
    ///
    /// Returns `false` when the head was discarded (no net change)
    /// and `true` when the head was kept. Keeping the head resets the
    /// cross-record cursor unless the step was cursor-driven.
    pub fn maybe_pop(&mut self, current: &V, cursor_driven: bool) -> bool {
        if self.stack.last() == Some(current) {
            self.stack.pop();
            return false;
        }
        if !cursor_driven {
            self.cursor = None;
        }
        true
    }

    /// Pops the head snapshot, if any.
    pub fn pop(&mut self) -> Option<V> {
        self.stack.pop()
    }

    /// Returns the head (newest archived) snapshot.
    #[must_use]
    pub fn head(&self) -> Option<&V> {
        self.stack.last()
    }

    /// Returns the earliest archived snapshot.
    #[must_use]
    pub fn original(&self) -> Option<&V> {
        self.stack.first()
    }

    /// Returns the snapshot `offset` steps from the head; offset 0 is
    /// the head itself.
    #[must_use]
    pub fn from_head(&self, offset: usize) -> Option<&V> {
        let len = self.stack.len();
        if offset >= len {
            None
        } else {
            self.stack.get(len - 1 - offset)
        }
    }

    /// Returns the number of archived snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` if nothing is archived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Discards every archived snapshot and the cursor.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.cursor = None;
    }

    /// Replaces the whole stack with a single entry.
    ///
    /// Used by UPDATE extraction and rebase, which collapse an edit
    /// history into one before/after delta.
    pub fn reset_to(&mut self, snapshot: V) {
        self.stack.clear();
        self.stack.push(snapshot);
        self.cursor = None;
    }

    /// Returns the cross-record preview cursor.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Sets the cross-record preview cursor.
    pub fn set_cursor(&mut self, cursor: Option<usize>) {
        self.cursor = cursor;
    }
}
