use log::debug;

use crate::document::Document;

/// Default number of snapshots the history keeps, counting the current one.
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Capped linear undo/redo log of document snapshots.
///
/// Entries are whole sanitized documents; selection and other transient UI
/// focus never enter the log. Pushing past capacity silently evicts the oldest
/// entry — lossy by design.
#[derive(Debug, Clone)]
pub struct BoundedHistory {
    entries: Vec<Document>,
    /// Index of the current snapshot in `entries`.
    cursor: usize,
    capacity: usize,
}

impl BoundedHistory {
    pub fn new(initial: Document) -> Self {
        Self::with_capacity(initial, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(initial: Document, capacity: usize) -> Self {
        assert!(capacity >= 1);
        Self {
            entries: vec![initial.sanitized()],
            cursor: 0,
            capacity,
        }
    }

    /// The committed state all readers observe outside a gesture.
    pub fn current(&self) -> &Document {
        &self.entries[self.cursor]
    }

    pub fn current_mut(&mut self) -> &mut Document {
        &mut self.entries[self.cursor]
    }

    /// Appends a snapshot after the current position, discarding any redo
    /// entries beyond it and evicting the oldest entry once over capacity.
    pub fn push(&mut self, next: Document) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(next.sanitized());
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
        debug!(
            "history push: {} entries, cursor {}",
            self.entries.len(),
            self.cursor
        );
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Steps back one snapshot and returns it; `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&Document> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Steps forward one snapshot and returns it; `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&Document> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    /// Number of snapshots currently held, the current one included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        false // always holds at least the current snapshot
    }
}
