//! Linear snapshot history for undo/redo.
//!
//! The history stores full-document snapshots with a cursor pointing at the current one.
//! Saving while the cursor is not at the tail drops the redo branch; exceeding the size cap
//! evicts the oldest snapshot. The manager is synchronous: callers decide when to save.

use chrono::{DateTime, Utc};
use tracing::trace;

/// Default number of snapshots kept.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// One recorded document state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Full document text.
    pub content: String,
    /// When the snapshot was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Undo/redo availability summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    /// Can undo
    pub can_undo: bool,
    /// Can redo
    pub can_redo: bool,
    /// Number of stored snapshots
    pub depth: usize,
    /// Index of the current snapshot, if any
    pub position: Option<usize>,
}

/// Bounded linear undo/redo history.
#[derive(Debug, Clone)]
pub struct EditHistory {
    snapshots: Vec<Snapshot>,
    cursor: Option<usize>,
    max_size: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl EditHistory {
    /// Create an empty history keeping at most `max_size` snapshots (at least one).
    pub fn new(max_size: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: None,
            max_size: max_size.max(1),
        }
    }

    /// Record `content` as the new current state, dropping any redo branch.
    pub fn save_state(&mut self, content: &str) {
        self.save_state_at(content, Utc::now());
    }

    /// [`save_state`](Self::save_state) with an explicit timestamp.
    pub fn save_state_at(&mut self, content: &str, timestamp: DateTime<Utc>) {
        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        if keep < self.snapshots.len() {
            trace!(dropped = self.snapshots.len() - keep, "discarding redo branch");
            self.snapshots.truncate(keep);
        }

        self.snapshots.push(Snapshot {
            content: content.to_string(),
            timestamp,
        });
        let mut cursor = self.snapshots.len() - 1;

        if self.snapshots.len() > self.max_size {
            self.snapshots.remove(0);
            cursor -= 1;
            trace!(max = self.max_size, "evicted oldest snapshot");
        }

        self.cursor = Some(cursor);
    }

    /// Can undo
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    /// Can redo
    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|cursor| cursor + 1 < self.snapshots.len())
    }

    /// Step back; returns the content to show, or `None` if there is nothing to undo.
    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        let cursor = self.cursor? - 1;
        self.cursor = Some(cursor);
        Some(self.snapshots[cursor].content.as_str())
    }

    /// Step forward; returns the content to show, or `None` if there is nothing to redo.
    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        let cursor = self.cursor? + 1;
        self.cursor = Some(cursor);
        Some(self.snapshots[cursor].content.as_str())
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }

    /// The current snapshot's content.
    pub fn current(&self) -> Option<&str> {
        self.cursor
            .and_then(|cursor| self.snapshots.get(cursor))
            .map(|snapshot| snapshot.content.as_str())
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// `true` if nothing has been saved since creation or the last [`clear`](Self::clear).
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Size cap.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Stored snapshots, oldest first.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Availability summary.
    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            depth: self.snapshots.len(),
            position: self.cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        let mut history = EditHistory::default();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(history.state().position, None);
    }

    #[test]
    fn test_save_after_undo_discards_redo() {
        let mut history = EditHistory::default();
        history.save_state("A");
        history.save_state("AB");
        assert_eq!(history.undo(), Some("A"));

        history.save_state("A");
        assert!(!history.can_redo());
        assert!(history.can_undo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), Some("A"));
        assert_eq!(history.snapshots()[0].content, "A");
    }

    #[test]
    fn test_clear_resets_cursor() {
        let mut history = EditHistory::new(3);
        history.save_state("x");
        history.save_state("y");
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.current(), None);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_zero_cap_is_raised_to_one() {
        let mut history = EditHistory::new(0);
        history.save_state("a");
        history.save_state("b");

        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), Some("b"));
        assert!(!history.can_undo());
    }
}
