//! Bounded undo/redo history of full document snapshots.
//!
//! `past` holds the state before each mutation, oldest first; `future` holds
//! states undone since the last mutation, most recent first. Pushing a new
//! entry always clears `future`. `past` never grows beyond `limit`; the oldest
//! snapshot is evicted instead.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::Document;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Undo/redo availability, reported to clients alongside state queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct UndoState {
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Document>,
    future: VecDeque<Document>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Record `previous` (the state about to be replaced) as the newest undo
    /// step and invalidate any redo history.
    pub fn push(&mut self, previous: Document) {
        self.past.push_back(previous);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        if !self.future.is_empty() {
            tracing::debug!(event = "history_redo_cleared", dropped = self.future.len());
            self.future.clear();
        }
    }

    /// Swap `current` with the most recent past snapshot. Returns false (and
    /// leaves `current` alone) when there is nothing to undo.
    pub fn undo(&mut self, current: &mut Document) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let undone = std::mem::replace(current, previous);
        self.future.push_front(undone);
        true
    }

    /// Swap `current` with the front of the redo list. Returns false when
    /// there is nothing to redo.
    pub fn redo(&mut self, current: &mut Document) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let redone = std::mem::replace(current, next);
        self.past.push_back(redone);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        true
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn undo_state(&self) -> UndoState {
        UndoState {
            can_undo: !self.past.is_empty(),
            can_redo: !self.future.is_empty(),
        }
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Snapshots available to undo, oldest first.
    pub fn past(&self) -> impl Iterator<Item = &Document> {
        self.past.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn named(name: &str) -> Document {
        let mut doc = Document::default();
        doc.name = name.to_string();
        doc
    }

    #[test]
    fn push_evicts_oldest_beyond_limit() {
        let mut history = History::new(50);
        let mut current = named("m0");
        // 55 mutations: before mutation i the state is "m{i-1}"
        for i in 1..=55 {
            history.push(current.clone());
            current = named(&format!("m{i}"));
        }
        assert_eq!(history.past_len(), 50);
        // Oldest retained is the state before mutation 6.
        assert_eq!(history.past().next().unwrap().name, "m5");
    }

    #[test]
    fn undo_then_redo_restores_latest() {
        let mut history = History::default();
        let mut current = named("a");
        history.push(current.clone());
        current = named("b");
        history.push(current.clone());
        current = named("c");

        assert!(history.undo(&mut current));
        assert_eq!(current.name, "b");
        assert!(history.redo(&mut current));
        assert_eq!(current.name, "c");
        assert_eq!(history.future_len(), 0);
    }

    #[test]
    fn undo_and_redo_on_empty_are_noops() {
        let mut history = History::default();
        let mut current = named("only");
        assert!(!history.undo(&mut current));
        assert!(!history.redo(&mut current));
        assert_eq!(current.name, "only");
    }

    #[test]
    fn new_push_after_undo_clears_future() {
        let mut history = History::default();
        let mut current = named("a");
        history.push(current.clone());
        current = named("b");
        assert!(history.undo(&mut current));
        assert!(history.undo_state().can_redo);

        history.push(current.clone());
        current = named("c");
        assert!(!history.undo_state().can_redo);
        assert!(!history.redo(&mut current));
        assert_eq!(current.name, "c");
    }
}
