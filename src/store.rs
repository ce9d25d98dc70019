//! The host-owned document plus its undo history.
//!
//! [`DocumentStore::mutate`] is the single tracked mutation entry point: the
//! change is applied to a working copy and only committed, with the prior
//! state pushed onto history, if it succeeds. A failed command never leaves
//! the document half-edited.

use crate::error::AppError;
use crate::history::{History, UndoState};
use crate::model::Document;

/// Everything a batch needs to put back on rollback: the document and the
/// history stacks as they were before the batch started.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    document: Document,
    history: History,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    document: Document,
    history: History,
}

impl DocumentStore {
    pub fn new(document: Document, history_limit: usize) -> Self {
        Self {
            document,
            history: History::new(history_limit),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn undo_state(&self) -> UndoState {
        self.history.undo_state()
    }

    /// Apply `f` atomically and record one undo step if it succeeds.
    pub fn mutate<F, R>(&mut self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut Document) -> Result<R, AppError>,
    {
        let mut working = self.document.clone();
        let result = f(&mut working)?;
        let previous = std::mem::replace(&mut self.document, working);
        self.history.push(previous);
        Ok(result)
    }

    /// Replace the document wholesale (new canvas, load) and start a fresh history.
    pub fn replace(&mut self, document: Document) {
        self.document = document;
        self.history.clear();
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.document)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.document)
    }

    /// Deep, independent copy of the document and history.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            document: self.document.clone(),
            history: self.history.clone(),
        }
    }

    /// Put back a checkpoint. Consumes it, so a checkpoint restores at most once.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.document = checkpoint.document;
        self.history = checkpoint.history;
    }
}
