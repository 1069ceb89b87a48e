//! Undo/redo.
//!
//! Each entry stores enough state to be applied and reverted exactly:
//! structural edits keep the object and its index, edits in place keep the
//! before/after snapshot.

use tracing::debug;

use crate::document::{Background, Document};
use crate::error::{EditorError, Result};
use crate::objects::SceneObject;
use crate::types::ObjectId;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Add { index: usize, object: SceneObject },
    Remove { index: usize, object: SceneObject },
    Reorder { id: ObjectId, from: usize, to: usize },
    Update { before: SceneObject, after: SceneObject },
    SetBackground { before: Background, after: Background },
    Resize { before: (u32, u32), after: (u32, u32) },
}

impl Command {
    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        match self {
            Command::Add { index, object } => doc.insert_object(*index, object.clone()),
            Command::Remove { object, .. } => doc.remove_object(object.id).map(|_| ()),
            Command::Reorder { id, from, to } => move_checked(doc, *id, *from, *to),
            Command::Update { after, .. } => doc.replace_object(after.clone()).map(|_| ()),
            Command::SetBackground { after, .. } => {
                doc.set_background(after.clone());
                Ok(())
            }
            Command::Resize { after, .. } => doc.resize(after.0, after.1).map(|_| ()),
        }
    }

    pub fn revert(&self, doc: &mut Document) -> Result<()> {
        match self {
            Command::Add { object, .. } => doc.remove_object(object.id).map(|_| ()),
            Command::Remove { index, object } => doc.insert_object(*index, object.clone()),
            Command::Reorder { id, from, to } => move_checked(doc, *id, *to, *from),
            Command::Update { before, .. } => doc.replace_object(before.clone()).map(|_| ()),
            Command::SetBackground { before, .. } => {
                doc.set_background(before.clone());
                Ok(())
            }
            Command::Resize { before, .. } => doc.resize(before.0, before.1).map(|_| ()),
        }
    }

    /// Object the command touched, if any.
    pub fn target(&self) -> Option<ObjectId> {
        match self {
            Command::Add { object, .. } | Command::Remove { object, .. } => Some(object.id),
            Command::Reorder { id, .. } => Some(*id),
            Command::Update { after, .. } => Some(after.id),
            Command::SetBackground { .. } | Command::Resize { .. } => None,
        }
    }
}

fn move_checked(doc: &mut Document, id: ObjectId, from: usize, to: usize) -> Result<()> {
    match doc.index_of(id) {
        Some(index) if index == from => {
            doc.move_to(from, to);
            Ok(())
        }
        _ => Err(EditorError::ObjectNotFound(id)),
    }
}

#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub label: String,
    pub command: Command,
}

/// Linear history with a cursor. Entries `[0, cursor)` are applied.
#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        History { entries: Vec::new(), cursor: 0, limit: limit.max(1) }
    }

    /// Records an already applied command. Drops any redo tail.
    pub fn record(&mut self, label: impl Into<String>, command: Command) {
        self.entries.truncate(self.cursor);
        self.entries.push(HistoryEntry { label: label.into(), command });
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    pub fn redo_depth(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Reverts the entry at the cursor. `Ok(None)` when there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> Result<Option<&HistoryEntry>> {
        if !self.can_undo() {
            debug!("undo with empty history");
            return Ok(None);
        }
        let entry = &self.entries[self.cursor - 1];
        entry.command.revert(doc)?;
        self.cursor -= 1;
        Ok(Some(&self.entries[self.cursor]))
    }

    /// Re-applies the entry after the cursor. `Ok(None)` at the tip.
    pub fn redo(&mut self, doc: &mut Document) -> Result<Option<&HistoryEntry>> {
        if !self.can_redo() {
            debug!("redo past the tip of history");
            return Ok(None);
        }
        let entry = &self.entries[self.cursor];
        entry.command.apply(doc)?;
        self.cursor += 1;
        Ok(Some(&self.entries[self.cursor - 1]))
    }

    /// Labels of applied entries, oldest first.
    pub fn labels(&self) -> Vec<String> {
        self.entries[..self.cursor].iter().map(|e| e.label.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
