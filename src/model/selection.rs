//! Selection snapshots and the push-vs-replace heuristic.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::editor::EditorHandle;

/// How two selection snapshots relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionComparison {
    Identical,
    /// Same line, different column: close enough to count as the same
    /// location for history purposes.
    PartiallyDifferent,
    Different,
}

/// Why a selection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeReason {
    User,
    Navigation,
    Edit,
    #[default]
    Unknown,
}

/// Opaque, comparable cursor position within an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub line: u32,
    pub column: u32,
}

impl SelectionSnapshot {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn compare(&self, other: &SelectionSnapshot) -> SelectionComparison {
        if self == other {
            SelectionComparison::Identical
        } else if self.line == other.line {
            SelectionComparison::PartiallyDifferent
        } else {
            SelectionComparison::Different
        }
    }
}

/// The active selection of a live editor plus the reason it changed.
#[derive(Debug, Clone)]
pub struct SelectionState {
    pub editor: Rc<dyn EditorHandle>,
    pub selection: Option<SelectionSnapshot>,
    pub reason: ChangeReason,
}

impl SelectionState {
    pub fn new(
        editor: Rc<dyn EditorHandle>,
        selection: Option<SelectionSnapshot>,
        reason: ChangeReason,
    ) -> Self {
        Self {
            editor,
            selection,
            reason,
        }
    }

    /// Whether `candidate` deserves a new navigation entry instead of
    /// replacing the entry recorded for `self`.
    ///
    /// True when the candidate is an explicit navigation, when the
    /// editors differ, when either side has no selection to compare, or
    /// when the selections are genuinely different. Everything else
    /// (same editor, comparably same location) replaces, which keeps
    /// scrolling from flooding the stack.
    pub fn justifies_new_entry(&self, candidate: &SelectionState) -> bool {
        if candidate.reason == ChangeReason::Navigation {
            return true;
        }
        if !self.editor.matches(candidate.editor.as_ref()) {
            return true;
        }
        match (self.selection, candidate.selection) {
            (Some(ours), Some(theirs)) => ours.compare(&theirs) == SelectionComparison::Different,
            _ => true,
        }
    }
}
