//! Back/forward navigation stack with selection-aware push/replace.
//!
//! The stack records visited editor+selection pairs with a cursor.
//! Qualifying selection changes either push a new entry or replace the
//! entry at the cursor, per [`SelectionState::justifies_new_entry`];
//! inserting while the cursor is not at the tail discards the forward
//! branch, classic back/forward semantics.

use tracing::debug;

use crate::matcher::IdentityMatcher;
use crate::model::{EditorRef, HandleId, SelectionSnapshot, SelectionState};

use super::disposal::{DisposalRegistry, WatchDisposal};

/// One visited location.
#[derive(Debug, Clone)]
pub struct NavigationEntry {
    pub editor: EditorRef,
    pub selection: Option<SelectionSnapshot>,
}

/// Bounded, selection-aware back/forward stack.
pub struct NavigationStack {
    entries: Vec<NavigationEntry>,
    /// Valid only while `entries` is non-empty.
    cursor: usize,
    /// Cursor position before the most recent cursor move.
    last_cursor: Option<usize>,
    limit: usize,
    /// Selection state recorded for the entry at the cursor; drives the
    /// push-vs-replace decision.
    current_selection: Option<SelectionState>,
    disposals: DisposalRegistry,
}

impl NavigationStack {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            last_cursor: None,
            limit,
            current_selection: None,
            disposals: DisposalRegistry::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[NavigationEntry] {
        &self.entries
    }

    /// Cursor position, if the stack holds any entries.
    pub fn cursor(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.cursor)
    }

    pub fn current_entry(&self) -> Option<&NavigationEntry> {
        self.entries.get(self.cursor)
    }

    /// Number of disposal subscriptions currently held.
    pub fn watched_handles(&self) -> usize {
        self.disposals.len()
    }

    /// Updates only the selection bookkeeping. Used while a replay is
    /// in flight, when resulting events must not push or replace.
    pub fn set_current_selection(&mut self, state: SelectionState) {
        self.current_selection = Some(state);
    }

    /// Records activity for a selection-capable editor: push a new
    /// entry, or replace the one under the cursor when the location is
    /// comparably the same.
    pub fn note_selection(
        &mut self,
        candidate: SelectionState,
        stored: EditorRef,
        watch: &mut WatchDisposal,
    ) {
        let entry = NavigationEntry {
            editor: stored,
            selection: candidate.selection,
        };
        let should_push = match &self.current_selection {
            None => true,
            Some(current) => current.justifies_new_entry(&candidate),
        };
        if should_push {
            self.push(entry, watch);
        } else {
            self.replace_current(entry, watch);
        }
        self.current_selection = Some(candidate);
    }

    /// Records activity for an editor without a selection concept.
    /// Consecutive identical editors collapse into one entry.
    pub fn note_editor(
        &mut self,
        stored: EditorRef,
        matcher: &IdentityMatcher,
        watch: &mut WatchDisposal,
    ) {
        if let Some(current) = self.current_entry() {
            if matcher.matches(&current.editor, &stored) {
                return;
            }
        }
        self.push(
            NavigationEntry {
                editor: stored,
                selection: None,
            },
            watch,
        );
        self.current_selection = None;
    }

    /// Moves the cursor back one entry and returns the replay target.
    pub fn go_back(&mut self) -> Option<NavigationEntry> {
        if self.entries.is_empty() || self.cursor == 0 {
            return None;
        }
        self.last_cursor = Some(self.cursor);
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Moves the cursor forward one entry and returns the replay target.
    pub fn go_forward(&mut self) -> Option<NavigationEntry> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.last_cursor = Some(self.cursor);
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Jumps to the cursor position before the last move and returns
    /// the replay target.
    pub fn go_last(&mut self) -> Option<NavigationEntry> {
        let target = self.last_cursor?;
        if target >= self.entries.len() {
            return None;
        }
        self.last_cursor = Some(self.cursor);
        self.cursor = target;
        Some(self.entries[self.cursor].clone())
    }

    /// Removes entries whose live handle was disposed.
    pub fn remove_handle(&mut self, id: HandleId) {
        if self
            .current_selection
            .as_ref()
            .is_some_and(|state| state.editor.id() == id)
        {
            self.current_selection = None;
        }
        self.remove_where(|entry| entry.editor.handle_id() == Some(id));
    }

    /// Removes every entry the predicate matches, fixing up the cursor
    /// and releasing disposal subscriptions no other entry shares.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&NavigationEntry) -> bool) -> usize {
        let marks: Vec<bool> = self.entries.iter().map(|entry| pred(entry)).collect();
        let removed_count = marks.iter().filter(|m| **m).count();
        if removed_count == 0 {
            return 0;
        }

        let removed_before = |index: usize| marks[..index].iter().filter(|m| **m).count();
        let new_cursor = self.cursor - removed_before(self.cursor);
        let new_last = self.last_cursor.and_then(|last| {
            if marks.get(last).copied().unwrap_or(true) {
                None
            } else {
                Some(last - removed_before(last))
            }
        });

        let mut kept = Vec::with_capacity(self.entries.len() - removed_count);
        let mut dropped = Vec::with_capacity(removed_count);
        for (entry, removed) in self.entries.drain(..).zip(marks.iter()) {
            if *removed {
                dropped.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        self.cursor = new_cursor.min(self.entries.len().saturating_sub(1));
        self.last_cursor = new_last;

        for entry in &dropped {
            Self::release_unreferenced(&self.entries, &mut self.disposals, entry);
        }
        debug!(
            removed = removed_count,
            remaining = self.entries.len(),
            "pruned navigation stack"
        );
        removed_count
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.last_cursor = None;
        self.current_selection = None;
        self.disposals.clear();
    }

    fn push(&mut self, entry: NavigationEntry, watch: &mut WatchDisposal) {
        // Branch truncation: inserting off the tail discards the
        // forward branch first.
        if !self.entries.is_empty() && self.cursor + 1 < self.entries.len() {
            let truncated: Vec<NavigationEntry> = self.entries.drain(self.cursor + 1..).collect();
            for removed in &truncated {
                Self::release_unreferenced(&self.entries, &mut self.disposals, removed);
            }
        }

        self.acquire(&entry, watch);
        let was_empty = self.entries.is_empty();
        self.entries.push(entry);
        if !was_empty {
            self.last_cursor = Some(self.cursor);
        }
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.limit {
            let evicted = self.entries.remove(0);
            self.cursor -= 1;
            self.last_cursor = self.last_cursor.and_then(|last| last.checked_sub(1));
            Self::release_unreferenced(&self.entries, &mut self.disposals, &evicted);
        }
    }

    fn replace_current(&mut self, entry: NavigationEntry, watch: &mut WatchDisposal) {
        if self.entries.is_empty() {
            self.push(entry, watch);
            return;
        }
        self.acquire(&entry, watch);
        let old = std::mem::replace(&mut self.entries[self.cursor], entry);
        Self::release_unreferenced(&self.entries, &mut self.disposals, &old);
    }

    fn acquire(&mut self, entry: &NavigationEntry, watch: &mut WatchDisposal) {
        if let Some(handle) = entry.editor.as_handle() {
            if !self.disposals.contains(handle.id()) {
                self.disposals.insert(handle.id(), watch(handle));
            }
        }
    }

    /// Releases the removed entry's subscription unless another entry
    /// still references the same handle.
    fn release_unreferenced(
        entries: &[NavigationEntry],
        disposals: &mut DisposalRegistry,
        removed: &NavigationEntry,
    ) {
        let Some(id) = removed.editor.handle_id() else {
            return;
        };
        if entries
            .iter()
            .any(|entry| entry.editor.handle_id() == Some(id))
        {
            return;
        }
        disposals.remove(id);
    }
}

impl std::fmt::Debug for NavigationStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationStack")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("last_cursor", &self.last_cursor)
            .finish()
    }
}
