//! Global, deduplicated, persisted editor access history.
//!
//! The list is hydrated lazily: on first access (or the host's
//! readiness signal) it seeds from the currently open editors,
//! most-recent-first, then appends persisted entries that no live
//! editor already covered. Persisted entries fill gaps at the tail;
//! they are never promoted above live editors.

use std::collections::HashSet;

use tracing::debug;

use crate::matcher::IdentityMatcher;
use crate::model::{EditorKind, EditorRef, HandleId, ResourceId};
use crate::store::{self, PersistedEntry};

use super::disposal::{DisposalRegistry, WatchDisposal};
use super::exclusion::ExclusionFilter;

/// Hydration progress of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationState {
    Uninitialized,
    /// Hydration is running; reentrant hydration attempts are ignored.
    Loading,
    Ready,
}

/// Bounded, deduplicated access history, most recent first.
pub struct GlobalHistory {
    state: HydrationState,
    entries: Vec<EditorRef>,
    limit: usize,
    filter: ExclusionFilter,
    disposals: DisposalRegistry,
}

impl GlobalHistory {
    pub fn new(limit: usize, filter: ExclusionFilter) -> Self {
        Self {
            state: HydrationState::Uninitialized,
            entries: Vec::new(),
            limit,
            filter,
            disposals: DisposalRegistry::new(),
        }
    }

    pub fn state(&self) -> HydrationState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == HydrationState::Ready
    }

    pub fn entries(&self) -> &[EditorRef] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of disposal subscriptions currently held.
    pub fn watched_handles(&self) -> usize {
        self.disposals.len()
    }

    /// Hydrates the list once. `live` is the already-converted open
    /// editor set, most recent first; `payload` is the persisted text,
    /// if any.
    pub fn ensure_loaded(
        &mut self,
        live: Vec<EditorRef>,
        payload: Option<String>,
        watch: &mut WatchDisposal,
    ) {
        if self.state != HydrationState::Uninitialized {
            return;
        }
        self.state = HydrationState::Loading;

        // A persisted entry is redundant once any live editor covered
        // its (resource, kind) pair, even one the filter rejected.
        let mut handled: HashSet<(ResourceId, Option<EditorKind>)> = HashSet::new();

        for editor in live {
            if let Some(resource) = editor.resource() {
                handled.insert((resource, editor.kind()));
            }
            if self.is_excluded(&editor) {
                continue;
            }
            self.acquire(&editor, watch);
            self.entries.push(editor);
        }

        let persisted = payload.as_deref().map(store::decode_entries).unwrap_or_default();
        for record in persisted {
            // The payload is hand-editable text; a duplicated record
            // must not hydrate twice.
            let key = (record.editor.resource.clone(), record.editor.kind.clone());
            if !handled.insert(key) {
                continue;
            }
            let editor = EditorRef::Descriptor(record.editor);
            if self.is_excluded(&editor) {
                continue;
            }
            self.entries.push(editor);
        }

        self.truncate_to_limit();
        self.state = HydrationState::Ready;
        debug!(entries = self.entries.len(), "hydrated editor history");
    }

    /// Promotes (or inserts) an entry at the front: any matching entry
    /// is removed first, then the new one leads the list.
    pub fn add(&mut self, editor: EditorRef, matcher: &IdentityMatcher, watch: &mut WatchDisposal) {
        if self.is_excluded(&editor) {
            return;
        }
        self.remove_where(|existing| matcher.matches(existing, &editor));
        self.acquire(&editor, watch);
        self.entries.insert(0, editor);
        self.truncate_to_limit();
    }

    /// Removes entries whose live handle was disposed.
    pub fn remove_handle(&mut self, id: HandleId) {
        self.remove_where(|entry| entry.handle_id() == Some(id));
    }

    /// Removes every entry the predicate matches. Returns whether
    /// anything was removed.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&EditorRef) -> bool) -> bool {
        let before = self.entries.len();
        let mut dropped = Vec::new();
        self.entries.retain(|entry| {
            if pred(entry) {
                dropped.push(entry.clone());
                false
            } else {
                true
            }
        });
        for entry in &dropped {
            Self::release_unreferenced(&self.entries, &mut self.disposals, entry);
        }
        self.entries.len() != before
    }

    /// Swaps in a freshly compiled exclusion filter and prunes entries
    /// it now rejects.
    pub fn refilter(&mut self, filter: ExclusionFilter) {
        self.filter = filter;
        let filter = &self.filter;
        let before = self.entries.len();
        let mut dropped = Vec::new();
        self.entries.retain(|entry| {
            let excluded = entry
                .resource()
                .is_some_and(|resource| filter.excludes(&resource));
            if excluded {
                dropped.push(entry.clone());
            }
            !excluded
        });
        for entry in &dropped {
            Self::release_unreferenced(&self.entries, &mut self.disposals, entry);
        }
        if before != self.entries.len() {
            debug!(pruned = before - self.entries.len(), "re-filtered editor history");
        }
    }

    /// Records to persist: descriptor-backed entries only, in order.
    pub fn serialize_entries(&self) -> Vec<PersistedEntry> {
        self.entries
            .iter()
            .filter_map(|entry| entry.as_descriptor())
            .map(|descriptor| PersistedEntry {
                editor: descriptor.clone(),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.disposals.clear();
    }

    fn is_excluded(&self, editor: &EditorRef) -> bool {
        editor
            .resource()
            .is_some_and(|resource| self.filter.excludes(&resource))
    }

    fn acquire(&mut self, editor: &EditorRef, watch: &mut WatchDisposal) {
        if let Some(handle) = editor.as_handle() {
            if !self.disposals.contains(handle.id()) {
                self.disposals.insert(handle.id(), watch(handle));
            }
        }
    }

    fn truncate_to_limit(&mut self) {
        while self.entries.len() > self.limit {
            if let Some(evicted) = self.entries.pop() {
                Self::release_unreferenced(&self.entries, &mut self.disposals, &evicted);
            }
        }
    }

    fn release_unreferenced(
        entries: &[EditorRef],
        disposals: &mut DisposalRegistry,
        removed: &EditorRef,
    ) {
        let Some(id) = removed.handle_id() else {
            return;
        };
        if entries.iter().any(|entry| entry.handle_id() == Some(id)) {
            return;
        }
        disposals.remove(id);
    }
}

impl std::fmt::Debug for GlobalHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalHistory")
            .field("state", &self.state)
            .field("len", &self.entries.len())
            .finish()
    }
}
