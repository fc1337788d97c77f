//! The history engine facade.
//!
//! [`HistoryService`] wires host events into the component stacks and
//! exposes the replay operations: back/forward/last navigation,
//! recently-used cycling, reopening closed editors, jumping to the last
//! edit location, and the global history queries.
//!
//! # Reentrancy
//!
//! The engine is run-to-completion. The only feedback loops are the
//! `open_editor` calls issued during replay; events they produce are
//! drained and dispatched while a reentrancy flag is still raised, so
//! self-caused selection changes update bookkeeping without pushing new
//! entries and self-caused closes are not recorded as closures. Flags
//! are lowered by RAII guards on every exit path.

mod closed;
mod disposal;
mod edit_location;
mod exclusion;
mod history_list;
mod nav_stack;
mod recently_used;

pub use closed::{ClosedEditorRecord, ClosedEditors};
pub use disposal::{DisposalRegistry, WatchDisposal};
pub use edit_location::{EditLocation, EditLocationSlot};
pub use exclusion::ExclusionFilter;
pub use history_list::{GlobalHistory, HydrationState};
pub use nav_stack::{NavigationEntry, NavigationStack};
pub use recently_used::{CycleDirection, RecentlyUsedTracker};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use tracing::debug;

use crate::config::EngineConfig;
use crate::host::{
    EditorAccess, EditorCloseEvent, EditorEvent, EditorOrder, FileEvent, HostEvent, Workspace,
};
use crate::matcher::IdentityMatcher;
use crate::model::{
    ChangeReason, EditorHandle, EditorRef, GroupId, HandleId, OpenOptions, ResourceDescriptor,
    ResourceId, SelectionSnapshot, SelectionState, SCHEME_FILE, SCHEME_REMOTE, SCHEME_USERDATA,
};
use crate::store::{HistoryStore, StorageScope, HISTORY_STORAGE_KEY};

/// Reentrancy flag with RAII raise/lower.
#[derive(Clone, Default)]
struct Flag(Rc<Cell<bool>>);

impl Flag {
    fn raise(&self) -> FlagGuard {
        self.0.set(true);
        FlagGuard(Rc::clone(&self.0))
    }

    fn is_raised(&self) -> bool {
        self.0.get()
    }
}

/// Lowers its flag when dropped, on every exit path.
struct FlagGuard(Rc<Cell<bool>>);

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Selection burst buffered for end-of-turn coalescing.
struct PendingSelection {
    editor: Rc<dyn EditorHandle>,
    selection: Option<SelectionSnapshot>,
    reason: ChangeReason,
}

/// Tracks, replays, and persists editor navigation and access history.
pub struct HistoryService {
    access: Rc<RefCell<dyn EditorAccess>>,
    workspace: Rc<RefCell<dyn Workspace>>,
    store: Rc<RefCell<dyn HistoryStore>>,
    matcher: IdentityMatcher,
    nav: NavigationStack,
    closed: ClosedEditors,
    edit_location: EditLocationSlot,
    recently_used: RecentlyUsedTracker,
    history: GlobalHistory,
    pending_selection: Option<PendingSelection>,
    navigating_in_stack: Flag,
    ignore_close: Flag,
    navigating_in_recently_used_global: Flag,
    navigating_in_recently_used_group: Flag,
}

impl HistoryService {
    pub fn new(
        config: &EngineConfig,
        access: Rc<RefCell<dyn EditorAccess>>,
        workspace: Rc<RefCell<dyn Workspace>>,
        store: Rc<RefCell<dyn HistoryStore>>,
    ) -> Self {
        let filter = ExclusionFilter::build(&*workspace.borrow());
        Self {
            access,
            workspace,
            store,
            matcher: IdentityMatcher::new(),
            nav: NavigationStack::new(config.navigation_limit),
            closed: ClosedEditors::new(config.closed_limit),
            edit_location: EditLocationSlot::new(),
            recently_used: RecentlyUsedTracker::new(),
            history: GlobalHistory::new(config.history_limit, filter),
            pending_selection: None,
            navigating_in_stack: Flag::default(),
            ignore_close: Flag::default(),
            navigating_in_recently_used_global: Flag::default(),
            navigating_in_recently_used_group: Flag::default(),
        }
    }

    /// Registers a content-provider scheme, trusted by identity
    /// matching even before the host finished restoring.
    pub fn register_content_provider_scheme(&mut self, scheme: impl Into<String>) {
        self.matcher.register_provider_scheme(scheme);
    }

    // ---- event intake ----

    /// Feeds one scheduling turn's worth of events, then flushes the
    /// coalesced selection slot.
    pub fn process(&mut self, events: impl IntoIterator<Item = HostEvent>) {
        for event in events {
            self.dispatch(event);
        }
        self.end_of_turn();
    }

    pub fn dispatch(&mut self, event: HostEvent) {
        match event {
            HostEvent::Editor(event) => self.dispatch_editor(event),
            HostEvent::Files(events) => self.on_files_changed(&events),
            HostEvent::ExclusionConfigChanged => self.on_exclusion_config_changed(),
            HostEvent::AboutToPersist => self.persist_history(),
            HostEvent::Ready => self.on_ready(),
        }
    }

    /// Flushes the pending selection burst; call once per turn.
    pub fn end_of_turn(&mut self) {
        self.flush_pending_selection();
    }

    fn dispatch_editor(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::ActiveEditorChanged(editor) => self.on_active_editor_changed(editor),
            EditorEvent::SelectionChanged {
                editor,
                selection,
                reason,
            } => self.note_selection_change(editor, selection, reason),
            EditorEvent::EditorClosed(event) => self.on_editor_closed(event),
            EditorEvent::EditorOpenFailed(editor) => self.on_editor_open_failed(editor),
            EditorEvent::RecencyChanged => self.on_recency_changed(),
            EditorEvent::EditorDisposed(id) => self.on_editor_disposed(id),
        }
    }

    fn on_active_editor_changed(&mut self, editor: Option<Rc<dyn EditorHandle>>) {
        let Some(editor) = editor else {
            return;
        };
        let stored = self.preferred_ref(&editor);
        self.history_add(stored.clone());

        let access = Rc::clone(&self.access);
        let mut watch =
            move |handle: &Rc<dyn EditorHandle>| access.borrow_mut().watch_disposal(handle);
        if editor.supports_selection() {
            let candidate = SelectionState::new(editor, None, ChangeReason::Unknown);
            if self.navigating_in_stack.is_raised() {
                self.nav.set_current_selection(candidate);
            } else {
                self.nav.note_selection(candidate, stored, &mut watch);
            }
        } else if !self.navigating_in_stack.is_raised() {
            self.nav.note_editor(stored, &self.matcher, &mut watch);
        }
    }

    /// Buffers a selection change. Bursts within one turn targeting the
    /// same editor merge into a single logical event; an `Edit` reason
    /// survives any later reason in the burst.
    fn note_selection_change(
        &mut self,
        editor: Rc<dyn EditorHandle>,
        selection: Option<SelectionSnapshot>,
        reason: ChangeReason,
    ) {
        if let Some(pending) = &mut self.pending_selection {
            if pending.editor.id() == editor.id() {
                pending.selection = selection;
                pending.reason = if pending.reason == ChangeReason::Edit {
                    ChangeReason::Edit
                } else {
                    reason
                };
                return;
            }
            // A different editor never merges; apply the old burst first.
            self.flush_pending_selection();
        }
        self.pending_selection = Some(PendingSelection {
            editor,
            selection,
            reason,
        });
    }

    fn flush_pending_selection(&mut self) {
        let Some(pending) = self.pending_selection.take() else {
            return;
        };
        let stored = self.preferred_ref(&pending.editor);

        let access = Rc::clone(&self.access);
        let mut watch =
            move |handle: &Rc<dyn EditorHandle>| access.borrow_mut().watch_disposal(handle);

        if pending.reason == ChangeReason::Edit {
            self.edit_location
                .set(Rc::clone(&pending.editor), pending.selection, &mut watch);
        }

        self.history_add(stored.clone());

        if pending.editor.supports_selection() {
            let candidate = SelectionState::new(pending.editor, pending.selection, pending.reason);
            if self.navigating_in_stack.is_raised() {
                self.nav.set_current_selection(candidate);
            } else {
                self.nav.note_selection(candidate, stored, &mut watch);
            }
        }
    }

    fn on_editor_closed(&mut self, event: EditorCloseEvent) {
        if self.ignore_close.is_raised() {
            return;
        }
        if self.closed.record(&event) {
            debug!(index = event.index, "recorded closed editor");
        }
    }

    fn on_editor_open_failed(&mut self, editor: EditorRef) {
        let matcher = &self.matcher;
        self.history.remove_where(|entry| matcher.matches(entry, &editor));
        self.nav
            .remove_where(|entry| matcher.matches(&entry.editor, &editor));
    }

    fn on_recency_changed(&mut self) {
        // Recency changes caused by our own cycling must not end the
        // session.
        if self.navigating_in_recently_used_global.is_raised()
            || self.navigating_in_recently_used_group.is_raised()
        {
            return;
        }
        self.recently_used.invalidate();
    }

    fn on_editor_disposed(&mut self, id: HandleId) {
        self.nav.remove_handle(id);
        self.history.remove_handle(id);
        self.edit_location.remove_handle(id);
    }

    fn on_files_changed(&mut self, events: &[FileEvent]) {
        for event in events {
            match event {
                FileEvent::Deleted(resource) => self.on_resource_deleted(resource),
                FileEvent::Moved {
                    source,
                    target,
                    is_file,
                } => self.on_resource_moved(source, target.as_ref(), *is_file),
            }
        }
    }

    fn on_resource_deleted(&mut self, resource: &ResourceId) {
        let matcher = &self.matcher;
        self.nav
            .remove_where(|entry| matcher.matches_deleted(resource, &entry.editor));
        self.history
            .remove_where(|entry| matcher.matches_deleted(resource, entry));
        self.closed.remove_where(|record| record.references(resource));
        self.workspace.borrow_mut().remove_recently_opened(resource);
    }

    fn on_resource_moved(
        &mut self,
        source: &ResourceId,
        target: Option<&ResourceId>,
        is_file: bool,
    ) {
        let matcher = &self.matcher;
        self.nav
            .remove_where(|entry| matcher.matches_moved(source, &entry.editor));
        self.history
            .remove_where(|entry| matcher.matches_moved(source, entry));
        self.closed
            .remove_where(|record| record.references_within(source));
        self.workspace.borrow_mut().remove_recently_opened(source);

        if is_file {
            if let Some(target) = target {
                self.history_add(EditorRef::Descriptor(ResourceDescriptor::new(
                    target.clone(),
                )));
            }
        }
    }

    fn on_exclusion_config_changed(&mut self) {
        let filter = ExclusionFilter::build(&*self.workspace.borrow());
        self.history.refilter(filter);
    }

    fn on_ready(&mut self) {
        self.matcher.mark_restored();
        self.ensure_history_loaded();
    }

    // ---- navigation replay ----

    /// Navigates one entry back. A second navigation issued while a
    /// replay is pending is ignored.
    pub fn go_back(&mut self) -> Result<()> {
        if self.navigating_in_stack.is_raised() {
            return Ok(());
        }
        self.flush_pending_selection();
        match self.nav.go_back() {
            Some(entry) => self.replay_navigation(entry),
            None => Ok(()),
        }
    }

    /// Navigates one entry forward.
    pub fn go_forward(&mut self) -> Result<()> {
        if self.navigating_in_stack.is_raised() {
            return Ok(());
        }
        self.flush_pending_selection();
        match self.nav.go_forward() {
            Some(entry) => self.replay_navigation(entry),
            None => Ok(()),
        }
    }

    /// Jumps to the entry visited before the last cursor move.
    pub fn go_last(&mut self) -> Result<()> {
        if self.navigating_in_stack.is_raised() {
            return Ok(());
        }
        self.flush_pending_selection();
        match self.nav.go_last() {
            Some(entry) => self.replay_navigation(entry),
            None => Ok(()),
        }
    }

    fn replay_navigation(&mut self, entry: NavigationEntry) -> Result<()> {
        let _guard = self.navigating_in_stack.raise();
        let options = OpenOptions {
            reveal_if_open: true,
            selection: entry.selection,
            ..Default::default()
        };
        let result = self.access.borrow_mut().open_editor(&entry.editor, &options);
        self.pump_editor_events();
        result.map(|_| ())
    }

    /// Replays the last edit location. Opens exactly like a navigation
    /// entry, without touching navigation-stack bookkeeping.
    pub fn open_last_edit_location(&mut self) -> Result<()> {
        let Some(location) = self.edit_location.get() else {
            return Ok(());
        };
        let options = OpenOptions {
            reveal_if_open: true,
            selection: location.selection,
            ..Default::default()
        };
        let result = self
            .access
            .borrow_mut()
            .open_editor(&EditorRef::Handle(location.editor), &options);
        self.pump_editor_events();
        result.map(|_| ())
    }

    // ---- recently-used cycling ----

    /// Opens the next (more recently used) editor of the session.
    pub fn open_next_recently_used_editor(&mut self, group: Option<GroupId>) -> Result<()> {
        self.cycle_recently_used(group, CycleDirection::Next)
    }

    /// Opens the previously (less recently) used editor of the session.
    pub fn open_previously_used_editor(&mut self, group: Option<GroupId>) -> Result<()> {
        self.cycle_recently_used(group, CycleDirection::Previous)
    }

    fn cycle_recently_used(
        &mut self,
        group: Option<GroupId>,
        direction: CycleDirection,
    ) -> Result<()> {
        let access = Rc::clone(&self.access);
        let target = self
            .recently_used
            .cycle(group, direction, &*access.borrow());
        let Some(target) = target else {
            return Ok(());
        };

        let flag = match group {
            Some(_) => &self.navigating_in_recently_used_group,
            None => &self.navigating_in_recently_used_global,
        };
        let _guard = flag.raise();

        let options = OpenOptions {
            reveal_if_open: true,
            ..Default::default()
        };
        let result = self
            .access
            .borrow_mut()
            .open_editor(&EditorRef::Handle(target), &options);
        self.pump_editor_events();
        result.map(|_| ())
    }

    // ---- closed-editor reopening ----

    /// Reopens the most recently closed editor. A record that fails to
    /// reopen is discarded and the next most recent one is tried, until
    /// the buffer is exhausted; exhaustion is a silent no-op.
    pub fn reopen_last_closed_editor(&mut self) -> Result<()> {
        let _guard = self.ignore_close.raise();
        let group = self.access.borrow().active_group();

        while let Some(record) = self.closed.pop() {
            let mut options = OpenOptions {
                pinned: true,
                sticky: record.sticky,
                index: Some(record.index),
                ..Default::default()
            };

            // Restoring the recorded sticky flag at an index whose
            // current sticky state disagrees would corrupt the tab
            // ordering; append instead.
            if self.access.borrow().is_sticky(group, record.index) != record.sticky {
                options.index = None;
            }

            if let Some(index) = options.index {
                if let Some(existing) = self.access.borrow().editor_at(group, index) {
                    let record_ref = EditorRef::Descriptor(record.untyped.clone());
                    if self
                        .matcher
                        .matches(&EditorRef::Handle(existing), &record_ref)
                    {
                        // Already open at that position; nothing to do.
                        break;
                    }
                }
            }

            let target = EditorRef::Descriptor(record.untyped.clone());
            let opened = self.access.borrow_mut().open_editor(&target, &options);
            self.pump_editor_events();
            match opened {
                Ok(Some(_)) => break,
                Ok(None) => {
                    debug!(resource = %record.untyped.resource, "reopen yielded no pane, trying next record");
                }
                Err(err) => {
                    debug!(resource = %record.untyped.resource, error = %err, "reopen failed, trying next record");
                }
            }
        }
        Ok(())
    }

    // ---- history queries ----

    /// Ordered snapshot of the global history, most recent first.
    pub fn get_history(&mut self) -> Vec<EditorRef> {
        self.ensure_history_loaded();
        self.history.entries().to_vec()
    }

    /// Removes every history entry matching `editor`. Returns whether
    /// anything was removed.
    pub fn remove_from_history(&mut self, editor: &EditorRef) -> bool {
        self.ensure_history_loaded();
        let matcher = &self.matcher;
        self.history.remove_where(|entry| matcher.matches(entry, editor))
    }

    /// Most recent history resource with the given scheme.
    pub fn get_last_active_file(&mut self, scheme: &str) -> Option<ResourceId> {
        self.ensure_history_loaded();
        self.history
            .entries()
            .iter()
            .filter_map(|entry| entry.resource())
            .find(|resource| resource.scheme() == scheme)
    }

    /// Workspace root of the most recent history entry that resolves to
    /// one, optionally filtered by root scheme. Falls back to the first
    /// matching workspace root when no entry resolves.
    pub fn get_last_active_workspace_root(&mut self, scheme: Option<&str>) -> Option<ResourceId> {
        self.ensure_history_loaded();
        let workspace = self.workspace.borrow();
        for entry in self.history.entries() {
            let Some(resource) = entry.resource() else {
                continue;
            };
            if let Some(root) = workspace.root_of(&resource) {
                if scheme.map_or(true, |s| root.scheme() == s) {
                    return Some(root);
                }
            }
        }
        workspace
            .roots()
            .into_iter()
            .find(|root| scheme.map_or(true, |s| root.scheme() == s))
    }

    // ---- lifecycle ----

    /// Resets every stack.
    pub fn clear(&mut self) {
        self.nav.clear();
        self.closed.clear();
        self.edit_location.clear();
        self.recently_used.invalidate();
        self.history.clear();
        self.pending_selection = None;
    }

    /// Clears the external recently-opened list.
    pub fn clear_recently_opened(&mut self) {
        self.workspace.borrow_mut().clear_recently_opened();
    }

    // ---- introspection (for embedders rendering history UI) ----

    pub fn navigation_entries(&self) -> &[NavigationEntry] {
        self.nav.entries()
    }

    pub fn navigation_cursor(&self) -> Option<usize> {
        self.nav.cursor()
    }

    pub fn closed_editors(&self) -> &[ClosedEditorRecord] {
        self.closed.records()
    }

    pub fn last_edit_location(&self) -> Option<EditLocation> {
        self.edit_location.get()
    }

    /// Disposal subscriptions currently held across the stacks.
    pub fn watched_handles(&self) -> usize {
        self.nav.watched_handles() + self.history.watched_handles()
    }

    // ---- internals ----

    /// Dispatches events the host queued while an `open_editor` call
    /// was in flight, with the caller's reentrancy guard still raised.
    fn pump_editor_events(&mut self) {
        let events = self.access.borrow_mut().drain_events();
        for event in events {
            self.dispatch_editor(event);
        }
        self.flush_pending_selection();
    }

    /// Stores a handle as a descriptor when its resource survives
    /// disposal and restart; other schemes stay live and are evicted on
    /// disposal.
    fn preferred_ref(&self, editor: &Rc<dyn EditorHandle>) -> EditorRef {
        let Some(resource) = editor.resource() else {
            return EditorRef::Handle(Rc::clone(editor));
        };
        let scheme = resource.scheme();
        let preferred = matches!(scheme, SCHEME_FILE | SCHEME_REMOTE | SCHEME_USERDATA)
            || scheme == self.workspace.borrow().default_scheme();
        if preferred {
            EditorRef::Descriptor(ResourceDescriptor::with_kind(resource, editor.kind()))
        } else {
            EditorRef::Handle(Rc::clone(editor))
        }
    }

    fn history_add(&mut self, editor: EditorRef) {
        self.ensure_history_loaded();
        let access = Rc::clone(&self.access);
        let mut watch =
            move |handle: &Rc<dyn EditorHandle>| access.borrow_mut().watch_disposal(handle);
        self.history.add(editor, &self.matcher, &mut watch);
    }

    fn ensure_history_loaded(&mut self) {
        if self.history.state() != HydrationState::Uninitialized {
            return;
        }
        let live: Vec<EditorRef> = self
            .access
            .borrow()
            .editors(EditorOrder::MostRecentlyActive)
            .into_iter()
            .map(|(_, editor)| self.preferred_ref(&editor))
            .collect();
        let payload = self
            .store
            .borrow()
            .get(HISTORY_STORAGE_KEY, StorageScope::Workspace);

        let access = Rc::clone(&self.access);
        let mut watch =
            move |handle: &Rc<dyn EditorHandle>| access.borrow_mut().watch_disposal(handle);
        self.history.ensure_loaded(live, payload, &mut watch);
    }

    fn persist_history(&mut self) {
        // Never hydrated means nothing changed; keep the stored payload.
        if !self.history.is_ready() {
            return;
        }
        let entries = self.history.serialize_entries();
        match crate::store::encode_entries(&entries) {
            Ok(payload) => {
                if let Err(err) = self.store.borrow_mut().store(
                    HISTORY_STORAGE_KEY,
                    payload,
                    StorageScope::Workspace,
                ) {
                    tracing::warn!(error = %err, "failed to persist editor history");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to serialize editor history"),
        }
    }
}
