//! Collaborator traits and the events the embedder feeds into the
//! engine.
//!
//! The engine is single-threaded and run-to-completion: the embedder
//! collects events from its own sources (editor area, file watcher,
//! configuration, persistence) and pumps one batch per scheduling turn
//! into [`HistoryService::process`](crate::service::HistoryService::process).
//! All mutation happens synchronously inside that call.
//!
//! The one source of feedback are `open_editor` calls issued during
//! replay: events they cause must be queued by the host and handed back
//! through [`EditorAccess::drain_events`], which the engine calls while
//! its reentrancy guards are still raised.

use std::fmt;
use std::rc::Rc;

use crate::model::{
    ChangeReason, EditorHandle, EditorRef, GroupId, HandleId, OpenOptions, PaneId, ResourceId,
    SelectionSnapshot,
};

/// RAII cleanup token for a host-side subscription.
///
/// Dropping the token unsubscribes. Components hold one token per
/// watched handle and drop it deterministically on eviction or removal.
pub struct Subscription {
    on_drop: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(on_drop: impl FnOnce() + 'static) -> Self {
        Self {
            on_drop: Some(Box::new(on_drop)),
        }
    }

    /// A token that does nothing when dropped.
    pub fn noop() -> Self {
        Self { on_drop: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(on_drop) = self.on_drop.take() {
            on_drop();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription")
    }
}

/// Why the host reported an editor as closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseContext {
    /// The user really closed the tab.
    Normal,
    /// The tab was replaced in place; not a real closure.
    Replace,
    /// The tab moved to another group; not a real closure.
    Move,
}

/// Notification that a tab was closed.
#[derive(Debug, Clone)]
pub struct EditorCloseEvent {
    pub editor: Rc<dyn EditorHandle>,
    pub context: CloseContext,
    pub group: GroupId,
    /// Tab index the editor occupied when it closed.
    pub index: usize,
    pub sticky: bool,
}

/// Ordering requested from [`EditorAccess::editors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorOrder {
    /// Tab order, group by group.
    Sequential,
    /// Most recently active first.
    MostRecentlyActive,
}

/// Events originating from the editor area.
#[derive(Debug, Clone)]
pub enum EditorEvent {
    /// Focus moved to another editor, or away from all of them.
    ActiveEditorChanged(Option<Rc<dyn EditorHandle>>),
    /// The active editor's selection changed. Bursts within one turn
    /// are coalesced by the engine.
    SelectionChanged {
        editor: Rc<dyn EditorHandle>,
        selection: Option<SelectionSnapshot>,
        reason: ChangeReason,
    },
    EditorClosed(EditorCloseEvent),
    /// The host failed to open the referenced editor.
    EditorOpenFailed(EditorRef),
    /// The most-recently-active ordering changed.
    RecencyChanged,
    /// A live handle was disposed.
    EditorDisposed(HandleId),
}

/// File-system changes relevant to history maintenance.
#[derive(Debug, Clone)]
pub enum FileEvent {
    Deleted(ResourceId),
    Moved {
        source: ResourceId,
        /// Where the resource went, when known.
        target: Option<ResourceId>,
        /// False for folder moves, which cascade to contained entries.
        is_file: bool,
    },
}

/// Everything the embedder can feed into the engine.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Editor(EditorEvent),
    /// A batch of file-system changes observed in one step.
    Files(Vec<FileEvent>),
    /// Exclusion globs changed; the history must be re-filtered.
    ExclusionConfigChanged,
    /// State persistence is about to run; flush history to the store.
    AboutToPersist,
    /// The host finished restoring its editor state.
    Ready,
}

/// Editor-area capabilities consumed by the engine.
pub trait EditorAccess {
    fn active_editor(&self) -> Option<Rc<dyn EditorHandle>>;

    fn active_group(&self) -> GroupId;

    /// All open editors with their groups, in the requested order.
    fn editors(&self, order: EditorOrder) -> Vec<(GroupId, Rc<dyn EditorHandle>)>;

    /// Open editors of one group, in the requested order.
    fn editors_in_group(&self, group: GroupId, order: EditorOrder) -> Vec<Rc<dyn EditorHandle>>;

    /// Editor at a tab index of a group, if the slot is occupied.
    fn editor_at(&self, group: GroupId, index: usize) -> Option<Rc<dyn EditorHandle>>;

    /// Sticky state of a tab index in a group.
    fn is_sticky(&self, group: GroupId, index: usize) -> bool;

    /// Open (or reveal) an editor. `Ok(None)` means the host produced
    /// no pane, e.g. because the open was vetoed.
    fn open_editor(
        &mut self,
        editor: &EditorRef,
        options: &OpenOptions,
    ) -> anyhow::Result<Option<PaneId>>;

    /// Watch a live handle for disposal. Disposal itself arrives as
    /// [`EditorEvent::EditorDisposed`]; the returned token unsubscribes
    /// when dropped.
    fn watch_disposal(&mut self, editor: &Rc<dyn EditorHandle>) -> Subscription;

    /// Events produced as a side effect of `open_editor` calls, queued
    /// until the engine drains them inside its guarded region.
    fn drain_events(&mut self) -> Vec<EditorEvent>;
}

/// Workspace-level capabilities: roots, exclusion globs, and the
/// external recently-opened list.
pub trait Workspace {
    fn roots(&self) -> Vec<ResourceId>;

    /// Workspace root containing `resource`, if any.
    fn root_of(&self, resource: &ResourceId) -> Option<ResourceId>;

    /// Merged file-exclude and search-exclude glob patterns, scoped to
    /// a root. `None` asks for the fallback patterns applied outside
    /// every root.
    fn exclude_patterns(&self, root: Option<&ResourceId>) -> Vec<String>;

    /// Scheme the workspace stores its own files under.
    fn default_scheme(&self) -> String;

    /// Remove a resource from the external recently-opened list.
    fn remove_recently_opened(&mut self, resource: &ResourceId);

    fn clear_recently_opened(&mut self);
}
