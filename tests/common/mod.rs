//! Shared mock host for the integration suites.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use navquill::host::{
    EditorAccess, EditorEvent, EditorOrder, Subscription, Workspace,
};
use navquill::model::{
    EditorHandle, EditorKind, EditorRef, GroupId, HandleId, OpenOptions, PaneId,
    ResourceDescriptor, ResourceId, SelectionSnapshot,
};

pub fn res(s: &str) -> ResourceId {
    ResourceId::parse(s).unwrap()
}

/// A scripted live editor handle.
#[derive(Debug)]
pub struct TestEditor {
    pub id: HandleId,
    pub kind: EditorKind,
    pub resource: Option<ResourceId>,
    pub supports_selection: bool,
    /// Untyped projection; defaults to the resource when present.
    pub untyped: Option<ResourceDescriptor>,
    /// Associated resources; empty means just the primary one.
    pub associated: Vec<ResourceId>,
}

impl TestEditor {
    pub fn text(id: u64, resource: &str) -> Rc<Self> {
        let resource = res(resource);
        Rc::new(Self {
            id: HandleId(id),
            kind: EditorKind::new("text"),
            untyped: Some(ResourceDescriptor::with_kind(
                resource.clone(),
                EditorKind::new("text"),
            )),
            resource: Some(resource),
            supports_selection: true,
            associated: Vec::new(),
        })
    }

    /// A side-by-side editor showing two resources, recorded for
    /// reopening through a synthetic descriptor.
    pub fn side_by_side(id: u64, left: &str, right: &str) -> Rc<Self> {
        Rc::new(Self {
            id: HandleId(id),
            kind: EditorKind::new("diff"),
            resource: Some(res(right)),
            supports_selection: true,
            untyped: Some(ResourceDescriptor::with_kind(
                res(&format!("diff:///compare/{id}")),
                EditorKind::new("diff"),
            )),
            associated: vec![res(left), res(right)],
        })
    }

    /// An editor with no selection concept and no resource, e.g. a
    /// welcome page. Stored live, never persisted.
    pub fn opaque(id: u64) -> Rc<Self> {
        Rc::new(Self {
            id: HandleId(id),
            kind: EditorKind::new("welcome"),
            resource: None,
            supports_selection: false,
            untyped: None,
            associated: Vec::new(),
        })
    }

}

impl EditorHandle for TestEditor {
    fn id(&self) -> HandleId {
        self.id
    }

    fn kind(&self) -> EditorKind {
        self.kind.clone()
    }

    fn resource(&self) -> Option<ResourceId> {
        self.resource.clone()
    }

    fn associated_resources(&self) -> Vec<ResourceId> {
        if self.associated.is_empty() {
            self.resource.clone().into_iter().collect()
        } else {
            self.associated.clone()
        }
    }

    fn untyped(&self) -> Option<ResourceDescriptor> {
        self.untyped.clone()
    }

    fn supports_selection(&self) -> bool {
        self.supports_selection
    }
}

/// One recorded `open_editor` call.
#[derive(Debug, Clone)]
pub struct OpenCall {
    pub resource: Option<ResourceId>,
    pub options: OpenOptions,
}

/// Scripted result for the next `open_editor` calls, front first.
pub type OpenScript = Vec<anyhow::Result<Option<PaneId>>>;

#[derive(Default)]
pub struct MockAccess {
    /// Most recently active first.
    pub recency: Vec<(GroupId, Rc<dyn EditorHandle>)>,
    pub active_group: u32,
    /// Sticky state per (group, index).
    pub sticky: HashMap<(u32, usize), bool>,
    /// Occupied tab slots per (group, index).
    pub slots: HashMap<(u32, usize), Rc<dyn EditorHandle>>,
    /// Events handed back on the next `drain_events`.
    pub queued: Vec<EditorEvent>,
    pub open_calls: Vec<OpenCall>,
    pub open_script: OpenScript,
    pub active_watches: Rc<Cell<usize>>,
}

impl MockAccess {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn with_recency(editors: &[Rc<TestEditor>]) -> Rc<RefCell<Self>> {
        let access = Self::new();
        access.borrow_mut().recency = editors
            .iter()
            .map(|e| (GroupId(0), Rc::clone(e) as Rc<dyn EditorHandle>))
            .collect();
        access
    }
}

impl EditorAccess for MockAccess {
    fn active_editor(&self) -> Option<Rc<dyn EditorHandle>> {
        self.recency.first().map(|(_, editor)| Rc::clone(editor))
    }

    fn active_group(&self) -> GroupId {
        GroupId(self.active_group)
    }

    fn editors(&self, _order: EditorOrder) -> Vec<(GroupId, Rc<dyn EditorHandle>)> {
        self.recency
            .iter()
            .map(|(group, editor)| (*group, Rc::clone(editor)))
            .collect()
    }

    fn editors_in_group(&self, group: GroupId, _order: EditorOrder) -> Vec<Rc<dyn EditorHandle>> {
        self.recency
            .iter()
            .filter(|(g, _)| *g == group)
            .map(|(_, editor)| Rc::clone(editor))
            .collect()
    }

    fn editor_at(&self, group: GroupId, index: usize) -> Option<Rc<dyn EditorHandle>> {
        self.slots.get(&(group.0, index)).cloned()
    }

    fn is_sticky(&self, group: GroupId, index: usize) -> bool {
        self.sticky.get(&(group.0, index)).copied().unwrap_or(false)
    }

    fn open_editor(
        &mut self,
        editor: &EditorRef,
        options: &OpenOptions,
    ) -> anyhow::Result<Option<PaneId>> {
        self.open_calls.push(OpenCall {
            resource: editor.resource(),
            options: options.clone(),
        });
        if self.open_script.is_empty() {
            Ok(Some(PaneId(1)))
        } else {
            self.open_script.remove(0)
        }
    }

    fn watch_disposal(&mut self, _editor: &Rc<dyn EditorHandle>) -> Subscription {
        let watches = Rc::clone(&self.active_watches);
        watches.set(watches.get() + 1);
        Subscription::new(move || watches.set(watches.get() - 1))
    }

    fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.queued)
    }
}

#[derive(Default)]
pub struct MockWorkspace {
    pub roots: Vec<ResourceId>,
    /// Patterns per root path; `None` key is the fallback set.
    pub excludes: HashMap<Option<String>, Vec<String>>,
    pub default_scheme: String,
    pub removed_recently_opened: Vec<ResourceId>,
    pub cleared_recently_opened: bool,
}

impl MockWorkspace {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            default_scheme: "file".to_string(),
            ..Self::default()
        }))
    }

    pub fn with_fallback_excludes(patterns: &[&str]) -> Rc<RefCell<Self>> {
        let workspace = Self::new();
        workspace
            .borrow_mut()
            .excludes
            .insert(None, patterns.iter().map(|p| p.to_string()).collect());
        workspace
    }
}

impl Workspace for MockWorkspace {
    fn roots(&self) -> Vec<ResourceId> {
        self.roots.clone()
    }

    fn root_of(&self, resource: &ResourceId) -> Option<ResourceId> {
        self.roots
            .iter()
            .find(|root| resource.is_equal_or_descendant_of(root))
            .cloned()
    }

    fn exclude_patterns(&self, root: Option<&ResourceId>) -> Vec<String> {
        let key = root.map(|r| r.to_string());
        self.excludes.get(&key).cloned().unwrap_or_default()
    }

    fn default_scheme(&self) -> String {
        self.default_scheme.clone()
    }

    fn remove_recently_opened(&mut self, resource: &ResourceId) {
        self.removed_recently_opened.push(resource.clone());
    }

    fn clear_recently_opened(&mut self) {
        self.cleared_recently_opened = true;
    }
}

/// Convenience: a selection snapshot.
pub fn sel(line: u32, column: u32) -> SelectionSnapshot {
    SelectionSnapshot::new(line, column)
}
