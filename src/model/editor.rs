//! Editor references: live, disposable handles and serializable
//! resource descriptors.
//!
//! History components never assume an editor stays alive. Anything that
//! must survive handle disposal (or a process restart) is stored as a
//! [`ResourceDescriptor`]; everything else is stored as a live handle
//! and evicted when the handle is disposed.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::resource::ResourceId;
use super::selection::SelectionSnapshot;

/// Stable identity token of a live editor handle.
///
/// Assigned by the host; two handles with the same id are the same
/// editor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

/// Editor implementation identifier, e.g. `"text"` or `"diff"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditorKind(pub String);

impl EditorKind {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Identifier of an editor group (a tab strip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u32);

/// Identifier of an open editor pane, returned by the host on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneId(pub u64);

/// Live, disposable representation of an open editor.
///
/// Implemented by the host. Handle equality is host-owned: the default
/// compares identity tokens, but composite editors may override it.
pub trait EditorHandle: fmt::Debug {
    fn id(&self) -> HandleId;

    fn kind(&self) -> EditorKind;

    /// Primary resource backing this editor, if any.
    fn resource(&self) -> Option<ResourceId>;

    /// Every resource shown by this editor. A side-by-side editor
    /// reports both sides; plain editors report their primary resource.
    fn associated_resources(&self) -> Vec<ResourceId> {
        self.resource().into_iter().collect()
    }

    /// Serializable projection of this editor, if it has one. Editors
    /// without an untyped projection cannot be recorded for reopening.
    fn untyped(&self) -> Option<ResourceDescriptor>;

    /// Whether this editor exposes a cursor/selection concept.
    fn supports_selection(&self) -> bool;

    /// Current selection, for editors that support one.
    fn selection(&self) -> Option<SelectionSnapshot> {
        None
    }

    /// Host-owned handle equality.
    fn matches(&self, other: &dyn EditorHandle) -> bool {
        self.id() == other.id()
    }
}

/// Serializable, handle-independent reference to editor content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub resource: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EditorKind>,
}

impl ResourceDescriptor {
    pub fn new(resource: ResourceId) -> Self {
        Self {
            resource,
            kind: None,
        }
    }

    pub fn with_kind(resource: ResourceId, kind: EditorKind) -> Self {
        Self {
            resource,
            kind: Some(kind),
        }
    }
}

/// A reference to an editor: either a live handle or a descriptor.
#[derive(Debug, Clone)]
pub enum EditorRef {
    Handle(Rc<dyn EditorHandle>),
    Descriptor(ResourceDescriptor),
}

impl EditorRef {
    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            EditorRef::Handle(handle) => handle.resource(),
            EditorRef::Descriptor(descriptor) => Some(descriptor.resource.clone()),
        }
    }

    pub fn kind(&self) -> Option<EditorKind> {
        match self {
            EditorRef::Handle(handle) => Some(handle.kind()),
            EditorRef::Descriptor(descriptor) => descriptor.kind.clone(),
        }
    }

    pub fn as_handle(&self) -> Option<&Rc<dyn EditorHandle>> {
        match self {
            EditorRef::Handle(handle) => Some(handle),
            EditorRef::Descriptor(_) => None,
        }
    }

    pub fn as_descriptor(&self) -> Option<&ResourceDescriptor> {
        match self {
            EditorRef::Handle(_) => None,
            EditorRef::Descriptor(descriptor) => Some(descriptor),
        }
    }

    /// Identity token when this reference is a live handle.
    pub fn handle_id(&self) -> Option<HandleId> {
        self.as_handle().map(|h| h.id())
    }
}

/// Options applied when (re)opening an editor through the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenOptions {
    /// Open as a pinned (non-preview) tab.
    pub pinned: bool,
    /// Open as a sticky tab.
    pub sticky: bool,
    /// Tab index to open at; None appends.
    pub index: Option<usize>,
    /// Reveal the existing pane instead of opening a second one.
    pub reveal_if_open: bool,
    /// Selection to restore after opening.
    pub selection: Option<SelectionSnapshot>,
}
