//! Core data model: resources, editor references, and selections.
//!
//! # Modules
//!
//! - `resource`: resource identity and containment
//! - `editor`: live handles, descriptors, open options
//! - `selection`: selection snapshots and change reasons

pub mod editor;
pub mod resource;
pub mod selection;

pub use editor::{
    EditorHandle, EditorKind, EditorRef, GroupId, HandleId, OpenOptions, PaneId,
    ResourceDescriptor,
};
pub use resource::{ResourceId, SCHEME_FILE, SCHEME_REMOTE, SCHEME_USERDATA};
pub use selection::{ChangeReason, SelectionComparison, SelectionSnapshot, SelectionState};
