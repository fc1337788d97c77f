//! Recently-closed editors.
//!
//! A bounded LIFO of closed-editor records, most recent at the tail.
//! Only genuine closures are recorded: tabs replaced in place or moved
//! across groups never really closed.

use crate::host::{CloseContext, EditorCloseEvent};
use crate::model::{EditorKind, ResourceDescriptor, ResourceId};

/// Everything needed to restore a closed editor.
#[derive(Debug, Clone)]
pub struct ClosedEditorRecord {
    pub kind: EditorKind,
    /// Serializable projection the reopen is issued against.
    pub untyped: ResourceDescriptor,
    pub primary_resource: Option<ResourceId>,
    /// Every resource the editor showed (both sides of a side-by-side).
    pub associated_resources: Vec<ResourceId>,
    /// Tab index the editor occupied when it closed.
    pub index: usize,
    pub sticky: bool,
}

impl ClosedEditorRecord {
    /// Whether any resource this record references equals `resource`.
    /// A composite record references its untyped projection, its
    /// primary resource, and every associated side.
    pub fn references(&self, resource: &ResourceId) -> bool {
        self.untyped.resource == *resource
            || self.primary_resource.as_ref() == Some(resource)
            || self.associated_resources.iter().any(|r| r == resource)
    }

    /// Whether any referenced resource is `source` or lives below it.
    pub fn references_within(&self, source: &ResourceId) -> bool {
        self.untyped.resource.is_equal_or_descendant_of(source)
            || self
                .primary_resource
                .as_ref()
                .is_some_and(|r| r.is_equal_or_descendant_of(source))
            || self
                .associated_resources
                .iter()
                .any(|r| r.is_equal_or_descendant_of(source))
    }
}

/// Bounded ring of [`ClosedEditorRecord`]s.
#[derive(Debug)]
pub struct ClosedEditors {
    records: Vec<ClosedEditorRecord>,
    limit: usize,
}

impl ClosedEditors {
    pub fn new(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ClosedEditorRecord] {
        &self.records
    }

    /// Records a close event. Returns false when the event does not
    /// qualify: not a genuine closure, or the editor has no untyped
    /// projection to reopen from.
    pub fn record(&mut self, event: &EditorCloseEvent) -> bool {
        if event.context != CloseContext::Normal {
            return false;
        }
        let Some(untyped) = event.editor.untyped() else {
            return false;
        };

        // One record per resource: a re-close of the same resource
        // supersedes the older record.
        let resource = untyped.resource.clone();
        self.records.retain(|record| record.untyped.resource != resource);

        self.records.push(ClosedEditorRecord {
            kind: event.editor.kind(),
            primary_resource: event.editor.resource(),
            associated_resources: event.editor.associated_resources(),
            untyped,
            index: event.index,
            sticky: event.sticky,
        });

        if self.records.len() > self.limit {
            self.records.remove(0);
        }
        true
    }

    /// Pops the most recently closed record.
    pub fn pop(&mut self) -> Option<ClosedEditorRecord> {
        self.records.pop()
    }

    /// Removes records the predicate matches.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&ClosedEditorRecord) -> bool) {
        self.records.retain(|record| !pred(record));
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
