//! Identity matching across live handles, descriptors, and file events.
//!
//! One comparison protocol serves every history component: stacks store
//! a mix of live handles and serialized descriptors, and file events
//! (delete, move) must find matching entries in either representation.

use std::collections::BTreeSet;

use crate::model::{EditorHandle, EditorRef, ResourceDescriptor, ResourceId};

/// Decides whether two editor references denote the same logical
/// resource.
///
/// During host restore, serialized descriptors may be stale; a live
/// handle is only claimed equal to a descriptor before restore has
/// finished when a content provider is registered for the resource's
/// scheme.
#[derive(Debug, Default)]
pub struct IdentityMatcher {
    restored: bool,
    provider_schemes: BTreeSet<String>,
}

impl IdentityMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks host restore as finished, lifting the live-vs-descriptor
    /// gate.
    pub fn mark_restored(&mut self) {
        self.restored = true;
    }

    pub fn register_provider_scheme(&mut self, scheme: impl Into<String>) {
        self.provider_schemes.insert(scheme.into());
    }

    /// A deleted resource matches serialized descriptors only, and only
    /// exactly: deleting `/a/b` never touches `/a/b/c`.
    pub fn matches_deleted(&self, deleted: &ResourceId, editor: &EditorRef) -> bool {
        match editor {
            EditorRef::Descriptor(descriptor) => descriptor.resource == *deleted,
            // A live handle for a deleted resource removes itself on disposal.
            EditorRef::Handle(_) => false,
        }
    }

    /// A move source matches serialized descriptors at or below the
    /// source path, so folder renames cascade to contained files. Live
    /// handles never match: the host rewires them itself.
    pub fn matches_moved(&self, source: &ResourceId, editor: &EditorRef) -> bool {
        match editor {
            EditorRef::Descriptor(descriptor) => {
                descriptor.resource.is_equal_or_descendant_of(source)
            }
            EditorRef::Handle(_) => false,
        }
    }

    /// Exact-resource match against either representation.
    pub fn matches_resource(&self, resource: &ResourceId, editor: &EditorRef) -> bool {
        editor.resource().is_some_and(|r| r == *resource)
    }

    /// Whether two editor references denote the same logical resource.
    pub fn matches(&self, a: &EditorRef, b: &EditorRef) -> bool {
        match (a, b) {
            (EditorRef::Handle(x), EditorRef::Handle(y)) => x.matches(y.as_ref()),
            (EditorRef::Handle(handle), EditorRef::Descriptor(descriptor))
            | (EditorRef::Descriptor(descriptor), EditorRef::Handle(handle)) => {
                self.handle_matches_descriptor(handle.as_ref(), descriptor)
            }
            (EditorRef::Descriptor(x), EditorRef::Descriptor(y)) => {
                if x.resource != y.resource {
                    return false;
                }
                match (&x.kind, &y.kind) {
                    (Some(a), Some(b)) => a == b,
                    _ => true,
                }
            }
        }
    }

    fn handle_matches_descriptor(
        &self,
        handle: &dyn EditorHandle,
        descriptor: &ResourceDescriptor,
    ) -> bool {
        let Some(resource) = handle.resource() else {
            return false;
        };
        if resource != descriptor.resource {
            return false;
        }
        // Stale-descriptor gate: before restore finished, only trust
        // schemes that have a registered content provider.
        self.restored || self.provider_schemes.contains(resource.scheme())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EditorKind, ResourceDescriptor};

    fn res(s: &str) -> ResourceId {
        ResourceId::parse(s).unwrap()
    }

    fn descriptor(s: &str) -> EditorRef {
        EditorRef::Descriptor(ResourceDescriptor::new(res(s)))
    }

    #[test]
    fn test_delete_matches_exactly() {
        let matcher = IdentityMatcher::new();
        let deleted = res("file:///a/b");
        assert!(matcher.matches_deleted(&deleted, &descriptor("file:///a/b")));
        assert!(!matcher.matches_deleted(&deleted, &descriptor("file:///a/b/c")));
        assert!(!matcher.matches_deleted(&deleted, &descriptor("file:///a")));
    }

    #[test]
    fn test_move_cascades_to_descendants() {
        let matcher = IdentityMatcher::new();
        let source = res("file:///project/old");
        assert!(matcher.matches_moved(&source, &descriptor("file:///project/old")));
        assert!(matcher.matches_moved(&source, &descriptor("file:///project/old/deep/f.rs")));
        assert!(!matcher.matches_moved(&source, &descriptor("file:///project/older/f.rs")));
    }

    #[test]
    fn test_descriptor_kinds_must_agree_when_both_known() {
        let matcher = IdentityMatcher::new();
        let text = EditorRef::Descriptor(ResourceDescriptor::with_kind(
            res("file:///a.rs"),
            EditorKind::new("text"),
        ));
        let diff = EditorRef::Descriptor(ResourceDescriptor::with_kind(
            res("file:///a.rs"),
            EditorKind::new("diff"),
        ));
        let untagged = descriptor("file:///a.rs");
        assert!(!matcher.matches(&text, &diff));
        assert!(matcher.matches(&text, &untagged));
        assert!(matcher.matches(&text, &text.clone()));
    }

    #[test]
    fn test_missing_resource_never_matches() {
        let matcher = IdentityMatcher::new();
        assert!(!matcher.matches_resource(&res("file:///a.rs"), &descriptor("file:///b.rs")));
    }
}
