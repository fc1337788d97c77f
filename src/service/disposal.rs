//! Disposal-subscription bookkeeping for stacks holding live handles.

use std::fmt;

use indexmap::IndexMap;

use crate::host::Subscription;
use crate::model::{EditorHandle, HandleId};

/// Callback acquiring a disposal subscription for a live handle.
///
/// Components take this instead of the full editor-access collaborator
/// so they stay testable in isolation.
pub type WatchDisposal = dyn FnMut(&std::rc::Rc<dyn EditorHandle>) -> Subscription;

/// Map from a live handle's identity to its cleanup subscription.
///
/// Each stack owns one registry. Inserting for an already-watched
/// handle replaces (and thereby releases) the prior subscription;
/// removing drops the token, unsubscribing deterministically. Entries
/// backed by descriptors never appear here.
#[derive(Default)]
pub struct DisposalRegistry {
    subs: IndexMap<HandleId, Subscription>,
}

impl DisposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: HandleId, subscription: Subscription) {
        self.subs.insert(id, subscription);
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.subs.contains_key(&id)
    }

    /// Drops the subscription for `id`, if one is held.
    pub fn remove(&mut self, id: HandleId) {
        self.subs.shift_remove(&id);
    }

    pub fn clear(&mut self) {
        self.subs.clear();
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

impl fmt::Debug for DisposalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposalRegistry")
            .field("watched", &self.subs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_sub(active: &Rc<Cell<usize>>) -> Subscription {
        active.set(active.get() + 1);
        let active = Rc::clone(active);
        Subscription::new(move || active.set(active.get() - 1))
    }

    #[test]
    fn test_remove_releases_subscription() {
        let active = Rc::new(Cell::new(0));
        let mut registry = DisposalRegistry::new();
        registry.insert(HandleId(1), counting_sub(&active));
        assert_eq!(active.get(), 1);

        registry.remove(HandleId(1));
        assert_eq!(active.get(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_replaces_prior_subscription() {
        let active = Rc::new(Cell::new(0));
        let mut registry = DisposalRegistry::new();
        registry.insert(HandleId(1), counting_sub(&active));
        registry.insert(HandleId(1), counting_sub(&active));
        assert_eq!(active.get(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear_releases_everything() {
        let active = Rc::new(Cell::new(0));
        let mut registry = DisposalRegistry::new();
        registry.insert(HandleId(1), counting_sub(&active));
        registry.insert(HandleId(2), counting_sub(&active));
        registry.clear();
        assert_eq!(active.get(), 0);
    }
}
