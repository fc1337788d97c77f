//! Cycling through most-recently-used editors.
//!
//! The ordering is snapshotted lazily on the first cycle of a session
//! and stays frozen while the user keeps cycling; any externally caused
//! recency change invalidates the session, forcing a fresh snapshot on
//! the next cycle.

use std::rc::Rc;

use crate::host::{EditorAccess, EditorOrder};
use crate::model::{EditorHandle, GroupId};

/// Direction of a cycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    /// Toward more recently used editors.
    Next,
    /// Toward less recently used editors.
    Previous,
}

/// Frozen recency ordering captured at the start of a session.
#[derive(Debug)]
struct RecentlyUsedSnapshot {
    /// None cycles across all groups.
    scope: Option<GroupId>,
    /// Most recently active first.
    editors: Vec<Rc<dyn EditorHandle>>,
    index: usize,
}

/// Tracks the active cycling session, global or per-group.
#[derive(Debug, Default)]
pub struct RecentlyUsedTracker {
    session: Option<RecentlyUsedSnapshot>,
}

impl RecentlyUsedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the cursor and returns the editor to open. Captures a
    /// fresh snapshot when no session is active or the scope changed.
    /// The cursor clamps at both ends.
    pub fn cycle(
        &mut self,
        scope: Option<GroupId>,
        direction: CycleDirection,
        access: &dyn EditorAccess,
    ) -> Option<Rc<dyn EditorHandle>> {
        let needs_snapshot = match &self.session {
            Some(session) => session.scope != scope,
            None => true,
        };
        if needs_snapshot {
            let editors: Vec<Rc<dyn EditorHandle>> = match scope {
                Some(group) => access.editors_in_group(group, EditorOrder::MostRecentlyActive),
                None => access
                    .editors(EditorOrder::MostRecentlyActive)
                    .into_iter()
                    .map(|(_, editor)| editor)
                    .collect(),
            };
            if editors.is_empty() {
                self.session = None;
                return None;
            }
            self.session = Some(RecentlyUsedSnapshot {
                scope,
                editors,
                index: 0,
            });
        }

        let session = self.session.as_mut()?;
        let oldest = session.editors.len() - 1;
        session.index = match direction {
            CycleDirection::Next => session.index.saturating_sub(1),
            CycleDirection::Previous => (session.index + 1).min(oldest),
        };
        session.editors.get(session.index).cloned()
    }

    /// Drops the frozen ordering; the next cycle starts a new session.
    pub fn invalidate(&mut self) {
        self.session = None;
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }
}
