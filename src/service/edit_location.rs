//! Last-edit-location bookmark.

use std::rc::Rc;

use crate::model::{EditorHandle, HandleId, SelectionSnapshot};

use super::disposal::{DisposalRegistry, WatchDisposal};

/// Where the last edit happened.
#[derive(Debug, Clone)]
pub struct EditLocation {
    pub editor: Rc<dyn EditorHandle>,
    pub selection: Option<SelectionSnapshot>,
}

/// Single-slot bookmark of the most recent edit, cleared when its
/// handle is disposed.
#[derive(Debug, Default)]
pub struct EditLocationSlot {
    location: Option<EditLocation>,
    disposals: DisposalRegistry,
}

impl EditLocationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        editor: Rc<dyn EditorHandle>,
        selection: Option<SelectionSnapshot>,
        watch: &mut WatchDisposal,
    ) {
        self.disposals.clear();
        self.disposals.insert(editor.id(), watch(&editor));
        self.location = Some(EditLocation { editor, selection });
    }

    pub fn get(&self) -> Option<EditLocation> {
        self.location.clone()
    }

    pub fn remove_handle(&mut self, id: HandleId) {
        if self
            .location
            .as_ref()
            .is_some_and(|location| location.editor.id() == id)
        {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.location = None;
        self.disposals.clear();
    }
}
