//! Draft/publish state - the has-draft flag and its transitions.
//!
//! Pure state machine with no I/O. Callers feed it the current published
//! text and draft, and get back the transition (if any) that observers
//! such as status badges care about.

use serde::{Deserialize, Serialize};

/// An observable change of the has-draft flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DraftTransition {
    /// The draft diverged from the published text (false -> true).
    Opened,
    /// The draft and published text agree again (true -> false).
    Cleared,
}

/// Tracks whether the draft differs from the published text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DraftState {
    has_draft: bool,
}

impl DraftState {
    pub fn new(text: &str, draft: &str) -> Self {
        Self {
            has_draft: text != draft,
        }
    }

    pub fn has_draft(&self) -> bool {
        self.has_draft
    }

    /// Re-evaluate the flag after the draft changed.
    pub fn observe(&mut self, text: &str, draft: &str) -> Option<DraftTransition> {
        self.set(text != draft)
    }

    /// Record a publish: text now equals draft.
    pub fn publish(&mut self) -> Option<DraftTransition> {
        self.set(false)
    }

    fn set(&mut self, has_draft: bool) -> Option<DraftTransition> {
        let transition = match (self.has_draft, has_draft) {
            (false, true) => Some(DraftTransition::Opened),
            (true, false) => Some(DraftTransition::Cleared),
            _ => None,
        };
        self.has_draft = has_draft;
        transition
    }
}
