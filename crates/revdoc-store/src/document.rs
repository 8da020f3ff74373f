//! Authoritative Document - the single source of truth for one asset.
//!
//! Owns the published text, the live draft, the revision history and the
//! draft state. Every submission is validated and rebased completely before
//! anything is mutated, so a rejected submission leaves no trace.

use crate::draft::{DraftState, DraftTransition};
use crate::error::{ApplyError, ExportError, PersistenceError};
use crate::export::Exporter;
use crate::history::{RetentionPolicy, RevisionHistory};
use crate::persistence::{normalize_line_endings, Persistence};
use revdoc_core::{ClientId, DocumentId, RevisionId, TextOperation};
use serde::{Deserialize, Serialize};

/// State a mirror needs to (re)synchronize with the authoritative document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub text: String,
    pub draft: String,
    pub revision: RevisionId,
}

/// Notifications for external observers (persistence triggers, badges).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentEvent {
    /// The document changed and may need to be persisted.
    Changed { revision: RevisionId },
    /// The draft diverged from the published text.
    DraftOpened,
    /// The published text caught up with the draft.
    DraftCleared,
}

impl From<DraftTransition> for DocumentEvent {
    fn from(transition: DraftTransition) -> Self {
        match transition {
            DraftTransition::Opened => DocumentEvent::DraftOpened,
            DraftTransition::Cleared => DocumentEvent::DraftCleared,
        }
    }
}

/// An edit as received from a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// Who the client claims authored the edit.
    pub submitter: ClientId,
    pub operation: TextOperation,
    /// The revision the operation was computed against.
    pub base_revision: RevisionId,
}

impl Submission {
    pub fn new(submitter: ClientId, operation: TextOperation, base_revision: RevisionId) -> Self {
        Self {
            submitter,
            operation,
            base_revision,
        }
    }
}

/// A submission accepted into the history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accepted {
    /// The operation rebased onto the draft it was applied to. This form is
    /// what every mirror must apply.
    pub operation: TextOperation,
    /// The revision this operation produced.
    pub revision: RevisionId,
}

/// The authoritative copy of one asset.
#[derive(Clone, Debug)]
pub struct AuthoritativeDocument {
    id: DocumentId,
    text: String,
    draft: String,
    history: RevisionHistory,
    draft_state: DraftState,
    pending_events: Vec<DocumentEvent>,
}

impl AuthoritativeDocument {
    /// Create a document at revision 0.
    pub fn new(
        id: DocumentId,
        text: impl Into<String>,
        draft: impl Into<String>,
        retention: RetentionPolicy,
    ) -> Self {
        Self::from_snapshot(
            id,
            Snapshot {
                text: text.into(),
                draft: draft.into(),
                revision: RevisionId::INITIAL,
            },
            retention,
        )
    }

    /// Rebuild a document from a snapshot, keeping its revision.
    pub fn from_snapshot(id: DocumentId, snapshot: Snapshot, retention: RetentionPolicy) -> Self {
        let draft_state = DraftState::new(&snapshot.text, &snapshot.draft);
        Self {
            id,
            text: snapshot.text,
            draft: snapshot.draft,
            history: RevisionHistory::new(snapshot.revision, retention),
            draft_state,
            pending_events: Vec::new(),
        }
    }

    /// Load an asset from storage. Line endings are normalized here, once.
    pub fn load<P: Persistence + ?Sized>(
        id: DocumentId,
        persistence: &P,
        retention: RetentionPolicy,
    ) -> Result<Self, PersistenceError> {
        let asset = persistence.load()?;
        let text = normalize_line_endings(&asset.text);
        let draft = normalize_line_endings(&asset.draft);
        tracing::debug!(document = %id, has_draft = text != draft, "Loaded asset");
        Ok(Self::new(id, text, draft, retention))
    }

    // === Accessors ===

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// The published text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The live draft under editing.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn revision(&self) -> RevisionId {
        self.history.head()
    }

    pub fn has_draft(&self) -> bool {
        self.draft_state.has_draft()
    }

    pub fn history(&self) -> &RevisionHistory {
        &self.history
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            draft: self.draft.clone(),
            revision: self.revision(),
        }
    }

    // === Editing ===

    /// Accept an edit from `caller`.
    ///
    /// The operation is rebased over every operation accepted after its base
    /// revision, applied to the draft, and appended to the history. The
    /// returned operation is the rebased form that must be broadcast.
    pub fn submit(
        &mut self,
        caller: &ClientId,
        submission: Submission,
    ) -> Result<Accepted, ApplyError> {
        let Submission {
            submitter,
            operation,
            base_revision,
        } = submission;

        if &submitter != caller {
            tracing::warn!(document = %self.id, %submitter, %caller, "Rejected edit with foreign identity");
            return Err(ApplyError::IdentityMismatch {
                declared: submitter,
                caller: caller.clone(),
            });
        }

        let current = self.revision();
        let (rebased, draft) = match self.rebase(operation, base_revision) {
            Ok(rebased) => rebased,
            Err(e) => {
                tracing::warn!(document = %self.id, base = %base_revision, %current, error = %e, "Rejected edit");
                return Err(e);
            }
        };

        // Nothing below can fail.
        self.draft = draft;
        let revision = self.history.push(rebased.clone());
        self.pending_events.push(DocumentEvent::Changed { revision });
        if let Some(transition) = self.draft_state.observe(&self.text, &self.draft) {
            tracing::info!(document = %self.id, ?transition, "Draft state changed");
            self.pending_events.push(transition.into());
        }

        tracing::debug!(
            document = %self.id,
            %submitter,
            base = %base_revision,
            %revision,
            "Accepted edit"
        );

        Ok(Accepted {
            operation: rebased,
            revision,
        })
    }

    /// Rebase `operation` from `base` onto the current draft and compute the
    /// resulting draft, without touching `self`.
    fn rebase(
        &self,
        mut operation: TextOperation,
        base: RevisionId,
    ) -> Result<(TextOperation, String), ApplyError> {
        for concurrent in self.history.since(base)? {
            let (rebased, _) = TextOperation::transform(&operation, concurrent)?;
            operation = rebased;
        }
        let draft = operation.apply(&self.draft)?;
        Ok((operation, draft))
    }

    /// Publish the draft: the published text becomes the draft.
    ///
    /// Idempotent apart from the change notification. Does not touch the
    /// revision.
    pub fn publish(&mut self) -> Option<DraftTransition> {
        self.text.clone_from(&self.draft);
        let transition = self.draft_state.publish();
        if let Some(transition) = transition {
            self.pending_events.push(transition.into());
        }
        self.pending_events.push(DocumentEvent::Changed {
            revision: self.revision(),
        });

        tracing::info!(document = %self.id, revision = %self.revision(), "Published draft");
        transition
    }

    /// Drain queued notifications, oldest first.
    pub fn take_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Forget history up to `acknowledged` once every mirror has caught up.
    pub fn compact(&mut self, acknowledged: RevisionId) -> usize {
        let removed = self.history.prune_through(acknowledged);
        if removed > 0 {
            tracing::debug!(document = %self.id, removed, floor = %self.history.floor(), "Compacted history");
        }
        removed
    }

    // === Boundaries ===

    /// Persist the document. The draft is only written while it differs
    /// from the published text.
    pub fn save_to<P: Persistence + ?Sized>(&self, persistence: &P) -> Result<(), PersistenceError> {
        let draft = self.has_draft().then_some(self.draft.as_str());
        persistence.save(&self.text, draft)
    }

    /// Render the published text.
    pub fn export_with<E: Exporter + ?Sized>(&self, exporter: &E) -> Result<Vec<u8>, ExportError> {
        exporter.export(&self.text)
    }
}
