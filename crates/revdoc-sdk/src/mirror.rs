//! Local document mirror - the client-side copy of a document.
//!
//! Local edits apply immediately. The mirror keeps two views:
//!
//! - the *confirmed* state (published text, draft, revision), which only
//!   ever moves forward by applying authoritative broadcasts in revision
//!   order, whoever authored them;
//! - the *speculative* draft, which is the confirmed draft followed by every
//!   local edit that has not been acknowledged yet.
//!
//! At most one local edit is in flight. It is submitted against the
//! confirmed revision and, until its own broadcast comes back, every
//! foreign broadcast is transformed over the pending edits so the two
//! views stay consistent.

use crate::error::MirrorError;
use revdoc_core::{ClientId, RevisionId, TextOperation};
use revdoc_store::{AssetEvent, DraftState, DraftTransition, EditText, Snapshot};
use std::collections::VecDeque;

/// Client-side copy of one document.
#[derive(Clone, Debug)]
pub struct LocalMirror {
    client_id: ClientId,
    text: String,
    confirmed: String,
    revision: RevisionId,
    speculative: String,
    /// Unacknowledged local edits; the head is the one in flight, if any.
    pending: VecDeque<TextOperation>,
    in_flight: bool,
    draft_state: DraftState,
    transitions: Vec<DraftTransition>,
}

impl LocalMirror {
    /// Start from an authoritative snapshot.
    pub fn new(client_id: ClientId, snapshot: Snapshot) -> Self {
        let draft_state = DraftState::new(&snapshot.text, &snapshot.draft);
        Self {
            client_id,
            speculative: snapshot.draft.clone(),
            text: snapshot.text,
            confirmed: snapshot.draft,
            revision: snapshot.revision,
            pending: VecDeque::new(),
            in_flight: false,
            draft_state,
            transitions: Vec::new(),
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The published text as last broadcast.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The draft including local edits not yet acknowledged.
    pub fn draft(&self) -> &str {
        &self.speculative
    }

    /// The draft as of [`LocalMirror::revision`].
    pub fn confirmed_draft(&self) -> &str {
        &self.confirmed
    }

    /// Last authoritative revision incorporated.
    pub fn revision(&self) -> RevisionId {
        self.revision
    }

    /// Revision including pending local edits.
    pub fn local_revision(&self) -> RevisionId {
        RevisionId(self.revision.value() + self.pending.len() as u64)
    }

    pub fn has_draft(&self) -> bool {
        self.draft_state.has_draft()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// True when every local edit has been acknowledged.
    pub fn is_synchronized(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain draft transitions observed since the last call.
    pub fn take_transitions(&mut self) -> Vec<DraftTransition> {
        std::mem::take(&mut self.transitions)
    }

    // === Local side ===

    /// Apply a local edit to the speculative draft and queue it for submission.
    ///
    /// An edit without components (possible only on an empty draft) is
    /// validated and dropped.
    pub fn apply_local_edit(&mut self, op: TextOperation) -> Result<(), MirrorError> {
        let draft = op.apply(&self.speculative)?;
        if op.components().is_empty() {
            return Ok(());
        }
        self.speculative = draft;
        self.pending.push_back(op);
        self.observe_draft();
        Ok(())
    }

    /// The next edit to submit, if nothing is in flight.
    ///
    /// The returned edit is based on the confirmed revision. Call again
    /// after its acknowledgement to release the following one.
    pub fn take_outgoing(&mut self) -> Option<EditText> {
        if self.in_flight {
            return None;
        }
        let op = self.pending.front()?;
        self.in_flight = true;
        Some(EditText::new(self.client_id.clone(), op, self.revision))
    }

    /// The server refused the edit in flight.
    ///
    /// Every queued edit was built on top of it, so all of them are dropped
    /// and the draft falls back to the confirmed one. Broadcasts keep
    /// applying as before. Returns how many local edits were abandoned.
    pub fn reject_in_flight(&mut self) -> usize {
        if !self.in_flight {
            return 0;
        }
        let abandoned = self.pending.len();
        self.pending.clear();
        self.in_flight = false;
        self.speculative.clone_from(&self.confirmed);
        self.observe_draft();

        tracing::warn!(client = %self.client_id, abandoned, revision = %self.revision, "Dropped rejected edits");
        abandoned
    }

    // === Remote side ===

    /// Incorporate any broadcast event.
    pub fn on_event(&mut self, event: &AssetEvent) -> Result<(), MirrorError> {
        match event {
            AssetEvent::TextEdited {
                operation,
                revision,
            } => {
                let op = operation
                    .accepted_operation()
                    .map_err(|e| MirrorError::InvalidBroadcast(e.to_string()))?;
                self.on_remote_operation(&operation.user_id, op, *revision)
            }
            AssetEvent::DraftChangesApplied => {
                self.on_draft_changes_applied();
                Ok(())
            }
        }
    }

    /// Apply an accepted operation, already rebased by the server, that
    /// produced `revision`.
    ///
    /// Revisions at or below the current one are duplicates and ignored.
    pub fn on_remote_operation(
        &mut self,
        author: &ClientId,
        op: TextOperation,
        revision: RevisionId,
    ) -> Result<(), MirrorError> {
        if revision <= self.revision {
            tracing::debug!(client = %self.client_id, %revision, "Ignoring duplicate broadcast");
            return Ok(());
        }
        let expected = self.revision.next();
        if revision != expected {
            return Err(MirrorError::OutOfOrder {
                expected,
                received: revision,
            });
        }

        let confirmed = op.apply(&self.confirmed)?;

        if self.in_flight && author == &self.client_id {
            // Our own edit came back; the speculative draft already has it.
            self.pending.pop_front();
            self.in_flight = false;
        } else {
            let mut incoming = op;
            let mut rebased = VecDeque::with_capacity(self.pending.len());
            for (index, pending) in self.pending.iter().enumerate() {
                let (pending_prime, incoming_prime) = TextOperation::transform(pending, &incoming)?;
                incoming = incoming_prime;
                // An unsent edit cancelled out down to nothing has nothing to submit.
                let sent = index == 0 && self.in_flight;
                if pending_prime.components().is_empty() && !sent {
                    continue;
                }
                rebased.push_back(pending_prime);
            }
            let speculative = incoming.apply(&self.speculative)?;
            self.pending = rebased;
            self.speculative = speculative;
        }

        self.confirmed = confirmed;
        self.revision = revision;
        self.observe_draft();
        Ok(())
    }

    /// The authoritative draft was published.
    pub fn on_draft_changes_applied(&mut self) {
        self.text.clone_from(&self.confirmed);
        self.observe_draft();
    }

    /// Drop all pending edits and adopt the authoritative state.
    ///
    /// Returns how many local edits were abandoned.
    pub fn resync(&mut self, snapshot: Snapshot) -> usize {
        let abandoned = self.pending.len();
        self.pending.clear();
        self.in_flight = false;
        self.text = snapshot.text;
        self.speculative.clone_from(&snapshot.draft);
        self.confirmed = snapshot.draft;
        self.revision = snapshot.revision;
        self.observe_draft();

        if abandoned > 0 {
            tracing::warn!(client = %self.client_id, abandoned, revision = %self.revision, "Abandoned pending edits on resync");
        }
        abandoned
    }

    fn observe_draft(&mut self) {
        if let Some(transition) = self.draft_state.observe(&self.text, &self.speculative) {
            self.transitions.push(transition);
        }
    }
}
