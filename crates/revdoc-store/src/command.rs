//! Asset commands - the closed set of requests a client can make.
//!
//! Commands carry typed payloads and are dispatched by exhaustive matching;
//! an unknown command cannot be expressed. Each command produces an
//! [`AssetEvent`] which the transport broadcasts to every subscriber.

use crate::document::{AuthoritativeDocument, Submission};
use crate::error::ApplyError;
use revdoc_core::{ClientId, InvalidOperation, OperationData, RevisionId, TextOperation};
use serde::{Deserialize, Serialize};

/// Payload of an edit request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditText {
    pub operation: OperationData,
    /// Revision the operation was computed against.
    pub base_revision: RevisionId,
}

impl EditText {
    pub fn new(user_id: ClientId, operation: &TextOperation, base_revision: RevisionId) -> Self {
        Self {
            operation: OperationData::new(user_id, operation),
            base_revision,
        }
    }
}

/// A request against one asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum AssetCommand {
    /// Apply an edit to the draft.
    EditText(EditText),
    /// Publish the draft.
    ApplyDraftChanges,
}

/// What every subscriber of an asset receives after a command succeeds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AssetEvent {
    /// An edit was accepted as `revision`. The operation is the rebased form.
    #[serde(rename_all = "camelCase")]
    TextEdited {
        operation: OperationData,
        revision: RevisionId,
    },
    /// The draft was published.
    DraftChangesApplied,
}

impl AssetEvent {
    /// The accepted operation and its revision, for `TextEdited`.
    pub fn edit(&self) -> Option<Result<(TextOperation, RevisionId), InvalidOperation>> {
        match self {
            AssetEvent::TextEdited {
                operation,
                revision,
            } => Some(operation.accepted_operation().map(|op| (op, *revision))),
            AssetEvent::DraftChangesApplied => None,
        }
    }
}

impl AuthoritativeDocument {
    /// Run a command on behalf of the authenticated `caller`.
    ///
    /// The identity check and the operation decoding both happen before the
    /// document is touched.
    pub fn dispatch(
        &mut self,
        caller: &ClientId,
        command: AssetCommand,
    ) -> Result<AssetEvent, ApplyError> {
        match command {
            AssetCommand::EditText(EditText {
                operation,
                base_revision,
            }) => {
                if &operation.user_id != caller {
                    return Err(ApplyError::IdentityMismatch {
                        declared: operation.user_id,
                        caller: caller.clone(),
                    });
                }
                let decoded = operation.operation()?;
                let submitter = operation.user_id;

                let accepted =
                    self.submit(caller, Submission::new(submitter.clone(), decoded, base_revision))?;
                Ok(AssetEvent::TextEdited {
                    operation: OperationData::new(submitter, &accepted.operation),
                    revision: accepted.revision,
                })
            }
            AssetCommand::ApplyDraftChanges => {
                self.publish();
                Ok(AssetEvent::DraftChangesApplied)
            }
        }
    }
}
