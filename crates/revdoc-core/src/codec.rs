//! Operation codec - transport representation of text operations.
//!
//! On the wire an operation is an ordered list of single-key objects:
//!
//! ```text
//! [{"retain": 5}, {"insert": "hello"}, {"delete": 2}]
//! ```
//!
//! Decoding validates the whole list before an operation is built, so a
//! rejected payload never reaches a document.

use crate::error::InvalidOperation;
use crate::id::ClientId;
use crate::operation::{Component, TextOperation};
use serde::{Deserialize, Serialize};

/// One tagged component as it travels over the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportComponent {
    Retain(u64),
    Insert(String),
    Delete(u64),
}

/// Ordered list of transport components.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportOperation(pub Vec<TransportComponent>);

impl TransportOperation {
    pub fn components(&self) -> &[TransportComponent] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An edit as submitted by a client: the declared author and the operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationData {
    pub user_id: ClientId,
    pub ops: TransportOperation,
}

impl OperationData {
    pub fn new(user_id: ClientId, operation: &TextOperation) -> Self {
        Self {
            user_id,
            ops: serialize(operation),
        }
    }

    /// Validate and rebuild the carried operation.
    pub fn operation(&self) -> Result<TextOperation, InvalidOperation> {
        deserialize(&self.ops)
    }

    /// Rebuild an operation broadcast by the authoritative store.
    ///
    /// Unlike [`OperationData::operation`] this accepts an empty list: an
    /// accepted edit can be rebased down to nothing (two clients deleting
    /// the same text) and still has to be acknowledged.
    pub fn accepted_operation(&self) -> Result<TextOperation, InvalidOperation> {
        if self.ops.is_empty() {
            return Ok(TextOperation::new());
        }
        deserialize(&self.ops)
    }
}

/// Convert an operation into its transport form.
pub fn serialize(operation: &TextOperation) -> TransportOperation {
    TransportOperation(
        operation
            .components()
            .iter()
            .map(|component| match component {
                Component::Retain(n) => TransportComponent::Retain(*n as u64),
                Component::Insert(s) => TransportComponent::Insert(s.clone()),
                Component::Delete(n) => TransportComponent::Delete(*n as u64),
            })
            .collect(),
    )
}

/// Rebuild an operation from its transport form.
///
/// Rejects empty lists and zero-length components. Valid but non-canonical
/// input (for example two adjacent retains) is canonicalized.
pub fn deserialize(data: &TransportOperation) -> Result<TextOperation, InvalidOperation> {
    if data.is_empty() {
        return Err(InvalidOperation::Empty);
    }

    let mut components = Vec::with_capacity(data.len());
    for (index, component) in data.components().iter().enumerate() {
        let component = match component {
            TransportComponent::Retain(n) => Component::Retain(to_len(*n, index)?),
            TransportComponent::Delete(n) => Component::Delete(to_len(*n, index)?),
            TransportComponent::Insert(s) if s.is_empty() => {
                return Err(InvalidOperation::ZeroLength { index })
            }
            TransportComponent::Insert(s) => Component::Insert(s.clone()),
        };
        components.push(component);
    }

    Ok(TextOperation::from_components(components))
}

fn to_len(n: u64, index: usize) -> Result<usize, InvalidOperation> {
    if n == 0 {
        return Err(InvalidOperation::ZeroLength { index });
    }
    usize::try_from(n)
        .map_err(|_| InvalidOperation::Decode(format!("component {} length {} is too large", index, n)))
}

/// Encode an operation as a JSON component list.
pub fn to_json(operation: &TextOperation) -> serde_json::Result<String> {
    serde_json::to_string(&serialize(operation))
}

/// Decode and validate a JSON component list.
pub fn from_json(json: &str) -> Result<TextOperation, InvalidOperation> {
    let data: TransportOperation = serde_json::from_str(json)?;
    deserialize(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let mut op = TextOperation::new();
        op.retain(5).insert("hello").delete(2);
        assert_eq!(
            to_json(&op).unwrap(),
            r#"[{"retain":5},{"insert":"hello"},{"delete":2}]"#
        );
    }

    #[test]
    fn test_round_trip() {
        let mut op = TextOperation::new();
        op.retain(1).insert("é").delete(3).retain(2);
        let decoded = deserialize(&serialize(&op)).unwrap();
        assert_eq!(decoded, op);
    }

    #[test]
    fn test_rejects_empty_list() {
        assert_eq!(from_json("[]"), Err(InvalidOperation::Empty));
    }

    #[test]
    fn test_rejects_zero_length_components() {
        assert_eq!(
            from_json(r#"[{"retain":2},{"delete":0}]"#),
            Err(InvalidOperation::ZeroLength { index: 1 })
        );
        assert_eq!(
            from_json(r#"[{"retain":0}]"#),
            Err(InvalidOperation::ZeroLength { index: 0 })
        );
        assert_eq!(
            from_json(r#"[{"insert":""}]"#),
            Err(InvalidOperation::ZeroLength { index: 0 })
        );
    }

    #[test]
    fn test_rejects_unknown_tags() {
        assert!(matches!(
            from_json(r#"[{"retain":1},{"replace":"x"}]"#),
            Err(InvalidOperation::Decode(_))
        ));
        assert!(matches!(
            from_json(r#"[{"retain":-1}]"#),
            Err(InvalidOperation::Decode(_))
        ));
        assert!(matches!(from_json(r#"[42]"#), Err(InvalidOperation::Decode(_))));
    }

    #[test]
    fn test_canonicalizes_adjacent_components() {
        let op = from_json(r#"[{"retain":1},{"retain":2},{"insert":"a"},{"insert":"b"}]"#).unwrap();
        assert_eq!(
            op.components(),
            &[Component::Retain(3), Component::Insert("ab".to_string())]
        );
    }

    #[test]
    fn test_operation_data_envelope() {
        let op = TextOperation::insert_at(1, 1, "B").unwrap();
        let data = OperationData::new(ClientId::new("alice"), &op);
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"userId":"alice","ops":[{"retain":1},{"insert":"B"}]}"#);

        let decoded: OperationData = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.operation().unwrap(), op);
    }

    #[test]
    fn test_accepted_operation_may_be_empty() {
        let data = OperationData::new(ClientId::new("bob"), &TextOperation::new());
        assert!(data.ops.is_empty());
        assert_eq!(data.operation(), Err(InvalidOperation::Empty));
        assert!(data.accepted_operation().unwrap().is_noop());
    }
}
