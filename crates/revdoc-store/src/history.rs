//! Revision history with bounded retention.
//!
//! The history holds the operations accepted since its *floor* revision.
//! An incoming operation based on revision `b` is rebased over the
//! operations that produced revisions `b+1 ..= head`, which requires
//! `floor <= b <= head`.

use crate::error::ApplyError;
use revdoc_core::{RevisionId, TextOperation};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How much accepted history a document keeps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep every accepted operation for the lifetime of the document.
    #[default]
    Unbounded,
    /// Keep only the most recent `n` operations.
    KeepLast(usize),
}

/// Ordered operations accepted by an authoritative document.
#[derive(Clone, Debug)]
pub struct RevisionHistory {
    /// Revision of the state right before the oldest retained operation.
    floor: RevisionId,
    ops: VecDeque<TextOperation>,
    policy: RetentionPolicy,
}

impl RevisionHistory {
    /// Create an empty history starting at `start`.
    pub fn new(start: RevisionId, policy: RetentionPolicy) -> Self {
        Self {
            floor: start,
            ops: VecDeque::new(),
            policy,
        }
    }

    /// The current revision.
    pub fn head(&self) -> RevisionId {
        RevisionId(self.floor.0 + self.ops.len() as u64)
    }

    /// The oldest revision an operation can still be based on.
    pub fn floor(&self) -> RevisionId {
        self.floor
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Number of retained operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append an accepted operation and return the revision it produced.
    pub fn push(&mut self, operation: TextOperation) -> RevisionId {
        self.ops.push_back(operation);
        let head = self.head();

        if let RetentionPolicy::KeepLast(keep) = self.policy {
            while self.ops.len() > keep {
                self.ops.pop_front();
                self.floor = self.floor.next();
            }
        }

        head
    }

    /// Operations accepted after `base`, oldest first.
    pub fn since(
        &self,
        base: RevisionId,
    ) -> Result<impl Iterator<Item = &TextOperation> + '_, ApplyError> {
        let head = self.head();
        if base > head {
            return Err(ApplyError::Stale {
                base,
                current: head,
            });
        }
        if base < self.floor {
            return Err(ApplyError::Pruned {
                base,
                oldest: self.floor,
            });
        }
        let skip = (base.0 - self.floor.0) as usize;
        Ok(self.ops.iter().skip(skip))
    }

    /// The operation that produced `revision`, if still retained.
    pub fn get(&self, revision: RevisionId) -> Option<&TextOperation> {
        if revision <= self.floor {
            return None;
        }
        let index = (revision.0 - self.floor.0 - 1) as usize;
        self.ops.get(index)
    }

    /// Drop every operation up to and including `revision`.
    ///
    /// Call once all mirrors are known to have incorporated `revision`.
    /// Returns the number of operations removed.
    pub fn prune_through(&mut self, revision: RevisionId) -> usize {
        let target = revision.min(self.head());
        let mut removed = 0;
        while self.floor < target {
            self.ops.pop_front();
            self.floor = self.floor.next();
            removed += 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(doc_len: usize, text: &str) -> TextOperation {
        TextOperation::insert_at(doc_len, doc_len, text).unwrap()
    }

    #[test]
    fn test_push_advances_head() {
        let mut history = RevisionHistory::new(RevisionId(0), RetentionPolicy::Unbounded);
        assert_eq!(history.push(insert(0, "a")), RevisionId(1));
        assert_eq!(history.push(insert(1, "b")), RevisionId(2));
        assert_eq!(history.head(), RevisionId(2));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_since() {
        let mut history = RevisionHistory::new(RevisionId(0), RetentionPolicy::Unbounded);
        history.push(insert(0, "a"));
        history.push(insert(1, "b"));
        history.push(insert(2, "c"));

        let ops: Vec<_> = history.since(RevisionId(1)).unwrap().collect();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], &insert(1, "b"));

        assert_eq!(history.since(RevisionId(3)).unwrap().count(), 0);
        assert!(matches!(
            history.since(RevisionId(4)),
            Err(ApplyError::Stale { .. })
        ));
    }

    #[test]
    fn test_keep_last_moves_floor() {
        let mut history = RevisionHistory::new(RevisionId(0), RetentionPolicy::KeepLast(2));
        history.push(insert(0, "a"));
        history.push(insert(1, "b"));
        history.push(insert(2, "c"));

        assert_eq!(history.floor(), RevisionId(1));
        assert_eq!(history.head(), RevisionId(3));
        assert!(history.since(RevisionId(1)).is_ok());
        assert!(matches!(
            history.since(RevisionId(0)),
            Err(ApplyError::Pruned { .. })
        ));
    }

    #[test]
    fn test_get() {
        let mut history = RevisionHistory::new(RevisionId(5), RetentionPolicy::Unbounded);
        history.push(insert(0, "a"));
        assert_eq!(history.get(RevisionId(6)), Some(&insert(0, "a")));
        assert_eq!(history.get(RevisionId(5)), None);
        assert_eq!(history.get(RevisionId(7)), None);
    }

    #[test]
    fn test_prune_through() {
        let mut history = RevisionHistory::new(RevisionId(0), RetentionPolicy::Unbounded);
        for i in 0..4 {
            history.push(insert(i, "x"));
        }
        assert_eq!(history.prune_through(RevisionId(3)), 3);
        assert_eq!(history.floor(), RevisionId(3));
        assert_eq!(history.len(), 1);

        // Pruning past the head stops at the head.
        assert_eq!(history.prune_through(RevisionId(10)), 1);
        assert_eq!(history.floor(), RevisionId(4));
        assert_eq!(history.head(), RevisionId(4));
    }
}
