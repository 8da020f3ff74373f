//! Revision counter for the authoritative document.

use serde::{Deserialize, Serialize};

/// Number of operations the authoritative document has accepted.
///
/// Revision 0 is the initial state. Each accepted operation advances the
/// counter by exactly one.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RevisionId(pub u64);

impl RevisionId {
    /// The revision of a freshly loaded document.
    pub const INITIAL: RevisionId = RevisionId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The revision assigned to the next accepted operation.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Number of revisions between `earlier` and `self`, if `earlier` is not
    /// ahead of `self`.
    pub fn since(self, earlier: RevisionId) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl From<u64> for RevisionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for RevisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_and_since() {
        let r = RevisionId::INITIAL.next().next();
        assert_eq!(r, RevisionId(2));
        assert_eq!(r.since(RevisionId(0)), Some(2));
        assert_eq!(RevisionId(1).since(r), None);
    }
}
