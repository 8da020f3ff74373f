//! Text operations - retain/insert/delete edit scripts with operational transform.
//!
//! A [`TextOperation`] walks over a source text from start to end. Every
//! character of the source is either retained or deleted, and new text can
//! be inserted anywhere along the way. The operation therefore knows the
//! exact length of the text it applies to (`base_len`) and of the text it
//! produces (`target_len`).
//!
//! Lengths are counted in `char`s, never bytes.
//!
//! Operations are always kept in canonical form:
//! - adjacent components of the same kind are merged
//! - zero-length components are never stored
//! - an insert directly following a delete is moved in front of it

use crate::error::OperationError;
use std::cmp::Ordering;

/// Number of `char`s in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// A single step of a text operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
    /// Skip `n` characters unchanged.
    Retain(usize),
    /// Insert a literal string at the cursor.
    Insert(String),
    /// Remove `n` characters.
    Delete(usize),
}

impl Component {
    /// Characters this component consumes from the source text.
    pub fn base_len(&self) -> usize {
        match self {
            Component::Retain(n) | Component::Delete(n) => *n,
            Component::Insert(_) => 0,
        }
    }

    /// Characters this component contributes to the target text.
    pub fn target_len(&self) -> usize {
        match self {
            Component::Retain(n) => *n,
            Component::Insert(s) => char_len(s),
            Component::Delete(_) => 0,
        }
    }
}

/// An ordered edit script over a text buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextOperation {
    ops: Vec<Component>,
    base_len: usize,
    target_len: usize,
}

impl TextOperation {
    /// Create an empty operation (applies to the empty string).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a canonical operation from raw components.
    pub fn from_components(components: impl IntoIterator<Item = Component>) -> Self {
        let mut op = Self::new();
        for component in components {
            op.push(component);
        }
        op
    }

    /// An operation inserting `text` at `position` of a document of `doc_len` chars.
    pub fn insert_at(doc_len: usize, position: usize, text: &str) -> Result<Self, OperationError> {
        if position > doc_len {
            return Err(OperationError::OutOfBounds {
                position,
                length: doc_len,
            });
        }
        let mut op = Self::new();
        op.retain(position).insert(text).retain(doc_len - position);
        Ok(op)
    }

    /// An operation deleting `count` chars at `position` of a document of `doc_len` chars.
    pub fn delete_at(doc_len: usize, position: usize, count: usize) -> Result<Self, OperationError> {
        let end = position.saturating_add(count);
        if end > doc_len {
            return Err(OperationError::OutOfBounds {
                position: end,
                length: doc_len,
            });
        }
        let mut op = Self::new();
        op.retain(position).delete(count).retain(doc_len - end);
        Ok(op)
    }

    /// The components of this operation, in canonical form.
    pub fn components(&self) -> &[Component] {
        &self.ops
    }

    /// Length of the text this operation applies to.
    pub fn base_len(&self) -> usize {
        self.base_len
    }

    /// Length of the text this operation produces.
    pub fn target_len(&self) -> usize {
        self.target_len
    }

    /// True if applying this operation leaves any text unchanged.
    pub fn is_noop(&self) -> bool {
        matches!(self.ops.as_slice(), [] | [Component::Retain(_)])
    }

    // === Builder ===

    /// Skip `n` characters.
    pub fn retain(&mut self, n: usize) -> &mut Self {
        if n == 0 {
            return self;
        }
        self.base_len += n;
        self.target_len += n;
        if let Some(Component::Retain(last)) = self.ops.last_mut() {
            *last += n;
        } else {
            self.ops.push(Component::Retain(n));
        }
        self
    }

    /// Insert `text` at the cursor.
    pub fn insert(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        self.target_len += char_len(text);

        let len = self.ops.len();
        match self.ops.as_mut_slice() {
            [.., Component::Insert(last)] => last.push_str(text),
            [.., Component::Insert(before), Component::Delete(_)] => before.push_str(text),
            [.., Component::Delete(_)] => {
                self.ops.insert(len - 1, Component::Insert(text.to_string()));
            }
            _ => self.ops.push(Component::Insert(text.to_string())),
        }
        self
    }

    /// Remove `n` characters.
    pub fn delete(&mut self, n: usize) -> &mut Self {
        if n == 0 {
            return self;
        }
        self.base_len += n;
        if let Some(Component::Delete(last)) = self.ops.last_mut() {
            *last += n;
        } else {
            self.ops.push(Component::Delete(n));
        }
        self
    }

    /// Append any component.
    pub fn push(&mut self, component: Component) -> &mut Self {
        match component {
            Component::Retain(n) => self.retain(n),
            Component::Insert(s) => self.insert(&s),
            Component::Delete(n) => self.delete(n),
        }
    }

    // === Algorithms ===

    /// Apply this operation to `text`.
    ///
    /// Fails without producing anything if `text` does not have exactly
    /// `base_len` characters.
    pub fn apply(&self, text: &str) -> Result<String, OperationError> {
        let actual = char_len(text);
        if actual != self.base_len {
            return Err(OperationError::LengthMismatch {
                expected: self.base_len,
                actual,
            });
        }

        let mut result = String::with_capacity(text.len());
        let mut chars = text.chars();
        for component in &self.ops {
            match component {
                Component::Retain(n) => result.extend(chars.by_ref().take(*n)),
                Component::Insert(s) => result.push_str(s),
                Component::Delete(n) => {
                    chars.by_ref().take(*n).for_each(drop);
                }
            }
        }
        Ok(result)
    }

    /// The operation that undoes this one when applied to its result.
    ///
    /// `text` must be the text this operation was applied to.
    pub fn invert(&self, text: &str) -> Result<TextOperation, OperationError> {
        let actual = char_len(text);
        if actual != self.base_len {
            return Err(OperationError::LengthMismatch {
                expected: self.base_len,
                actual,
            });
        }

        let mut inverse = TextOperation::new();
        let mut chars = text.chars();
        for component in &self.ops {
            match component {
                Component::Retain(n) => {
                    inverse.retain(*n);
                    chars.by_ref().take(*n).for_each(drop);
                }
                Component::Insert(s) => {
                    inverse.delete(char_len(s));
                }
                Component::Delete(n) => {
                    let removed: String = chars.by_ref().take(*n).collect();
                    inverse.insert(&removed);
                }
            }
        }
        Ok(inverse)
    }

    /// Combine `self` followed by `other` into a single operation.
    ///
    /// `apply(apply(t, self), other) == apply(t, self.compose(other))`.
    pub fn compose(&self, other: &TextOperation) -> Result<TextOperation, OperationError> {
        if self.target_len != other.base_len {
            return Err(OperationError::ComposeMismatch {
                first_target: self.target_len,
                second_base: other.base_len,
            });
        }
        let mismatch = || OperationError::ComposeMismatch {
            first_target: self.target_len,
            second_base: other.base_len,
        };

        let mut composed = TextOperation::new();
        let mut first = self.ops.iter().cloned();
        let mut second = other.ops.iter().cloned();
        let mut a = first.next();
        let mut b = second.next();

        loop {
            match (a.take(), b.take()) {
                (None, None) => break,
                // Deletes of the first operation never reach the second.
                (Some(Component::Delete(n)), rest) => {
                    composed.delete(n);
                    a = first.next();
                    b = rest;
                }
                // Inserts of the second operation do not touch the first.
                (rest, Some(Component::Insert(s))) => {
                    composed.insert(&s);
                    a = rest;
                    b = second.next();
                }
                (None, Some(_)) | (Some(_), None) => return Err(mismatch()),
                (Some(Component::Retain(x)), Some(Component::Retain(y))) => {
                    let (min, rx, ry) = consume(x, y);
                    composed.retain(min);
                    a = remainder(rx, Component::Retain, &mut first);
                    b = remainder(ry, Component::Retain, &mut second);
                }
                (Some(Component::Retain(x)), Some(Component::Delete(y))) => {
                    let (min, rx, ry) = consume(x, y);
                    composed.delete(min);
                    a = remainder(rx, Component::Retain, &mut first);
                    b = remainder(ry, Component::Delete, &mut second);
                }
                (Some(Component::Insert(s)), Some(Component::Retain(y))) => {
                    let (head, tail) = split_chars(&s, y);
                    composed.insert(head);
                    let consumed = char_len(head);
                    a = if tail.is_empty() {
                        first.next()
                    } else {
                        Some(Component::Insert(tail.to_string()))
                    };
                    b = remainder(y - consumed, Component::Retain, &mut second);
                }
                (Some(Component::Insert(s)), Some(Component::Delete(y))) => {
                    // Text inserted by the first and removed by the second cancels out.
                    let (head, tail) = split_chars(&s, y);
                    let consumed = char_len(head);
                    a = if tail.is_empty() {
                        first.next()
                    } else {
                        Some(Component::Insert(tail.to_string()))
                    };
                    b = remainder(y - consumed, Component::Delete, &mut second);
                }
            }
        }

        Ok(composed)
    }

    /// Transform two concurrent operations derived from the same text.
    ///
    /// Returns `(left', right')` such that
    /// `apply(apply(t, left), right') == apply(apply(t, right), left')`.
    ///
    /// When both insert at the same position, the insert of `left` ends up
    /// first. Callers rebasing a newly submitted operation over already
    /// accepted history pass the new operation as `left`.
    pub fn transform(
        left: &TextOperation,
        right: &TextOperation,
    ) -> Result<(TextOperation, TextOperation), OperationError> {
        if left.base_len != right.base_len {
            return Err(OperationError::TransformMismatch {
                left_base: left.base_len,
                right_base: right.base_len,
            });
        }
        let mismatch = || OperationError::TransformMismatch {
            left_base: left.base_len,
            right_base: right.base_len,
        };

        let mut left_prime = TextOperation::new();
        let mut right_prime = TextOperation::new();
        let mut lefts = left.ops.iter().cloned();
        let mut rights = right.ops.iter().cloned();
        let mut a = lefts.next();
        let mut b = rights.next();

        loop {
            match (a.take(), b.take()) {
                (None, None) => break,
                (Some(Component::Insert(s)), rest) => {
                    right_prime.retain(char_len(&s));
                    left_prime.insert(&s);
                    a = lefts.next();
                    b = rest;
                }
                (rest, Some(Component::Insert(s))) => {
                    left_prime.retain(char_len(&s));
                    right_prime.insert(&s);
                    a = rest;
                    b = rights.next();
                }
                (None, Some(_)) | (Some(_), None) => return Err(mismatch()),
                (Some(Component::Retain(x)), Some(Component::Retain(y))) => {
                    let (min, rx, ry) = consume(x, y);
                    left_prime.retain(min);
                    right_prime.retain(min);
                    a = remainder(rx, Component::Retain, &mut lefts);
                    b = remainder(ry, Component::Retain, &mut rights);
                }
                // Both removed the same range; neither side needs to do it again.
                (Some(Component::Delete(x)), Some(Component::Delete(y))) => {
                    let (_, rx, ry) = consume(x, y);
                    a = remainder(rx, Component::Delete, &mut lefts);
                    b = remainder(ry, Component::Delete, &mut rights);
                }
                (Some(Component::Delete(x)), Some(Component::Retain(y))) => {
                    let (min, rx, ry) = consume(x, y);
                    left_prime.delete(min);
                    a = remainder(rx, Component::Delete, &mut lefts);
                    b = remainder(ry, Component::Retain, &mut rights);
                }
                (Some(Component::Retain(x)), Some(Component::Delete(y))) => {
                    let (min, rx, ry) = consume(x, y);
                    right_prime.delete(min);
                    a = remainder(rx, Component::Retain, &mut lefts);
                    b = remainder(ry, Component::Delete, &mut rights);
                }
            }
        }

        Ok((left_prime, right_prime))
    }
}

/// Take `min(x, y)` from both lengths, returning `(min, x - min, y - min)`.
fn consume(x: usize, y: usize) -> (usize, usize, usize) {
    match x.cmp(&y) {
        Ordering::Less => (x, 0, y - x),
        Ordering::Equal => (x, 0, 0),
        Ordering::Greater => (y, x - y, 0),
    }
}

/// The leftover of a partially consumed component, or the next one.
fn remainder(
    left: usize,
    make: fn(usize) -> Component,
    iter: &mut impl Iterator<Item = Component>,
) -> Option<Component> {
    if left > 0 {
        Some(make(left))
    } else {
        iter.next()
    }
}

/// Split `s` after its first `n` chars.
fn split_chars(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

impl std::fmt::Display for TextOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .ops
            .iter()
            .map(|c| match c {
                Component::Retain(n) => format!("retain {}", n),
                Component::Insert(s) => format!("insert {:?}", s),
                Component::Delete(n) => format!("delete {}", n),
            })
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
