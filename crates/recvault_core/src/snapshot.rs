//! Change-value snapshots.
//!
//! A snapshot is the versioned payload of a record: the full field
//! set at one point in time. Concrete record kinds implement
//! [`ValueSet`] to plug into collections, history and validation.

use std::cmp::Ordering;
use std::fmt;

/// Tag identifying one field of a snapshot kind.
///
/// Tags are stable per kind; validation errors and field diffs refer
/// to fields by tag, never by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldTag(pub u16);

impl FieldTag {
    /// Creates a new field tag.
    #[must_use]
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    /// Returns the raw tag value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field:{}", self.0)
    }
}

/// The set of fields that differ between two snapshots of one kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDelta {
    fields: Vec<FieldTag>,
}

impl FieldDelta {
    /// Creates an empty delta.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Records one differing field.
    pub fn add(&mut self, tag: FieldTag) {
        if !self.fields.contains(&tag) {
            self.fields.push(tag);
        }
    }

    /// Returns `true` if no fields differ.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if the given field differs.
    #[must_use]
    pub fn contains(&self, tag: FieldTag) -> bool {
        self.fields.contains(&tag)
    }

    /// Returns the number of differing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates over the differing field tags.
    pub fn iter(&self) -> impl Iterator<Item = FieldTag> + '_ {
        self.fields.iter().copied()
    }
}

impl FromIterator<FieldTag> for FieldDelta {
    fn from_iter<I: IntoIterator<Item = FieldTag>>(iter: I) -> Self {
        let mut delta = FieldDelta::new();
        for tag in iter {
            delta.add(tag);
        }
        delta
    }
}

/// Capability trait for record snapshots.
///
/// Implementations must be copyable, comparable whole-snapshot
/// against another snapshot of the same kind, and able to report
/// which fields differ. Equality is semantic: an encrypted kind
/// compares plaintext, not ciphertext.
pub trait ValueSet: Clone + PartialEq {
    /// Reports the fields whose values differ between `self` and
    /// `other`.
    fn diff(&self, other: &Self) -> FieldDelta;

    /// Orders two snapshots for collection iteration.
    ///
    /// Conventionally sort key first, then display name; the owning
    /// collection breaks remaining ties by identity.
    fn compare(&self, other: &Self) -> Ordering;

    /// Returns display text for one field, if the field exists and
    /// has a presentable value.
    fn field_text(&self, tag: FieldTag) -> Option<String>;
}
