//! Per-record validation ledger.
//!
//! Validation findings never abort anything. They accumulate here as
//! (field tag, message) pairs and taint the record's edit status; the
//! caller decides whether an ERROR-tainted status blocks commit.

use crate::snapshot::{FieldTag, ValueSet};

/// One validation finding against a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The field the finding is attached to.
    pub field: FieldTag,
    /// Human-readable message.
    pub message: String,
}

/// Accumulated validation findings for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationLedger {
    errors: Vec<FieldError>,
}

impl ValidationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Records one finding.
    pub fn add(&mut self, field: FieldTag, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Discards all findings.
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Returns `true` if no findings are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates over all findings.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Iterates over findings attached to one field.
    pub fn for_field(&self, tag: FieldTag) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(move |e| e.field == tag)
    }

    /// Returns the first message attached to one field, if any.
    ///
    /// This is the presentation-layer accessor for per-field error
    /// text.
    #[must_use]
    pub fn first_for_field(&self, tag: FieldTag) -> Option<&str> {
        self.for_field(tag).next().map(|e| e.message.as_str())
    }
}

/// Validation rules for one concrete record kind.
///
/// Rules run once per `validate()` pass over a collection and write
/// their findings into the supplied ledger.
pub trait Validator<V: ValueSet> {
    /// Examines one snapshot and records findings.
    fn validate(&self, values: &V, ledger: &mut ValidationLedger);
}

impl<V: ValueSet, F> Validator<V> for F
where
    F: Fn(&V, &mut ValidationLedger),
{
    fn validate(&self, values: &V, ledger: &mut ValidationLedger) {
        self(values, ledger);
    }
}
