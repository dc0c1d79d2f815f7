//! Shared test fixtures for unit tests.

use crate::crypto::{CipherSet, ControlKey, EncryptedValue};
use crate::error::VaultResult;
use crate::snapshot::{FieldDelta, FieldTag, ValueSet};
use std::cmp::Ordering;

/// Field tag for the note name.
pub const NOTE_NAME: FieldTag = FieldTag::new(1);
/// Field tag for the note amount.
pub const NOTE_AMOUNT: FieldTag = FieldTag::new(2);

/// Minimal snapshot kind used across unit tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteValues {
    pub name: String,
    pub amount: i64,
}

impl NoteValues {
    pub fn new(name: &str, amount: i64) -> Self {
        Self {
            name: name.to_string(),
            amount,
        }
    }
}

impl ValueSet for NoteValues {
    fn diff(&self, other: &Self) -> FieldDelta {
        let mut delta = FieldDelta::new();
        if self.name != other.name {
            delta.add(NOTE_NAME);
        }
        if self.amount != other.amount {
            delta.add(NOTE_AMOUNT);
        }
        delta
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }

    fn field_text(&self, tag: FieldTag) -> Option<String> {
        match tag {
            NOTE_NAME => Some(self.name.clone()),
            NOTE_AMOUNT => Some(self.amount.to_string()),
            _ => None,
        }
    }
}

/// Field tag for the encrypted secret name.
pub const SECRET_NAME: FieldTag = FieldTag::new(1);

/// Snapshot kind with one encrypted field, used by crypto tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretValues {
    pub name: EncryptedValue,
}

impl SecretValues {
    /// Creates a snapshot with encryption deferred.
    pub fn deferred(name: &str) -> Self {
        Self {
            name: EncryptedValue::deferred(name.as_bytes()),
        }
    }

    /// Creates a snapshot encrypted under the given key.
    pub fn encrypted(name: &str, key: &ControlKey) -> VaultResult<Self> {
        Ok(Self {
            name: EncryptedValue::from_plain(name.as_bytes(), key)?,
        })
    }
}

impl ValueSet for SecretValues {
    fn diff(&self, other: &Self) -> FieldDelta {
        let mut delta = FieldDelta::new();
        if self.name != other.name {
            delta.add(SECRET_NAME);
        }
        delta
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.name.plain().cmp(&other.name.plain())
    }

    fn field_text(&self, tag: FieldTag) -> Option<String> {
        match tag {
            SECRET_NAME => self
                .name
                .plain()
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }
}

impl CipherSet for SecretValues {
    fn secure_fields(&self) -> Vec<&EncryptedValue> {
        vec![&self.name]
    }

    fn secure_fields_mut(&mut self) -> Vec<&mut EncryptedValue> {
        vec![&mut self.name]
    }
}
