//! Snapshot fixtures and collection helpers.
//!
//! Provides concrete snapshot kinds and convenience constructors for
//! common test scenarios.

use recvault_core::crypto::{
    CipherSet, ControlKey, ControlKeyDomain, EncryptedValue, SymmetricKey,
};
use recvault_core::{Collection, FieldDelta, FieldTag, KeyId, RecordId, ValueSet};
use std::cmp::Ordering;

/// Field tag for an account's name.
pub const ACCOUNT_NAME: FieldTag = FieldTag::new(1);
/// Field tag for an account's balance.
pub const ACCOUNT_BALANCE: FieldTag = FieldTag::new(2);

/// A plain (unencrypted) account snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountValues {
    /// Display name, doubles as the sort key.
    pub name: String,
    /// Balance in minor units.
    pub balance: i64,
}

impl AccountValues {
    /// Creates an account snapshot.
    pub fn new(name: &str, balance: i64) -> Self {
        Self {
            name: name.to_string(),
            balance,
        }
    }
}

impl ValueSet for AccountValues {
    fn diff(&self, other: &Self) -> FieldDelta {
        let mut delta = FieldDelta::new();
        if self.name != other.name {
            delta.add(ACCOUNT_NAME);
        }
        if self.balance != other.balance {
            delta.add(ACCOUNT_BALANCE);
        }
        delta
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }

    fn field_text(&self, tag: FieldTag) -> Option<String> {
        match tag {
            ACCOUNT_NAME => Some(self.name.clone()),
            ACCOUNT_BALANCE => Some(self.balance.to_string()),
            _ => None,
        }
    }
}

/// An account snapshot whose name is encrypted at rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureAccountValues {
    /// Display name, encrypted.
    pub name: EncryptedValue,
    /// Balance in minor units.
    pub balance: i64,
}

impl SecureAccountValues {
    /// Creates a snapshot with encryption deferred.
    pub fn deferred(name: &str, balance: i64) -> Self {
        Self {
            name: EncryptedValue::deferred(name.as_bytes()),
            balance,
        }
    }

    /// Creates a snapshot encrypted under the given key.
    pub fn encrypted(name: &str, balance: i64, key: &ControlKey) -> Self {
        Self {
            name: EncryptedValue::from_plain(name.as_bytes(), key)
                .expect("Failed to encrypt fixture name"),
            balance,
        }
    }
}

impl ValueSet for SecureAccountValues {
    fn diff(&self, other: &Self) -> FieldDelta {
        let mut delta = FieldDelta::new();
        if self.name != other.name {
            delta.add(ACCOUNT_NAME);
        }
        if self.balance != other.balance {
            delta.add(ACCOUNT_BALANCE);
        }
        delta
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.name.plain().cmp(&other.name.plain())
    }

    fn field_text(&self, tag: FieldTag) -> Option<String> {
        match tag {
            ACCOUNT_NAME => self
                .name
                .plain()
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
            ACCOUNT_BALANCE => Some(self.balance.to_string()),
            _ => None,
        }
    }
}

impl CipherSet for SecureAccountValues {
    fn secure_fields(&self) -> Vec<&EncryptedValue> {
        vec![&self.name]
    }

    fn secure_fields_mut(&mut self) -> Vec<&mut EncryptedValue> {
        vec![&mut self.name]
    }
}

/// Builds a CORE collection of plain accounts with identities 1..=n.
pub fn account_collection(entries: &[(&str, i64)]) -> Collection<AccountValues> {
    let mut col = Collection::new_core();
    for (i, (name, balance)) in entries.iter().enumerate() {
        col.insert_raw(RecordId::new(i as u64 + 1), AccountValues::new(name, *balance))
            .expect("Failed to insert fixture record");
    }
    col
}

/// Builds a Control-Key Domain holding one active key.
pub fn domain_with_key() -> (ControlKeyDomain, KeyId) {
    let mut domain = ControlKeyDomain::new();
    let id = domain.install_key(SymmetricKey::generate());
    (domain, id)
}

/// Builds a CORE collection of encrypted accounts under the given
/// key, identities 1..=n.
pub fn secure_collection(
    entries: &[(&str, i64)],
    key: &ControlKey,
) -> Collection<SecureAccountValues> {
    let mut col = Collection::new_core();
    for (i, (name, balance)) in entries.iter().enumerate() {
        col.insert_raw(
            RecordId::new(i as u64 + 1),
            SecureAccountValues::encrypted(name, *balance, key),
        )
        .expect("Failed to insert fixture record");
    }
    col
}
