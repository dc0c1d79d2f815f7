//! Reference-data records: one record per value of a closed
//! enumeration.
//!
//! Each reference-data kind supplies a fixed compile-time table
//! binding every enumeration value to a stable class id, a sort order
//! and a display name, all independent of declaration order. Lookup
//! works by enumeration value, class id, name or identity; a CORE
//! collection permits exactly one record per enumeration value.

use crate::collection::Collection;
use crate::crypto::{CipherSet, ControlKey, EncryptedValue};
use crate::error::{VaultError, VaultResult};
use crate::record::Record;
use crate::snapshot::{FieldDelta, FieldTag, ValueSet};
use crate::types::{ClassId, RecordId};
use std::cmp::Ordering;

/// Field tag for a reference-data record's display name.
pub const STATIC_NAME: FieldTag = FieldTag::new(1);
/// Field tag for a reference-data record's enabled flag.
pub const STATIC_ENABLED: FieldTag = FieldTag::new(2);
/// Field tag for a reference-data record's class id.
pub const STATIC_CLASS: FieldTag = FieldTag::new(3);

/// One entry of a reference-data kind's static table.
#[derive(Debug, Clone, Copy)]
pub struct StaticEntry<K> {
    /// The enumeration value.
    pub value: K,
    /// Stable class id, independent of declaration order.
    pub class_id: ClassId,
    /// Sort order, independent of declaration order.
    pub sort_order: u16,
    /// Canonical display name.
    pub name: &'static str,
}

/// A closed enumeration usable as a reference-data kind.
///
/// Implementations supply the full table; the lookup methods are
/// derived from it.
pub trait StaticKind: Copy + Eq + Sized + 'static {
    /// Returns the kind's table, one entry per enumeration value.
    fn table() -> &'static [StaticEntry<Self>];

    /// Resolves this value's table entry.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidEnumValue`] when the table has no
    /// entry for the value, which means the table is incomplete.
    fn entry(self) -> VaultResult<&'static StaticEntry<Self>> {
        Self::table()
            .iter()
            .find(|e| e.value == self)
            .ok_or_else(|| VaultError::invalid_enum("enumeration value missing from table"))
    }

    /// Resolves an enumeration value from its class id.
    fn from_class_id(id: ClassId) -> VaultResult<Self> {
        Self::table()
            .iter()
            .find(|e| e.class_id == id)
            .map(|e| e.value)
            .ok_or_else(|| VaultError::unknown_class(id))
    }

    /// Resolves an enumeration value from its canonical name.
    fn from_name(name: &str) -> VaultResult<Self> {
        Self::table()
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value)
            .ok_or_else(|| VaultError::invalid_enum(format!("no enumeration value named {name}")))
    }
}

/// Snapshot for one reference-data record.
///
/// Carries the enumeration value, its sort order (copied from the
/// table at construction), an encrypted display name and an enabled
/// flag. The value and sort order never change after construction;
/// name and enabled flag are the editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticValues<K: StaticKind> {
    value: K,
    order: u16,
    /// Display name, encrypted at rest.
    pub name: EncryptedValue,
    /// Whether the value is offered to new data.
    pub enabled: bool,
}

impl<K: StaticKind> StaticValues<K> {
    /// Creates a snapshot with name encryption deferred.
    pub fn new(value: K) -> VaultResult<Self> {
        let entry = value.entry()?;
        Ok(Self {
            value,
            order: entry.sort_order,
            name: EncryptedValue::deferred(entry.name.as_bytes()),
            enabled: true,
        })
    }

    /// Creates a snapshot with the name encrypted under the given key.
    pub fn with_key(value: K, key: &ControlKey) -> VaultResult<Self> {
        let entry = value.entry()?;
        Ok(Self {
            value,
            order: entry.sort_order,
            name: EncryptedValue::from_plain(entry.name.as_bytes(), key)?,
            enabled: true,
        })
    }

    /// Returns the enumeration value.
    #[must_use]
    pub fn value(&self) -> K {
        self.value
    }

    /// Returns the sort order.
    #[must_use]
    pub fn sort_order(&self) -> u16 {
        self.order
    }

    /// Returns the display name as text, unless purged.
    #[must_use]
    pub fn name_text(&self) -> Option<String> {
        self.name
            .plain()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl<K: StaticKind> ValueSet for StaticValues<K> {
    fn diff(&self, other: &Self) -> FieldDelta {
        let mut delta = FieldDelta::new();
        if self.name != other.name {
            delta.add(STATIC_NAME);
        }
        if self.enabled != other.enabled {
            delta.add(STATIC_ENABLED);
        }
        if self.value != other.value {
            delta.add(STATIC_CLASS);
        }
        delta
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.name.plain().cmp(&other.name.plain()))
    }

    fn field_text(&self, tag: FieldTag) -> Option<String> {
        match tag {
            STATIC_NAME => self.name_text(),
            STATIC_ENABLED => Some(self.enabled.to_string()),
            STATIC_CLASS => self.value.entry().ok().map(|e| e.class_id.to_string()),
            _ => None,
        }
    }
}

impl<K: StaticKind> CipherSet for StaticValues<K> {
    fn secure_fields(&self) -> Vec<&EncryptedValue> {
        vec![&self.name]
    }

    fn secure_fields_mut(&mut self) -> Vec<&mut EncryptedValue> {
        vec![&mut self.name]
    }
}

impl<K: StaticKind> Collection<StaticValues<K>> {
    /// Creates the record for one enumeration value.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidEnumValue`] when the collection
    /// already holds a record for the value; a CORE collection
    /// permits exactly one per value.
    pub fn create_static(&mut self, value: K) -> VaultResult<RecordId> {
        if self.find_by_value(value).is_some() {
            let entry = value.entry()?;
            return Err(VaultError::invalid_enum(format!(
                "duplicate record for enumeration value {}",
                entry.name
            )));
        }
        self.create(StaticValues::new(value)?)
    }

    /// Creates records for every table entry not yet present.
    pub fn populate_defaults(&mut self) -> VaultResult<()> {
        for entry in K::table() {
            if self.find_by_value(entry.value).is_none() {
                self.create_static(entry.value)?;
            }
        }
        Ok(())
    }

    /// Looks a record up by enumeration value.
    #[must_use]
    pub fn find_by_value(&self, value: K) -> Option<&Record<StaticValues<K>>> {
        self.iter().find(|r| r.values().value == value)
    }

    /// Looks a record up by class id.
    pub fn find_by_class_id(&self, id: ClassId) -> VaultResult<&Record<StaticValues<K>>> {
        let value = K::from_class_id(id)?;
        self.find_by_value(value)
            .ok_or_else(|| VaultError::unknown_class(id))
    }

    /// Looks a record up by display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Record<StaticValues<K>>> {
        self.iter()
            .find(|r| r.values().name.plain() == Some(name.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataState;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum AccountClass {
        Savings,
        Current,
        Loan,
    }

    // Sort order deliberately disagrees with declaration order.
    const ACCOUNT_CLASSES: &[StaticEntry<AccountClass>] = &[
        StaticEntry {
            value: AccountClass::Savings,
            class_id: ClassId::new(10),
            sort_order: 2,
            name: "Savings",
        },
        StaticEntry {
            value: AccountClass::Current,
            class_id: ClassId::new(11),
            sort_order: 1,
            name: "Current",
        },
        StaticEntry {
            value: AccountClass::Loan,
            class_id: ClassId::new(12),
            sort_order: 3,
            name: "Loan",
        },
    ];

    impl StaticKind for AccountClass {
        fn table() -> &'static [StaticEntry<Self>] {
            ACCOUNT_CLASSES
        }
    }

    #[test]
    fn kind_lookups() {
        assert_eq!(
            AccountClass::from_class_id(ClassId::new(11)).unwrap(),
            AccountClass::Current
        );
        assert_eq!(
            AccountClass::from_name("Loan").unwrap(),
            AccountClass::Loan
        );
        assert!(matches!(
            AccountClass::from_class_id(ClassId::new(99)),
            Err(VaultError::InvalidEnumValue { .. })
        ));
        assert!(matches!(
            AccountClass::from_name("Checking"),
            Err(VaultError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn populate_creates_one_record_per_value() {
        let mut col: Collection<StaticValues<AccountClass>> = Collection::new_core();
        col.populate_defaults().unwrap();
        assert_eq!(col.len(), 3);
        assert!(col.iter().all(|r| r.state() == DataState::New));

        // Idempotent: nothing new on a second pass.
        col.populate_defaults().unwrap();
        assert_eq!(col.len(), 3);
    }

    #[test]
    fn iteration_follows_sort_order_not_declaration() {
        let mut col: Collection<StaticValues<AccountClass>> = Collection::new_core();
        col.populate_defaults().unwrap();
        let order: Vec<AccountClass> = col.iter().map(|r| r.values().value()).collect();
        assert_eq!(
            order,
            vec![
                AccountClass::Current,
                AccountClass::Savings,
                AccountClass::Loan
            ]
        );
    }

    #[test]
    fn duplicate_value_rejected() {
        let mut col: Collection<StaticValues<AccountClass>> = Collection::new_core();
        col.create_static(AccountClass::Savings).unwrap();
        assert!(matches!(
            col.create_static(AccountClass::Savings),
            Err(VaultError::InvalidEnumValue { .. })
        ));
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn collection_lookups() {
        let mut col: Collection<StaticValues<AccountClass>> = Collection::new_core();
        col.populate_defaults().unwrap();

        let by_value = col.find_by_value(AccountClass::Loan).unwrap();
        assert_eq!(by_value.values().name_text().as_deref(), Some("Loan"));

        let by_class = col.find_by_class_id(ClassId::new(10)).unwrap();
        assert_eq!(by_class.values().value(), AccountClass::Savings);

        let by_name = col.find_by_name("Current").unwrap();
        assert_eq!(by_name.values().value(), AccountClass::Current);

        assert!(col.find_by_name("Checking").is_none());
    }

    #[test]
    fn name_edit_is_tracked_like_any_field() {
        let mut col: Collection<StaticValues<AccountClass>> = Collection::new_core();
        let id = col.create_static(AccountClass::Savings).unwrap();
        // NEW records stay NEW on change.
        col.update_record(id, |v| {
            v.name = EncryptedValue::deferred(&b"Deposit"[..]);
        })
        .unwrap();
        let rec = col.get(id).unwrap();
        assert_eq!(rec.state(), DataState::New);
        assert_eq!(rec.values().name_text().as_deref(), Some("Deposit"));
        assert_eq!(col.find_by_name("Deposit").unwrap().id(), id);
    }
}
