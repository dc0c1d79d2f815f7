//! Encrypted field values and record-level rekeying.

use crate::collection::Collection;
use crate::crypto::keys::{ControlKey, ControlKeyDomain, RekeyTarget};
use crate::error::{VaultError, VaultResult};
use crate::record::Record;
use crate::snapshot::ValueSet;
use crate::types::{EditState, KeyId};
use std::collections::BTreeSet;

/// One encrypted field: a plaintext/ciphertext pair bound to a
/// control key.
///
/// Equality is semantic: two values are equal when their plaintexts
/// are, regardless of nonce-divergent ciphertext. Once the plaintext
/// has been purged, equality falls back to (key, ciphertext).
#[derive(Debug, Clone)]
pub struct EncryptedValue {
    key_id: Option<KeyId>,
    plain: Option<Vec<u8>>,
    cipher_text: Vec<u8>,
}

impl EncryptedValue {
    /// Creates a value from plaintext with encryption deferred until
    /// a key is bound.
    #[must_use]
    pub fn deferred(plain: impl Into<Vec<u8>>) -> Self {
        Self {
            key_id: None,
            plain: Some(plain.into()),
            cipher_text: Vec::new(),
        }
    }

    /// Creates a value from plaintext, encrypting immediately.
    pub fn from_plain(plain: impl Into<Vec<u8>>, key: &ControlKey) -> VaultResult<Self> {
        let plain = plain.into();
        let cipher_text = key.encrypt(&plain)?;
        Ok(Self {
            key_id: Some(key.id()),
            plain: Some(plain),
            cipher_text,
        })
    }

    /// Creates a value from stored ciphertext, decrypting immediately.
    pub fn from_cipher(cipher_text: Vec<u8>, key: &ControlKey) -> VaultResult<Self> {
        let plain = key.decrypt(&cipher_text)?;
        Ok(Self {
            key_id: Some(key.id()),
            plain: Some(plain),
            cipher_text,
        })
    }

    /// Returns the plaintext, unless purged.
    #[must_use]
    pub fn plain(&self) -> Option<&[u8]> {
        self.plain.as_deref()
    }

    /// Returns the identifier of the bound key, if any.
    #[must_use]
    pub fn key_id(&self) -> Option<KeyId> {
        self.key_id
    }

    /// Returns the ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Logic`] if no key has been bound yet;
    /// asking for ciphertext before encryption is a programming
    /// error, not a data problem.
    pub fn cipher_text(&self) -> VaultResult<&[u8]> {
        if self.key_id.is_none() {
            return Err(VaultError::logic("ciphertext requested before key bound"));
        }
        Ok(&self.cipher_text)
    }

    /// Replaces the plaintext and re-encrypts under the given key.
    pub fn set_plain(&mut self, plain: impl Into<Vec<u8>>, key: &ControlKey) -> VaultResult<()> {
        let plain = plain.into();
        self.cipher_text = key.encrypt(&plain)?;
        self.plain = Some(plain);
        self.key_id = Some(key.id());
        Ok(())
    }

    /// Encrypts a deferred value. No-op when already bound to this
    /// key.
    pub fn bind(&mut self, key: &ControlKey) -> VaultResult<()> {
        if self.key_id == Some(key.id()) {
            return Ok(());
        }
        let plain = self
            .plain
            .as_deref()
            .ok_or_else(|| VaultError::logic("bind on a purged value"))?;
        self.cipher_text = key.encrypt(plain)?;
        self.key_id = Some(key.id());
        Ok(())
    }

    /// Adopts security from a previous incarnation of this value.
    ///
    /// When `old` is bound to the same key and carries equal
    /// plaintext, its ciphertext is reused byte-for-byte and the
    /// encrypt operation is never invoked. Otherwise the value is
    /// (re-)encrypted from plaintext under `key`.
    pub fn adopt_security(
        &mut self,
        key: &ControlKey,
        old: Option<&EncryptedValue>,
    ) -> VaultResult<()> {
        if let Some(old) = old {
            if old.key_id == Some(key.id()) && old.plain == self.plain {
                self.cipher_text = old.cipher_text.clone();
                self.key_id = old.key_id;
                return Ok(());
            }
        }
        let plain = self
            .plain
            .as_deref()
            .ok_or_else(|| VaultError::logic("adopt_security on a purged value"))?;
        self.cipher_text = key.encrypt(plain)?;
        self.key_id = Some(key.id());
        Ok(())
    }

    /// Rebinds this value to a new key, re-encrypting. No-op when
    /// already bound to it; a purged plaintext is recovered through
    /// the old key first.
    ///
    /// Returns whether a re-encryption happened.
    pub fn rekey(&mut self, key: &ControlKey, domain: &ControlKeyDomain) -> VaultResult<bool> {
        if self.key_id == Some(key.id()) {
            return Ok(false);
        }
        if self.plain.is_none() {
            let old_id = self
                .key_id
                .ok_or_else(|| VaultError::logic("rekey on a value never encrypted"))?;
            let old_key = domain.get(old_id)?;
            self.plain = Some(old_key.decrypt(&self.cipher_text)?);
        }
        // Plaintext is present here.
        if let Some(plain) = self.plain.as_deref() {
            self.cipher_text = key.encrypt(plain)?;
        }
        self.key_id = Some(key.id());
        Ok(true)
    }

    /// Drops the plaintext, keeping only the ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Logic`] if the value was never
    /// encrypted; purging it would lose the data.
    pub fn purge_plain(&mut self) -> VaultResult<()> {
        if self.key_id.is_none() {
            return Err(VaultError::logic("purge before key bound"));
        }
        self.plain = None;
        Ok(())
    }
}

impl PartialEq for EncryptedValue {
    fn eq(&self, other: &Self) -> bool {
        match (&self.plain, &other.plain) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.key_id == other.key_id && self.cipher_text == other.cipher_text,
            _ => false,
        }
    }
}

impl Eq for EncryptedValue {}

/// Snapshot kinds carrying encrypted fields.
///
/// The field lists must be positionally stable between calls so that
/// old and new snapshots can be paired field-for-field.
pub trait CipherSet: ValueSet {
    /// Returns the encrypted fields of this snapshot.
    fn secure_fields(&self) -> Vec<&EncryptedValue>;

    /// Returns the encrypted fields of this snapshot, mutably.
    fn secure_fields_mut(&mut self) -> Vec<&mut EncryptedValue>;
}

/// Adopts security across a whole snapshot, pairing encrypted fields
/// positionally with an old incarnation.
pub fn adopt_security<V: CipherSet>(
    new: &mut V,
    key: &ControlKey,
    old: Option<&V>,
) -> VaultResult<()> {
    let old_fields: Vec<Option<&EncryptedValue>> = match old {
        Some(old) => old.secure_fields().into_iter().map(Some).collect(),
        None => vec![None; new.secure_fields().len()],
    };
    for (field, old_field) in new.secure_fields_mut().into_iter().zip(old_fields) {
        field.adopt_security(key, old_field)?;
    }
    Ok(())
}

impl<V: CipherSet> Record<V> {
    /// Rebinds every encrypted field to a new key.
    ///
    /// No-op when all fields are already bound to it. Otherwise the
    /// current snapshot is archived first so the rekey is undoable,
    /// and the record leaves CLEAN so persistence picks the fresh
    /// ciphertext up. Deleted records are rekeyed without leaving the
    /// deleted family.
    pub(crate) fn rekey(
        &mut self,
        key: &ControlKey,
        domain: &ControlKeyDomain,
    ) -> VaultResult<bool> {
        let bound = self
            .values
            .secure_fields()
            .iter()
            .all(|f| f.key_id() == Some(key.id()));
        if bound {
            return Ok(false);
        }
        self.push_history();
        for field in self.values.secure_fields_mut() {
            field.rekey(key, domain)?;
        }
        if self.state.is_deleted() {
            self.edit_state = EditState::Dirty;
        } else {
            self.set_changed();
        }
        Ok(true)
    }
}

impl<V: CipherSet> Collection<V> {
    /// Re-encrypts every record under the given key, deleted and
    /// hidden ones included. Returns how many records changed.
    pub fn rekey_records(
        &mut self,
        key: &ControlKey,
        domain: &ControlKeyDomain,
    ) -> VaultResult<usize> {
        let mut rekeyed = 0;
        for record in &mut self.records {
            if record.rekey(key, domain)? {
                rekeyed += 1;
            }
        }
        self.refresh_edit_state();
        Ok(rekeyed)
    }
}

impl<V: CipherSet> RekeyTarget for Collection<V> {
    fn rekey_all(&mut self, key: &ControlKey, domain: &ControlKeyDomain) -> VaultResult<usize> {
        self.rekey_records(key, domain)
    }

    fn collect_key_refs(&self, refs: &mut BTreeSet<KeyId>) {
        // Archived snapshots count too: undo must never land on a
        // purged key.
        for record in &self.records {
            for field in record.values().secure_fields() {
                if let Some(id) = field.key_id() {
                    refs.insert(id);
                }
            }
            for offset in 0..record.history().len() {
                if let Some(snapshot) = record.history().from_head(offset) {
                    for field in snapshot.secure_fields() {
                        if let Some(id) = field.key_id() {
                            refs.insert(id);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cipher::SymmetricKey;
    use crate::testutil::SecretValues;
    use crate::types::{DataState, RecordId};

    fn domain_with_key() -> (ControlKeyDomain, KeyId) {
        let mut domain = ControlKeyDomain::new();
        let id = domain.install_key(SymmetricKey::generate());
        (domain, id)
    }

    #[test]
    fn from_plain_encrypts_immediately() {
        let (domain, id) = domain_with_key();
        let key = domain.get(id).unwrap();
        let value = EncryptedValue::from_plain(&b"payee"[..], key).unwrap();
        assert_eq!(value.plain(), Some(&b"payee"[..]));
        assert_eq!(value.key_id(), Some(id));
        assert_eq!(key.decrypt(value.cipher_text().unwrap()).unwrap(), b"payee");
    }

    #[test]
    fn deferred_binds_later() {
        let (domain, id) = domain_with_key();
        let mut value = EncryptedValue::deferred(&b"payee"[..]);
        assert!(value.key_id().is_none());
        assert!(matches!(
            value.cipher_text(),
            Err(VaultError::Logic { .. })
        ));

        value.bind(domain.get(id).unwrap()).unwrap();
        assert_eq!(value.key_id(), Some(id));
        assert!(value.cipher_text().is_ok());
    }

    #[test]
    fn from_cipher_decrypts_immediately() {
        let (domain, id) = domain_with_key();
        let key = domain.get(id).unwrap();
        let stored = key.encrypt(b"payee").unwrap();
        let value = EncryptedValue::from_cipher(stored.clone(), key).unwrap();
        assert_eq!(value.plain(), Some(&b"payee"[..]));
        assert_eq!(value.cipher_text().unwrap(), &stored[..]);
    }

    #[test]
    fn equality_is_on_plaintext() {
        let (domain, id) = domain_with_key();
        let key = domain.get(id).unwrap();
        let a = EncryptedValue::from_plain(&b"same"[..], key).unwrap();
        let b = EncryptedValue::from_plain(&b"same"[..], key).unwrap();
        // Random nonces make the ciphertexts differ; equality holds.
        assert_ne!(a.cipher_text().unwrap(), b.cipher_text().unwrap());
        assert_eq!(a, b);

        let c = EncryptedValue::from_plain(&b"other"[..], key).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn adopt_security_reuses_ciphertext_byte_for_byte() {
        let (domain, id) = domain_with_key();
        let key = domain.get(id).unwrap();
        let old = EncryptedValue::from_plain(&b"payee"[..], key).unwrap();

        let mut new = EncryptedValue::deferred(&b"payee"[..]);
        new.adopt_security(key, Some(&old)).unwrap();
        assert_eq!(
            new.cipher_text().unwrap(),
            old.cipher_text().unwrap(),
            "unchanged plaintext must reuse the old ciphertext"
        );
    }

    #[test]
    fn adopt_security_reencrypts_on_change() {
        let (domain, id) = domain_with_key();
        let key = domain.get(id).unwrap();
        let old = EncryptedValue::from_plain(&b"payee"[..], key).unwrap();

        let mut new = EncryptedValue::deferred(&b"other"[..]);
        new.adopt_security(key, Some(&old)).unwrap();
        assert_ne!(new.cipher_text().unwrap(), old.cipher_text().unwrap());
        assert_eq!(key.decrypt(new.cipher_text().unwrap()).unwrap(), b"other");
    }

    #[test]
    fn rekey_is_noop_on_same_key() {
        let (domain, id) = domain_with_key();
        let key = domain.get(id).unwrap();
        let mut value = EncryptedValue::from_plain(&b"payee"[..], key).unwrap();
        let before = value.cipher_text().unwrap().to_vec();
        assert!(!value.rekey(key, &domain).unwrap());
        assert_eq!(value.cipher_text().unwrap(), &before[..]);
    }

    #[test]
    fn rekey_recovers_purged_plaintext() {
        let (mut domain, first) = domain_with_key();
        let mut value =
            EncryptedValue::from_plain(&b"payee"[..], domain.get(first).unwrap()).unwrap();
        value.purge_plain().unwrap();
        assert!(value.plain().is_none());

        let second = domain.install_key(SymmetricKey::generate());
        let new_key = domain.get(second).unwrap();
        assert!(value.rekey(new_key, &domain).unwrap());
        assert_eq!(value.plain(), Some(&b"payee"[..]));
        assert_eq!(value.key_id(), Some(second));
        assert_eq!(
            new_key.decrypt(value.cipher_text().unwrap()).unwrap(),
            b"payee"
        );
    }

    #[test]
    fn record_rekey_archives_history_and_keeps_deleted_state() {
        let (mut domain, first) = domain_with_key();
        let mut col: Collection<SecretValues> = Collection::new_core();
        let key = domain.get(first).unwrap();
        col.insert_raw(RecordId::new(1), SecretValues::encrypted("cash", key).unwrap())
            .unwrap();
        col.insert_raw(RecordId::new(2), SecretValues::encrypted("bank", key).unwrap())
            .unwrap();
        col.delete_record(RecordId::new(2)).unwrap();

        let second = domain.install_key(SymmetricKey::generate());
        let snapshot = domain.clone();
        let new_key = snapshot.get(second).unwrap();
        let rekeyed = col.rekey_records(new_key, &snapshot).unwrap();
        assert_eq!(rekeyed, 2);

        let live = col.get(RecordId::new(1)).unwrap();
        assert_eq!(live.state(), DataState::Changed);
        assert_eq!(live.history().len(), 1);
        assert_eq!(live.values().name.key_id(), Some(second));

        // The deleted record was rekeyed without leaving the deleted
        // family.
        let hidden = col.get(RecordId::new(2)).unwrap();
        assert!(hidden.state().is_deleted());
        assert_eq!(hidden.values().name.key_id(), Some(second));
    }

    #[test]
    fn collect_key_refs_sees_history() {
        let (mut domain, first) = domain_with_key();
        let mut col: Collection<SecretValues> = Collection::new_core();
        col.insert_raw(
            RecordId::new(1),
            SecretValues::encrypted("cash", domain.get(first).unwrap()).unwrap(),
        )
        .unwrap();

        let second = domain.install_key(SymmetricKey::generate());
        let snapshot = domain.clone();
        col.rekey_records(snapshot.get(second).unwrap(), &snapshot)
            .unwrap();

        // Current values reference the new key; the archived snapshot
        // still references the old one.
        let mut refs = BTreeSet::new();
        col.collect_key_refs(&mut refs);
        assert!(refs.contains(&first));
        assert!(refs.contains(&second));
    }
}
