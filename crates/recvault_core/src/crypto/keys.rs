//! Control-Key Domain: the set of keys encrypted values may bind to.

use crate::crypto::cipher::{Cipher, GcmCipher, SymmetricKey};
use crate::error::{VaultError, VaultResult};
use crate::types::KeyId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// One member of a Control-Key Domain.
///
/// Every encrypted value binds to exactly one member by [`KeyId`].
/// At most one member is active; the rest are retired and survive
/// only while some record still references them.
#[derive(Debug, Clone)]
pub struct ControlKey {
    id: KeyId,
    active: bool,
    key: SymmetricKey,
    cipher: GcmCipher,
}

impl ControlKey {
    fn new(id: KeyId, key: SymmetricKey) -> Self {
        let cipher = GcmCipher::new(&key);
        Self {
            id,
            active: true,
            key,
            cipher,
        }
    }

    /// Returns the member's identifier.
    #[must_use]
    pub fn id(&self) -> KeyId {
        self.id
    }

    /// Returns `true` if this is the domain's active member.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Encrypts a plaintext under this member's key.
    pub fn encrypt(&self, plaintext: &[u8]) -> VaultResult<Vec<u8>> {
        self.cipher.encrypt(plaintext)
    }

    /// Decrypts a ciphertext bound to this member.
    pub fn decrypt(&self, ciphertext: &[u8]) -> VaultResult<Vec<u8>> {
        self.cipher.decrypt(ciphertext)
    }

    /// Wraps this member's raw key material under another cipher, for
    /// storage by a persistence adapter.
    pub fn wrap_under(&self, wrapping: &dyn Cipher) -> VaultResult<Vec<u8>> {
        wrapping.wrap_key(&self.key)
    }
}

/// A collection that can be driven through a key rotation.
pub trait RekeyTarget {
    /// Re-encrypts every record under the given key, deleted and
    /// hidden records included. Returns how many records were
    /// actually re-encrypted.
    fn rekey_all(&mut self, key: &ControlKey, domain: &ControlKeyDomain) -> VaultResult<usize>;

    /// Adds the key ids still referenced by any record to `refs`.
    fn collect_key_refs(&self, refs: &mut BTreeSet<KeyId>);
}

/// Summary of one domain rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationOutcome {
    /// Identifier of the newly active key.
    pub key_id: KeyId,
    /// Records re-encrypted across all targets.
    pub records_rekeyed: usize,
    /// Retired keys removed because nothing references them.
    pub keys_purged: usize,
}

/// The set of control keys for one dataset.
#[derive(Debug, Clone, Default)]
pub struct ControlKeyDomain {
    members: BTreeMap<KeyId, ControlKey>,
    next: u32,
}

impl ControlKeyDomain {
    /// Creates an empty domain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs key material as the new active member, retiring the
    /// previous one.
    pub fn install_key(&mut self, key: SymmetricKey) -> KeyId {
        self.next += 1;
        let id = KeyId::new(self.next);
        for member in self.members.values_mut() {
            member.active = false;
        }
        self.members.insert(id, ControlKey::new(id, key));
        id
    }

    /// Returns the active member, if any.
    #[must_use]
    pub fn active_key(&self) -> Option<&ControlKey> {
        self.members.values().find(|m| m.active)
    }

    /// Resolves a member by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::UnresolvedReference`] for an unknown id.
    pub fn get(&self, id: KeyId) -> VaultResult<&ControlKey> {
        self.members
            .get(&id)
            .ok_or_else(|| VaultError::unresolved_key(id))
    }

    /// Returns the number of members, retired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the domain holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Rotates the domain: installs a fresh random key as the active
    /// member, re-encrypts every target under it, then purges retired
    /// members no record references any more.
    ///
    /// Deleted and hidden records are rekeyed like any other; they
    /// are live until physically removed.
    pub fn rotate(&mut self, targets: &mut [&mut dyn RekeyTarget]) -> VaultResult<RotationOutcome> {
        let key_id = self.install_key(SymmetricKey::generate());

        // Targets decrypt purged plaintext through the old members,
        // so they work against a snapshot taken after installation.
        let snapshot = self.clone();
        let key = snapshot.get(key_id)?;

        let mut records_rekeyed = 0;
        for target in targets.iter_mut() {
            records_rekeyed += target.rekey_all(key, &snapshot)?;
        }

        let keys_purged = self.purge_unreferenced(targets);
        info!(
            key = %key_id,
            records = records_rekeyed,
            purged = keys_purged,
            "control-key domain rotated"
        );
        Ok(RotationOutcome {
            key_id,
            records_rekeyed,
            keys_purged,
        })
    }

    /// Removes retired members no target references. Returns how many
    /// were removed.
    pub fn purge_unreferenced(&mut self, targets: &[&mut dyn RekeyTarget]) -> usize {
        let mut refs = BTreeSet::new();
        for target in targets {
            target.collect_key_refs(&mut refs);
        }
        let before = self.members.len();
        self.members
            .retain(|id, member| member.active || refs.contains(id));
        before - self.members.len()
    }
}
