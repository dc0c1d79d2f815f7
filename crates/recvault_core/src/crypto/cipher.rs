//! Symmetric cipher provider, default AES-256-GCM.

use crate::error::{VaultError, VaultResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Raw symmetric key material.
///
/// Zeroized when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Generates a new random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> VaultResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(VaultError::invalid_key_size(bytes.len(), KEY_SIZE));
        }
        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Derives a key from a passphrase using HKDF-SHA256.
    ///
    /// HKDF is a key derivation function, not a password hash: the
    /// input is expected to carry high entropy already. The salt
    /// should be random, unique per dataset, and stored alongside it.
    pub fn derive_from_passphrase(passphrase: &[u8], salt: &[u8]) -> VaultResult<Self> {
        use hkdf::Hkdf;
        use sha2::Sha256;

        let hk = Hkdf::<Sha256>::new(Some(salt), passphrase);
        let mut bytes = [0u8; KEY_SIZE];
        hk.expand(b"recvault-control-key-v1", &mut bytes)
            .map_err(|_| VaultError::encryption_failed("HKDF expand failed"))?;
        Ok(Self { bytes })
    }

    /// Returns the key as a byte slice.
    ///
    /// # Security
    ///
    /// Never log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Opaque symmetric cipher capability.
///
/// Encrypted values call through this trait only; swapping the
/// algorithm means supplying another implementation, nothing more.
pub trait Cipher {
    /// Encrypts a plaintext, returning a self-contained ciphertext.
    fn encrypt(&self, plaintext: &[u8]) -> VaultResult<Vec<u8>>;

    /// Decrypts a ciphertext produced by [`encrypt`](Cipher::encrypt).
    fn decrypt(&self, ciphertext: &[u8]) -> VaultResult<Vec<u8>>;

    /// Wraps another key's raw material for storage.
    fn wrap_key(&self, key: &SymmetricKey) -> VaultResult<Vec<u8>> {
        self.encrypt(key.as_bytes())
    }

    /// Unwraps key material wrapped with [`wrap_key`](Cipher::wrap_key).
    fn unwrap_key(&self, wrapped: &[u8]) -> VaultResult<SymmetricKey> {
        let bytes = self.decrypt(wrapped)?;
        SymmetricKey::from_bytes(&bytes)
    }
}

/// AES-256-GCM cipher, the default provider.
///
/// Ciphertext format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
#[derive(Clone)]
pub struct GcmCipher {
    cipher: Aes256Gcm,
}

impl GcmCipher {
    /// Creates a cipher around the given key.
    #[must_use]
    pub fn new(key: &SymmetricKey) -> Self {
        // Infallible: SymmetricKey is always exactly 32 bytes.
        let key_array = GenericArray::from_slice(key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(key_array),
        }
    }
}

impl Cipher for GcmCipher {
    fn encrypt(&self, plaintext: &[u8]) -> VaultResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| VaultError::encryption_failed("encryption error"))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend(ciphertext);
        Ok(result)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> VaultResult<Vec<u8>> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(VaultError::decryption_failed("ciphertext too short"));
        }
        let nonce = Nonce::from_slice(&ciphertext[..NONCE_SIZE]);
        self.cipher
            .decrypt(nonce, &ciphertext[NONCE_SIZE..])
            .map_err(|_| VaultError::decryption_failed("decryption error"))
    }
}

impl std::fmt::Debug for GcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcmCipher")
            .field("cipher", &"Aes256Gcm")
            .finish()
    }
}
