//! Field-level encryption for RecVault.
//!
//! Records with sensitive fields keep each such field as an
//! [`EncryptedValue`]: a plaintext/ciphertext pair bound to one member
//! of a [`ControlKeyDomain`]. The domain holds at most one active key
//! plus retired ones; rotating it re-encrypts every registered
//! collection and purges keys nothing references any more.
//!
//! ## Security model
//!
//! - AES-256-GCM authenticated encryption, unique nonce per operation
//! - Key material zeroized on drop
//! - HKDF-SHA256 when deriving keys from passphrases
//!
//! Mass re-encryption is the one long-running operation of the crate;
//! `rekey` runs it on a dedicated worker thread with progress events
//! and cooperative cancellation.

mod cipher;
mod encrypted;
mod keys;
mod rekey;

pub use cipher::{Cipher, GcmCipher, SymmetricKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use encrypted::{adopt_security, CipherSet, EncryptedValue};
pub use keys::{ControlKey, ControlKeyDomain, RekeyTarget, RotationOutcome};
pub use rekey::{rekey_collection, spawn_rekey, RekeyFeed, RekeyHandle, RekeyOutcome, RekeyProgress};
