//! # RecVault Core
//!
//! A versioned, encrypted, collection-of-records framework.
//!
//! RecVault manages ordered collections of identity-bearing records,
//! each carrying a lifecycle state, a per-record change history with
//! undo, a validation ledger and optionally field-level encryption
//! under a rotatable Control-Key Domain.
//!
//! ## Building blocks
//!
//! - [`Collection`] — ordered, identity-indexed record arena with a
//!   fixed [`ListStyle`] (CORE, EDIT, UPDATE, ...)
//! - [`Record`] — one record: snapshot, state, history, ledger
//! - [`ValueSet`] — capability trait concrete snapshot kinds implement
//! - [`crypto`] — encrypted field values, Control-Key Domain, rekey
//!   worker
//! - [`refdata`] — one-record-per-enumeration-value reference data
//!
//! ## Example
//!
//! ```rust,ignore
//! use recvault_core::{Collection, RecordId};
//!
//! let mut core = Collection::new_core();
//! let id = core.create(AccountValues::new("Cash"))?;
//!
//! // Interactive session on a working copy.
//! let mut edit = core.derive_edit()?;
//! edit.update_record(id, |v| v.name = "Bank".into())?;
//!
//! // Three-phase commit back onto the core.
//! core.prepare(&mut edit)?;
//! core.commit();
//! ```
//!
//! The core is single-threaded: callers hold exclusive access to a
//! collection for the duration of a commit cycle. The one
//! long-running operation, mass re-encryption, runs on a dedicated
//! worker thread (see [`crypto::spawn_rekey`]).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
pub mod crypto;
mod error;
mod history;
mod ident;
mod record;
pub mod refdata;
mod snapshot;
#[cfg(test)]
pub(crate) mod testutil;
mod types;
mod validation;

pub use collection::Collection;
pub use config::Config;
pub use error::{VaultError, VaultResult};
pub use history::History;
pub use ident::IdAllocator;
pub use record::Record;
pub use snapshot::{FieldDelta, FieldTag, ValueSet};
pub use types::{ClassId, DataState, EditState, Generation, KeyId, ListStyle, RecordId};
pub use validation::{FieldError, ValidationLedger, Validator};
