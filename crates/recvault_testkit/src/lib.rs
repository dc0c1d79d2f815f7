//! # RecVault Testkit
//!
//! Test utilities for RecVault.
//!
//! This crate provides:
//! - Snapshot fixtures (plain and encrypted account kinds)
//! - Collection and Control-Key Domain helpers
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recvault_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_collection() {
//!     let core = account_collection(&[("Cash", 100), ("Bank", 200)]);
//!     let edit = core.derive_edit().unwrap();
//!     // ... test operations
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
