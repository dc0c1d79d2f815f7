//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random snapshots and
//! collections that maintain required invariants.

use crate::fixtures::AccountValues;
use proptest::prelude::*;
use recvault_core::{Collection, RecordId};

/// Strategy for generating account names.
pub fn account_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{1,11}").expect("Invalid regex")
}

/// Strategy for generating balances.
pub fn balance_strategy() -> impl Strategy<Value = i64> {
    -1_000_000i64..1_000_000i64
}

/// Strategy for generating account snapshots.
pub fn account_values_strategy() -> impl Strategy<Value = AccountValues> {
    (account_name_strategy(), balance_strategy())
        .prop_map(|(name, balance)| AccountValues { name, balance })
}

/// Strategy for generating assigned record identities.
pub fn record_id_strategy() -> impl Strategy<Value = RecordId> {
    (1u64..100_000).prop_map(RecordId::new)
}

/// Strategy for generating a CORE collection of 0..max accounts with
/// factory-issued identities.
pub fn account_collection_strategy(max: usize) -> impl Strategy<Value = Collection<AccountValues>> {
    prop::collection::vec(account_values_strategy(), 0..max).prop_map(|snapshots| {
        let mut col = Collection::new_core();
        for values in snapshots {
            col.create(values).expect("factory insertion cannot collide");
        }
        col
    })
}
