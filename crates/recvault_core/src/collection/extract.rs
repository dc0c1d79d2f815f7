//! Derivation of sibling collections from a base collection.

use crate::collection::Collection;
use crate::error::VaultResult;
use crate::record::Record;
use crate::snapshot::ValueSet;
use crate::types::{DataState, ListStyle};

impl<V: ValueSet> Collection<V> {
    /// Derives an EDIT collection: a working copy for an interactive
    /// session, shadowing every record of this collection via base
    /// references.
    ///
    /// Clones arrive CLEAN (hidden when the base record is in a
    /// deleted state). The derived allocator reserves this
    /// collection's high-water mark so identities issued during the
    /// session cannot collide on commit.
    pub fn derive_edit(&self) -> VaultResult<Collection<V>> {
        let mut out = Collection::new(ListStyle::Edit);
        out.ident.reserve_through(self.ident.max_id());
        for record in self.iter() {
            let mut clone = Record::new(record.values.clone());
            clone.id = record.id;
            clone.base = Some(record.id);
            clone.hidden = record.hidden;
            clone.set_clean(ListStyle::Edit, Some(record.state));
            out.push_record(clone)?;
        }
        Ok(out)
    }

    /// Derives an UPDATE collection: the minimal extract of non-CLEAN
    /// records for persistence sync.
    ///
    /// A clone that ends CHANGED gets its history forced to a single
    /// entry holding this record's pre-change values, collapsing any
    /// longer edit history into one before/after delta.
    pub fn derive_update(&self) -> VaultResult<Collection<V>> {
        let mut out = Collection::new(ListStyle::Update);
        out.ident.reserve_through(self.ident.max_id());
        for record in self.iter() {
            if record.state == DataState::Clean {
                continue;
            }
            let mut clone = Record::new(record.values.clone());
            clone.id = record.id;
            clone.base = Some(record.id);
            clone.hidden = record.hidden;
            clone.state = record.state;
            clone.edit_state = record.edit_state;
            if clone.state == DataState::Changed {
                clone.history.reset_to(record.original_values().clone());
            }
            out.push_record(clone)?;
        }
        Ok(out)
    }

    /// Derives a COPY collection: a detached snapshot with the same
    /// identities, values and states, but no base links and no
    /// history.
    pub fn derive_copy(&self) -> VaultResult<Collection<V>> {
        let mut out = Collection::new(ListStyle::Copy);
        out.ident.reserve_through(self.ident.max_id());
        for record in self.iter() {
            let mut clone = Record::new(record.values.clone());
            clone.id = record.id;
            clone.hidden = record.hidden;
            clone.state = record.state;
            clone.edit_state = record.edit_state;
            out.push_record(clone)?;
        }
        Ok(out)
    }

    /// Derives a CLONE collection: a full-fidelity duplicate
    /// including history, ledgers and flags, used to duplicate a
    /// whole dataset. Base references are dropped; a clone belongs to
    /// a new dataset where they would dangle.
    pub fn derive_clone(&self) -> VaultResult<Collection<V>> {
        let mut out = Collection::new(ListStyle::Clone);
        out.ident.reserve_through(self.ident.max_id());
        for record in self.iter() {
            let mut clone = record.clone();
            clone.base = None;
            out.push_record(clone)?;
        }
        out.refresh_edit_state();
        Ok(out)
    }

    /// Derives a VIEW collection: a read-only projection shadowing
    /// this collection by base references. Clones arrive CLEAN with
    /// no history.
    pub fn derive_view(&self) -> VaultResult<Collection<V>> {
        let mut out = Collection::new(ListStyle::View);
        out.ident.reserve_through(self.ident.max_id());
        for record in self.iter() {
            let mut clone = Record::new(record.values.clone());
            clone.id = record.id;
            clone.base = Some(record.id);
            clone.hidden = record.hidden;
            clone.set_clean(ListStyle::View, Some(record.state));
            out.push_record(clone)?;
        }
        Ok(out)
    }

    /// Derives a SPOT collection: a transient editing extract with
    /// the restricted two-state lifecycle (CLEAN <-> CHANGED).
    pub fn derive_spot(&self) -> VaultResult<Collection<V>> {
        let mut out = Collection::new(ListStyle::Spot);
        out.ident.reserve_through(self.ident.max_id());
        for record in self.iter() {
            if record.hidden {
                continue;
            }
            let mut clone = Record::new(record.values.clone());
            clone.id = record.id;
            clone.base = Some(record.id);
            clone.set_clean(ListStyle::Spot, None);
            out.push_record(clone)?;
        }
        Ok(out)
    }
}
