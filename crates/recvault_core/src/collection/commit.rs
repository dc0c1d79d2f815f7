//! Three-phase edit-session commit.
//!
//! `prepare` applies an EDIT collection's changes onto this (CORE)
//! collection, `rollback` reverses exactly those actions, and
//! `commit` irreversibly freezes the result. No phase validates
//! business rules: validation must precede `prepare`, and rollback is
//! guaranteed invertible only if nothing else mutated this collection
//! between `prepare` and `rollback`. The caller must hold exclusive
//! access to this collection for the whole cycle.

use crate::collection::Collection;
use crate::error::{VaultError, VaultResult};
use crate::record::Record;
use crate::snapshot::ValueSet;
use crate::types::{DataState, EditState};

impl<V: ValueSet> Collection<V> {
    /// Phase one: applies an edit session's outcome onto this
    /// collection, per edit-record state.
    ///
    /// NEW inserts a new record here (flagged as inserted); DELETED,
    /// DELCHG and RECOVERED flip the counterpart's state (flagged as
    /// flipped); CHANGED pushes the counterpart's history and copies
    /// the edited values in, flagging whether a net change was
    /// actually applied. DELNEW records were never persisted and
    /// apply nothing.
    ///
    /// # Errors
    ///
    /// A NEW record whose identity collides here aborts with
    /// [`VaultError::DuplicateIdentity`]; a missing counterpart
    /// aborts with [`VaultError::UnresolvedReference`]. An aborted
    /// prepare should be rolled back.
    pub fn prepare(&mut self, edit: &mut Collection<V>) -> VaultResult<()> {
        for edit_idx in 0..edit.records.len() {
            let state = edit.records[edit_idx].state;
            match state {
                DataState::New => {
                    let edit_record = &edit.records[edit_idx];
                    let mut inserted = Record::new(edit_record.values.clone());
                    inserted.id = edit_record.id;
                    inserted.set_new();
                    inserted.mid_insert = true;
                    let id = self.push_record(inserted)?;
                    edit.records[edit_idx].base = Some(id);
                }
                DataState::Deleted | DataState::DelChg => {
                    let idx = self.counterpart(&edit.records[edit_idx])?;
                    let record = &mut self.records[idx];
                    if !record.state.is_deleted() {
                        record.set_deleted();
                        record.mid_restore = true;
                    }
                }
                DataState::Recovered => {
                    let idx = self.counterpart(&edit.records[edit_idx])?;
                    let record = &mut self.records[idx];
                    if record.state.is_deleted() || record.hidden {
                        record.set_recovered();
                        record.mid_restore = true;
                    }
                }
                DataState::Changed => {
                    let idx = self.counterpart(&edit.records[edit_idx])?;
                    let record = &mut self.records[idx];
                    record.push_history();
                    record.values = edit.records[edit_idx].values.clone();
                    if record.maybe_pop_history(false) {
                        record.set_changed();
                        record.mid_change = true;
                        self.reposition(idx);
                    }
                }
                DataState::DelNew | DataState::Clean | DataState::NoState => {}
            }
        }
        self.refresh_edit_state();
        Ok(())
    }

    /// Phase two (alternative): reverses exactly what `prepare` did.
    ///
    /// Inserted records are removed, flipped states are flipped back,
    /// and pushed history entries are popped. Only invertible if
    /// nothing else mutated this collection since `prepare`.
    pub fn rollback(&mut self) {
        let mut removed = false;
        for record in &mut self.records {
            if record.mid_insert {
                // Inserted during prepare; drop below. The insertion
                // flag, not the NEW state, marks these: a record can
                // be NEW here without the running cycle inserting it.
                removed = true;
            } else if record.mid_restore {
                if record.state == DataState::Recovered {
                    // Was a committed deletion: back to CLEAN+hidden.
                    record.hidden = true;
                    record.state = DataState::Clean;
                    record.edit_state = EditState::Clean;
                } else if record.state.is_deleted() {
                    record.set_recovered();
                } else {
                    record.set_deleted();
                }
                record.mid_restore = false;
            } else if record.mid_change {
                record.pop_history();
                record.mid_change = false;
            }
        }
        if removed {
            self.records.retain(|r| !r.mid_insert);
            self.reindex();
        }
        self.rebuild_order();
        self.refresh_edit_state();
    }

    /// Phase three: irreversibly freezes this collection.
    ///
    /// DELNEW records were never persisted and are physically
    /// removed, never emitting a delete. Every other record collapses
    /// to CLEAN with history, ledgers and transient flags cleared;
    /// the hidden flag survives. Bumps the generation.
    pub fn commit(&mut self) {
        let before = self.records.len();
        self.records.retain(|r| r.state != DataState::DelNew);
        if self.records.len() != before {
            self.reindex();
        }
        for record in &mut self.records {
            record.freeze();
        }
        self.rebuild_order();
        self.generation = self.generation.next();
        self.edit_state = EditState::Clean;
    }

    /// Resolves the counterpart of an edit record in this collection.
    fn counterpart(&self, edit_record: &Record<V>) -> VaultResult<usize> {
        let base_id = edit_record
            .base
            .ok_or_else(|| VaultError::logic("edit record has no base reference"))?;
        self.resolve(base_id)
    }
}
