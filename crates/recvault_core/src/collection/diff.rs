//! Collection comparison (diff) and in-place rebase.

use crate::collection::Collection;
use crate::error::VaultResult;
use crate::record::Record;
use crate::snapshot::ValueSet;
use crate::types::{ListStyle, RecordId};
use std::collections::BTreeSet;

impl<V: ValueSet> Collection<V> {
    /// Compares two collections and produces a DIFFER collection.
    ///
    /// For each record of `new`: absent in `old` inserts NEW with no
    /// base; present but unequal inserts CHANGED with the old record
    /// as base and history seeded with the old values; present and
    /// equal is dropped. Records of `old` matched by nothing in `new`
    /// are inserted DELETED with no base.
    pub fn diff(new: &Collection<V>, old: &Collection<V>) -> VaultResult<Collection<V>> {
        let mut out = Collection::new(ListStyle::Differ);
        out.ident
            .reserve_through(new.ident.max_id().max(old.ident.max_id()));

        // Disposable view of old identities; whatever survives the
        // scan was deleted.
        let mut remaining: BTreeSet<RecordId> = old.iter().map(Record::id).collect();

        for record in new.iter() {
            match old.get(record.id) {
                None => {
                    let mut clone = Record::new(record.values.clone());
                    clone.id = record.id;
                    clone.set_new();
                    out.push_record(clone)?;
                }
                Some(old_record) => {
                    remaining.remove(&record.id);
                    if old_record.values != record.values {
                        let mut clone = Record::new(record.values.clone());
                        clone.id = record.id;
                        clone.base = Some(record.id);
                        clone.set_clean(ListStyle::Differ, None);
                        clone.set_changed();
                        clone.history.reset_to(old_record.values.clone());
                        out.push_record(clone)?;
                    }
                }
            }
        }

        for id in remaining {
            if let Some(old_record) = old.get(id) {
                let mut clone = Record::new(old_record.values.clone());
                clone.id = id;
                clone.set_deleted();
                out.push_record(clone)?;
            }
        }

        out.refresh_edit_state();
        Ok(out)
    }

    /// Rebases this collection's own states against a new base,
    /// in place.
    ///
    /// Unlike [`Collection::diff`], which produces a third
    /// collection, rebase mutates the current one: it resyncs a live
    /// session against a freshly reloaded copy without discarding
    /// compatible unsaved edits.
    pub fn rebase(&mut self, base: &Collection<V>) -> VaultResult<()> {
        let mut remaining: BTreeSet<RecordId> = base.iter().map(Record::id).collect();
        self.ident.reserve_through(base.ident.max_id());
        let style = self.style;

        for idx in 0..self.records.len() {
            let id = self.records[idx].id;
            match base.get(id) {
                None => {
                    // Not in the new base: this is session-local data.
                    let record = &mut self.records[idx];
                    let was_hidden = record.hidden;
                    record.base = None;
                    record.history.clear();
                    record.set_new();
                    if was_hidden {
                        record.set_deleted();
                    }
                }
                Some(base_record) => {
                    remaining.remove(&id);
                    let record = &mut self.records[idx];
                    let was_hidden = record.hidden;
                    record.base = Some(id);
                    if base_record.values != record.values {
                        // Unsaved edit survives as a single delta
                        // against the new base values.
                        record.history.reset_to(base_record.values.clone());
                        record.set_clean(style, None);
                        record.set_changed();
                        if was_hidden {
                            record.set_deleted();
                        }
                    } else {
                        record.history.clear();
                        record.set_clean(style, None);
                        if was_hidden {
                            record.set_deleted();
                        }
                    }
                }
            }
        }

        // Base records this collection never saw were deleted from
        // under the session.
        for id in remaining {
            if let Some(base_record) = base.get(id) {
                let mut clone = Record::new(base_record.values.clone());
                clone.id = id;
                clone.set_deleted();
                self.push_record(clone)?;
            }
        }

        self.rebuild_order();
        self.refresh_edit_state();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::NoteValues;
    use crate::types::{DataState, EditState};

    fn collection(entries: &[(u64, &str, i64)]) -> Collection<NoteValues> {
        let mut col = Collection::new_core();
        for (id, name, amount) in entries {
            col.insert_raw(RecordId::new(*id), NoteValues::new(name, *amount))
                .unwrap();
        }
        col
    }

    #[test]
    fn diff_classifies_new_changed_deleted() {
        let old = collection(&[(1, "cash", 100), (2, "bank", 200), (3, "card", 300)]);
        let new = collection(&[(1, "cash", 100), (2, "bank", 250), (4, "loan", 400)]);

        let differ = Collection::diff(&new, &old).unwrap();
        assert_eq!(differ.style(), ListStyle::Differ);
        assert_eq!(differ.len(), 3);

        // Unchanged record 1 is dropped entirely.
        assert!(differ.get(RecordId::new(1)).is_none());

        let changed = differ.get(RecordId::new(2)).unwrap();
        assert_eq!(changed.state(), DataState::Changed);
        assert_eq!(changed.base(), Some(RecordId::new(2)));
        assert_eq!(changed.history().head().unwrap().amount, 200);
        assert_eq!(changed.values().amount, 250);

        let deleted = differ.get(RecordId::new(3)).unwrap();
        assert_eq!(deleted.state(), DataState::Deleted);
        assert_eq!(deleted.base(), None);

        let added = differ.get(RecordId::new(4)).unwrap();
        assert_eq!(added.state(), DataState::New);
        assert_eq!(added.base(), None);
    }

    #[test]
    fn diff_of_identical_collections_is_empty() {
        let a = collection(&[(1, "cash", 100)]);
        let b = collection(&[(1, "cash", 100)]);
        let differ = Collection::diff(&a, &b).unwrap();
        assert!(differ.is_empty());
        assert_eq!(differ.edit_state(), EditState::Clean);
    }

    #[test]
    fn diff_scenario_single_field_rename() {
        // Collection {id=1, name="Cash", CLEAN}; renamed to "Bank".
        let old = collection(&[(1, "Cash", 0)]);
        let mut new = old.derive_copy().unwrap();
        new.update_record(RecordId::new(1), |v| v.name = "Bank".into())
            .unwrap();

        let differ = Collection::diff(&new, &old).unwrap();
        assert_eq!(differ.len(), 1);
        let rec = differ.get(RecordId::new(1)).unwrap();
        assert_eq!(rec.state(), DataState::Changed);
        assert_eq!(rec.history().head().unwrap().name, "Cash");
        assert_eq!(rec.values().name, "Bank");
    }

    #[test]
    fn rebase_preserves_compatible_edits() {
        // Session edited record 2; the reloaded base changed record 3
        // and gained record 5; record 4 disappeared from the base.
        let mut session = collection(&[(1, "a", 1), (2, "b", 2), (3, "c", 3), (4, "d", 4)]);
        session
            .update_record(RecordId::new(2), |v| v.amount = 20)
            .unwrap();

        let base = collection(&[(1, "a", 1), (2, "b", 2), (3, "c", 30), (5, "e", 5)]);
        session.rebase(&base).unwrap();

        // Untouched and equal: clean.
        assert_eq!(session.get(RecordId::new(1)).unwrap().state(), DataState::Clean);

        // Unsaved edit survives as a one-entry delta against base.
        let edited = session.get(RecordId::new(2)).unwrap();
        assert_eq!(edited.state(), DataState::Changed);
        assert_eq!(edited.values().amount, 20);
        assert_eq!(edited.history().len(), 1);
        assert_eq!(edited.history().head().unwrap().amount, 2);

        // Base changed under a record the session never touched.
        let stale = session.get(RecordId::new(3)).unwrap();
        assert_eq!(stale.state(), DataState::Changed);
        assert_eq!(stale.history().head().unwrap().amount, 30);

        // Absent from the new base: session-local NEW.
        assert_eq!(session.get(RecordId::new(4)).unwrap().state(), DataState::New);

        // Present only in the new base: appended DELETED.
        let gone = session.get(RecordId::new(5)).unwrap();
        assert_eq!(gone.state(), DataState::Deleted);
        assert_eq!(gone.base(), None);
    }

    #[test]
    fn rebase_preserves_hidden_flag() {
        let mut session = collection(&[(1, "a", 1), (2, "b", 2)]);
        session
            .update_record(RecordId::new(2), |v| v.amount = 9)
            .unwrap();
        session.delete_record(RecordId::new(1)).unwrap();
        session.delete_record(RecordId::new(2)).unwrap();

        // Record 1 vanished from the base; record 2 still matches its
        // old values there.
        let base = collection(&[(2, "b", 2)]);
        session.rebase(&base).unwrap();

        // Deleted + absent in base: DELNEW, still hidden.
        let local = session.get(RecordId::new(1)).unwrap();
        assert_eq!(local.state(), DataState::DelNew);
        assert!(local.is_hidden());

        // Deleted + changed against base: DELCHG.
        let changed = session.get(RecordId::new(2)).unwrap();
        assert_eq!(changed.state(), DataState::DelChg);
        assert!(changed.is_hidden());
    }

    #[test]
    fn diff_reapplied_onto_old_reproduces_new() {
        // Independent, non-overlapping edits from a common ancestor.
        let ancestor = collection(&[(1, "a", 1), (2, "b", 2), (3, "c", 3)]);

        let mut a = ancestor.derive_copy().unwrap();
        a.update_record(RecordId::new(1), |v| v.amount = 10).unwrap();
        a.create(NoteValues::new("x", 99)).unwrap(); // id 4

        let b = ancestor.derive_copy().unwrap();

        let differ = Collection::diff(&a, &b).unwrap();

        // Reapply the differ onto b: inserts NEW, applies CHANGED.
        let mut rebuilt = b.derive_copy().unwrap();
        for rec in differ.iter() {
            match rec.state() {
                DataState::New => {
                    rebuilt.insert_raw(rec.id(), rec.values().clone()).unwrap();
                }
                DataState::Changed => {
                    let values = rec.values().clone();
                    rebuilt
                        .update_record(rec.id(), |v| *v = values)
                        .unwrap();
                }
                DataState::Deleted => {
                    rebuilt.delete_record(rec.id()).unwrap();
                }
                _ => {}
            }
        }

        // Record-for-record equality with a.
        assert_eq!(rebuilt.len(), a.len());
        for rec in a.iter() {
            let other = rebuilt.get(rec.id()).unwrap();
            assert_eq!(other.values(), rec.values());
        }
    }
}
