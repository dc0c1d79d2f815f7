//! Identity-bearing, stateful records.
//!
//! A record owns exactly one current snapshot, one history stack and
//! one validation ledger. Records live in their collection's arena;
//! the "base" relationship to a record in another collection is a
//! plain identity resolved through that collection's allocator, never
//! a live pointer.

use crate::history::History;
use crate::snapshot::{FieldDelta, FieldTag, ValueSet};
use crate::types::{DataState, EditState, ListStyle, RecordId};
use crate::validation::ValidationLedger;

/// One record of a collection.
#[derive(Debug, Clone)]
pub struct Record<V: ValueSet> {
    pub(crate) id: RecordId,
    pub(crate) state: DataState,
    pub(crate) edit_state: EditState,
    /// Hidden flag, distinct from the lifecycle state: a committed
    /// deletion leaves a CLEAN but hidden record.
    pub(crate) hidden: bool,
    /// Transient: field changes were applied during a commit cycle.
    pub(crate) mid_change: bool,
    /// Transient: lifecycle state was flipped during a commit cycle.
    pub(crate) mid_restore: bool,
    /// Transient: inserted during a commit cycle. Kept apart from the
    /// lifecycle state: a record can be NEW without having been
    /// inserted by the running cycle.
    pub(crate) mid_insert: bool,
    /// Identity of the shadowed record in the base collection.
    pub(crate) base: Option<RecordId>,
    pub(crate) values: V,
    pub(crate) history: History<V>,
    pub(crate) ledger: ValidationLedger,
}

impl<V: ValueSet> Record<V> {
    /// Creates a detached record around a snapshot.
    #[must_use]
    pub fn new(values: V) -> Self {
        Self {
            id: RecordId::UNSET,
            state: DataState::NoState,
            edit_state: EditState::Clean,
            hidden: false,
            mid_change: false,
            mid_restore: false,
            mid_insert: false,
            base: None,
            values,
            history: History::new(),
            ledger: ValidationLedger::new(),
        }
    }

    /// Returns the record's identity.
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> DataState {
        self.state
    }

    /// Returns the derived edit status.
    #[must_use]
    pub fn edit_state(&self) -> EditState {
        self.edit_state
    }

    /// Returns `true` if the record is hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Returns `true` if the lifecycle state is in the deleted family.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.state.is_deleted()
    }

    /// Returns the identity of the base record, if any.
    #[must_use]
    pub fn base(&self) -> Option<RecordId> {
        self.base
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn values(&self) -> &V {
        &self.values
    }

    /// Returns the history stack.
    #[must_use]
    pub fn history(&self) -> &History<V> {
        &self.history
    }

    /// Returns the validation ledger.
    #[must_use]
    pub fn ledger(&self) -> &ValidationLedger {
        &self.ledger
    }

    /// Returns `true` if any snapshots are archived.
    #[must_use]
    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    /// Returns the earliest archived snapshot, falling back to the
    /// current one when nothing is archived.
    #[must_use]
    pub fn original_values(&self) -> &V {
        self.history.original().unwrap_or(&self.values)
    }

    /// Fields whose current values differ from the most recent
    /// archived snapshot; empty when nothing is archived.
    #[must_use]
    pub fn changed_fields(&self) -> FieldDelta {
        match self.history.head() {
            Some(previous) => self.values.diff(previous),
            None => FieldDelta::new(),
        }
    }

    /// Formatted display text for one field.
    #[must_use]
    pub fn field_text(&self, tag: FieldTag) -> Option<String> {
        self.values.field_text(tag)
    }

    /// First validation message attached to one field, if any.
    #[must_use]
    pub fn error_text(&self, tag: FieldTag) -> Option<&str> {
        self.ledger.first_for_field(tag)
    }

    // --- lifecycle transitions -------------------------------------

    /// Transition to NEW: always allowed, un-hides, marks dirty.
    pub(crate) fn set_new(&mut self) {
        self.hidden = false;
        self.state = DataState::New;
        self.edit_state = EditState::Dirty;
    }

    /// Transition to CLEAN.
    ///
    /// A base in a deleted-family state hides this record. In an EDIT
    /// collection a record without a base cannot be CLEAN (there is
    /// nothing to be clean against) and is redirected to NEW.
    pub(crate) fn set_clean(&mut self, style: ListStyle, base_state: Option<DataState>) {
        if style == ListStyle::Edit && self.base.is_none() {
            self.set_new();
            return;
        }
        if base_state.is_some_and(DataState::is_deleted) {
            self.hidden = true;
        }
        self.state = DataState::Clean;
        self.edit_state = EditState::Clean;
    }

    /// Transition to RECOVERED: un-hides and restores the exact
    /// pre-deletion state.
    ///
    /// A CLEAN but hidden record is a committed deletion; recovering
    /// it enters the RECOVERED state proper, which commits as an
    /// un-hide.
    pub(crate) fn set_recovered(&mut self) {
        self.state = match self.state {
            DataState::Deleted => DataState::Clean,
            DataState::DelNew => DataState::New,
            DataState::DelChg => DataState::Changed,
            DataState::Clean if self.hidden => DataState::Recovered,
            other => other,
        };
        self.hidden = false;
        self.edit_state = match self.state {
            DataState::Clean => EditState::Clean,
            _ => EditState::Dirty,
        };
    }

    /// Transition to CHANGED: a NEW record stays NEW (its insertion
    /// already covers the change).
    pub(crate) fn set_changed(&mut self) {
        self.state = match self.state {
            DataState::New | DataState::DelNew => DataState::New,
            _ => DataState::Changed,
        };
        self.edit_state = EditState::Dirty;
    }

    /// Transition to DELETED: hides and remembers the prior state so
    /// recovery restores it exactly. Idempotent on the deleted family.
    pub(crate) fn set_deleted(&mut self) {
        self.hidden = true;
        self.state = match self.state {
            DataState::New => DataState::DelNew,
            DataState::Changed => DataState::DelChg,
            DataState::Clean | DataState::Recovered | DataState::NoState => DataState::Deleted,
            deleted => deleted,
        };
        self.edit_state = EditState::Dirty;
    }

    // --- history operations ----------------------------------------

    /// Archives the current snapshot.
    pub(crate) fn push_history(&mut self) {
        self.history.push(self.values.clone());
    }

    /// Drops the just-pushed entry if nothing actually changed.
    pub(crate) fn maybe_pop_history(&mut self, cursor_driven: bool) -> bool {
        self.history.maybe_pop(&self.values, cursor_driven)
    }

    /// Undoes the most recent archived change, restoring its values.
    ///
    /// Returns `false` when there is nothing to undo. A CHANGED
    /// record whose history empties out returns to CLEAN; a NEW
    /// record stays NEW.
    pub(crate) fn pop_history(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        self.values = previous;
        if self.history.is_empty() && self.state == DataState::Changed {
            self.state = DataState::Clean;
            self.edit_state = EditState::Clean;
        }
        true
    }

    /// Steps one entry deeper into the base record's history
    /// (toward the earliest entry).
    ///
    /// Pushes a local entry, copies in the targeted archived values,
    /// then collapses the push if the preview matches current values.
    /// Stepping past the earliest entry restores live base values and
    /// forces CLEAN. Returns whether a net change was applied.
    pub(crate) fn peek_previous(&mut self, base: &Record<V>) -> bool {
        let next = match self.history.cursor() {
            None => 0,
            Some(i) => i + 1,
        };
        self.step_to(base, base.history.from_head(next).map(|_| next))
    }

    /// Steps one entry back toward the base record's live values.
    ///
    /// Returns whether a net change was applied; a record already at
    /// live values is a no-op.
    pub(crate) fn peek_further(&mut self, base: &Record<V>) -> bool {
        match self.history.cursor() {
            None => false,
            Some(0) => self.step_to(base, None),
            Some(i) => {
                let target = if base.history.from_head(i - 1).is_some() {
                    Some(i - 1)
                } else {
                    None
                };
                self.step_to(base, target)
            }
        }
    }

    /// Moves the preview to the given base history offset, or to the
    /// base's live values when `target` is `None`.
    fn step_to(&mut self, base: &Record<V>, target: Option<usize>) -> bool {
        self.push_history();
        match target {
            Some(offset) => {
                // Offset was validated by the caller.
                if let Some(snapshot) = base.history.from_head(offset) {
                    self.values = snapshot.clone();
                }
                self.history.set_cursor(Some(offset));
                let changed = self.maybe_pop_history(true);
                if changed {
                    self.set_changed();
                }
                changed
            }
            None => {
                self.values = base.values.clone();
                self.history.set_cursor(None);
                let changed = self.maybe_pop_history(true);
                self.state = DataState::Clean;
                self.edit_state = EditState::Clean;
                changed
            }
        }
    }

    /// Irreversibly freezes the record to CLEAN: clears history,
    /// ledger and transient flags. The hidden flag survives so a
    /// committed deletion stays hidden.
    pub(crate) fn freeze(&mut self) {
        self.history.clear();
        self.ledger.clear();
        self.mid_change = false;
        self.mid_restore = false;
        self.mid_insert = false;
        self.state = DataState::Clean;
        self.edit_state = EditState::Clean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::NoteValues;

    fn record(name: &str, amount: i64) -> Record<NoteValues> {
        Record::new(NoteValues::new(name, amount))
    }

    #[test]
    fn new_record_defaults() {
        let rec = record("Cash", 100);
        assert_eq!(rec.state(), DataState::NoState);
        assert_eq!(rec.edit_state(), EditState::Clean);
        assert!(rec.id().is_unset());
        assert!(!rec.is_hidden());
        assert!(!rec.has_history());
    }

    #[test]
    fn set_new_unhides_and_dirties() {
        let mut rec = record("Cash", 100);
        rec.hidden = true;
        rec.set_new();
        assert_eq!(rec.state(), DataState::New);
        assert_eq!(rec.edit_state(), EditState::Dirty);
        assert!(!rec.is_hidden());
    }

    #[test]
    fn clean_with_deleted_base_hides() {
        let mut rec = record("Cash", 100);
        rec.base = Some(RecordId::new(1));
        rec.set_clean(ListStyle::Edit, Some(DataState::Deleted));
        assert_eq!(rec.state(), DataState::Clean);
        assert!(rec.is_hidden());
    }

    #[test]
    fn clean_in_edit_without_base_redirects_to_new() {
        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Edit, None);
        assert_eq!(rec.state(), DataState::New);
        assert_eq!(rec.edit_state(), EditState::Dirty);
    }

    #[test]
    fn clean_in_core_without_base_stays_clean() {
        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Core, None);
        assert_eq!(rec.state(), DataState::Clean);
    }

    #[test]
    fn delete_maps_prior_state() {
        let mut rec = record("Cash", 100);

        rec.set_new();
        rec.set_deleted();
        assert_eq!(rec.state(), DataState::DelNew);
        assert!(rec.is_hidden());

        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Core, None);
        rec.set_changed();
        rec.set_deleted();
        assert_eq!(rec.state(), DataState::DelChg);

        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Core, None);
        rec.set_deleted();
        assert_eq!(rec.state(), DataState::Deleted);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut rec = record("Cash", 100);
        rec.set_new();
        rec.set_deleted();
        rec.set_deleted();
        assert_eq!(rec.state(), DataState::DelNew);
    }

    #[test]
    fn recover_restores_exact_state() {
        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Core, None);
        rec.set_changed();
        rec.set_deleted();
        rec.set_recovered();
        assert_eq!(rec.state(), DataState::Changed);
        assert!(!rec.is_hidden());

        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Core, None);
        rec.set_deleted();
        rec.set_recovered();
        assert_eq!(rec.state(), DataState::Clean);
        assert_eq!(rec.edit_state(), EditState::Clean);
    }

    #[test]
    fn changed_on_new_stays_new() {
        let mut rec = record("Cash", 100);
        rec.set_new();
        rec.set_changed();
        assert_eq!(rec.state(), DataState::New);
    }

    #[test]
    fn history_collapse_on_revert() {
        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Core, None);

        rec.push_history();
        rec.values.name = "Bank".into();
        assert!(rec.maybe_pop_history(false));
        assert_eq!(rec.history().len(), 1);

        // Revert the field to its pre-push value: entry discarded.
        rec.push_history();
        rec.values.name = "Till".into();
        rec.values.name = "Bank".into();
        assert!(!rec.maybe_pop_history(false));
        assert_eq!(rec.history().len(), 1);
    }

    #[test]
    fn changed_fields_reports_delta_against_history() {
        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Core, None);
        assert!(rec.changed_fields().is_empty());

        rec.push_history();
        rec.values.amount = 250;
        rec.maybe_pop_history(false);
        rec.set_changed();

        let delta = rec.changed_fields();
        assert_eq!(delta.len(), 1);
        assert!(delta.contains(crate::testutil::NOTE_AMOUNT));
        assert!(!delta.contains(crate::testutil::NOTE_NAME));
    }

    #[test]
    fn undo_restores_values_and_state() {
        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Core, None);

        rec.push_history();
        rec.values.amount = 250;
        rec.maybe_pop_history(false);
        rec.set_changed();
        assert_eq!(rec.state(), DataState::Changed);

        assert!(rec.pop_history());
        assert_eq!(rec.values().amount, 100);
        assert_eq!(rec.state(), DataState::Clean);
        assert!(!rec.pop_history());
    }

    #[test]
    fn peek_walks_base_history() {
        // Base record with two archived generations.
        let mut base = record("v3", 3);
        base.set_clean(ListStyle::Core, None);
        base.push_history();
        base.values = NoteValues::new("v2", 2);
        base.maybe_pop_history(false);
        base.push_history();
        base.values = NoteValues::new("v3-live", 4);
        base.maybe_pop_history(false);
        // History (head first): {v2}, {v3}; live: {v3-live}.

        let mut edit = record("v3-live", 4);
        edit.base = Some(RecordId::new(1));
        edit.set_clean(ListStyle::Edit, Some(DataState::Clean));

        // Step to the newest archived entry.
        assert!(edit.peek_previous(&base));
        assert_eq!(edit.values().name, "v2");
        assert_eq!(edit.state(), DataState::Changed);

        // Step to the earliest entry.
        assert!(edit.peek_previous(&base));
        assert_eq!(edit.values().name, "v3");

        // Past the earliest: live base values, forced CLEAN.
        assert!(edit.peek_previous(&base));
        assert_eq!(edit.values().name, "v3-live");
        assert_eq!(edit.state(), DataState::Clean);

        // Walk back toward live values with peek_further.
        assert!(!edit.peek_further(&base));
    }

    #[test]
    fn peek_matching_preview_is_no_op() {
        let mut base = record("same", 1);
        base.set_clean(ListStyle::Core, None);
        base.push_history();
        // Values unchanged after push: archived equals live.
        base.history.maybe_pop(&NoteValues::new("other", 9), false);
        // Base history now holds {same,1}.

        let mut edit = record("same", 1);
        edit.base = Some(RecordId::new(1));
        edit.set_clean(ListStyle::Edit, Some(DataState::Clean));

        // Preview equals current values: collapses to a no-op.
        assert!(!edit.peek_previous(&base));
        assert!(edit.history().is_empty());
    }

    #[test]
    fn freeze_clears_everything_but_hidden() {
        let mut rec = record("Cash", 100);
        rec.set_clean(ListStyle::Core, None);
        rec.push_history();
        rec.values.amount = 1;
        rec.maybe_pop_history(false);
        rec.set_deleted();
        rec.mid_change = true;
        rec.ledger.add(crate::testutil::NOTE_NAME, "bad");

        rec.freeze();
        assert_eq!(rec.state(), DataState::Clean);
        assert!(rec.is_hidden());
        assert!(!rec.has_history());
        assert!(rec.ledger().is_empty());
        assert!(!rec.mid_change);
    }
}
