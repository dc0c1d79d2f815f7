//! Ordered, identity-indexed record collections.
//!
//! A collection owns its records in a dense arena and keeps a
//! comparator-ordered view over them (sort key, then name, then
//! identity). Derived collections (edit/update/copy/diff extracts)
//! live in `extract` and `diff`; the three-phase edit-session commit
//! lives in `commit`.

mod commit;
mod diff;
mod extract;

use crate::error::{VaultError, VaultResult};
use crate::ident::IdAllocator;
use crate::record::Record;
use crate::snapshot::ValueSet;
use crate::types::{DataState, EditState, Generation, ListStyle, RecordId};
use crate::validation::Validator;
use std::cmp::Ordering;

/// An ordered, identity-indexed set of same-kind records.
#[derive(Debug)]
pub struct Collection<V: ValueSet> {
    pub(crate) style: ListStyle,
    /// Record arena; the map and order vector index into it.
    pub(crate) records: Vec<Record<V>>,
    /// Arena indices in comparator order.
    pub(crate) order: Vec<usize>,
    pub(crate) ident: IdAllocator,
    pub(crate) generation: Generation,
    pub(crate) edit_state: EditState,
}

impl<V: ValueSet> Collection<V> {
    /// Creates an empty collection of the given style.
    #[must_use]
    pub fn new(style: ListStyle) -> Self {
        Self {
            style,
            records: Vec::new(),
            order: Vec::new(),
            ident: IdAllocator::new(),
            generation: Generation::default(),
            edit_state: EditState::Clean,
        }
    }

    /// Creates an empty CORE collection.
    #[must_use]
    pub fn new_core() -> Self {
        Self::new(ListStyle::Core)
    }

    /// Returns the collection style.
    #[must_use]
    pub fn style(&self) -> ListStyle {
        self.style
    }

    /// Returns the generation counter.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the aggregate edit status.
    #[must_use]
    pub fn edit_state(&self) -> EditState {
        self.edit_state
    }

    /// Returns the number of records, hidden ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the collection holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of visible (non-hidden) records.
    #[must_use]
    pub fn visible_len(&self) -> usize {
        self.records.iter().filter(|r| !r.is_hidden()).count()
    }

    /// Returns the highest identity issued or observed.
    #[must_use]
    pub fn max_id(&self) -> RecordId {
        self.ident.max_id()
    }

    /// Looks a record up by identity.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Record<V>> {
        self.ident.get(id).map(|idx| &self.records[idx])
    }

    /// Iterates over records in comparator order.
    pub fn iter(&self) -> impl Iterator<Item = &Record<V>> {
        self.order.iter().map(|&idx| &self.records[idx])
    }

    /// Iterates over visible records in comparator order.
    pub fn iter_visible(&self) -> impl Iterator<Item = &Record<V>> {
        self.iter().filter(|r| !r.is_hidden())
    }

    /// Creates a record through the collection factory.
    ///
    /// A fresh identity (`max + 1`) is issued and the record starts
    /// NEW (CLEAN in a SPOT collection, which does not track
    /// insertions).
    pub fn create(&mut self, values: V) -> VaultResult<RecordId> {
        self.insert_values(RecordId::UNSET, values)
    }

    /// Inserts a record with a known identity and raw field values.
    ///
    /// This is the persistence-adapter entry point for rehydrating a
    /// CORE record: the record arrives CLEAN. Identity zero falls
    /// back to factory behavior.
    pub fn insert_raw(&mut self, id: RecordId, values: V) -> VaultResult<RecordId> {
        self.insert_values(id, values)
    }

    fn insert_values(&mut self, id: RecordId, values: V) -> VaultResult<RecordId> {
        if !self.ident.is_unique(id) {
            return Err(VaultError::duplicate_identity(id, self.style));
        }
        let (id, state) = self.ident.assign(id);
        let mut record = Record::new(values);
        record.id = id;
        match state {
            DataState::New if self.style == ListStyle::Spot => {
                record.set_clean(self.style, None);
            }
            DataState::New => record.set_new(),
            _ => record.set_clean(self.style, None),
        }
        if record.state().is_dirty() {
            self.edit_state = self.edit_state.combine(EditState::Dirty);
        }
        self.push_record(record)
    }

    /// Applies a field mutation to one record, recording history.
    ///
    /// The current snapshot is archived first; if the mutation turns
    /// out to be a no-op the archived entry is discarded again.
    /// Returns whether a net change occurred.
    pub fn update_record(&mut self, id: RecordId, f: impl FnOnce(&mut V)) -> VaultResult<bool> {
        let idx = self.resolve(id)?;
        let record = &mut self.records[idx];
        record.push_history();
        f(&mut record.values);
        let changed = record.maybe_pop_history(false);
        if changed {
            record.set_changed();
            self.edit_state = self.edit_state.combine(EditState::Dirty);
            self.reposition(idx);
        }
        Ok(changed)
    }

    /// Marks a record deleted.
    ///
    /// SPOT collections do not track deletion and reject this with a
    /// logic error.
    pub fn delete_record(&mut self, id: RecordId) -> VaultResult<()> {
        if !self.style.tracks_deletes() {
            return Err(VaultError::logic("delete in SPOT collection"));
        }
        let idx = self.resolve(id)?;
        self.records[idx].set_deleted();
        self.edit_state = self.edit_state.combine(EditState::Dirty);
        Ok(())
    }

    /// Restores a deleted record to its exact pre-deletion state.
    pub fn recover_record(&mut self, id: RecordId) -> VaultResult<()> {
        if !self.style.tracks_deletes() {
            return Err(VaultError::logic("recover in SPOT collection"));
        }
        let idx = self.resolve(id)?;
        self.records[idx].set_recovered();
        self.edit_state = self.edit_state.combine(EditState::Dirty);
        Ok(())
    }

    /// Undoes the most recent archived change on one record.
    pub fn undo_record(&mut self, id: RecordId) -> VaultResult<bool> {
        let idx = self.resolve(id)?;
        let undone = self.records[idx].pop_history();
        if undone {
            self.reposition(idx);
        }
        Ok(undone)
    }

    /// Steps one record deeper into its base record's history
    /// (cross-record undo preview).
    pub fn peek_previous(&mut self, id: RecordId, base: &Collection<V>) -> VaultResult<bool> {
        let idx = self.resolve(id)?;
        let base_record = self.base_record(idx, base)?;
        let changed = self.records[idx].peek_previous(base_record);
        if changed {
            self.reposition(idx);
        }
        Ok(changed)
    }

    /// Steps one record back toward its base record's live values.
    pub fn peek_further(&mut self, id: RecordId, base: &Collection<V>) -> VaultResult<bool> {
        let idx = self.resolve(id)?;
        let base_record = self.base_record(idx, base)?;
        let changed = self.records[idx].peek_further(base_record);
        if changed {
            self.reposition(idx);
        }
        Ok(changed)
    }

    /// Runs the supplied validation rules once over every live
    /// record, refilling each ledger and deriving edit statuses.
    ///
    /// Deleted records are not validated (they are going away); they
    /// count as validated-dirty for the aggregate.
    pub fn validate(&mut self, rules: &dyn Validator<V>) -> EditState {
        let mut aggregate = EditState::Clean;
        for record in &mut self.records {
            record.ledger.clear();
            record.edit_state = if record.state.is_deleted() {
                EditState::Valid
            } else {
                rules.validate(&record.values, &mut record.ledger);
                if !record.ledger.is_empty() {
                    EditState::Error
                } else if record.state.is_dirty() || record.has_history() {
                    EditState::Valid
                } else {
                    EditState::Clean
                }
            };
            aggregate = aggregate.combine(record.edit_state);
        }
        self.edit_state = aggregate;
        aggregate
    }

    /// Recomputes the aggregate edit status from the records.
    pub fn refresh_edit_state(&mut self) -> EditState {
        let mut aggregate = EditState::Clean;
        for record in &self.records {
            aggregate = aggregate.combine(record.edit_state);
        }
        self.edit_state = aggregate;
        aggregate
    }

    // --- internals ---------------------------------------------------

    pub(crate) fn resolve(&self, id: RecordId) -> VaultResult<usize> {
        self.ident
            .get(id)
            .ok_or_else(|| VaultError::unresolved_record(id))
    }

    fn base_record<'a>(&self, idx: usize, base: &'a Collection<V>) -> VaultResult<&'a Record<V>> {
        let base_id = self.records[idx]
            .base
            .ok_or_else(|| VaultError::logic("record has no base reference"))?;
        base.get(base_id)
            .ok_or_else(|| VaultError::unresolved_record(base_id))
    }

    /// Inserts a fully formed record, preserving its state.
    pub(crate) fn push_record(&mut self, record: Record<V>) -> VaultResult<RecordId> {
        let id = record.id;
        let idx = self.records.len();
        if !self.ident.insert(id, idx) {
            return Err(VaultError::duplicate_identity(id, self.style));
        }
        let pos = self.sorted_position(&record);
        self.records.push(record);
        self.order.insert(pos, idx);
        Ok(id)
    }

    /// Ordering of two records: comparator order, identity as the
    /// final tie-break.
    fn record_cmp(a: &Record<V>, b: &Record<V>) -> Ordering {
        a.values.compare(&b.values).then(a.id.cmp(&b.id))
    }

    fn sorted_position(&self, record: &Record<V>) -> usize {
        self.order
            .partition_point(|&j| Self::record_cmp(&self.records[j], record) == Ordering::Less)
    }

    /// Moves one record to its correct ordered position after its
    /// sort key may have changed.
    pub(crate) fn reposition(&mut self, idx: usize) {
        if let Some(pos) = self.order.iter().position(|&j| j == idx) {
            self.order.remove(pos);
        }
        let pos = self.sorted_position(&self.records[idx]);
        self.order.insert(pos, idx);
    }

    /// Rebuilds the ordered view from scratch.
    pub(crate) fn rebuild_order(&mut self) {
        let mut order: Vec<usize> = (0..self.records.len()).collect();
        order.sort_by(|&a, &b| Self::record_cmp(&self.records[a], &self.records[b]));
        self.order = order;
    }

    /// Rebuilds the identity map after arena indices shifted.
    pub(crate) fn reindex(&mut self) {
        let entries: Vec<(RecordId, usize)> = self
            .records
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.id, idx))
            .collect();
        self.ident.rebuild(entries);
    }
}
