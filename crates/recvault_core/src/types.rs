//! Core type definitions for RecVault.

use std::fmt;

/// Unique identifier for a record within one collection.
///
/// Identities are positive integers. The value `0` means "not yet
/// assigned"; a real identity is issued on first insertion into a
/// CORE collection and never reused within that collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RecordId(pub u64);

impl RecordId {
    /// The unassigned identity.
    pub const UNSET: RecordId = RecordId(0);

    /// Creates a new record ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns `true` if this identity has not been assigned yet.
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec:{}", self.0)
    }
}

/// Identifier for one member of a Control-Key Domain.
///
/// Every encrypted value binds to exactly one key by this identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyId(pub u32);

impl KeyId {
    /// Creates a new key ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key:{}", self.0)
    }
}

/// Stable small integer identifying one value of a closed
/// reference-data enumeration, independent of declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u16);

impl ClassId {
    /// Creates a new class ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class:{}", self.0)
    }
}

/// Generation counter for a collection.
///
/// Bumped on every commit; lets callers detect that a collection has
/// moved on underneath a derived extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    /// Creates a new generation counter.
    #[must_use]
    pub const fn new(gen: u64) -> Self {
        Self(gen)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next generation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen:{}", self.0)
    }
}

/// Fixed style of a record collection.
///
/// The style determines which lifecycle transitions a collection
/// permits and how it relates to a base collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListStyle {
    /// Canonical, persisted-equivalent collection.
    Core,
    /// Working copy for an interactive session, shadowing CORE
    /// records via base references.
    Edit,
    /// Minimal extract of changed/new/deleted records for
    /// persistence sync.
    Update,
    /// Detached snapshot: same identities and values, no base links,
    /// no history.
    Copy,
    /// Full-fidelity duplicate including history and hidden flags,
    /// used to duplicate a whole dataset.
    Clone,
    /// Read-only projection of another collection.
    View,
    /// Result of comparing two collections, annotated
    /// NEW/CHANGED/DELETED per record.
    Differ,
    /// Transient spot-editing collection with a restricted two-state
    /// lifecycle (CLEAN <-> CHANGED, no delete tracking).
    Spot,
}

impl ListStyle {
    /// Returns `true` if this style tracks record deletion.
    ///
    /// SPOT collections use the restricted two-state lifecycle and
    /// reject delete/recover transitions.
    #[must_use]
    pub const fn tracks_deletes(self) -> bool {
        !matches!(self, ListStyle::Spot)
    }

    /// Returns `true` if records in this style carry base references
    /// into another collection.
    #[must_use]
    pub const fn shadows_base(self) -> bool {
        matches!(self, ListStyle::Edit | ListStyle::Update | ListStyle::View)
    }
}

impl fmt::Display for ListStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListStyle::Core => "CORE",
            ListStyle::Edit => "EDIT",
            ListStyle::Update => "UPDATE",
            ListStyle::Copy => "COPY",
            ListStyle::Clone => "CLONE",
            ListStyle::View => "VIEW",
            ListStyle::Differ => "DIFFER",
            ListStyle::Spot => "SPOT",
        };
        write!(f, "{name}")
    }
}

/// Lifecycle state of a record.
///
/// The deleted family is split three ways so that a deletion can be
/// restored exactly and so that a record never persisted (`DelNew`)
/// never emits a delete instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataState {
    /// Freshly constructed, not yet inserted.
    #[default]
    NoState,
    /// Inserted this session, not yet committed anywhere.
    New,
    /// In step with the committed version.
    Clean,
    /// Live changes against the committed version.
    Changed,
    /// Deleted; was CLEAN before.
    Deleted,
    /// Deleted; was NEW before (never persisted).
    DelNew,
    /// Deleted; was CHANGED before.
    DelChg,
    /// Restored from a deleted state this session.
    Recovered,
}

impl DataState {
    /// Returns `true` for any member of the deleted family.
    #[must_use]
    pub const fn is_deleted(self) -> bool {
        matches!(self, DataState::Deleted | DataState::DelNew | DataState::DelChg)
    }

    /// Returns `true` if the record diverges from its committed
    /// version (anything but CLEAN).
    #[must_use]
    pub const fn is_dirty(self) -> bool {
        !matches!(self, DataState::Clean)
    }
}

impl fmt::Display for DataState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataState::NoState => "NOSTATE",
            DataState::New => "NEW",
            DataState::Clean => "CLEAN",
            DataState::Changed => "CHANGED",
            DataState::Deleted => "DELETED",
            DataState::DelNew => "DELNEW",
            DataState::DelChg => "DELCHG",
            DataState::Recovered => "RECOVERED",
        };
        write!(f, "{name}")
    }
}

/// Coarse edit status derived from a record's state and its
/// validation ledger, aggregated upward to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditState {
    /// No outstanding changes.
    #[default]
    Clean,
    /// Changes present and validated without errors.
    Valid,
    /// Changes present, not yet validated.
    Dirty,
    /// Validation produced at least one error.
    Error,
}

impl EditState {
    /// Combines two statuses, keeping the more severe one.
    ///
    /// Severity order: `Clean < Valid < Dirty < Error`.
    #[must_use]
    pub fn combine(self, other: EditState) -> EditState {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    const fn rank(self) -> u8 {
        match self {
            EditState::Clean => 0,
            EditState::Valid => 1,
            EditState::Dirty => 2,
            EditState::Error => 3,
        }
    }
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditState::Clean => "CLEAN",
            EditState::Valid => "VALID",
            EditState::Dirty => "DIRTY",
            EditState::Error => "ERROR",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_unset() {
        assert!(RecordId::UNSET.is_unset());
        assert!(!RecordId::new(1).is_unset());
    }

    #[test]
    fn record_id_display() {
        assert_eq!(format!("{}", RecordId::new(42)), "rec:42");
    }

    #[test]
    fn generation_next() {
        let g = Generation::new(5);
        assert_eq!(g.next().as_u64(), 6);
    }

    #[test]
    fn deleted_family() {
        assert!(DataState::Deleted.is_deleted());
        assert!(DataState::DelNew.is_deleted());
        assert!(DataState::DelChg.is_deleted());
        assert!(!DataState::Changed.is_deleted());
        assert!(!DataState::Clean.is_deleted());
    }

    #[test]
    fn spot_style_restrictions() {
        assert!(!ListStyle::Spot.tracks_deletes());
        assert!(ListStyle::Core.tracks_deletes());
        assert!(ListStyle::Edit.shadows_base());
        assert!(!ListStyle::Core.shadows_base());
    }

    #[test]
    fn edit_state_combine() {
        assert_eq!(EditState::Clean.combine(EditState::Dirty), EditState::Dirty);
        assert_eq!(EditState::Error.combine(EditState::Valid), EditState::Error);
        assert_eq!(EditState::Valid.combine(EditState::Clean), EditState::Valid);
        assert_eq!(EditState::Dirty.combine(EditState::Error), EditState::Error);
    }
}
