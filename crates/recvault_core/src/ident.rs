//! Identity allocation and identity -> record lookup.
//!
//! Each collection owns one [`IdAllocator`]: a fixed 10-way
//! multi-level radix map keyed by identity, mapping to the record's
//! dense index in the collection's arena. The map grows in depth
//! (never width) only when an identity exceeds current capacity,
//! giving bounded, cache-friendly growth for dense identities while
//! still tolerating sparse or huge ones.

use crate::types::{DataState, RecordId};

const FAN_OUT: usize = 10;

#[derive(Debug)]
enum Node {
    Branch([Option<Box<Node>>; FAN_OUT]),
    Leaf(usize),
}

impl Node {
    fn branch() -> Self {
        Node::Branch(std::array::from_fn(|_| None))
    }
}

/// Identity allocator and lookup map for one collection.
///
/// Identities are unique within the collection and zero is never
/// stored. The allocator tracks the highest identity ever issued or
/// observed (the high-water mark), which is what `assign` uses to
/// issue fresh identities.
#[derive(Debug)]
pub struct IdAllocator {
    root: Node,
    /// Digit levels in the map; capacity is 10^depth.
    depth: u32,
    capacity: u64,
    max_id: u64,
    len: usize,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    /// Creates an empty allocator with the minimum depth.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::branch(),
            depth: 1,
            capacity: FAN_OUT as u64,
            max_id: 0,
            len: 0,
        }
    }

    /// Returns the high-water mark.
    #[must_use]
    pub fn max_id(&self) -> RecordId {
        RecordId::new(self.max_id)
    }

    /// Returns the number of mapped identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no identities are mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current depth of the radix map.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Checks whether an identity would be unique in this collection.
    ///
    /// An identity is unique if it is zero (a fresh one will be
    /// issued), exceeds the high-water mark, or has no map entry.
    #[must_use]
    pub fn is_unique(&self, id: RecordId) -> bool {
        id.is_unset() || id.as_u64() > self.max_id || self.get(id).is_none()
    }

    /// Resolves an identity to its arena index.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<usize> {
        let raw = id.as_u64();
        if raw == 0 || self.out_of_range(raw) {
            return None;
        }
        let mut node = &self.root;
        let mut depth = self.depth;
        loop {
            match node {
                Node::Leaf(index) => return Some(*index),
                Node::Branch(children) => {
                    let digit = Self::digit(raw, depth);
                    match &children[digit] {
                        Some(child) => {
                            node = child;
                            depth -= 1;
                        }
                        None => return None,
                    }
                }
            }
        }
    }

    /// Maps an identity to an arena index.
    ///
    /// Returns `false` without storing anything if the identity is
    /// zero or already mapped. Grows the map in depth as needed and
    /// raises the high-water mark.
    pub fn insert(&mut self, id: RecordId, index: usize) -> bool {
        let raw = id.as_u64();
        if raw == 0 {
            return false;
        }
        while self.out_of_range(raw) {
            self.grow();
        }
        let depth = self.depth;
        if !Self::insert_at(&mut self.root, raw, index, depth) {
            return false;
        }
        self.max_id = self.max_id.max(raw);
        self.len += 1;
        true
    }

    /// Removes an identity mapping, returning its arena index.
    ///
    /// The high-water mark is deliberately not lowered: identities
    /// are never reused within a collection.
    pub fn remove(&mut self, id: RecordId) -> Option<usize> {
        let raw = id.as_u64();
        if raw == 0 || self.out_of_range(raw) {
            return None;
        }
        let depth = self.depth;
        let removed = Self::remove_at(&mut self.root, raw, depth);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Assigns an identity for insertion.
    ///
    /// Identity zero issues `max + 1` and marks the record NEW;
    /// any other identity raises the high-water mark if needed and
    /// marks the record CLEAN (it came from persisted data).
    pub fn assign(&mut self, id: RecordId) -> (RecordId, DataState) {
        if id.is_unset() {
            self.max_id += 1;
            (RecordId::new(self.max_id), DataState::New)
        } else {
            self.max_id = self.max_id.max(id.as_u64());
            (id, DataState::Clean)
        }
    }

    /// Raises the high-water mark to at least `id`.
    ///
    /// Used when deriving a collection so that identities issued in
    /// the derived session do not collide with the base.
    pub fn reserve_through(&mut self, id: RecordId) {
        self.max_id = self.max_id.max(id.as_u64());
    }

    /// Rebuilds the map from scratch, keeping the high-water mark.
    ///
    /// Used after arena reordering or physical removal, when every
    /// index may have shifted.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (RecordId, usize)>) {
        self.root = Node::branch();
        self.depth = 1;
        self.capacity = FAN_OUT as u64;
        self.len = 0;
        for (id, index) in entries {
            self.insert(id, index);
        }
    }

    /// Digit of `raw` at the given level; level `depth` is the most
    /// significant digit under the current capacity.
    fn digit(raw: u64, depth: u32) -> usize {
        let divisor = 10u64.pow(depth - 1);
        ((raw / divisor) % FAN_OUT as u64) as usize
    }

    /// True when `raw` exceeds current capacity. A saturated capacity
    /// (20 digit levels) covers the whole u64 range.
    fn out_of_range(&self, raw: u64) -> bool {
        self.capacity != u64::MAX && raw >= self.capacity
    }

    fn grow(&mut self) {
        let old = std::mem::replace(&mut self.root, Node::branch());
        if let Node::Branch(children) = &mut self.root {
            children[0] = Some(Box::new(old));
        }
        self.depth += 1;
        self.capacity = self.capacity.saturating_mul(FAN_OUT as u64);
    }

    fn insert_at(node: &mut Node, raw: u64, index: usize, depth: u32) -> bool {
        let Node::Branch(children) = node else {
            return false;
        };
        let digit = Self::digit(raw, depth);
        if depth == 1 {
            if children[digit].is_some() {
                return false;
            }
            children[digit] = Some(Box::new(Node::Leaf(index)));
            true
        } else {
            let child = children[digit].get_or_insert_with(|| Box::new(Node::branch()));
            Self::insert_at(child, raw, index, depth - 1)
        }
    }

    fn remove_at(node: &mut Node, raw: u64, depth: u32) -> Option<usize> {
        let Node::Branch(children) = node else {
            return None;
        };
        let digit = Self::digit(raw, depth);
        if depth == 1 {
            match children[digit].take() {
                Some(boxed) => match *boxed {
                    Node::Leaf(index) => Some(index),
                    branch => {
                        children[digit] = Some(Box::new(branch));
                        None
                    }
                },
                None => None,
            }
        } else {
            Self::remove_at(children[digit].as_mut()?, raw, depth - 1)
        }
    }
}
