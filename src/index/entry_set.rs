//! Node references stored under one key of a value, path or name index.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::NodeKey;

/// Insertion-ordered, deduplicated set of node keys.
///
/// Membership test, insertion and removal are O(1) amortized. Removed keys
/// leave a hole in the ordering vector that is reclaimed once holes make up
/// more than half of it.
///
/// Equality is set equality: two sets holding the same keys are equal
/// regardless of the order the keys were added in.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<NodeKey>", into = "Vec<NodeKey>")]
pub struct IndexEntrySet {
    /// Keys in insertion order, `None` marks a removed key
    slots: Vec<Option<NodeKey>>,
    /// Key to its slot position
    positions: HashMap<NodeKey, usize>,
}

impl IndexEntrySet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the node key is referenced
    #[inline]
    pub fn is_present(&self, node_key: NodeKey) -> bool {
        self.positions.contains_key(&node_key)
    }

    /// Returns true if the node key is referenced
    #[inline]
    pub fn contains(&self, node_key: NodeKey) -> bool {
        self.is_present(node_key)
    }

    /// Adds a node key. Adding a key twice is a no-op.
    pub fn add_node_key(&mut self, node_key: NodeKey) -> &mut Self {
        if !self.positions.contains_key(&node_key) {
            self.positions.insert(node_key, self.slots.len());
            self.slots.push(Some(node_key));
        }
        self
    }

    /// Removes a node key, returning whether it was present.
    pub fn remove_node_key(&mut self, node_key: NodeKey) -> bool {
        match self.positions.remove(&node_key) {
            Some(pos) => {
                self.slots[pos] = None;
                if self.slots.len() > 8 && self.positions.len() * 2 < self.slots.len() {
                    self.compact();
                }
                true
            }
            None => false,
        }
    }

    /// Returns true if at least one node key is referenced
    #[inline]
    pub fn has_node_keys(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Returns the number of referenced node keys
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if no node key is referenced
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates the node keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.slots.iter().flatten().copied()
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (pos, slot) in self.slots.iter().enumerate() {
            if let Some(key) = slot {
                self.positions.insert(*key, pos);
            }
        }
    }
}

impl PartialEq for IndexEntrySet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.positions.keys().all(|k| other.is_present(*k))
    }
}

impl Eq for IndexEntrySet {}

impl FromIterator<NodeKey> for IndexEntrySet {
    fn from_iter<I: IntoIterator<Item = NodeKey>>(iter: I) -> Self {
        let mut set = IndexEntrySet::new();
        for key in iter {
            set.add_node_key(key);
        }
        set
    }
}

impl From<Vec<NodeKey>> for IndexEntrySet {
    fn from(keys: Vec<NodeKey>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<IndexEntrySet> for Vec<NodeKey> {
    fn from(set: IndexEntrySet) -> Self {
        set.keys().collect()
    }
}

impl fmt::Debug for IndexEntrySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}
