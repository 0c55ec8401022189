//! Index maintenance for the working revision
//!
//! Writers borrow an index tree mutably for the duration of one write
//! transaction. Committed values are never modified: every change clones
//! the working value, edits the clone and stores it back, which path-copies
//! the affected branch of the tree.

use super::{IndexEntrySet, IndexKey, IndexResult, RevisionList, VersionedIndexTree};
use crate::NodeKey;

/// Maintains the node-to-revisions index.
pub struct RevisionIndexWriter<'a> {
    tree: &'a mut VersionedIndexTree<NodeKey, RevisionList>,
}

impl<'a> RevisionIndexWriter<'a> {
    /// Wraps the node-to-revisions tree
    pub fn new(tree: &'a mut VersionedIndexTree<NodeKey, RevisionList>) -> Self {
        Self { tree }
    }

    /// Records that a node changed in the working revision.
    ///
    /// Recording the same node twice within one revision is a no-op.
    pub fn record_change(&mut self, node_key: NodeKey) -> IndexResult<()> {
        let revision = self.tree.working_revision();

        let list = match self.tree.get(&node_key) {
            Some(existing) if existing.last() == revision => return Ok(()),
            Some(existing) => {
                let mut list = existing.clone();
                list.push(revision)?;
                list
            }
            None => RevisionList::new(revision),
        };

        self.tree.insert_or_update(node_key, list);
        Ok(())
    }
}

/// Maintains a value index mapping typed values to node references.
pub struct ValueIndexWriter<'a> {
    tree: &'a mut VersionedIndexTree<IndexKey, IndexEntrySet>,
}

impl<'a> ValueIndexWriter<'a> {
    /// Wraps a value index tree
    pub fn new(tree: &'a mut VersionedIndexTree<IndexKey, IndexEntrySet>) -> Self {
        Self { tree }
    }

    /// Adds a node reference under a key. Returns false if it was already
    /// referenced.
    pub fn add(&mut self, key: IndexKey, node_key: NodeKey) -> bool {
        let mut set = match self.tree.get(&key) {
            Some(existing) if existing.contains(node_key) => return false,
            Some(existing) => existing.clone(),
            None => IndexEntrySet::new(),
        };
        set.add_node_key(node_key);
        self.tree.insert_or_update(key, set);
        true
    }

    /// Removes a node reference from a key. Keys left without references
    /// are dropped from the index.
    pub fn remove(&mut self, key: &IndexKey, node_key: NodeKey) -> bool {
        let mut set = match self.tree.get(key) {
            Some(existing) if existing.contains(node_key) => existing.clone(),
            _ => return false,
        };
        set.remove_node_key(node_key);

        if set.has_node_keys() {
            self.tree.insert_or_update(key.clone(), set);
        } else {
            self.tree.remove(key);
        }
        true
    }
}
