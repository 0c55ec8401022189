//! The single write transaction of a memory resource

use std::cmp::Ordering;
use std::sync::Arc;

use super::memory::{MemoryResource, ResourceState};
use super::{NodeSpec, DOCUMENT_ROOT_KEY};
use crate::history::{HistoryError, HistoryResult};
use crate::index::{IndexKey, IndexResult, RevisionIndexWriter, ValueIndexWriter, VersionedIndexTree};
use crate::node::{NameKey, NodeKind, NodeRecord};
use crate::observability::Event;
use crate::{NodeKey, Revision};

/// Writes the working revision of a [`MemoryResource`].
///
/// Changes become visible to readers only through [`commit`](Self::commit).
/// The transaction stays usable after a commit. Dropping it rolls back
/// anything uncommitted and releases the writer slot.
pub struct MemoryWriteTrx {
    resource: MemoryResource,
    /// Revision the working content derives from
    base_revision: Revision,
}

impl MemoryWriteTrx {
    pub(super) fn new(resource: MemoryResource, base_revision: Revision) -> Self {
        Self {
            resource,
            base_revision,
        }
    }

    /// Returns the revision the next commit will produce
    pub fn revision_number(&self) -> HistoryResult<Revision> {
        Ok(self.resource.read_state()?.working_revision())
    }

    /// Returns the revision the working content derives from
    pub fn base_revision(&self) -> Revision {
        self.base_revision
    }

    /// Appends a node as the last child of `parent`.
    ///
    /// Attributes and namespaces attach to an element instead of joining
    /// its children. Returns the new node key.
    pub fn insert_child(&mut self, parent: NodeKey, spec: NodeSpec) -> HistoryResult<NodeKey> {
        let mut state = self.resource.write_state()?;
        Editor::new(&mut state, &self.resource).insert_child(parent, spec)
    }

    /// Replaces the value of a text, comment, attribute or processing
    /// instruction node.
    pub fn set_value(&mut self, node_key: NodeKey, value: impl Into<Vec<u8>>) -> HistoryResult<()> {
        let mut state = self.resource.write_state()?;
        Editor::new(&mut state, &self.resource).set_value(node_key, value.into())
    }

    /// Replaces the name of a named node.
    pub fn set_name(
        &mut self,
        node_key: NodeKey,
        name: NameKey,
        uri: Option<NameKey>,
    ) -> HistoryResult<()> {
        let mut state = self.resource.write_state()?;
        Editor::new(&mut state, &self.resource).set_name(node_key, name, uri)
    }

    /// Removes a node together with its subtree, attributes and namespaces.
    pub fn remove(&mut self, node_key: NodeKey) -> HistoryResult<()> {
        let mut state = self.resource.write_state()?;
        Editor::new(&mut state, &self.resource).remove(node_key)
    }

    /// Discards uncommitted changes and restarts the working revision from
    /// an older committed revision. The next commit points back to it.
    pub fn revert_to(&mut self, revision: Revision) -> HistoryResult<()> {
        let mut state = self.resource.write_state()?;
        state.check_revision(revision)?;
        let most_recent = state.most_recent_revision();

        state.rollback();
        state.records.revert_to(revision)?;
        state.value_index.revert_to(revision)?;

        // the revision index keeps its history; it records what the revert changes
        if self.resource.config().revision_index_enabled {
            let changed = changed_keys(&state.records, revision, most_recent)?;
            let mut writer = RevisionIndexWriter::new(&mut state.revision_index);
            for node_key in changed {
                writer.record_change(node_key)?;
            }
        }
        drop(state);

        self.base_revision = revision;
        let revision_str = revision.to_string();
        let most_recent_str = most_recent.to_string();
        Event::ResourceRevert.log(&[
            ("from", most_recent_str.as_str()),
            ("to", revision_str.as_str()),
        ]);
        Ok(())
    }

    /// Seals the working revision and returns its number.
    pub fn commit(&mut self) -> HistoryResult<Revision> {
        let mut state = self.resource.write_state()?;
        let previous = self.base_revision;
        let revision = state.commit(previous);
        let node_count = state.records.len_at(revision)?;
        drop(state);

        self.base_revision = revision;

        let revision_str = revision.to_string();
        let previous_str = previous.to_string();
        let node_count_str = node_count.to_string();
        Event::IndexCommit.log(&[("revision", revision_str.as_str())]);
        Event::ResourceCommit.log(&[
            ("nodes", node_count_str.as_str()),
            ("previous", previous_str.as_str()),
            ("revision", revision_str.as_str()),
        ]);
        Ok(revision)
    }

    /// Discards every uncommitted change, including a pending revert.
    pub fn rollback(&mut self) -> HistoryResult<()> {
        let mut state = self.resource.write_state()?;
        let had_changes = state.has_uncommitted_changes();
        state.rollback();
        self.base_revision = state.most_recent_revision();
        drop(state);

        if had_changes {
            Event::ResourceRollback.log(&[]);
        }
        Ok(())
    }
}

impl Drop for MemoryWriteTrx {
    fn drop(&mut self) {
        let _ = self.rollback();
        self.resource.release_writer();
    }
}

/// Keys whose records differ between two committed revisions.
fn changed_keys(
    records: &VersionedIndexTree<NodeKey, Arc<NodeRecord>>,
    from: Revision,
    to: Revision,
) -> IndexResult<Vec<NodeKey>> {
    let mut left = records.iter_at(from)?.peekable();
    let mut right = records.iter_at(to)?.peekable();
    let mut changed = Vec::new();

    loop {
        let l = left.peek().map(|(k, v)| (**k, *v));
        let r = right.peek().map(|(k, v)| (**k, *v));
        match (l, r) {
            (None, None) => break,
            (Some((key, _)), None) => {
                changed.push(key);
                left.next();
            }
            (None, Some((key, _))) => {
                changed.push(key);
                right.next();
            }
            (Some((lk, lv)), Some((rk, rv))) => match lk.cmp(&rk) {
                Ordering::Less => {
                    changed.push(lk);
                    left.next();
                }
                Ordering::Greater => {
                    changed.push(rk);
                    right.next();
                }
                Ordering::Equal => {
                    if !Arc::ptr_eq(lv, rv) {
                        changed.push(lk);
                    }
                    left.next();
                    right.next();
                }
            },
        }
    }

    Ok(changed)
}

/// Structural edits against the working revision under the write lock.
struct Editor<'a> {
    state: &'a mut ResourceState,
    revision_index: bool,
    value_index: bool,
}

impl<'a> Editor<'a> {
    fn new(state: &'a mut ResourceState, resource: &MemoryResource) -> Self {
        let config = resource.config();
        Self {
            state,
            revision_index: config.revision_index_enabled,
            value_index: config.value_index_enabled,
        }
    }

    fn insert_child(&mut self, parent_key: NodeKey, spec: NodeSpec) -> HistoryResult<NodeKey> {
        let kind = spec.kind();
        let mut parent = self.load(parent_key)?;

        match (parent.kind(), kind.is_structural()) {
            (NodeKind::Element, _) | (NodeKind::Document, true) => {}
            (NodeKind::Document, false) => {
                return Err(HistoryError::invalid_operation(format!(
                    "{} must be attached to an element",
                    kind
                )))
            }
            (other, _) => {
                return Err(HistoryError::invalid_operation(format!(
                    "{} node {} cannot have children",
                    other, parent_key
                )))
            }
        }

        let node_key = self.state.next_node_key;
        self.state.next_node_key += 1;

        let mut record = NodeRecord::new(node_key, kind, self.state.working_revision());
        record.set_parent_key(Some(parent_key));
        spec.apply(&mut record);

        match kind {
            NodeKind::Attribute => {
                parent.attribute_keys_mut().push(node_key);
                self.store(parent)?;
            }
            NodeKind::Namespace => {
                parent.namespace_keys_mut().push(node_key);
                self.store(parent)?;
            }
            _ => {
                let last_child = self.last_child_of(&parent)?;
                let ordinal = last_child
                    .as_ref()
                    .and_then(|last| last.dewey_id())
                    .and_then(|dewey| dewey.divisions().last().copied())
                    .unwrap_or(0)
                    + 1;
                record.set_dewey_id(parent.dewey_id().map(|dewey| dewey.child(ordinal)));

                match last_child {
                    Some(mut last) => {
                        record.set_left_sibling_key(Some(last.node_key()));
                        last.set_right_sibling_key(Some(node_key));
                        self.store(last)?;
                    }
                    None => parent.set_first_child_key(Some(node_key)),
                }

                parent.set_child_count(parent.child_count() + 1);
                parent.set_descendant_count(parent.descendant_count() + 1);
                let grandparent = parent.parent_key();
                self.store(parent)?;
                self.adjust_descendant_counts(grandparent, 1)?;
            }
        }

        self.index_value(&record);
        self.store(record)?;
        Ok(node_key)
    }

    fn set_value(&mut self, node_key: NodeKey, value: Vec<u8>) -> HistoryResult<()> {
        let mut record = self.load(node_key)?;
        if !record.kind().has_value() {
            return Err(HistoryError::invalid_operation(format!(
                "{} node {} has no value",
                record.kind(),
                node_key
            )));
        }

        self.unindex_value(&record);
        record.set_raw_value(Some(value));
        self.index_value(&record);
        self.store(record)
    }

    fn set_name(&mut self, node_key: NodeKey, name: NameKey, uri: Option<NameKey>) -> HistoryResult<()> {
        let mut record = self.load(node_key)?;
        if !record.kind().is_named() {
            return Err(HistoryError::invalid_operation(format!(
                "{} node {} has no name",
                record.kind(),
                node_key
            )));
        }

        record.set_name(Some(name), uri);
        self.store(record)
    }

    fn remove(&mut self, node_key: NodeKey) -> HistoryResult<()> {
        if node_key == DOCUMENT_ROOT_KEY {
            return Err(HistoryError::invalid_operation(
                "the document root cannot be removed",
            ));
        }

        let record = self.load(node_key)?;
        let parent_key = record
            .parent_key()
            .ok_or_else(|| HistoryError::corrupt_index(node_key, "node has no parent"))?;
        let mut parent = self.load(parent_key)?;

        match record.kind() {
            NodeKind::Attribute => {
                parent.attribute_keys_mut().retain(|key| *key != node_key);
                self.store(parent)?;
            }
            NodeKind::Namespace => {
                parent.namespace_keys_mut().retain(|key| *key != node_key);
                self.store(parent)?;
            }
            _ => {
                match record.left_sibling_key() {
                    Some(left_key) => {
                        let mut left = self.load(left_key)?;
                        left.set_right_sibling_key(record.right_sibling_key());
                        self.store(left)?;
                    }
                    None => parent.set_first_child_key(record.right_sibling_key()),
                }
                if let Some(right_key) = record.right_sibling_key() {
                    let mut right = self.load(right_key)?;
                    right.set_left_sibling_key(record.left_sibling_key());
                    self.store(right)?;
                }

                let removed = 1 + record.descendant_count();
                parent.set_child_count(parent.child_count().saturating_sub(1));
                parent.set_descendant_count(parent.descendant_count().saturating_sub(removed));
                let grandparent = parent.parent_key();
                self.store(parent)?;
                self.adjust_descendant_counts(grandparent, -(removed as i64))?;
            }
        }

        for key in self.subtree_keys(node_key)? {
            let removed = self.load(key)?;
            self.unindex_value(&removed);
            self.discard(key)?;
        }
        Ok(())
    }

    // ==================================================================
    // Record access
    // ==================================================================

    fn load(&self, node_key: NodeKey) -> HistoryResult<NodeRecord> {
        self.state
            .records
            .get(&node_key)
            .map(|record| NodeRecord::clone(record))
            .ok_or(HistoryError::NodeNotFound { node_key })
    }

    /// Stamps the record with the working revision and replaces the shared copy.
    fn store(&mut self, mut record: NodeRecord) -> HistoryResult<()> {
        let node_key = record.node_key();
        record.set_revision(self.state.working_revision());
        record.rehash();
        self.record_change(node_key)?;
        self.state.records.insert_or_update(node_key, Arc::new(record));
        Ok(())
    }

    fn discard(&mut self, node_key: NodeKey) -> HistoryResult<()> {
        self.record_change(node_key)?;
        self.state.records.remove(&node_key);
        Ok(())
    }

    fn record_change(&mut self, node_key: NodeKey) -> HistoryResult<()> {
        if self.revision_index {
            RevisionIndexWriter::new(&mut self.state.revision_index).record_change(node_key)?;
        }
        Ok(())
    }

    fn last_child_of(&self, parent: &NodeRecord) -> HistoryResult<Option<NodeRecord>> {
        let mut last = None;
        let mut link = parent.first_child_key();
        while let Some(key) = link {
            let child = self
                .state
                .records
                .get(&key)
                .ok_or(HistoryError::NodeNotFound { node_key: key })?;
            link = child.right_sibling_key();
            last = Some(key);
        }
        last.map(|key| self.load(key)).transpose()
    }

    fn adjust_descendant_counts(&mut self, mut link: Option<NodeKey>, delta: i64) -> HistoryResult<()> {
        while let Some(key) = link {
            let mut ancestor = self.load(key)?;
            ancestor.set_descendant_count(ancestor.descendant_count().saturating_add_signed(delta));
            link = ancestor.parent_key();
            self.store(ancestor)?;
        }
        Ok(())
    }

    /// The node plus every node below it, attributes and namespaces included.
    fn subtree_keys(&self, root: NodeKey) -> HistoryResult<Vec<NodeKey>> {
        let mut keys = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let record = self
                .state
                .records
                .get(&key)
                .ok_or(HistoryError::NodeNotFound { node_key: key })?;
            keys.push(key);
            stack.extend_from_slice(record.attribute_keys());
            stack.extend_from_slice(record.namespace_keys());

            let mut child = record.first_child_key();
            while let Some(child_key) = child {
                stack.push(child_key);
                child = self
                    .state
                    .records
                    .get(&child_key)
                    .ok_or(HistoryError::NodeNotFound { node_key: child_key })?
                    .right_sibling_key();
            }
        }
        Ok(keys)
    }

    // ==================================================================
    // Value index
    // ==================================================================

    fn value_key(record: &NodeRecord) -> Option<IndexKey> {
        match record.kind() {
            NodeKind::Text | NodeKind::Attribute => {
                record.raw_value().and_then(IndexKey::from_raw_value)
            }
            _ => None,
        }
    }

    fn index_value(&mut self, record: &NodeRecord) {
        if !self.value_index {
            return;
        }
        if let Some(key) = Self::value_key(record) {
            ValueIndexWriter::new(&mut self.state.value_index).add(key, record.node_key());
        }
    }

    fn unindex_value(&mut self, record: &NodeRecord) {
        if !self.value_index {
            return;
        }
        if let Some(key) = Self::value_key(record) {
            ValueIndexWriter::new(&mut self.state.value_index).remove(&key, record.node_key());
        }
    }
}
