//! Mutable node records
//!
//! A record is the versioned data of one node as held by the storage layer.
//! Readers never see a record directly; they receive an immutable view
//! bound to one shared record instance.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DeweyId, NameKey, NodeKind};
use crate::{NodeKey, Revision};

/// Versioned data of one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRecord {
    node_key: NodeKey,
    kind: NodeKind,
    parent_key: Option<NodeKey>,
    first_child_key: Option<NodeKey>,
    left_sibling_key: Option<NodeKey>,
    right_sibling_key: Option<NodeKey>,
    child_count: u64,
    descendant_count: u64,
    name_key: Option<NameKey>,
    uri_key: Option<NameKey>,
    path_node_key: Option<NodeKey>,
    raw_value: Option<Vec<u8>>,
    attribute_keys: Vec<NodeKey>,
    namespace_keys: Vec<NodeKey>,
    hash: u64,
    revision: Revision,
    dewey_id: Option<DeweyId>,
}

impl NodeRecord {
    /// Creates an unlinked record of the given kind, last changed in `revision`.
    pub fn new(node_key: NodeKey, kind: NodeKind, revision: Revision) -> Self {
        Self {
            node_key,
            kind,
            parent_key: None,
            first_child_key: None,
            left_sibling_key: None,
            right_sibling_key: None,
            child_count: 0,
            descendant_count: 0,
            name_key: None,
            uri_key: None,
            path_node_key: None,
            raw_value: None,
            attribute_keys: Vec::new(),
            namespace_keys: Vec::new(),
            hash: 0,
            revision,
            dewey_id: None,
        }
    }

    // ==================================================================
    // Accessors
    // ==================================================================

    /// Returns the node key
    #[inline]
    pub fn node_key(&self) -> NodeKey {
        self.node_key
    }

    /// Returns the node kind
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the parent key
    #[inline]
    pub fn parent_key(&self) -> Option<NodeKey> {
        self.parent_key
    }

    /// Returns the first child key
    #[inline]
    pub fn first_child_key(&self) -> Option<NodeKey> {
        self.first_child_key
    }

    /// Returns the left sibling key
    #[inline]
    pub fn left_sibling_key(&self) -> Option<NodeKey> {
        self.left_sibling_key
    }

    /// Returns the right sibling key
    #[inline]
    pub fn right_sibling_key(&self) -> Option<NodeKey> {
        self.right_sibling_key
    }

    /// Returns the number of structural children
    #[inline]
    pub fn child_count(&self) -> u64 {
        self.child_count
    }

    /// Returns the number of structural descendants
    #[inline]
    pub fn descendant_count(&self) -> u64 {
        self.descendant_count
    }

    /// Returns the local name key
    #[inline]
    pub fn name_key(&self) -> Option<NameKey> {
        self.name_key
    }

    /// Returns the namespace URI key
    #[inline]
    pub fn uri_key(&self) -> Option<NameKey> {
        self.uri_key
    }

    /// Returns the key of the path-summary node
    #[inline]
    pub fn path_node_key(&self) -> Option<NodeKey> {
        self.path_node_key
    }

    /// Returns the raw value bytes
    #[inline]
    pub fn raw_value(&self) -> Option<&[u8]> {
        self.raw_value.as_deref()
    }

    /// Returns the attribute keys of an element
    #[inline]
    pub fn attribute_keys(&self) -> &[NodeKey] {
        &self.attribute_keys
    }

    /// Returns the namespace keys of an element
    #[inline]
    pub fn namespace_keys(&self) -> &[NodeKey] {
        &self.namespace_keys
    }

    /// Returns the stored content hash
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Returns the revision in which this record was last written
    #[inline]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Returns the structural position label
    #[inline]
    pub fn dewey_id(&self) -> Option<&DeweyId> {
        self.dewey_id.as_ref()
    }

    // ==================================================================
    // Mutators (storage layer only)
    // ==================================================================

    /// Sets the parent key
    pub fn set_parent_key(&mut self, key: Option<NodeKey>) {
        self.parent_key = key;
    }

    /// Sets the first child key
    pub fn set_first_child_key(&mut self, key: Option<NodeKey>) {
        self.first_child_key = key;
    }

    /// Sets the left sibling key
    pub fn set_left_sibling_key(&mut self, key: Option<NodeKey>) {
        self.left_sibling_key = key;
    }

    /// Sets the right sibling key
    pub fn set_right_sibling_key(&mut self, key: Option<NodeKey>) {
        self.right_sibling_key = key;
    }

    /// Sets the child count
    pub fn set_child_count(&mut self, count: u64) {
        self.child_count = count;
    }

    /// Sets the descendant count
    pub fn set_descendant_count(&mut self, count: u64) {
        self.descendant_count = count;
    }

    /// Sets name and URI keys
    pub fn set_name(&mut self, name_key: Option<NameKey>, uri_key: Option<NameKey>) {
        self.name_key = name_key;
        self.uri_key = uri_key;
    }

    /// Sets the path-summary node key
    pub fn set_path_node_key(&mut self, key: Option<NodeKey>) {
        self.path_node_key = key;
    }

    /// Sets the raw value
    pub fn set_raw_value(&mut self, value: Option<Vec<u8>>) {
        self.raw_value = value;
    }

    /// Returns the attribute key list for editing
    pub fn attribute_keys_mut(&mut self) -> &mut Vec<NodeKey> {
        &mut self.attribute_keys
    }

    /// Returns the namespace key list for editing
    pub fn namespace_keys_mut(&mut self) -> &mut Vec<NodeKey> {
        &mut self.namespace_keys
    }

    /// Sets the revision of the last write
    pub fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }

    /// Sets the structural position label
    pub fn set_dewey_id(&mut self, dewey_id: Option<DeweyId>) {
        self.dewey_id = dewey_id;
    }

    /// Recomputes the content hash from kind, name and value.
    pub fn rehash(&mut self) {
        self.hash = self.content_hash();
    }

    /// Hash over the kind tag, name keys and raw value.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&[self.kind.type_key()]);
        hasher.update(&self.name_key.unwrap_or(-1).to_le_bytes());
        hasher.update(&self.uri_key.unwrap_or(-1).to_le_bytes());
        if let Some(value) = &self.raw_value {
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value);
        }
        u64::from(hasher.finalize())
    }
}

impl fmt::Display for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[key={}, rev={}", self.kind, self.node_key, self.revision)?;
        if let Some(parent) = self.parent_key {
            write!(f, ", parent={}", parent)?;
        }
        if let Some(dewey_id) = &self.dewey_id {
            write!(f, ", dewey={}", dewey_id)?;
        }
        write!(f, "]")
    }
}
