//! Index kinds and the payloads they store

use serde::{Deserialize, Serialize};

use super::{IndexEntrySet, RevisionList};

/// Kind of a secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    /// Element and attribute names to node keys
    Name,
    /// Path-summary nodes to node keys
    Path,
    /// Content-and-structure: typed values to node keys
    Cas,
    /// Node key to the revisions in which the node changed
    RecordToRevisions,
}

impl IndexType {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Name => "NAME",
            IndexType::Path => "PATH",
            IndexType::Cas => "CAS",
            IndexType::RecordToRevisions => "RECORD_TO_REVISIONS",
        }
    }
}

/// Value stored under one key of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexRecord {
    /// Node keys sharing the index key
    Nodes(IndexEntrySet),
    /// Revisions in which the keyed node changed
    Revisions(RevisionList),
}

impl IndexRecord {
    /// Returns the revision list, if this is a node-to-revisions record
    pub fn as_revisions(&self) -> Option<&RevisionList> {
        match self {
            IndexRecord::Revisions(list) => Some(list),
            IndexRecord::Nodes(_) => None,
        }
    }

    /// Returns the node references, if this is a value-index record
    pub fn as_nodes(&self) -> Option<&IndexEntrySet> {
        match self {
            IndexRecord::Nodes(set) => Some(set),
            IndexRecord::Revisions(_) => None,
        }
    }
}
