//! One slot of a resolved history

use crate::node::ImmutableNode;
use crate::Revision;

/// State of a node at one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    /// The node as it was at `revision`
    Present {
        revision: Revision,
        node: ImmutableNode,
    },
    /// The node-to-revisions index lists `revision`, but the node could not
    /// be found there. Only the indexed path produces this.
    Absent { revision: Revision },
}

impl HistoryEntry {
    /// Returns the revision of this slot
    pub fn revision(&self) -> Revision {
        match self {
            HistoryEntry::Present { revision, .. } | HistoryEntry::Absent { revision } => *revision,
        }
    }

    /// Returns the node view, if present
    pub fn node(&self) -> Option<&ImmutableNode> {
        match self {
            HistoryEntry::Present { node, .. } => Some(node),
            HistoryEntry::Absent { .. } => None,
        }
    }

    /// Returns true if the node was found
    pub fn is_present(&self) -> bool {
        matches!(self, HistoryEntry::Present { .. })
    }

    /// Returns true for an absent-marker
    pub fn is_absent(&self) -> bool {
        matches!(self, HistoryEntry::Absent { .. })
    }
}
