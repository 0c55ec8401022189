//! Transaction interfaces consumed from the page layer
//!
//! The resolver never touches storage directly. It opens read-only
//! transactions through a [`ResourceSession`], each pinned to one committed
//! revision, and navigates them through [`NodeReadOnlyTrx`].
//!
//! # Invariants
//!
//! - A transaction observes exactly one committed revision for its lifetime
//! - Failing to move to a node is an expected signal, never an error
//! - Opening a transaction at a revision that was never committed is fatal
//! - `close` is idempotent and also happens on drop

mod traversal;

pub use traversal::traverse;

use crate::history::HistoryResult;
use crate::index::{IndexRecord, IndexType};
use crate::node::ImmutableNode;
use crate::{NodeKey, Revision};

/// Opens read-only transactions on one resource.
pub trait ResourceSession {
    /// Transaction type handed out by this session
    type Trx: NodeReadOnlyTrx;

    /// Opens a transaction pinned to `revision`, or to the most recent
    /// committed revision if `None`.
    ///
    /// Fails with [`HistoryError::RevisionNotFound`](crate::HistoryError::RevisionNotFound)
    /// if the revision was never committed.
    fn begin_node_read_only_trx(&self, revision: Option<Revision>) -> HistoryResult<Self::Trx>;

    /// Returns the most recent committed revision
    fn most_recent_revision_number(&self) -> HistoryResult<Revision>;
}

/// Cursor over the nodes of one committed revision.
pub trait NodeReadOnlyTrx {
    /// Session the transaction was opened through
    type Session: ResourceSession;

    /// Returns the session that opened this transaction
    fn resource_session(&self) -> &Self::Session;

    /// Revision this transaction is pinned to
    fn revision_number(&self) -> Revision;

    /// Most recent committed revision when the transaction was opened
    fn most_recent_revision_number(&self) -> Revision;

    /// Revision this transaction's snapshot was derived from. May skip
    /// several revision numbers.
    fn previous_revision_number(&self) -> Revision;

    /// Moves the cursor to a node. Returns `Ok(false)` and leaves the cursor
    /// unchanged if the node does not exist in this revision.
    fn move_to(&mut self, node_key: NodeKey) -> HistoryResult<bool>;

    /// Returns an immutable view of the current node
    fn node(&self) -> Option<ImmutableNode>;

    /// Returns the key of the current node
    fn node_key(&self) -> Option<NodeKey> {
        self.node().map(|node| node.node_key())
    }

    /// Reads the record stored under `key` in an index instance.
    ///
    /// `Ok(None)` means the index holds no entry for the key, or the index
    /// does not exist on this resource.
    fn get_record(
        &self,
        key: NodeKey,
        index_type: IndexType,
        index_slot: u32,
    ) -> HistoryResult<Option<IndexRecord>>;

    /// Releases the transaction. Calling it again has no effect.
    fn close(&mut self);
}
