//! Error types for revision-history resolution and its collaborators
//!
//! Integrity failures are fatal and always reach the caller. Expected
//! absence (a node missing from a revision, an index without an entry) is
//! never an error.

use thiserror::Error;

use crate::index::{IndexError, Severity};
use crate::{NodeKey, Revision};

/// Errors crossing the history, transaction and resource boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A transaction was requested at a revision that was never committed.
    #[error("revision {revision} does not exist (most recent is {most_recent})")]
    RevisionNotFound {
        /// Requested revision
        revision: Revision,
        /// Most recent committed revision
        most_recent: Revision,
    },

    /// An index entry could not be read or has the wrong shape.
    #[error("corrupt index entry for node {node_key}: {reason}")]
    CorruptIndex {
        /// Node the entry is keyed by
        node_key: NodeKey,
        /// What was wrong with it
        reason: String,
    },

    /// A previous-revision pointer does not lead to an older revision.
    #[error("revision {revision} points back to revision {previous}")]
    BrokenRevisionChain {
        /// Revision whose pointer is broken
        revision: Revision,
        /// Where it points to
        previous: Revision,
    },

    /// The addressed node does not exist in any revision that was searched.
    #[error("node {node_key} does not exist")]
    NodeNotFound {
        /// Missing node
        node_key: NodeKey,
    },

    /// The transaction is not positioned on any node.
    #[error("transaction has no current node")]
    NoCurrentNode,

    /// Another write transaction is open on the resource.
    #[error("another write transaction is active")]
    WriterActive,

    /// An operation that the node structure does not allow.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Shared state was poisoned by a panicking thread.
    #[error("resource lock poisoned")]
    LockPoisoned,

    /// Configuration could not be read or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Any other index failure.
    #[error(transparent)]
    Index(IndexError),
}

impl HistoryError {
    /// Create a corrupt index error
    pub fn corrupt_index(node_key: NodeKey, reason: impl Into<String>) -> Self {
        HistoryError::CorruptIndex {
            node_key,
            reason: reason.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        HistoryError::InvalidOperation(reason.into())
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        HistoryError::Config(reason.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            HistoryError::RevisionNotFound { .. } => "HIST_REVISION_NOT_FOUND",
            HistoryError::CorruptIndex { .. } => "HIST_CORRUPT_INDEX",
            HistoryError::BrokenRevisionChain { .. } => "HIST_BROKEN_REVISION_CHAIN",
            HistoryError::NodeNotFound { .. } => "HIST_NODE_NOT_FOUND",
            HistoryError::NoCurrentNode => "HIST_NO_CURRENT_NODE",
            HistoryError::WriterActive => "HIST_WRITER_ACTIVE",
            HistoryError::InvalidOperation(_) => "HIST_INVALID_OPERATION",
            HistoryError::LockPoisoned => "HIST_LOCK_POISONED",
            HistoryError::Config(_) => "HIST_CONFIG_ERROR",
            HistoryError::Index(e) => e.code(),
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            HistoryError::RevisionNotFound { .. }
            | HistoryError::CorruptIndex { .. }
            | HistoryError::BrokenRevisionChain { .. }
            | HistoryError::LockPoisoned => Severity::Fatal,
            HistoryError::Index(e) => e.severity(),
            _ => Severity::Error,
        }
    }

    /// Returns whether this error signals an integrity failure
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl From<IndexError> for HistoryError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::RevisionNotFound {
                revision,
                most_recent,
            } => HistoryError::RevisionNotFound {
                revision,
                most_recent,
            },
            other => HistoryError::Index(other),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for HistoryError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        HistoryError::LockPoisoned
    }
}

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;
