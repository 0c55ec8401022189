//! Index error types
//!
//! Error codes:
//! - INDEX_REVISION_NOT_FOUND (FATAL)
//! - INDEX_NOT_STRICTLY_INCREASING
//! - INDEX_EMPTY_REVISION_LIST

use thiserror::Error;

use crate::Revision;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller misuse, the index itself is intact
    Error,
    /// Storage integrity is in question
    Fatal,
}

/// Errors raised by the versioned index structures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A lookup or revert targeted a revision that was never committed.
    #[error("revision {revision} does not exist (most recent is {most_recent})")]
    RevisionNotFound {
        /// Requested revision
        revision: Revision,
        /// Most recent committed revision
        most_recent: Revision,
    },

    /// A revision list would lose its ascending order.
    #[error("revision {next} does not follow revision {previous}")]
    NotStrictlyIncreasing {
        /// Last revision in the list
        previous: Revision,
        /// Revision that was offered
        next: Revision,
    },

    /// A revision list was built from no revisions at all.
    #[error("revision list must not be empty")]
    EmptyRevisionList,
}

impl IndexError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::RevisionNotFound { .. } => "INDEX_REVISION_NOT_FOUND",
            IndexError::NotStrictlyIncreasing { .. } => "INDEX_NOT_STRICTLY_INCREASING",
            IndexError::EmptyRevisionList => "INDEX_EMPTY_REVISION_LIST",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            IndexError::RevisionNotFound { .. } => Severity::Fatal,
            IndexError::NotStrictlyIncreasing { .. } | IndexError::EmptyRevisionList => {
                Severity::Error
            }
        }
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
