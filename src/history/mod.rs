//! Node history across revisions
//!
//! [`RevisionHistory`] reconstructs the ordered sequence of states a node
//! went through, one [`HistoryEntry`] per revision, oldest first.
//!
//! # Invariants
//!
//! - Results are always in ascending revision order
//! - The indexed path yields exactly one entry per listed revision
//! - The fallback path reports only revisions where the node was found
//! - No transaction outlives the probe that opened it
//! - Integrity failures propagate; a partial history is never returned

mod entry;
mod errors;
mod resolver;

pub use entry::HistoryEntry;
pub use errors::{HistoryError, HistoryResult};
pub use resolver::RevisionHistory;
