//! Versioned secondary indexes
//!
//! Indexes map a derived key to the node keys sharing it, or, for the
//! node-to-revisions index, a node key to the revisions in which the node
//! changed. Each index is a persistent red-black tree: every committed
//! revision keeps its own root, and later writes never modify it.
//!
//! # Invariants
//!
//! - A lookup at revision R sees exactly the entries committed as of R
//! - Committed values are immutable; writers replace them with new copies
//! - Revision lists are non-empty and strictly increasing
//! - A single writer mutates the working revision at a time

mod entry_set;
mod errors;
mod key;
mod record;
mod revision_list;
mod tree;
mod writer;

pub use entry_set::IndexEntrySet;
pub use errors::{IndexError, IndexResult, Severity};
pub use key::IndexKey;
pub use record::{IndexRecord, IndexType};
pub use revision_list::RevisionList;
pub use tree::{Iter, VersionedIndexTree};
pub use writer::{RevisionIndexWriter, ValueIndexWriter};
