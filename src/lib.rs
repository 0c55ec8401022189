//! histdb - temporal indexing and node-history resolution for a
//! multi-revision document store
//!
//! - `index`: persistent red-black index trees and their payloads
//! - `node`: node records and their immutable, kind-specific views
//! - `trx`: the transaction interfaces the page layer provides
//! - `resource`: an in-memory, revisioned resource implementing them
//! - `history`: resolution of a node's states across revisions

pub mod config;
pub mod history;
pub mod index;
pub mod node;
pub mod observability;
pub mod resource;
pub mod trx;

pub use config::HistoryConfig;
pub use history::{HistoryEntry, HistoryError, HistoryResult, RevisionHistory};

/// Stable identity of a node within a resource.
pub type NodeKey = u64;

/// Number of a committed revision. Revision 0 is the initial state.
pub type Revision = u32;
