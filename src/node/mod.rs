//! Node records and their immutable views
//!
//! The storage layer owns mutable [`NodeRecord`]s. Readers only ever get an
//! [`ImmutableNode`]: a tagged view over the record's kind that forwards
//! every accessor and offers no way to change the record.

mod dewey;
mod immutable;
mod kind;
mod record;
mod visitor;

pub use dewey::DeweyId;
pub use immutable::{
    ImmutableAttribute, ImmutableComment, ImmutableDocument, ImmutableElement,
    ImmutableNamespace, ImmutableNode, ImmutablePI, ImmutableText,
};
pub use kind::NodeKind;
pub use record::NodeRecord;
pub use visitor::{VisitResult, Visitor};

/// Key into the resource's name dictionary.
pub type NameKey = i32;
