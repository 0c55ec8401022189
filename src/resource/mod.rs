//! In-memory resource
//!
//! A complete, revisioned node store kept in memory. It implements the
//! transaction interfaces of [`crate::trx`] and is what tests and embedders
//! resolve histories against when no page layer is attached.
//!
//! Node records, the node-to-revisions index and the value index are each a
//! [`VersionedIndexTree`](crate::index::VersionedIndexTree); all three
//! commit together, so their revision numbers always agree.
//!
//! # Invariants
//!
//! - Revision 0 holds exactly the document root (node key 0)
//! - Every revision >= 1 records the revision its content derives from
//! - At most one write transaction is open at a time
//! - Committed records are shared, never modified

mod memory;
mod write_trx;

pub use memory::{MemoryReadTrx, MemoryResource};
pub use write_trx::MemoryWriteTrx;

use crate::node::{NameKey, NodeKind, NodeRecord};
use crate::NodeKey;

/// Node key of the document root.
pub const DOCUMENT_ROOT_KEY: NodeKey = 0;

/// Content of a node to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
    /// Element with a local name and optional namespace URI
    Element {
        name: NameKey,
        uri: Option<NameKey>,
    },
    /// Attribute of the parent element
    Attribute {
        name: NameKey,
        uri: Option<NameKey>,
        value: Vec<u8>,
    },
    /// Namespace declaration on the parent element
    Namespace { prefix: NameKey, uri: NameKey },
    /// Text content
    Text(Vec<u8>),
    /// Comment
    Comment(Vec<u8>),
    /// Processing instruction
    ProcessingInstruction { target: NameKey, content: Vec<u8> },
}

impl NodeSpec {
    pub fn element(name: NameKey) -> Self {
        NodeSpec::Element { name, uri: None }
    }

    pub fn attribute(name: NameKey, value: impl Into<Vec<u8>>) -> Self {
        NodeSpec::Attribute {
            name,
            uri: None,
            value: value.into(),
        }
    }

    pub fn namespace(prefix: NameKey, uri: NameKey) -> Self {
        NodeSpec::Namespace { prefix, uri }
    }

    pub fn text(value: impl Into<Vec<u8>>) -> Self {
        NodeSpec::Text(value.into())
    }

    pub fn comment(value: impl Into<Vec<u8>>) -> Self {
        NodeSpec::Comment(value.into())
    }

    pub fn processing_instruction(target: NameKey, content: impl Into<Vec<u8>>) -> Self {
        NodeSpec::ProcessingInstruction {
            target,
            content: content.into(),
        }
    }

    /// Returns the kind of node to be created
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeSpec::Element { .. } => NodeKind::Element,
            NodeSpec::Attribute { .. } => NodeKind::Attribute,
            NodeSpec::Namespace { .. } => NodeKind::Namespace,
            NodeSpec::Text(_) => NodeKind::Text,
            NodeSpec::Comment(_) => NodeKind::Comment,
            NodeSpec::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
        }
    }

    /// Copies name and value into a freshly created record
    fn apply(self, record: &mut NodeRecord) {
        match self {
            NodeSpec::Element { name, uri } => record.set_name(Some(name), uri),
            NodeSpec::Attribute { name, uri, value } => {
                record.set_name(Some(name), uri);
                record.set_raw_value(Some(value));
            }
            NodeSpec::Namespace { prefix, uri } => record.set_name(Some(prefix), Some(uri)),
            NodeSpec::Text(value) | NodeSpec::Comment(value) => record.set_raw_value(Some(value)),
            NodeSpec::ProcessingInstruction { target, content } => {
                record.set_name(Some(target), None);
                record.set_raw_value(Some(content));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_kinds() {
        assert_eq!(NodeSpec::element(1).kind(), NodeKind::Element);
        assert_eq!(NodeSpec::attribute(1, "v").kind(), NodeKind::Attribute);
        assert_eq!(NodeSpec::namespace(1, 2).kind(), NodeKind::Namespace);
        assert_eq!(NodeSpec::text("t").kind(), NodeKind::Text);
        assert_eq!(NodeSpec::comment("c").kind(), NodeKind::Comment);
        assert_eq!(
            NodeSpec::processing_instruction(3, "x").kind(),
            NodeKind::ProcessingInstruction
        );
    }

    #[test]
    fn test_apply_sets_name_and_value() {
        let mut record = NodeRecord::new(9, NodeKind::Attribute, 1);
        NodeSpec::attribute(4, "blue").apply(&mut record);
        assert_eq!(record.name_key(), Some(4));
        assert_eq!(record.uri_key(), None);
        assert_eq!(record.raw_value(), Some(&b"blue"[..]));

        let mut record = NodeRecord::new(10, NodeKind::Namespace, 1);
        NodeSpec::namespace(5, 6).apply(&mut record);
        assert_eq!(record.name_key(), Some(5));
        assert_eq!(record.uri_key(), Some(6));
    }
}
