//! Node kinds

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a node in a document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// Document root, one per resource
    Document,
    /// Element
    Element,
    /// Attribute of an element
    Attribute,
    /// Namespace declaration of an element
    Namespace,
    /// Text content
    Text,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

impl NodeKind {
    /// Returns the stable type tag used in hashes and logs
    pub fn type_key(&self) -> u8 {
        match self {
            NodeKind::Document => 9,
            NodeKind::Element => 1,
            NodeKind::Attribute => 2,
            NodeKind::Namespace => 13,
            NodeKind::Text => 3,
            NodeKind::Comment => 8,
            NodeKind::ProcessingInstruction => 7,
        }
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "DOCUMENT",
            NodeKind::Element => "ELEMENT",
            NodeKind::Attribute => "ATTRIBUTE",
            NodeKind::Namespace => "NAMESPACE",
            NodeKind::Text => "TEXT",
            NodeKind::Comment => "COMMENT",
            NodeKind::ProcessingInstruction => "PROCESSING_INSTRUCTION",
        }
    }

    /// Returns true for kinds carrying a name and URI key
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            NodeKind::Element
                | NodeKind::Attribute
                | NodeKind::Namespace
                | NodeKind::ProcessingInstruction
        )
    }

    /// Returns true for kinds carrying a raw value
    pub fn has_value(&self) -> bool {
        matches!(
            self,
            NodeKind::Attribute
                | NodeKind::Text
                | NodeKind::Comment
                | NodeKind::ProcessingInstruction
        )
    }

    /// Returns true for kinds linked into the child/sibling structure.
    ///
    /// Attributes and namespaces hang off their element instead.
    pub fn is_structural(&self) -> bool {
        !matches!(self, NodeKind::Attribute | NodeKind::Namespace)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
