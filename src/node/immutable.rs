//! Immutable node views
//!
//! A view wraps one shared record instance. Writers replace records rather
//! than modifying them in place, so a view keeps returning the values it saw
//! when it was created, even after newer revisions change the same node.
//! Views expose no mutator and never hand out the record itself.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::visitor::{VisitResult, Visitor};
use super::{DeweyId, NameKey, NodeKind, NodeRecord};
use crate::{NodeKey, Revision};

/// Accessors shared by every node kind.
macro_rules! structural_accessors {
    () => {
        /// Returns the node key
        #[inline]
        pub fn node_key(&self) -> NodeKey {
            self.node.node_key()
        }

        /// Returns the node kind
        #[inline]
        pub fn kind(&self) -> NodeKind {
            self.node.kind()
        }

        /// Returns the parent key
        #[inline]
        pub fn parent_key(&self) -> Option<NodeKey> {
            self.node.parent_key()
        }

        /// Returns true if the node has a parent
        #[inline]
        pub fn has_parent(&self) -> bool {
            self.node.parent_key().is_some()
        }

        /// Returns the first child key
        #[inline]
        pub fn first_child_key(&self) -> Option<NodeKey> {
            self.node.first_child_key()
        }

        /// Returns true if the node has a first child
        #[inline]
        pub fn has_first_child(&self) -> bool {
            self.node.first_child_key().is_some()
        }

        /// Returns the left sibling key
        #[inline]
        pub fn left_sibling_key(&self) -> Option<NodeKey> {
            self.node.left_sibling_key()
        }

        /// Returns true if the node has a left sibling
        #[inline]
        pub fn has_left_sibling(&self) -> bool {
            self.node.left_sibling_key().is_some()
        }

        /// Returns the right sibling key
        #[inline]
        pub fn right_sibling_key(&self) -> Option<NodeKey> {
            self.node.right_sibling_key()
        }

        /// Returns true if the node has a right sibling
        #[inline]
        pub fn has_right_sibling(&self) -> bool {
            self.node.right_sibling_key().is_some()
        }

        /// Returns the number of structural children
        #[inline]
        pub fn child_count(&self) -> u64 {
            self.node.child_count()
        }

        /// Returns the number of structural descendants
        #[inline]
        pub fn descendant_count(&self) -> u64 {
            self.node.descendant_count()
        }

        /// Returns the path-summary node key
        #[inline]
        pub fn path_node_key(&self) -> Option<NodeKey> {
            self.node.path_node_key()
        }

        /// Returns the content hash
        #[inline]
        pub fn hash(&self) -> u64 {
            self.node.hash()
        }

        /// Returns the revision the wrapped record was last written in
        #[inline]
        pub fn revision(&self) -> Revision {
            self.node.revision()
        }

        /// Returns the structural position label
        #[inline]
        pub fn dewey_id(&self) -> Option<&DeweyId> {
            self.node.dewey_id()
        }
    };
}

macro_rules! name_accessors {
    () => {
        /// Returns the local name key
        #[inline]
        pub fn name_key(&self) -> Option<NameKey> {
            self.node.name_key()
        }

        /// Returns the namespace URI key
        #[inline]
        pub fn uri_key(&self) -> Option<NameKey> {
            self.node.uri_key()
        }
    };
}

macro_rules! value_accessors {
    () => {
        /// Returns the raw value bytes
        #[inline]
        pub fn raw_value(&self) -> &[u8] {
            self.node.raw_value().unwrap_or_default()
        }

        /// Returns the value as text, replacing invalid UTF-8
        pub fn value(&self) -> Cow<'_, str> {
            String::from_utf8_lossy(self.raw_value())
        }
    };
}

/// Declares a view type over one node kind.
macro_rules! immutable_view {
    ($(#[$doc:meta])* $name:ident, $visit:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            node: Arc<NodeRecord>,
        }

        impl $name {
            fn of(node: Arc<NodeRecord>) -> Self {
                Self { node }
            }

            structural_accessors!();

            /// Dispatches to the visitor method for this kind
            pub fn accept_visitor<V: Visitor + ?Sized>(&self, visitor: &mut V) -> VisitResult {
                visitor.$visit(self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&*self.node, f)
            }
        }
    };
}

immutable_view!(
    /// Immutable document root.
    ImmutableDocument,
    visit_document
);
immutable_view!(
    /// Immutable element.
    ImmutableElement,
    visit_element
);
immutable_view!(
    /// Immutable attribute.
    ImmutableAttribute,
    visit_attribute
);
immutable_view!(
    /// Immutable namespace declaration.
    ImmutableNamespace,
    visit_namespace
);
immutable_view!(
    /// Immutable text node.
    ImmutableText,
    visit_text
);
immutable_view!(
    /// Immutable comment.
    ImmutableComment,
    visit_comment
);
immutable_view!(
    /// Immutable processing instruction.
    ImmutablePI,
    visit_processing_instruction
);

impl ImmutableElement {
    name_accessors!();

    /// Returns the number of attributes
    pub fn attribute_count(&self) -> usize {
        self.node.attribute_keys().len()
    }

    /// Returns the key of the attribute at `index`
    pub fn attribute_key(&self, index: usize) -> Option<NodeKey> {
        self.node.attribute_keys().get(index).copied()
    }

    /// Returns all attribute keys
    pub fn attribute_keys(&self) -> &[NodeKey] {
        self.node.attribute_keys()
    }

    /// Returns the number of namespace declarations
    pub fn namespace_count(&self) -> usize {
        self.node.namespace_keys().len()
    }

    /// Returns the key of the namespace declaration at `index`
    pub fn namespace_key(&self, index: usize) -> Option<NodeKey> {
        self.node.namespace_keys().get(index).copied()
    }
}

impl ImmutableAttribute {
    name_accessors!();
    value_accessors!();
}

impl ImmutableNamespace {
    name_accessors!();
}

impl ImmutableText {
    value_accessors!();
}

impl ImmutableComment {
    value_accessors!();
}

impl ImmutablePI {
    name_accessors!();
    value_accessors!();
}

/// Read-only view of any node kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImmutableNode {
    /// Document root
    Document(ImmutableDocument),
    /// Element
    Element(ImmutableElement),
    /// Attribute
    Attribute(ImmutableAttribute),
    /// Namespace declaration
    Namespace(ImmutableNamespace),
    /// Text
    Text(ImmutableText),
    /// Comment
    Comment(ImmutableComment),
    /// Processing instruction
    ProcessingInstruction(ImmutablePI),
}

impl ImmutableNode {
    /// Wraps a shared record in the view matching its kind.
    pub fn of(node: Arc<NodeRecord>) -> Self {
        match node.kind() {
            NodeKind::Document => ImmutableNode::Document(ImmutableDocument::of(node)),
            NodeKind::Element => ImmutableNode::Element(ImmutableElement::of(node)),
            NodeKind::Attribute => ImmutableNode::Attribute(ImmutableAttribute::of(node)),
            NodeKind::Namespace => ImmutableNode::Namespace(ImmutableNamespace::of(node)),
            NodeKind::Text => ImmutableNode::Text(ImmutableText::of(node)),
            NodeKind::Comment => ImmutableNode::Comment(ImmutableComment::of(node)),
            NodeKind::ProcessingInstruction => {
                ImmutableNode::ProcessingInstruction(ImmutablePI::of(node))
            }
        }
    }

    /// Takes ownership of a record and wraps it.
    pub fn from_record(record: NodeRecord) -> Self {
        Self::of(Arc::new(record))
    }

    fn record(&self) -> &NodeRecord {
        match self {
            ImmutableNode::Document(n) => &n.node,
            ImmutableNode::Element(n) => &n.node,
            ImmutableNode::Attribute(n) => &n.node,
            ImmutableNode::Namespace(n) => &n.node,
            ImmutableNode::Text(n) => &n.node,
            ImmutableNode::Comment(n) => &n.node,
            ImmutableNode::ProcessingInstruction(n) => &n.node,
        }
    }

    /// Forwards to the visitor method matching the wrapped kind.
    pub fn accept_visitor<V: Visitor + ?Sized>(&self, visitor: &mut V) -> VisitResult {
        match self {
            ImmutableNode::Document(n) => n.accept_visitor(visitor),
            ImmutableNode::Element(n) => n.accept_visitor(visitor),
            ImmutableNode::Attribute(n) => n.accept_visitor(visitor),
            ImmutableNode::Namespace(n) => n.accept_visitor(visitor),
            ImmutableNode::Text(n) => n.accept_visitor(visitor),
            ImmutableNode::Comment(n) => n.accept_visitor(visitor),
            ImmutableNode::ProcessingInstruction(n) => n.accept_visitor(visitor),
        }
    }

    /// Returns the element view, if this is an element
    pub fn as_element(&self) -> Option<&ImmutableElement> {
        match self {
            ImmutableNode::Element(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the text view, if this is a text node
    pub fn as_text(&self) -> Option<&ImmutableText> {
        match self {
            ImmutableNode::Text(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the node key
    pub fn node_key(&self) -> NodeKey {
        self.record().node_key()
    }

    /// Returns the node kind
    pub fn kind(&self) -> NodeKind {
        self.record().kind()
    }

    /// Returns the parent key
    pub fn parent_key(&self) -> Option<NodeKey> {
        self.record().parent_key()
    }

    /// Returns true if the node has a parent
    pub fn has_parent(&self) -> bool {
        self.parent_key().is_some()
    }

    /// Returns the first child key
    pub fn first_child_key(&self) -> Option<NodeKey> {
        self.record().first_child_key()
    }

    /// Returns true if the node has a first child
    pub fn has_first_child(&self) -> bool {
        self.first_child_key().is_some()
    }

    /// Returns the left sibling key
    pub fn left_sibling_key(&self) -> Option<NodeKey> {
        self.record().left_sibling_key()
    }

    /// Returns true if the node has a left sibling
    pub fn has_left_sibling(&self) -> bool {
        self.left_sibling_key().is_some()
    }

    /// Returns the right sibling key
    pub fn right_sibling_key(&self) -> Option<NodeKey> {
        self.record().right_sibling_key()
    }

    /// Returns true if the node has a right sibling
    pub fn has_right_sibling(&self) -> bool {
        self.right_sibling_key().is_some()
    }

    /// Returns the number of structural children
    pub fn child_count(&self) -> u64 {
        self.record().child_count()
    }

    /// Returns the number of structural descendants
    pub fn descendant_count(&self) -> u64 {
        self.record().descendant_count()
    }

    /// Returns the local name key, for named kinds
    pub fn name_key(&self) -> Option<NameKey> {
        self.record().name_key()
    }

    /// Returns the namespace URI key, for named kinds
    pub fn uri_key(&self) -> Option<NameKey> {
        self.record().uri_key()
    }

    /// Returns the path-summary node key
    pub fn path_node_key(&self) -> Option<NodeKey> {
        self.record().path_node_key()
    }

    /// Returns the raw value, for kinds carrying one
    pub fn raw_value(&self) -> Option<&[u8]> {
        self.record().raw_value()
    }

    /// Returns the content hash
    pub fn hash(&self) -> u64 {
        self.record().hash()
    }

    /// Returns the revision the wrapped record was last written in
    pub fn revision(&self) -> Revision {
        self.record().revision()
    }

    /// Returns the structural position label
    pub fn dewey_id(&self) -> Option<&DeweyId> {
        self.record().dewey_id()
    }
}

impl fmt::Display for ImmutableNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.record(), f)
    }
}
