//! Kind-aware visitors over immutable node views

use super::immutable::{
    ImmutableAttribute, ImmutableComment, ImmutableDocument, ImmutableElement,
    ImmutableNamespace, ImmutablePI, ImmutableText,
};

/// Outcome of visiting one node, steering an ongoing traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitResult {
    /// Descend into the node's children, then continue
    Continue,
    /// Stop the whole traversal
    Terminate,
    /// Do not descend below this node
    SkipSubtree,
    /// Do not visit the remaining right siblings of this node
    SkipSiblings,
}

/// Double-dispatch target for node views.
///
/// A view calls the method matching its own kind, so implementors get
/// kind-specific behaviour without matching on the kind themselves. Every
/// method defaults to [`VisitResult::Continue`].
pub trait Visitor {
    /// Visits the document root
    fn visit_document(&mut self, _node: &ImmutableDocument) -> VisitResult {
        VisitResult::Continue
    }

    /// Visits an element
    fn visit_element(&mut self, _node: &ImmutableElement) -> VisitResult {
        VisitResult::Continue
    }

    /// Visits an attribute
    fn visit_attribute(&mut self, _node: &ImmutableAttribute) -> VisitResult {
        VisitResult::Continue
    }

    /// Visits a namespace declaration
    fn visit_namespace(&mut self, _node: &ImmutableNamespace) -> VisitResult {
        VisitResult::Continue
    }

    /// Visits a text node
    fn visit_text(&mut self, _node: &ImmutableText) -> VisitResult {
        VisitResult::Continue
    }

    /// Visits a comment
    fn visit_comment(&mut self, _node: &ImmutableComment) -> VisitResult {
        VisitResult::Continue
    }

    /// Visits a processing instruction
    fn visit_processing_instruction(&mut self, _node: &ImmutablePI) -> VisitResult {
        VisitResult::Continue
    }
}
