//! Visitor-driven preorder traversal

use super::NodeReadOnlyTrx;
use crate::history::{HistoryError, HistoryResult};
use crate::node::{VisitResult, Visitor};
use crate::NodeKey;

/// Visits the subtree rooted at the transaction's current node in preorder,
/// following first-child and right-sibling links.
///
/// Attributes and namespaces are not part of the child structure and are
/// not visited. `SkipSubtree` keeps the traversal out of the node's
/// children; `SkipSiblings` still descends but drops the node's remaining
/// right siblings; `Terminate` stops at once. The cursor is moved back to
/// the start node afterwards, also when the walk fails. Returns `Terminate`
/// if the visitor stopped the walk, `Continue` otherwise.
pub fn traverse<T, V>(trx: &mut T, visitor: &mut V) -> HistoryResult<VisitResult>
where
    T: NodeReadOnlyTrx + ?Sized,
    V: Visitor + ?Sized,
{
    let start = trx.node_key().ok_or(HistoryError::NoCurrentNode)?;

    let outcome = walk(trx, visitor, start);
    let restored = trx.move_to(start);
    let outcome = outcome?;
    restored?;
    Ok(outcome)
}

fn walk<T, V>(trx: &mut T, visitor: &mut V, start: NodeKey) -> HistoryResult<VisitResult>
where
    T: NodeReadOnlyTrx + ?Sized,
    V: Visitor + ?Sized,
{
    let mut pending: Vec<NodeKey> = Vec::new();
    let mut next = Some(start);
    let mut outcome = VisitResult::Continue;

    while let Some(node_key) = next {
        if !trx.move_to(node_key)? {
            return Err(HistoryError::NodeNotFound { node_key });
        }
        let node = trx.node().ok_or(HistoryError::NoCurrentNode)?;

        // siblings of the start node lie outside the subtree
        let right = if node_key == start {
            None
        } else {
            node.right_sibling_key()
        };

        next = match node.accept_visitor(visitor) {
            VisitResult::Terminate => {
                outcome = VisitResult::Terminate;
                None
            }
            VisitResult::Continue => {
                pending.extend(right);
                node.first_child_key().or_else(|| pending.pop())
            }
            VisitResult::SkipSubtree => {
                pending.extend(right);
                pending.pop()
            }
            VisitResult::SkipSiblings => node.first_child_key().or_else(|| pending.pop()),
        };
    }

    Ok(outcome)
}
