//! Indexed-path Resolution Tests
//!
//! Tests for histories driven by the node-to-revisions index:
//! - One entry per listed revision, ascending
//! - Listed revisions without the node become absent-markers
//! - Malformed or dangling index entries are fatal
//! - Every probe transaction is closed

mod common;

use common::{revisions, ScriptBuilder};
use histdb::index::{IndexEntrySet, IndexRecord, RevisionList};
use histdb::{HistoryConfig, HistoryEntry, HistoryError, RevisionHistory};

const NODE: u64 = 7;

fn revision_list(revisions: &[u32]) -> IndexRecord {
    IndexRecord::Revisions(RevisionList::from_revisions(revisions.to_vec()).unwrap())
}

// =============================================================================
// Result Shape
// =============================================================================

/// Node deleted at a listed revision yields a placeholder in that slot.
#[test]
fn test_absent_marker_for_listed_revision() {
    let session = ScriptBuilder::new(9)
        .node_at(NODE, &[2, 9])
        .index(NODE, revision_list(&[2, 5, 9]))
        .build();
    let history = RevisionHistory::new(HistoryConfig::default());

    let entries = history.resolve(&session, NODE).unwrap();

    assert_eq!(revisions(&entries), vec![2, 5, 9]);
    assert!(entries[0].is_present());
    assert_eq!(entries[1], HistoryEntry::Absent { revision: 5 });
    assert!(entries[2].is_present());

    assert_eq!(entries[0].node().unwrap().revision(), 2);
    assert_eq!(entries[2].node().unwrap().name_key(), Some(9));
    assert_eq!(history.metrics().snapshot().index_skews, 1);
}

/// Only listed revisions are probed, even if the node exists elsewhere.
#[test]
fn test_only_listed_revisions_probed() {
    let session = ScriptBuilder::new(6)
        .node_at(NODE, &[1, 2, 3, 4, 5, 6])
        .index(NODE, revision_list(&[1, 4]))
        .build();
    let history = RevisionHistory::new(HistoryConfig::default());

    let entries = history.resolve(&session, NODE).unwrap();

    assert_eq!(revisions(&entries), vec![1, 4]);
    // index lookup plus two probes
    assert_eq!(session.opened(), 3);
}

/// Views carry the record captured at their own revision.
#[test]
fn test_views_bound_to_their_revision() {
    let session = ScriptBuilder::new(3)
        .node_at(NODE, &[1, 3])
        .index(NODE, revision_list(&[1, 3]))
        .build();
    let history = RevisionHistory::new(HistoryConfig::default());

    let entries = history.resolve(&session, NODE).unwrap();
    let names: Vec<_> = entries
        .iter()
        .filter_map(HistoryEntry::node)
        .map(|node| node.name_key())
        .collect();
    assert_eq!(names, vec![Some(1), Some(3)]);
}

/// Index slot is taken from the configuration.
#[test]
fn test_configured_slot_used() {
    let session = ScriptBuilder::new(4)
        .node_at(NODE, &[2, 4])
        .index_in_slot(NODE, 2, revision_list(&[4]))
        .build();

    let default_slot = RevisionHistory::new(HistoryConfig::default());
    // no entry in slot 0, so the chain is walked
    assert_eq!(
        revisions(&default_slot.resolve(&session, NODE).unwrap()),
        vec![2, 4]
    );

    let slot_two = RevisionHistory::new(HistoryConfig {
        revision_index_slot: 2,
        ..HistoryConfig::default()
    });
    assert_eq!(revisions(&slot_two.resolve(&session, NODE).unwrap()), vec![4]);
}

/// Disabling the index forces the chain walk.
#[test]
fn test_disabled_index_not_consulted() {
    let session = ScriptBuilder::new(3)
        .node_at(NODE, &[1, 2, 3])
        .index(NODE, revision_list(&[3]))
        .build();
    let history = RevisionHistory::new(HistoryConfig {
        revision_index_enabled: false,
        ..HistoryConfig::default()
    });

    let entries = history.resolve(&session, NODE).unwrap();
    assert_eq!(revisions(&entries), vec![1, 2, 3]);

    let snapshot = history.metrics().snapshot();
    assert_eq!(snapshot.indexed_resolutions, 0);
    assert_eq!(snapshot.fallback_resolutions, 1);
}

// =============================================================================
// Integrity Failures
// =============================================================================

/// Node references where a revision list is expected.
#[test]
fn test_wrong_payload_is_corrupt_index() {
    let nodes: IndexEntrySet = vec![1, 2].into();
    let session = ScriptBuilder::new(2)
        .node_at(NODE, &[1])
        .index(NODE, IndexRecord::Nodes(nodes))
        .build();
    let history = RevisionHistory::new(HistoryConfig::default());

    let err = history.resolve(&session, NODE).unwrap_err();
    assert!(matches!(err, HistoryError::CorruptIndex { node_key: NODE, .. }));
    assert!(err.is_fatal());
    assert_eq!(history.metrics().snapshot().failures, 1);
}

/// A listed revision that was never committed propagates.
#[test]
fn test_dangling_revision_is_fatal() {
    let session = ScriptBuilder::new(3)
        .node_at(NODE, &[1])
        .index(NODE, revision_list(&[1, 8]))
        .build();
    let history = RevisionHistory::new(HistoryConfig::default());

    let err = history.resolve(&session, NODE).unwrap_err();
    assert_eq!(
        err,
        HistoryError::RevisionNotFound {
            revision: 8,
            most_recent: 3
        }
    );
    assert!(err.is_fatal());
    // nothing left open on the failure path
    assert_eq!(session.opened(), session.closed());
}

// =============================================================================
// Transactions and Determinism
// =============================================================================

/// One transaction at a time, all of them closed.
#[test]
fn test_transactions_closed_after_each_probe() {
    let session = ScriptBuilder::new(9)
        .node_at(NODE, &[2, 9])
        .index(NODE, revision_list(&[2, 5, 9]))
        .build();
    let history = RevisionHistory::new(HistoryConfig::default());

    history.resolve(&session, NODE).unwrap();

    assert_eq!(session.opened(), 4);
    assert_eq!(session.closed(), 4);
    assert_eq!(session.max_open(), 1);
}

/// A failed move at a listed revision still releases its transaction.
#[test]
fn test_transaction_closed_when_move_fails() {
    let session = ScriptBuilder::new(9)
        .node_at(NODE, &[2, 9])
        .index(NODE, revision_list(&[2, 5, 9]))
        .fail_moves_at(5)
        .build();
    let history = RevisionHistory::new(HistoryConfig::default());

    let err = history.resolve(&session, NODE).unwrap_err();
    assert_eq!(err, HistoryError::LockPoisoned);
    assert!(err.is_fatal());
    // lookup, 2, then the failing 5
    assert_eq!(session.opened(), 3);
    assert_eq!(session.closed(), 3);
    assert_eq!(history.metrics().snapshot().failures, 1);
}

/// Same node, same most-recent revision, same answer.
#[test]
fn test_resolution_is_idempotent() {
    let session = ScriptBuilder::new(9)
        .node_at(NODE, &[2, 9])
        .index(NODE, revision_list(&[2, 5, 9]))
        .build();
    let history = RevisionHistory::new(HistoryConfig::default());

    let first = history.resolve(&session, NODE).unwrap();
    let second = history.resolve(&session, NODE).unwrap();
    assert_eq!(first, second);
}
