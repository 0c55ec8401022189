//! In-memory Resource Tests
//!
//! End-to-end tests resolving histories against a real resource:
//! - Indexed and fallback paths agree on revisions where the node changed
//! - Reverts produce previous-revision pointers that skip numbers
//! - Readers at different revisions are isolated from writers

use std::thread;

use histdb::index::IndexKey;
use histdb::node::{NodeKind, VisitResult, Visitor, ImmutableText};
use histdb::resource::{MemoryResource, NodeSpec, DOCUMENT_ROOT_KEY};
use histdb::trx::{traverse, NodeReadOnlyTrx, ResourceSession};
use histdb::{HistoryConfig, HistoryEntry, RevisionHistory};

fn config(revision_index_enabled: bool) -> HistoryConfig {
    HistoryConfig {
        revision_index_enabled,
        ..HistoryConfig::default()
    }
}

fn revisions(entries: &[HistoryEntry]) -> Vec<u32> {
    entries.iter().map(HistoryEntry::revision).collect()
}

/// `doc > article(1) > [title(2) > "draft", body(3)]`, then three edits of
/// the title text in revisions 2..=4 and one body edit in revision 5.
fn build(resource: &MemoryResource) -> (u64, u64) {
    let mut wtx = resource.begin_node_write_trx().unwrap();
    let article = wtx.insert_child(DOCUMENT_ROOT_KEY, NodeSpec::element(1)).unwrap();
    let title = wtx.insert_child(article, NodeSpec::element(2)).unwrap();
    let text = wtx.insert_child(title, NodeSpec::text("draft")).unwrap();
    let body = wtx.insert_child(article, NodeSpec::element(3)).unwrap();
    wtx.commit().unwrap();

    for value in ["second", "third", "final"] {
        wtx.set_value(text, value).unwrap();
        wtx.commit().unwrap();
    }
    wtx.insert_child(body, NodeSpec::text("content")).unwrap();
    wtx.commit().unwrap();
    (text, body)
}

// =============================================================================
// Both Paths
// =============================================================================

/// Indexed path reports exactly the revisions where the text changed.
#[test]
fn test_indexed_history_of_edited_text() {
    let resource = MemoryResource::new(config(true));
    let (text, _) = build(&resource);
    let history = RevisionHistory::new(config(true));

    let entries = history.resolve(&resource, text).unwrap();
    assert_eq!(revisions(&entries), vec![1, 2, 3, 4]);

    let values: Vec<String> = entries
        .iter()
        .filter_map(HistoryEntry::node)
        .map(|node| String::from_utf8_lossy(node.raw_value().unwrap()).into_owned())
        .collect();
    assert_eq!(values, ["draft", "second", "third", "final"]);
}

/// Fallback path sees the node at every revision it was reachable in.
#[test]
fn test_fallback_history_covers_unchanged_revisions() {
    let resource = MemoryResource::new(config(false));
    let (text, _) = build(&resource);
    let history = RevisionHistory::new(config(false));

    let entries = history.resolve(&resource, text).unwrap();
    assert_eq!(revisions(&entries), vec![1, 2, 3, 4, 5]);
    assert_eq!(entries[3].node(), entries[4].node());
}

/// Revisions reported by the indexed path are a subset of the fallback's.
#[test]
fn test_paths_agree_on_changed_revisions() {
    let indexed_resource = MemoryResource::new(config(true));
    let plain_resource = MemoryResource::new(config(false));
    let (_, body) = build(&indexed_resource);
    build(&plain_resource);

    let indexed = RevisionHistory::new(config(true))
        .resolve(&indexed_resource, body)
        .unwrap();
    let fallback = RevisionHistory::new(config(false))
        .resolve(&plain_resource, body)
        .unwrap();

    assert_eq!(revisions(&indexed), vec![1, 5]);
    for entry in &indexed {
        assert!(fallback.contains(entry));
    }
}

// =============================================================================
// Reverts
// =============================================================================

/// A revert makes the next commit point back past the discarded revisions.
#[test]
fn test_fallback_jumps_over_reverted_revisions() {
    let resource = MemoryResource::new(config(false));
    let (text, _) = build(&resource);

    let mut wtx = resource.begin_node_write_trx().unwrap();
    wtx.revert_to(2).unwrap();
    assert_eq!(wtx.commit().unwrap(), 6);
    drop(wtx);

    let trx = resource.begin_node_read_only_trx(Some(6)).unwrap();
    assert_eq!(trx.previous_revision_number(), 2);

    let entries = RevisionHistory::new(config(false))
        .resolve(&resource, text)
        .unwrap();
    assert_eq!(revisions(&entries), vec![1, 2, 6]);
    assert_eq!(
        entries[2].node().unwrap().raw_value(),
        Some(&b"second"[..])
    );
}

/// The revert itself is listed as a change of the restored node.
#[test]
fn test_indexed_history_after_revert() {
    let resource = MemoryResource::new(config(true));
    let (text, _) = build(&resource);

    let mut wtx = resource.begin_node_write_trx().unwrap();
    wtx.revert_to(2).unwrap();
    wtx.commit().unwrap();
    drop(wtx);

    let entries = RevisionHistory::new(config(true))
        .resolve(&resource, text)
        .unwrap();
    assert_eq!(revisions(&entries), vec![1, 2, 3, 4, 6]);
    assert!(entries.iter().all(HistoryEntry::is_present));
}

// =============================================================================
// Isolation
// =============================================================================

/// Readers keep their revision while a writer commits.
#[test]
fn test_reader_isolated_from_writer() {
    let resource = MemoryResource::new(config(true));
    let (text, _) = build(&resource);

    let mut reader = resource.begin_node_read_only_trx(Some(4)).unwrap();
    assert!(reader.move_to(text).unwrap());
    let before = reader.node().unwrap();

    let mut wtx = resource.begin_node_write_trx().unwrap();
    wtx.set_value(text, "changed").unwrap();
    wtx.commit().unwrap();
    drop(wtx);

    assert!(reader.move_to(text).unwrap());
    assert_eq!(reader.node().unwrap(), before);
    assert_eq!(before.raw_value(), Some(&b"final"[..]));
    assert_eq!(reader.most_recent_revision_number(), 5);
    assert_eq!(resource.most_recent_revision_number().unwrap(), 6);
}

/// Concurrent resolutions on shared handles agree.
#[test]
fn test_concurrent_resolution() {
    let resource = MemoryResource::new(config(true));
    let (text, body) = build(&resource);
    let history = RevisionHistory::new(config(true));
    let expected = history.resolve(&resource, text).unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..10 {
                    assert_eq!(history.resolve(&resource, text).unwrap(), expected);
                    assert_eq!(history.resolve(&resource, body).unwrap().len(), 2);
                }
            });
        }
    });

    assert_eq!(history.metrics().snapshot().indexed_resolutions, 81);
}

// =============================================================================
// Value Index and Traversal
// =============================================================================

/// Value lookups follow the revision they are made at.
#[test]
fn test_value_index_per_revision() {
    let resource = MemoryResource::new(config(true));
    let (text, _) = build(&resource);

    let at_1 = resource.begin_node_read_only_trx(Some(1)).unwrap();
    let at_4 = resource.begin_node_read_only_trx(Some(4)).unwrap();
    let draft = IndexKey::from_string("draft");

    assert!(at_1.find_value(&draft).unwrap().unwrap().contains(text));
    assert!(at_4.find_value(&draft).unwrap().is_none());
    assert!(at_4
        .find_value(&IndexKey::from_string("final"))
        .unwrap()
        .unwrap()
        .contains(text));
}

struct TextCollector(Vec<String>);

impl Visitor for TextCollector {
    fn visit_text(&mut self, node: &ImmutableText) -> VisitResult {
        self.0.push(node.value().into_owned());
        VisitResult::Continue
    }
}

/// Traversal at an old revision sees that revision's text.
#[test]
fn test_traverse_old_revision() {
    let resource = MemoryResource::new(config(true));
    build(&resource);

    let mut trx = resource.begin_node_read_only_trx(Some(1)).unwrap();
    let mut collector = TextCollector(Vec::new());
    assert_eq!(
        traverse(&mut trx, &mut collector).unwrap(),
        VisitResult::Continue
    );
    assert_eq!(collector.0, ["draft"]);

    let mut trx = resource.begin_node_read_only_trx(None).unwrap();
    let mut collector = TextCollector(Vec::new());
    traverse(&mut trx, &mut collector).unwrap();
    assert_eq!(collector.0, ["final", "content"]);
    assert_eq!(trx.node().unwrap().kind(), NodeKind::Document);
}
