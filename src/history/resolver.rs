//! Revision history resolution
//!
//! Two paths, chosen once per call:
//!
//! - **Indexed**: the node-to-revisions index lists every revision in which
//!   the node changed. Each listed revision is probed; a miss yields an
//!   [`HistoryEntry::Absent`] slot so the result lines up with the list.
//! - **Fallback**: without an index entry, walk backwards from the most
//!   recent revision. A hit jumps to the transaction's previous revision; a
//!   miss steps down by one. Only hits are reported.
//!
//! Both paths return entries in ascending revision order. Every probe opens
//! its own transaction and closes it before the next one is opened, on
//! error paths too.

use std::ops::{Deref, DerefMut};

use crate::config::HistoryConfig;
use crate::index::{IndexRecord, IndexType, RevisionList};
use crate::node::ImmutableNode;
use crate::observability::{Event, HistoryMetrics, Logger, ObservationScope, Severity, Timer};
use crate::trx::{NodeReadOnlyTrx, ResourceSession};
use crate::{NodeKey, Revision};

use super::{HistoryEntry, HistoryError, HistoryResult};

/// Which path produced a history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Path {
    Indexed,
    Fallback,
}

impl Path {
    fn as_str(&self) -> &'static str {
        match self {
            Path::Indexed => "indexed",
            Path::Fallback => "fallback",
        }
    }
}

/// Read-only transaction that is closed when it goes out of scope.
struct OpenTrx<T: NodeReadOnlyTrx> {
    trx: T,
}

impl<T: NodeReadOnlyTrx> Deref for OpenTrx<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.trx
    }
}

impl<T: NodeReadOnlyTrx> DerefMut for OpenTrx<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.trx
    }
}

impl<T: NodeReadOnlyTrx> Drop for OpenTrx<T> {
    fn drop(&mut self) {
        self.trx.close();
    }
}

/// Resolves the ordered per-revision states of a node.
#[derive(Debug, Default)]
pub struct RevisionHistory {
    config: HistoryConfig,
    metrics: HistoryMetrics,
}

impl RevisionHistory {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            metrics: HistoryMetrics::new(),
        }
    }

    /// Returns the configuration
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Returns the resolution counters
    pub fn metrics(&self) -> &HistoryMetrics {
        &self.metrics
    }

    /// Resolves the history of `node_key` up to the session's most recent
    /// revision.
    ///
    /// A node that no revision after 0 contains is rejected with
    /// [`HistoryError::NodeNotFound`].
    pub fn resolve<S>(&self, session: &S, node_key: NodeKey) -> HistoryResult<Vec<HistoryEntry>>
    where
        S: ResourceSession + ?Sized,
    {
        let most_recent = session.most_recent_revision_number()?;
        self.resolve_up_to(session, node_key, most_recent)
    }

    /// Resolves the history of the node `trx` is positioned on, up to the
    /// most recent revision the transaction knows of.
    pub fn resolve_item<T>(&self, trx: &T) -> HistoryResult<Vec<HistoryEntry>>
    where
        T: NodeReadOnlyTrx + ?Sized,
    {
        let node_key = trx.node_key().ok_or(HistoryError::NoCurrentNode)?;
        self.resolve_up_to(
            trx.resource_session(),
            node_key,
            trx.most_recent_revision_number(),
        )
    }

    fn resolve_up_to<S>(
        &self,
        session: &S,
        node_key: NodeKey,
        most_recent: Revision,
    ) -> HistoryResult<Vec<HistoryEntry>>
    where
        S: ResourceSession + ?Sized,
    {
        let node_str = node_key.to_string();
        let most_recent_str = most_recent.to_string();
        let scope = ObservationScope::with_fields(
            "HISTORY_RESOLVE",
            &[
                ("most_recent", most_recent_str.as_str()),
                ("node_key", node_str.as_str()),
            ],
        );
        let timer = Timer::new();

        match self.select_path(session, node_key, most_recent) {
            Ok((path, entries)) => {
                self.metrics.add_entries_returned(entries.len() as u64);
                let count = entries.len().to_string();
                let elapsed = timer.elapsed_us();
                scope.complete_with_fields(&[
                    ("elapsed_us", elapsed.as_str()),
                    ("entries", count.as_str()),
                    ("path", path.as_str()),
                ]);
                Ok(entries)
            }
            Err(e) => {
                self.metrics.increment_failures();
                scope.fail(e.code(), &e.to_string(), e.is_fatal());
                Err(e)
            }
        }
    }

    fn select_path<S>(
        &self,
        session: &S,
        node_key: NodeKey,
        most_recent: Revision,
    ) -> HistoryResult<(Path, Vec<HistoryEntry>)>
    where
        S: ResourceSession + ?Sized,
    {
        if self.config.revision_index_enabled {
            if let Some(revisions) = self.lookup_revisions(session, node_key, most_recent)? {
                let entries = self.resolve_indexed(session, node_key, &revisions)?;
                return Ok((Path::Indexed, entries));
            }
        }
        let entries = self.resolve_fallback(session, node_key, most_recent)?;
        Ok((Path::Fallback, entries))
    }

    /// Reads the node's revision list as of the most recent revision.
    fn lookup_revisions<S>(
        &self,
        session: &S,
        node_key: NodeKey,
        most_recent: Revision,
    ) -> HistoryResult<Option<RevisionList>>
    where
        S: ResourceSession + ?Sized,
    {
        let trx = self.open(session, most_recent)?;
        let record = trx.get_record(
            node_key,
            IndexType::RecordToRevisions,
            self.config.revision_index_slot,
        );
        drop(trx);

        match record? {
            None => Ok(None),
            Some(IndexRecord::Revisions(revisions)) => Ok(Some(revisions)),
            Some(IndexRecord::Nodes(_)) => Err(HistoryError::corrupt_index(
                node_key,
                "expected a revision list, found node references",
            )),
        }
    }

    fn resolve_indexed<S>(
        &self,
        session: &S,
        node_key: NodeKey,
        revisions: &RevisionList,
    ) -> HistoryResult<Vec<HistoryEntry>>
    where
        S: ResourceSession + ?Sized,
    {
        self.metrics.increment_indexed_resolutions();
        let node_str = node_key.to_string();
        let count = revisions.len().to_string();
        Event::HistoryIndexedPath.log(&[
            ("node_key", node_str.as_str()),
            ("revisions", count.as_str()),
        ]);

        let mut entries = Vec::with_capacity(revisions.len());
        for &revision in revisions.revisions() {
            let mut trx = self.open(session, revision)?;
            let found = self.probe(&mut *trx, node_key)?;
            drop(trx);

            match found {
                Some(node) => entries.push(HistoryEntry::Present { revision, node }),
                None => {
                    self.metrics.increment_index_skews();
                    let revision_str = revision.to_string();
                    Event::HistoryIndexSkew.log(&[
                        ("node_key", node_str.as_str()),
                        ("revision", revision_str.as_str()),
                    ]);
                    entries.push(HistoryEntry::Absent { revision });
                }
            }
        }
        Ok(entries)
    }

    fn resolve_fallback<S>(
        &self,
        session: &S,
        node_key: NodeKey,
        most_recent: Revision,
    ) -> HistoryResult<Vec<HistoryEntry>>
    where
        S: ResourceSession + ?Sized,
    {
        self.metrics.increment_fallback_resolutions();
        let node_str = node_key.to_string();
        Event::HistoryFallbackPath.log(&[("node_key", node_str.as_str())]);

        let mut entries = Vec::new();
        let mut revision = most_recent;

        while revision > 0 {
            let mut trx = self.open(session, revision)?;
            let found = self.probe(&mut *trx, node_key)?;
            let previous = trx.previous_revision_number();
            drop(trx);

            match found {
                Some(node) => {
                    entries.push(HistoryEntry::Present { revision, node });
                    if previous >= revision {
                        let revision_str = revision.to_string();
                        let previous_str = previous.to_string();
                        Event::HistoryBrokenChain.log(&[
                            ("previous", previous_str.as_str()),
                            ("revision", revision_str.as_str()),
                        ]);
                        return Err(HistoryError::BrokenRevisionChain { revision, previous });
                    }
                    revision = previous;
                }
                None => revision -= 1,
            }
        }

        if entries.is_empty() && most_recent > 0 {
            return Err(HistoryError::NodeNotFound { node_key });
        }

        // collected newest first
        entries.reverse();
        Ok(entries)
    }

    fn open<S>(&self, session: &S, revision: Revision) -> HistoryResult<OpenTrx<S::Trx>>
    where
        S: ResourceSession + ?Sized,
    {
        self.metrics.increment_transactions_opened();
        let trx = session.begin_node_read_only_trx(Some(revision))?;
        Ok(OpenTrx { trx })
    }

    /// Moves to the node and returns its view, or `None` if the revision
    /// does not contain it.
    fn probe<T>(&self, trx: &mut T, node_key: NodeKey) -> HistoryResult<Option<ImmutableNode>>
    where
        T: NodeReadOnlyTrx + ?Sized,
    {
        let found = trx.move_to(node_key)?;
        if Logger::enabled(Severity::Trace) {
            let revision_str = trx.revision_number().to_string();
            let node_str = node_key.to_string();
            Event::HistoryProbe.log(&[
                ("found", if found { "true" } else { "false" }),
                ("node_key", node_str.as_str()),
                ("revision", revision_str.as_str()),
            ]);
        }

        if !found {
            self.metrics.increment_probe_misses();
            return Ok(None);
        }
        trx.node().map(Some).ok_or_else(|| {
            HistoryError::corrupt_index(node_key, "cursor moved but no node is current")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::resource::{MemoryResource, NodeSpec, DOCUMENT_ROOT_KEY};

    fn config(revision_index_enabled: bool) -> HistoryConfig {
        HistoryConfig {
            revision_index_enabled,
            ..HistoryConfig::default()
        }
    }

    /// Text node inserted in 1 and edited in 3. Revisions 2 and 4 only
    /// touch its left sibling's subtree.
    fn edited_text(resource: &MemoryResource) -> NodeKey {
        let mut wtx = resource.begin_node_write_trx().unwrap();
        let holder = wtx.insert_child(DOCUMENT_ROOT_KEY, NodeSpec::element(1)).unwrap();
        let text = wtx.insert_child(DOCUMENT_ROOT_KEY, NodeSpec::text("v1")).unwrap();
        wtx.commit().unwrap();
        wtx.insert_child(holder, NodeSpec::comment("other")).unwrap();
        wtx.commit().unwrap();
        wtx.set_value(text, "v3").unwrap();
        wtx.commit().unwrap();
        wtx.insert_child(holder, NodeSpec::element(2)).unwrap();
        wtx.commit().unwrap();
        text
    }

    fn values(entries: &[HistoryEntry]) -> Vec<(Revision, String)> {
        entries
            .iter()
            .map(|entry| {
                let value = entry
                    .node()
                    .and_then(|node| node.raw_value())
                    .map(|raw| String::from_utf8_lossy(raw).into_owned())
                    .unwrap_or_default();
                (entry.revision(), value)
            })
            .collect()
    }

    #[test]
    fn test_indexed_path_lists_changed_revisions() {
        let resource = MemoryResource::new(config(true));
        let text = edited_text(&resource);
        let history = RevisionHistory::new(config(true));

        let entries = history.resolve(&resource, text).unwrap();
        assert_eq!(
            values(&entries),
            vec![(1, "v1".to_string()), (3, "v3".to_string())]
        );

        let snapshot = history.metrics().snapshot();
        assert_eq!(snapshot.indexed_resolutions, 1);
        assert_eq!(snapshot.fallback_resolutions, 0);
        // one lookup plus one probe per listed revision
        assert_eq!(snapshot.transactions_opened, 3);
    }

    #[test]
    fn test_fallback_path_walks_every_revision() {
        let resource = MemoryResource::new(config(false));
        let text = edited_text(&resource);
        let history = RevisionHistory::new(config(false));

        let entries = history.resolve(&resource, text).unwrap();
        // unchanged revisions carry the node too, so each one is reported
        assert_eq!(
            values(&entries),
            vec![
                (1, "v1".to_string()),
                (2, "v1".to_string()),
                (3, "v3".to_string()),
                (4, "v3".to_string()),
            ]
        );
        assert_eq!(history.metrics().snapshot().fallback_resolutions, 1);
    }

    #[test]
    fn test_unindexed_node_falls_back() {
        // resource maintains the index, but the resolver reads another slot
        let resource = MemoryResource::new(config(true));
        let text = edited_text(&resource);
        let history = RevisionHistory::new(HistoryConfig {
            revision_index_slot: 3,
            ..HistoryConfig::default()
        });

        let entries = history.resolve(&resource, text).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(HistoryEntry::is_present));
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        let resource = MemoryResource::new(config(true));
        edited_text(&resource);
        let history = RevisionHistory::new(config(true));

        let err = history.resolve(&resource, 1000).unwrap_err();
        assert_eq!(err, HistoryError::NodeNotFound { node_key: 1000 });
        assert!(!err.is_fatal());

        let snapshot = history.metrics().snapshot();
        assert_eq!(snapshot.probe_misses, 4);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.entries_returned, 0);
    }

    #[test]
    fn test_empty_resource_has_empty_history() {
        let resource = MemoryResource::new(config(true));
        let history = RevisionHistory::new(config(true));

        assert!(history.resolve(&resource, 1000).unwrap().is_empty());
    }

    #[test]
    fn test_removed_node_keeps_its_past() {
        let resource = MemoryResource::new(config(true));
        let text = edited_text(&resource);
        let mut wtx = resource.begin_node_write_trx().unwrap();
        wtx.remove(text).unwrap();
        wtx.commit().unwrap();
        drop(wtx);

        let history = RevisionHistory::new(config(true));
        let entries = history.resolve(&resource, text).unwrap();
        // revision 5 is listed because the removal changed the node
        assert_eq!(
            entries.iter().map(HistoryEntry::revision).collect::<Vec<_>>(),
            vec![1, 3, 5]
        );
        assert!(entries[2].is_absent());
        assert_eq!(history.metrics().snapshot().index_skews, 1);
    }

    #[test]
    fn test_resolve_item_uses_current_node() {
        let resource = MemoryResource::new(config(true));
        let text = edited_text(&resource);
        let history = RevisionHistory::new(config(true));

        let mut trx = resource.begin_node_read_only_trx(None).unwrap();
        assert!(trx.move_to(text).unwrap());
        let entries = history.resolve_item(&trx).unwrap();
        assert_eq!(entries, history.resolve(&resource, text).unwrap());
        assert!(entries
            .iter()
            .filter_map(HistoryEntry::node)
            .all(|node| node.kind() == NodeKind::Text));
    }

    #[test]
    fn test_resolve_item_without_current_node() {
        let resource = MemoryResource::new(config(true));
        let history = RevisionHistory::new(config(true));
        let mut trx = resource.begin_node_read_only_trx(None).unwrap();
        trx.close();

        assert!(matches!(
            history.resolve_item(&trx),
            Err(HistoryError::NoCurrentNode)
        ));
    }

    #[test]
    fn test_views_survive_later_writes() {
        let resource = MemoryResource::new(config(true));
        let text = edited_text(&resource);
        let history = RevisionHistory::new(config(true));
        let before = history.resolve(&resource, text).unwrap();

        let mut wtx = resource.begin_node_write_trx().unwrap();
        wtx.set_value(text, "v6").unwrap();
        wtx.commit().unwrap();
        drop(wtx);

        assert_eq!(values(&before)[0].1, "v1");
        assert_eq!(values(&before)[1].1, "v3");
        assert_eq!(history.resolve(&resource, text).unwrap().len(), 3);
    }
}
