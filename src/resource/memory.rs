//! Shared resource state and read-only transactions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::write_trx::MemoryWriteTrx;
use super::DOCUMENT_ROOT_KEY;
use crate::config::HistoryConfig;
use crate::history::{HistoryError, HistoryResult};
use crate::index::{
    IndexEntrySet, IndexKey, IndexRecord, IndexType, RevisionList, VersionedIndexTree,
};
use crate::node::{DeweyId, ImmutableNode, NodeKind, NodeRecord};
use crate::observability::Event;
use crate::trx::{NodeReadOnlyTrx, ResourceSession};
use crate::{NodeKey, Revision};

/// Everything guarded by the resource lock.
pub(super) struct ResourceState {
    pub(super) records: VersionedIndexTree<NodeKey, Arc<NodeRecord>>,
    pub(super) revision_index: VersionedIndexTree<NodeKey, RevisionList>,
    pub(super) value_index: VersionedIndexTree<IndexKey, IndexEntrySet>,
    /// Previous-revision pointer of every committed revision
    pub(super) previous_revisions: Vec<Revision>,
    /// Next unused node key; never reused, not even after a rollback
    pub(super) next_node_key: NodeKey,
}

impl ResourceState {
    fn bootstrap() -> Self {
        let mut root = NodeRecord::new(DOCUMENT_ROOT_KEY, NodeKind::Document, 0);
        root.set_dewey_id(Some(DeweyId::root()));
        root.rehash();

        Self {
            records: VersionedIndexTree::with_initial([(DOCUMENT_ROOT_KEY, Arc::new(root))]),
            revision_index: VersionedIndexTree::new(),
            value_index: VersionedIndexTree::new(),
            previous_revisions: vec![0],
            next_node_key: DOCUMENT_ROOT_KEY + 1,
        }
    }

    pub(super) fn most_recent_revision(&self) -> Revision {
        self.records.most_recent_revision()
    }

    pub(super) fn working_revision(&self) -> Revision {
        self.records.working_revision()
    }

    pub(super) fn check_revision(&self, revision: Revision) -> HistoryResult<()> {
        let most_recent = self.most_recent_revision();
        if revision > most_recent {
            return Err(HistoryError::RevisionNotFound {
                revision,
                most_recent,
            });
        }
        Ok(())
    }

    pub(super) fn has_uncommitted_changes(&self) -> bool {
        self.records.has_uncommitted_changes()
            || self.revision_index.has_uncommitted_changes()
            || self.value_index.has_uncommitted_changes()
    }

    /// Seals all trees as one new revision.
    pub(super) fn commit(&mut self, previous: Revision) -> Revision {
        let revision = self.records.commit();
        self.revision_index.commit();
        self.value_index.commit();
        self.previous_revisions.push(previous);
        revision
    }

    pub(super) fn rollback(&mut self) {
        self.records.rollback();
        self.revision_index.rollback();
        self.value_index.rollback();
    }
}

struct Shared {
    config: HistoryConfig,
    state: RwLock<ResourceState>,
    writer_active: AtomicBool,
}

/// Revisioned in-memory node store.
///
/// Cloning is cheap and yields another handle on the same resource.
#[derive(Clone)]
pub struct MemoryResource {
    shared: Arc<Shared>,
}

impl MemoryResource {
    /// Creates a resource whose revision 0 holds an empty document.
    pub fn new(config: HistoryConfig) -> Self {
        Event::ResourceCreated.log(&[(
            "revision_index",
            if config.revision_index_enabled { "enabled" } else { "disabled" },
        )]);

        Self {
            shared: Arc::new(Shared {
                config,
                state: RwLock::new(ResourceState::bootstrap()),
                writer_active: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the configuration the resource was created with
    pub fn config(&self) -> &HistoryConfig {
        &self.shared.config
    }

    /// Opens a read-only transaction positioned on the document root.
    pub fn begin_node_read_only_trx(
        &self,
        revision: Option<Revision>,
    ) -> HistoryResult<MemoryReadTrx> {
        MemoryReadTrx::open(self.clone(), revision)
    }

    /// Returns the most recent committed revision
    pub fn most_recent_revision_number(&self) -> HistoryResult<Revision> {
        Ok(self.read_state()?.most_recent_revision())
    }

    /// Opens the write transaction, failing if one is already open.
    pub fn begin_node_write_trx(&self) -> HistoryResult<MemoryWriteTrx> {
        self.shared
            .writer_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HistoryError::WriterActive)?;

        let base_revision = match self.most_recent_revision_number() {
            Ok(revision) => revision,
            Err(e) => {
                self.release_writer();
                return Err(e);
            }
        };
        Ok(MemoryWriteTrx::new(self.clone(), base_revision))
    }

    /// Returns true while a write transaction is open
    pub fn has_active_writer(&self) -> bool {
        self.shared.writer_active.load(Ordering::Acquire)
    }

    pub(super) fn read_state(&self) -> HistoryResult<RwLockReadGuard<'_, ResourceState>> {
        Ok(self.shared.state.read()?)
    }

    pub(super) fn write_state(&self) -> HistoryResult<RwLockWriteGuard<'_, ResourceState>> {
        Ok(self.shared.state.write()?)
    }

    pub(super) fn release_writer(&self) {
        self.shared.writer_active.store(false, Ordering::Release);
    }
}

impl ResourceSession for MemoryResource {
    type Trx = MemoryReadTrx;

    fn begin_node_read_only_trx(&self, revision: Option<Revision>) -> HistoryResult<MemoryReadTrx> {
        MemoryResource::begin_node_read_only_trx(self, revision)
    }

    fn most_recent_revision_number(&self) -> HistoryResult<Revision> {
        MemoryResource::most_recent_revision_number(self)
    }
}

/// Read-only cursor pinned to one committed revision.
pub struct MemoryReadTrx {
    resource: MemoryResource,
    revision: Revision,
    previous_revision: Revision,
    most_recent_revision: Revision,
    current: Option<Arc<NodeRecord>>,
    closed: bool,
}

impl MemoryReadTrx {
    fn open(resource: MemoryResource, revision: Option<Revision>) -> HistoryResult<Self> {
        let (revision, previous_revision, most_recent_revision, current) = {
            let state = resource.read_state()?;
            let most_recent = state.most_recent_revision();
            let revision = revision.unwrap_or(most_recent);
            state.check_revision(revision)?;

            let previous = state.previous_revisions[revision as usize];
            let root = state
                .records
                .lookup(&DOCUMENT_ROOT_KEY, revision)?
                .cloned()
                .ok_or_else(|| {
                    HistoryError::corrupt_index(DOCUMENT_ROOT_KEY, "document root missing")
                })?;
            (revision, previous, most_recent, root)
        };

        Ok(Self {
            resource,
            revision,
            previous_revision,
            most_recent_revision,
            current: Some(current),
            closed: false,
        })
    }

    /// Looks up the node keys stored under a value at this revision.
    pub fn find_value(&self, key: &IndexKey) -> HistoryResult<Option<IndexEntrySet>> {
        self.ensure_open()?;
        if !self.resource.config().value_index_enabled {
            return Ok(None);
        }
        let state = self.resource.read_state()?;
        Ok(state.value_index.lookup(key, self.revision)?.cloned())
    }

    /// Returns true once the transaction has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> HistoryResult<()> {
        if self.closed {
            return Err(HistoryError::invalid_operation("transaction is closed"));
        }
        Ok(())
    }
}

impl NodeReadOnlyTrx for MemoryReadTrx {
    type Session = MemoryResource;

    fn resource_session(&self) -> &MemoryResource {
        &self.resource
    }

    fn revision_number(&self) -> Revision {
        self.revision
    }

    fn most_recent_revision_number(&self) -> Revision {
        self.most_recent_revision
    }

    fn previous_revision_number(&self) -> Revision {
        self.previous_revision
    }

    fn move_to(&mut self, node_key: NodeKey) -> HistoryResult<bool> {
        self.ensure_open()?;
        let state = self.resource.read_state()?;
        match state.records.lookup(&node_key, self.revision)? {
            Some(record) => {
                self.current = Some(Arc::clone(record));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn node(&self) -> Option<ImmutableNode> {
        self.current.as_ref().map(|record| ImmutableNode::of(Arc::clone(record)))
    }

    fn node_key(&self) -> Option<NodeKey> {
        self.current.as_ref().map(|record| record.node_key())
    }

    fn get_record(
        &self,
        key: NodeKey,
        index_type: IndexType,
        index_slot: u32,
    ) -> HistoryResult<Option<IndexRecord>> {
        self.ensure_open()?;
        let config = self.resource.config();
        if index_type != IndexType::RecordToRevisions
            || !config.revision_index_enabled
            || index_slot != config.revision_index_slot
        {
            return Ok(None);
        }

        let state = self.resource.read_state()?;
        Ok(state
            .revision_index
            .lookup(&key, self.revision)?
            .cloned()
            .map(IndexRecord::Revisions))
    }

    fn close(&mut self) {
        self.closed = true;
        self.current = None;
    }
}

impl Drop for MemoryReadTrx {
    fn drop(&mut self) {
        self.close();
    }
}
