//! Scripted page-layer collaborator
//!
//! Lets tests state exactly which revisions exist, where each one's
//! previous-revision pointer leads, which nodes each revision contains and
//! what the node-to-revisions index answers. It also counts transaction
//! opens and closes so tests can check that nothing is held open.
//! Transactions are released only by an explicit `close()`; dropping one
//! leaves it counted as open.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use histdb::index::{IndexRecord, IndexType};
use histdb::node::{ImmutableNode, NodeKind, NodeRecord};
use histdb::trx::{NodeReadOnlyTrx, ResourceSession};
use histdb::{HistoryEntry, HistoryError, HistoryResult, NodeKey, Revision};

struct ScriptedRevision {
    previous: Revision,
    nodes: HashMap<NodeKey, Arc<NodeRecord>>,
}

#[derive(Default)]
struct Counters {
    opened: Cell<usize>,
    closed: Cell<usize>,
    open_now: Cell<usize>,
    max_open: Cell<usize>,
}

struct Script {
    revisions: Vec<ScriptedRevision>,
    index: HashMap<(NodeKey, u32), IndexRecord>,
    failing_moves: HashSet<Revision>,
    counters: Counters,
}

/// Builder for a [`ScriptedSession`].
pub struct ScriptBuilder {
    revisions: Vec<ScriptedRevision>,
    index: HashMap<(NodeKey, u32), IndexRecord>,
    failing_moves: HashSet<Revision>,
}

impl ScriptBuilder {
    /// Revisions 0..=most_recent, each pointing back to its predecessor.
    pub fn new(most_recent: Revision) -> Self {
        let revisions = (0..=most_recent)
            .map(|revision| ScriptedRevision {
                previous: revision.saturating_sub(1),
                nodes: HashMap::new(),
            })
            .collect();
        Self {
            revisions,
            index: HashMap::new(),
            failing_moves: HashSet::new(),
        }
    }

    /// Overrides the previous-revision pointer of `revision`.
    pub fn previous(mut self, revision: Revision, previous: Revision) -> Self {
        self.revisions[revision as usize].previous = previous;
        self
    }

    /// Makes `node_key` exist at each of `revisions`. The record's name key
    /// is set to the revision so views can be told apart.
    pub fn node_at(mut self, node_key: NodeKey, revisions: &[Revision]) -> Self {
        for &revision in revisions {
            let mut record = NodeRecord::new(node_key, NodeKind::Element, revision);
            record.set_name(Some(revision as i32), None);
            record.rehash();
            self.revisions[revision as usize]
                .nodes
                .insert(node_key, Arc::new(record));
        }
        self
    }

    /// Answers node-to-revisions lookups for `node_key` in slot 0.
    pub fn index(self, node_key: NodeKey, record: IndexRecord) -> Self {
        self.index_in_slot(node_key, 0, record)
    }

    pub fn index_in_slot(mut self, node_key: NodeKey, slot: u32, record: IndexRecord) -> Self {
        self.index.insert((node_key, slot), record);
        self
    }

    /// Makes every `move_to` at `revision` fail with a poisoned lock.
    pub fn fail_moves_at(mut self, revision: Revision) -> Self {
        self.failing_moves.insert(revision);
        self
    }

    pub fn build(self) -> ScriptedSession {
        ScriptedSession {
            script: Rc::new(Script {
                revisions: self.revisions,
                index: self.index,
                failing_moves: self.failing_moves,
                counters: Counters::default(),
            }),
        }
    }
}

/// Session over a fixed script of revisions.
#[derive(Clone)]
pub struct ScriptedSession {
    script: Rc<Script>,
}

impl ScriptedSession {
    fn most_recent(&self) -> Revision {
        (self.script.revisions.len() - 1) as Revision
    }

    /// Number of transactions opened so far
    pub fn opened(&self) -> usize {
        self.script.counters.opened.get()
    }

    /// Number of transactions closed so far
    pub fn closed(&self) -> usize {
        self.script.counters.closed.get()
    }

    /// Largest number of transactions open at the same time
    pub fn max_open(&self) -> usize {
        self.script.counters.max_open.get()
    }
}

impl ResourceSession for ScriptedSession {
    type Trx = ScriptedTrx;

    fn begin_node_read_only_trx(&self, revision: Option<Revision>) -> HistoryResult<ScriptedTrx> {
        let most_recent = self.most_recent();
        let revision = revision.unwrap_or(most_recent);
        if revision > most_recent {
            return Err(HistoryError::RevisionNotFound {
                revision,
                most_recent,
            });
        }

        let counters = &self.script.counters;
        counters.opened.set(counters.opened.get() + 1);
        counters.open_now.set(counters.open_now.get() + 1);
        counters
            .max_open
            .set(counters.max_open.get().max(counters.open_now.get()));

        Ok(ScriptedTrx {
            session: self.clone(),
            revision,
            current: None,
            closed: false,
        })
    }

    fn most_recent_revision_number(&self) -> HistoryResult<Revision> {
        Ok(self.most_recent())
    }
}

/// Transaction over one scripted revision.
pub struct ScriptedTrx {
    session: ScriptedSession,
    revision: Revision,
    current: Option<Arc<NodeRecord>>,
    closed: bool,
}

impl ScriptedTrx {
    fn scripted(&self) -> &ScriptedRevision {
        &self.session.script.revisions[self.revision as usize]
    }
}

impl NodeReadOnlyTrx for ScriptedTrx {
    type Session = ScriptedSession;

    fn resource_session(&self) -> &ScriptedSession {
        &self.session
    }

    fn revision_number(&self) -> Revision {
        self.revision
    }

    fn most_recent_revision_number(&self) -> Revision {
        self.session.most_recent()
    }

    fn previous_revision_number(&self) -> Revision {
        self.scripted().previous
    }

    fn move_to(&mut self, node_key: NodeKey) -> HistoryResult<bool> {
        if self.session.script.failing_moves.contains(&self.revision) {
            return Err(HistoryError::LockPoisoned);
        }
        let found = self.scripted().nodes.get(&node_key).cloned();
        match found {
            Some(record) => {
                self.current = Some(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn node(&self) -> Option<ImmutableNode> {
        self.current.clone().map(ImmutableNode::of)
    }

    fn get_record(
        &self,
        key: NodeKey,
        index_type: IndexType,
        index_slot: u32,
    ) -> HistoryResult<Option<IndexRecord>> {
        if index_type != IndexType::RecordToRevisions {
            return Ok(None);
        }
        Ok(self.session.script.index.get(&(key, index_slot)).cloned())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let counters = &self.session.script.counters;
        counters.closed.set(counters.closed.get() + 1);
        counters.open_now.set(counters.open_now.get() - 1);
    }
}

/// Revision of every entry, in order
pub fn revisions(entries: &[HistoryEntry]) -> Vec<Revision> {
    entries.iter().map(HistoryEntry::revision).collect()
}
