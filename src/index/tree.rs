//! Persistent red-black index tree
//!
//! Every committed revision keeps the handle of its own root. Updates never
//! touch an existing node: insertion and removal allocate fresh nodes along
//! the root-to-leaf path they modify and reuse every other subtree, so the
//! tree of an older revision stays intact and readable without replay.
//!
//! Nodes live in an arena and are addressed by integer handles. Entries are
//! reference counted, so recolouring a node on the copied path shares the
//! key and value with the node it replaces.
//!
//! Balancing follows the functional red-black formulation: Okasaki's
//! insertion and Kahrs' deletion.

use std::cmp::Ordering;
use std::sync::Arc;

use super::errors::{IndexError, IndexResult};
use crate::Revision;

/// Stable handle of a node inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeHandle(usize);

type Link = Option<NodeHandle>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug)]
struct TreeNode<K, V> {
    color: Color,
    left: Link,
    right: Link,
    entry: Arc<(K, V)>,
}

/// Node fields copied out of the arena before allocating replacements.
type Parts<K, V> = (Color, Link, Arc<(K, V)>, Link);

/// Persistent balanced search tree with revision-scoped visibility.
///
/// Revision 0 is committed on construction and holds no entries. Writes
/// apply to the working (uncommitted) revision only; `commit` seals it.
/// Only a single writer may hold `&mut self`, while any number of readers
/// can look up committed revisions through `&self`.
#[derive(Debug)]
pub struct VersionedIndexTree<K, V> {
    /// All nodes ever allocated, committed ones are never mutated
    arena: Vec<TreeNode<K, V>>,
    /// Root of every committed revision, indexed by revision number
    roots: Vec<Link>,
    /// Root of the working revision
    working_root: Link,
    /// Arena length at the last commit; nodes past it are uncommitted
    committed_len: usize,
}

impl<K: Ord, V> Default for VersionedIndexTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> VersionedIndexTree<K, V> {
    /// Creates a tree whose revision 0 is committed and empty.
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            roots: vec![None],
            working_root: None,
            committed_len: 0,
        }
    }

    /// Creates a tree whose committed revision 0 already holds `entries`.
    pub fn with_initial<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut tree = Self::new();
        for (key, value) in entries {
            tree.insert_or_update(key, value);
        }
        tree.roots[0] = tree.working_root;
        tree.committed_len = tree.arena.len();
        tree
    }

    /// Returns the most recent committed revision
    pub fn most_recent_revision(&self) -> Revision {
        (self.roots.len() - 1) as Revision
    }

    /// Returns the revision the next commit will produce
    pub fn working_revision(&self) -> Revision {
        self.roots.len() as Revision
    }

    /// Returns the number of arena nodes, including superseded path copies
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// Returns true if the working revision differs from the last commit
    pub fn has_uncommitted_changes(&self) -> bool {
        self.working_root != self.roots[self.roots.len() - 1]
    }

    /// Looks up the value visible at a committed revision.
    ///
    /// Fails if the revision was never committed.
    pub fn lookup(&self, key: &K, revision: Revision) -> IndexResult<Option<&V>> {
        let root = self.root_at(revision)?;
        Ok(self.search(root, key))
    }

    /// Looks up the value in the working revision.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.search(self.working_root, key)
    }

    /// Returns true if the working revision holds the key
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces the value for a key in the working revision.
    pub fn insert_or_update(&mut self, key: K, value: V) {
        let entry = Arc::new((key, value));
        let root = self.ins(self.working_root, &entry);
        self.working_root = Some(self.blacken(root));
    }

    /// Removes a key from the working revision, returning whether it was
    /// present. An absent key allocates nothing.
    pub fn remove(&mut self, key: &K) -> bool {
        if self.get(key).is_none() {
            return false;
        }
        self.working_root = match self.del(self.working_root, key) {
            Some(root) => Some(self.blacken(root)),
            None => None,
        };
        true
    }

    /// Seals the working revision and returns its number.
    pub fn commit(&mut self) -> Revision {
        self.roots.push(self.working_root);
        self.committed_len = self.arena.len();
        self.most_recent_revision()
    }

    /// Discards every uncommitted change.
    pub fn rollback(&mut self) {
        self.arena.truncate(self.committed_len);
        self.working_root = self.roots[self.roots.len() - 1];
    }

    /// Discards uncommitted changes and restarts the working revision from
    /// the tree of an older committed revision.
    pub fn revert_to(&mut self, revision: Revision) -> IndexResult<()> {
        let root = self.root_at(revision)?;
        self.arena.truncate(self.committed_len);
        self.working_root = root;
        Ok(())
    }

    /// Iterates the entries live at a committed revision in key order.
    pub fn iter_at(&self, revision: Revision) -> IndexResult<Iter<'_, K, V>> {
        let root = self.root_at(revision)?;
        Ok(Iter::new(self, root))
    }

    /// Returns the number of keys live at a committed revision
    pub fn len_at(&self, revision: Revision) -> IndexResult<usize> {
        Ok(self.iter_at(revision)?.count())
    }

    fn root_at(&self, revision: Revision) -> IndexResult<Link> {
        self.roots
            .get(revision as usize)
            .copied()
            .ok_or(IndexError::RevisionNotFound {
                revision,
                most_recent: self.most_recent_revision(),
            })
    }

    fn search(&self, mut link: Link, key: &K) -> Option<&V> {
        while let Some(handle) = link {
            let node = self.node(handle);
            match key.cmp(&node.entry.0) {
                Ordering::Less => link = node.left,
                Ordering::Greater => link = node.right,
                Ordering::Equal => return Some(&node.entry.1),
            }
        }
        None
    }

    // ==================================================================
    // Arena access
    // ==================================================================

    #[inline]
    fn node(&self, handle: NodeHandle) -> &TreeNode<K, V> {
        &self.arena[handle.0]
    }

    fn parts(&self, handle: NodeHandle) -> Parts<K, V> {
        let node = self.node(handle);
        (node.color, node.left, Arc::clone(&node.entry), node.right)
    }

    fn alloc(&mut self, color: Color, left: Link, entry: Arc<(K, V)>, right: Link) -> NodeHandle {
        let handle = NodeHandle(self.arena.len());
        self.arena.push(TreeNode {
            color,
            left,
            right,
            entry,
        });
        handle
    }

    /// Returns the handle if the link is a red node
    fn red(&self, link: Link) -> Option<NodeHandle> {
        link.filter(|h| self.node(*h).color == Color::Red)
    }

    /// Returns the handle if the link is a black node
    fn black(&self, link: Link) -> Option<NodeHandle> {
        link.filter(|h| self.node(*h).color == Color::Black)
    }

    fn blacken(&mut self, handle: NodeHandle) -> NodeHandle {
        let (color, left, entry, right) = self.parts(handle);
        match color {
            Color::Black => handle,
            Color::Red => self.alloc(Color::Black, left, entry, right),
        }
    }

    // ==================================================================
    // Insertion
    // ==================================================================

    fn ins(&mut self, link: Link, entry: &Arc<(K, V)>) -> NodeHandle {
        let Some(handle) = link else {
            return self.alloc(Color::Red, None, Arc::clone(entry), None);
        };
        let (color, left, current, right) = self.parts(handle);

        match entry.0.cmp(&current.0) {
            Ordering::Less => {
                let new_left = Some(self.ins(left, entry));
                match color {
                    Color::Black => self.balance(new_left, current, right),
                    Color::Red => self.alloc(Color::Red, new_left, current, right),
                }
            }
            Ordering::Greater => {
                let new_right = Some(self.ins(right, entry));
                match color {
                    Color::Black => self.balance(left, current, new_right),
                    Color::Red => self.alloc(Color::Red, left, current, new_right),
                }
            }
            Ordering::Equal => self.alloc(color, left, Arc::clone(entry), right),
        }
    }

    /// Builds a black node from `left`, `entry`, `right`, repairing a red
    /// child with a red child below it.
    fn balance(&mut self, left: Link, entry: Arc<(K, V)>, right: Link) -> NodeHandle {
        if let (Some(l), Some(r)) = (self.red(left), self.red(right)) {
            let (_, a, x, b) = self.parts(l);
            let (_, c, z, d) = self.parts(r);
            let new_left = self.alloc(Color::Black, a, x, b);
            let new_right = self.alloc(Color::Black, c, z, d);
            return self.alloc(Color::Red, Some(new_left), entry, Some(new_right));
        }

        if let Some(l) = self.red(left) {
            let (_, ll, lx, lr) = self.parts(l);
            if let Some(ll) = self.red(ll) {
                let (_, a, x, b) = self.parts(ll);
                let new_left = self.alloc(Color::Black, a, x, b);
                let new_right = self.alloc(Color::Black, lr, entry, right);
                return self.alloc(Color::Red, Some(new_left), lx, Some(new_right));
            }
            if let Some(lr) = self.red(lr) {
                let (_, b, y, c) = self.parts(lr);
                let new_left = self.alloc(Color::Black, ll, lx, b);
                let new_right = self.alloc(Color::Black, c, entry, right);
                return self.alloc(Color::Red, Some(new_left), y, Some(new_right));
            }
        }

        if let Some(r) = self.red(right) {
            let (_, rl, rz, rr) = self.parts(r);
            if let Some(rr) = self.red(rr) {
                let (_, c, z, d) = self.parts(rr);
                let new_left = self.alloc(Color::Black, left, entry, rl);
                let new_right = self.alloc(Color::Black, c, z, d);
                return self.alloc(Color::Red, Some(new_left), rz, Some(new_right));
            }
            if let Some(rl) = self.red(rl) {
                let (_, b, y, c) = self.parts(rl);
                let new_left = self.alloc(Color::Black, left, entry, b);
                let new_right = self.alloc(Color::Black, c, rz, rr);
                return self.alloc(Color::Red, Some(new_left), y, Some(new_right));
            }
        }

        self.alloc(Color::Black, left, entry, right)
    }

    // ==================================================================
    // Removal
    // ==================================================================

    fn del(&mut self, link: Link, key: &K) -> Link {
        let handle = link?;
        let (_, left, entry, right) = self.parts(handle);

        match key.cmp(&entry.0) {
            Ordering::Less => {
                if self.black(left).is_some() {
                    let new_left = self.del(left, key);
                    Some(self.bal_left(new_left, entry, right))
                } else {
                    let new_left = self.del(left, key);
                    Some(self.alloc(Color::Red, new_left, entry, right))
                }
            }
            Ordering::Greater => {
                if self.black(right).is_some() {
                    let new_right = self.del(right, key);
                    Some(self.bal_right(left, entry, new_right))
                } else {
                    let new_right = self.del(right, key);
                    Some(self.alloc(Color::Red, left, entry, new_right))
                }
            }
            Ordering::Equal => self.fuse(left, right),
        }
    }

    /// Rebalances after the left subtree lost one black level.
    fn bal_left(&mut self, left: Link, entry: Arc<(K, V)>, right: Link) -> NodeHandle {
        if let Some(l) = self.red(left) {
            let (_, a, x, b) = self.parts(l);
            let new_left = self.alloc(Color::Black, a, x, b);
            return self.alloc(Color::Red, Some(new_left), entry, right);
        }
        if let Some(r) = self.black(right) {
            let (_, a, y, b) = self.parts(r);
            let new_right = self.alloc(Color::Red, a, y, b);
            return self.balance(left, entry, Some(new_right));
        }
        if let Some(r) = self.red(right) {
            let (_, rl, z, c) = self.parts(r);
            if let Some(rl) = self.black(rl) {
                let (_, a, y, b) = self.parts(rl);
                let new_left = self.alloc(Color::Black, left, entry, a);
                let c = Some(self.redden(c));
                let new_right = self.balance(b, z, c);
                return self.alloc(Color::Red, Some(new_left), y, Some(new_right));
            }
        }
        unreachable!("red-black invariant violated while rebalancing left")
    }

    /// Rebalances after the right subtree lost one black level.
    fn bal_right(&mut self, left: Link, entry: Arc<(K, V)>, right: Link) -> NodeHandle {
        if let Some(r) = self.red(right) {
            let (_, b, y, c) = self.parts(r);
            let new_right = self.alloc(Color::Black, b, y, c);
            return self.alloc(Color::Red, left, entry, Some(new_right));
        }
        if let Some(l) = self.black(left) {
            let (_, a, x, b) = self.parts(l);
            let new_left = self.alloc(Color::Red, a, x, b);
            return self.balance(Some(new_left), entry, right);
        }
        if let Some(l) = self.red(left) {
            let (_, a, x, lr) = self.parts(l);
            if let Some(lr) = self.black(lr) {
                let (_, b, y, c) = self.parts(lr);
                let a = Some(self.redden(a));
                let new_left = self.balance(a, x, b);
                let new_right = self.alloc(Color::Black, c, entry, right);
                return self.alloc(Color::Red, Some(new_left), y, Some(new_right));
            }
        }
        unreachable!("red-black invariant violated while rebalancing right")
    }

    /// Turns a black node red; only ever applied to black nodes.
    fn redden(&mut self, link: Link) -> NodeHandle {
        match self.black(link) {
            Some(handle) => {
                let (_, left, entry, right) = self.parts(handle);
                self.alloc(Color::Red, left, entry, right)
            }
            None => unreachable!("red-black invariant violated: expected a black node"),
        }
    }

    /// Joins the two subtrees of a removed node.
    fn fuse(&mut self, left: Link, right: Link) -> Link {
        let (Some(l), Some(r)) = (left, right) else {
            return left.or(right);
        };
        let (lc, a, x, b) = self.parts(l);
        let (rc, c, y, d) = self.parts(r);

        match (lc, rc) {
            (Color::Red, Color::Red) => {
                let bc = self.fuse(b, c);
                if let Some(m) = self.red(bc) {
                    let (_, b2, z, c2) = self.parts(m);
                    let new_left = self.alloc(Color::Red, a, x, b2);
                    let new_right = self.alloc(Color::Red, c2, y, d);
                    Some(self.alloc(Color::Red, Some(new_left), z, Some(new_right)))
                } else {
                    let new_right = self.alloc(Color::Red, bc, y, d);
                    Some(self.alloc(Color::Red, a, x, Some(new_right)))
                }
            }
            (Color::Black, Color::Black) => {
                let bc = self.fuse(b, c);
                if let Some(m) = self.red(bc) {
                    let (_, b2, z, c2) = self.parts(m);
                    let new_left = self.alloc(Color::Black, a, x, b2);
                    let new_right = self.alloc(Color::Black, c2, y, d);
                    Some(self.alloc(Color::Red, Some(new_left), z, Some(new_right)))
                } else {
                    let new_right = self.alloc(Color::Black, bc, y, d);
                    Some(self.bal_left(a, x, Some(new_right)))
                }
            }
            (Color::Black, Color::Red) => {
                let new_left = self.fuse(left, c);
                Some(self.alloc(Color::Red, new_left, y, d))
            }
            (Color::Red, Color::Black) => {
                let new_right = self.fuse(b, right);
                Some(self.alloc(Color::Red, a, x, new_right))
            }
        }
    }
}

/// In-order iterator over the entries of one committed revision.
pub struct Iter<'a, K, V> {
    tree: &'a VersionedIndexTree<K, V>,
    stack: Vec<NodeHandle>,
}

impl<'a, K: Ord, V> Iter<'a, K, V> {
    fn new(tree: &'a VersionedIndexTree<K, V>, root: Link) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
        };
        iter.push_left(root);
        iter
    }

    fn push_left(&mut self, mut link: Link) {
        while let Some(handle) = link {
            self.stack.push(handle);
            link = self.tree.node(handle).left;
        }
    }
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.stack.pop()?;
        let tree = self.tree;
        let node = tree.node(handle);
        self.push_left(node.right);
        Some((&node.entry.0, &node.entry.1))
    }
}
