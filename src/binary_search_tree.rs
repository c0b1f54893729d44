//! BinarySearchTree: unbalanced ordered map with Hibbard deletion.
//!
//! Nodes live in a `SlotMap` arena and refer to their children by
//! `NodeId`; there are no parent links. Every descent is iterative, so a
//! degenerate (list-shaped) tree costs O(n) time per operation but never
//! deep recursion.

use crate::entry::Entry;
use crate::map::Map;
use crate::reentrancy::ReentryCheck;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use log::{debug, trace};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena index of a tree node.
    struct NodeId;
}

#[derive(Debug)]
struct Node<K, V> {
    entry: Entry<K, V>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

// Where a subtree hangs: the root slot, or a child slot of some node.
#[derive(Copy, Clone, Debug)]
enum Link {
    Root,
    Left(NodeId),
    Right(NodeId),
}

/// Ordered map backed by a binary search tree with no rebalancing.
///
/// For every node, keys in its left subtree compare less and keys in its
/// right subtree compare greater. Keys and `iter()` come out ascending.
pub struct BinarySearchTree<K, V> {
    nodes: SlotMap<NodeId, Node<K, V>>,
    root: Option<NodeId>,
    reentrancy: ReentryCheck,
}

impl<K, V> BinarySearchTree<K, V>
where
    K: Ord,
{
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            reentrancy: ReentryCheck::new(),
        }
    }

    /// Number of nodes; always equals the count reachable from the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn child(&self, link: Link) -> Option<NodeId> {
        match link {
            Link::Root => self.root,
            Link::Left(p) => self.nodes[p].left,
            Link::Right(p) => self.nodes[p].right,
        }
    }

    fn set_child(&mut self, link: Link, to: Option<NodeId>) {
        match link {
            Link::Root => self.root = to,
            Link::Left(p) => self.nodes[p].left = to,
            Link::Right(p) => self.nodes[p].right = to,
        }
    }

    // Walk down from the root comparing against `q`. Returns the slot where
    // `q` lives (or would be attached) and the node in it, if any.
    fn search<Q>(&self, q: &Q) -> (Link, Option<NodeId>)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut link = Link::Root;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.nodes[id];
            match q.cmp(node.entry.key().borrow()) {
                Ordering::Equal => break,
                Ordering::Less => {
                    link = Link::Left(id);
                    cur = node.left;
                }
                Ordering::Greater => {
                    link = Link::Right(id);
                    cur = node.right;
                }
            }
        }
        (link, cur)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter();
        let id = self.search(q).1?;
        Some(self.nodes[id].entry.value())
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let found = {
            let _g = self.reentrancy.enter();
            self.search(q).1
        };
        Some(self.nodes[found?].entry.value_mut())
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter();
        self.search(q).1.is_some()
    }

    /// Insert or replace; returns the replaced value. A new key is attached
    /// as a leaf where the search for it fell off the tree.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter();
        match self.search(&key) {
            (_, Some(id)) => Some(self.nodes[id].entry.replace_value(value)),
            (link, None) => {
                let id = self.nodes.insert(Node {
                    entry: Entry::new(key, value),
                    left: None,
                    right: None,
                });
                match link {
                    Link::Root => self.root = Some(id),
                    Link::Left(p) => self.nodes[p].left = Some(id),
                    Link::Right(p) => self.nodes[p].right = Some(id),
                }
                None
            }
        }
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (link, found) = {
            let _g = self.reentrancy.enter();
            self.search(q)
        };
        Some(self.unlink(link, found?).into_parts())
    }

    /// Remove `q` only when its stored value equals `expected`.
    pub fn remove_if_eq<Q>(&mut self, q: &Q, expected: &V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
        V: PartialEq,
    {
        let (link, id) = {
            let _g = self.reentrancy.enter();
            let (link, found) = self.search(q);
            let id = found?;
            if self.nodes[id].entry.value() != expected {
                return None;
            }
            (link, id)
        };
        Some(self.unlink(link, id).into_parts().1)
    }

    // Hibbard deletion of node `id`, currently hanging from `link`. Runs no
    // user code, so callers release the reentrancy guard before calling.
    // No right child: the left subtree takes its place. No left child: the
    // right subtree does. Both: the minimum of the right subtree (the
    // in-order successor) is detached and takes over both children.
    fn unlink(&mut self, link: Link, id: NodeId) -> Entry<K, V> {
        debug_assert_eq!(self.child(link), Some(id));
        let (left, right) = (self.nodes[id].left, self.nodes[id].right);
        let replacement = match (left, right) {
            (_, None) => {
                trace!("bst remove: no right child, promoting left subtree");
                left
            }
            (None, Some(_)) => {
                trace!("bst remove: no left child, promoting right subtree");
                right
            }
            (Some(_), Some(r)) => {
                trace!("bst remove: two children, promoting in-order successor");
                let (rest, successor) = self.detach_min(r);
                let s = &mut self.nodes[successor];
                s.left = left;
                s.right = rest;
                Some(successor)
            }
        };
        self.set_child(link, replacement);
        self.nodes
            .remove(id)
            .expect("unlinked node must still be in the arena")
            .entry
    }

    // Remove the leftmost node of the subtree rooted at `top`. It has no left
    // child, so its right subtree takes its slot. Returns the new subtree
    // root and the detached node (still allocated in the arena).
    fn detach_min(&mut self, top: NodeId) -> (Option<NodeId>, NodeId) {
        let mut parent = None;
        let mut min = top;
        while let Some(l) = self.nodes[min].left {
            parent = Some(min);
            min = l;
        }
        let orphan = self.nodes[min].right.take();
        match parent {
            None => (orphan, min),
            Some(p) => {
                self.nodes[p].left = orphan;
                (Some(top), min)
            }
        }
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        let old = {
            let _g = self.reentrancy.enter();
            debug!("clearing binary search tree ({} nodes)", self.nodes.len());
            self.root = None;
            core::mem::replace(&mut self.nodes, SlotMap::with_key())
        };
        // Entries drop after the tree is consistent again.
        drop(old);
    }

    /// Number of nodes on the longest root-to-leaf path; 0 when empty.
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let node = &self.nodes[id];
            stack.extend(node.left.map(|c| (c, depth + 1)));
            stack.extend(node.right.map(|c| (c, depth + 1)));
        }
        deepest
    }

    /// In-order (ascending) iteration over `(key, value)` pairs.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut it = Iter {
            nodes: &self.nodes,
            stack: Vec::new(),
            remaining: self.nodes.len(),
        };
        it.push_left_spine(self.root);
        it
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        // Every arena node is reachable exactly once, and the in-order walk
        // is strictly ascending.
        let mut seen = 0usize;
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            seen += 1;
            assert!(seen <= self.nodes.len(), "cycle or shared child detected");
            let node = &self.nodes[id];
            stack.extend(node.left);
            stack.extend(node.right);
        }
        assert_eq!(seen, self.nodes.len(), "unreachable nodes left in arena");
        let keys: Vec<&K> = self.keys().collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "in-order walk not strictly ascending");
    }
}

impl<K, V> Default for BinarySearchTree<K, V>
where
    K: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over `(key, value)` pairs.
pub struct Iter<'a, K, V> {
    nodes: &'a SlotMap<NodeId, Node<K, V>>,
    stack: Vec<NodeId>,
    remaining: usize,
}

impl<K, V> Iter<'_, K, V> {
    fn push_left_spine(&mut self, mut cur: Option<NodeId>) {
        while let Some(id) = cur {
            self.stack.push(id);
            cur = self.nodes[id].left;
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let nodes = self.nodes;
        let node = &nodes[id];
        self.push_left_spine(node.right);
        self.remaining -= 1;
        Some(node.entry.as_pair())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

/// Keys in ascending order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a BinarySearchTree<K, V>
where
    K: Ord,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Extend<(K, V)> for BinarySearchTree<K, V>
where
    K: Ord,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for BinarySearchTree<K, V>
where
    K: Ord,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

/// Prints entries in ascending key order.
impl<K, V> fmt::Debug for BinarySearchTree<K, V>
where
    K: fmt::Debug + Ord,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Map<K, V> for BinarySearchTree<K, V>
where
    K: Ord,
{
    type Keys<'a>
        = Keys<'a, K, V>
    where
        Self: 'a,
        K: 'a;

    fn put(&mut self, key: K, value: V) -> Option<V> {
        BinarySearchTree::put(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        BinarySearchTree::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        BinarySearchTree::get_mut(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        BinarySearchTree::contains_key(self, key)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        BinarySearchTree::remove(self, key)
    }

    fn remove_if_eq(&mut self, key: &K, expected: &V) -> Option<V>
    where
        V: PartialEq,
    {
        BinarySearchTree::remove_if_eq(self, key, expected)
    }

    fn clear(&mut self) {
        BinarySearchTree::clear(self)
    }

    fn keys(&self) -> Self::Keys<'_> {
        BinarySearchTree::keys(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .is_test(true)
            .try_init();
    }

    fn tree_of(keys: &[i32]) -> BinarySearchTree<i32, i32> {
        let mut t = BinarySearchTree::new();
        for &k in keys {
            t.put(k, k * 10);
        }
        t
    }

    fn in_order(t: &BinarySearchTree<i32, i32>) -> Vec<i32> {
        t.keys().copied().collect()
    }

    // Structure as (key, left key, right key), in-order.
    fn shape(t: &BinarySearchTree<i32, i32>) -> Vec<(i32, Option<i32>, Option<i32>)> {
        let key_of = |c: Option<NodeId>| c.map(|c| *t.nodes[c].entry.key());
        let mut out: Vec<_> = t
            .nodes
            .values()
            .map(|n| (*n.entry.key(), key_of(n.left), key_of(n.right)))
            .collect();
        out.sort();
        out
    }

    /// Insert 8,6,10,2,7,9,13,11,12; remove 2,7,9 then 13,11; reinsert 2,7 and
    /// remove 6. The in-order walk matches at every stage.
    #[test]
    fn deletion_stress_sequence() {
        init_test_logger();
        let mut t = tree_of(&[8, 6, 10, 2, 7, 9, 13, 11, 12]);
        t.check_invariants();
        for k in [2, 7, 9] {
            assert_eq!(t.remove(&k), Some(k * 10));
            t.check_invariants();
        }
        assert_eq!(in_order(&t), vec![6, 8, 10, 11, 12, 13]);
        for k in [13, 11] {
            assert_eq!(t.remove(&k), Some(k * 10));
            t.check_invariants();
        }
        assert_eq!(in_order(&t), vec![6, 8, 10, 12]);
        t.put(2, 20);
        t.put(7, 70);
        assert_eq!(t.remove(&6), Some(60));
        t.check_invariants();
        assert_eq!(in_order(&t), vec![2, 7, 8, 10, 12]);
        assert_eq!(t.len(), 5);
    }

    /// Invariant: a two-child node is replaced by its in-order successor, which
    /// inherits the left child and the right subtree minus itself.
    #[test]
    fn two_child_removal_promotes_successor() {
        //        8
        //      /   \
        //     4     12
        //          /  \
        //        10    14
        //          \
        //           11
        let mut t = tree_of(&[8, 4, 12, 10, 14, 11]);
        assert_eq!(t.remove(&8), Some(80));
        let root = t.root.map(|r| *t.nodes[r].entry.key());
        assert_eq!(root, Some(10));
        assert_eq!(
            shape(&t),
            vec![
                (4, None, None),
                (10, Some(4), Some(12)),
                (11, None, None),
                (12, Some(11), Some(14)),
                (14, None, None),
            ]
        );
        t.check_invariants();
    }

    /// Invariant: when the successor is the right child itself, it keeps its
    /// own right subtree and adopts the removed node's left child.
    #[test]
    fn successor_is_immediate_right_child() {
        let mut t = tree_of(&[8, 6, 2, 10, 12]);
        assert_eq!(t.remove_if_eq(&8, &80), Some(80));
        assert_eq!(
            shape(&t),
            vec![
                (2, None, None),
                (6, Some(2), None),
                (10, Some(6), Some(12)),
                (12, None, None),
            ]
        );
        t.check_invariants();
    }

    /// Invariant: single-child and leaf removals splice the child into the
    /// parent's slot, including at the root.
    #[test]
    fn single_child_and_leaf_removals() {
        let mut t = tree_of(&[5, 3, 1]);
        assert_eq!(t.remove(&5), Some(50)); // root with only a left child
        assert_eq!(t.root.map(|r| *t.nodes[r].entry.key()), Some(3));
        assert_eq!(t.remove(&1), Some(10)); // leaf
        assert_eq!(t.remove(&3), Some(30)); // lone root
        assert!(t.is_empty());
        assert_eq!(t.height(), 0);

        let mut t = tree_of(&[5, 7, 9]);
        assert_eq!(t.remove(&7), Some(70)); // only a right child
        assert_eq!(shape(&t), vec![(5, None, Some(9)), (9, None, None)]);
        t.check_invariants();
    }

    /// Invariant: removing an absent key changes nothing.
    #[test]
    fn remove_absent_is_noop() {
        let mut t = tree_of(&[2, 1, 3]);
        assert_eq!(t.remove(&4), None);
        assert_eq!(t.len(), 3);
        assert_eq!(BinarySearchTree::<i32, i32>::new().remove(&1), None);
    }

    /// Invariant: conditional removal compares by value equality and leaves
    /// the tree untouched on mismatch.
    #[test]
    fn remove_if_eq_mismatch_is_noop() {
        let mut t = tree_of(&[8]);
        assert_eq!(t.remove_if_eq(&8, &70), None);
        assert_eq!(t.len(), 1);
        assert_eq!(t.remove_if_eq(&8, &80), Some(80));
        assert!(t.is_empty());
        assert_eq!(t.remove_if_eq(&8, &80), None);
    }

    /// Invariant: put on an existing key replaces the value without adding a node.
    #[test]
    fn put_existing_key_replaces_value() {
        let mut t: BinarySearchTree<String, i32> = BinarySearchTree::new();
        assert_eq!(t.put("starChild".into(), 5), None);
        assert_eq!(t.put("KISS".into(), 5), None);
        assert_eq!(t.put("starChild".into(), 6), Some(5));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("starChild"), Some(&6));
        *t.get_mut("KISS").unwrap() += 1;
        assert_eq!(t.get("KISS"), Some(&6));
    }

    /// Invariant: a key holding an absent-marker value still counts as present.
    #[test]
    fn none_value_is_present() {
        let mut t: BinarySearchTree<&str, Option<i32>> = BinarySearchTree::new();
        t.put("hi", None);
        assert!(t.contains_key("hi"));
        assert_eq!(t.get("hi"), Some(&None));
    }

    /// Invariant: sorted insertion degenerates into a list; iterative descent
    /// and deletion still work without exhausting the stack.
    #[test]
    fn degenerate_tree_is_handled_iteratively() {
        let n = 5_000;
        let mut t: BinarySearchTree<u32, ()> = (0..n).map(|k| (k, ())).collect();
        assert_eq!(t.height(), n as usize);
        assert!(t.contains_key(&(n - 1)));
        assert_eq!(t.keys().len(), n as usize);
        assert_eq!(t.remove(&(n - 1)), Some(()));
        assert_eq!(t.remove(&0), Some(()));
        assert_eq!(t.len(), n as usize - 2);
        t.clear();
        assert!(t.is_empty());
    }

    /// Invariant: clear drops every node; the tree is usable afterwards.
    #[test]
    fn clear_then_reuse() {
        let mut t: BinarySearchTree<String, usize> = BinarySearchTree::new();
        for i in 0..455 {
            t.put(format!("hi{i}"), i + 1);
            assert_eq!(t.get(format!("hi{i}").as_str()), Some(&(i + 1)));
        }
        assert_eq!(t.len(), 455);
        t.clear();
        assert_eq!(t.len(), 0);
        for i in 0..455 {
            assert!(!t.contains_key(format!("hi{i}").as_str()));
        }
        t.put("again".into(), 1);
        t.check_invariants();
    }

    /// Invariant: iteration and Debug output are ascending by key.
    #[test]
    fn iteration_is_ascending() {
        let t: BinarySearchTree<&str, i32> = [
            ("banana", 1),
            ("apple", 10),
            ("orange", 3),
            ("watermelon", 50),
            ("strawberry", 100),
        ]
        .into_iter()
        .collect();
        let keys: Vec<_> = t.keys().copied().collect();
        assert_eq!(keys, ["apple", "banana", "orange", "strawberry", "watermelon"]);
        assert_eq!(t.values().copied().collect::<Vec<_>>(), [10, 1, 3, 100, 50]);
        assert_eq!(
            format!("{t:?}"),
            r#"{"apple": 10, "banana": 1, "orange": 3, "strawberry": 100, "watermelon": 50}"#
        );
        let mut keys = t.keys();
        keys.next();
        let rest = keys.clone();
        assert_eq!(rest.len(), 4);
        assert_eq!(keys.collect::<Vec<_>>(), rest.collect::<Vec<_>>());
    }

    /// Invariant (debug-only): re-entering the tree from `K: Ord` during a
    /// descent panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_ord_during_get() {
        struct ReentryKey {
            id: u32,
            map: *const BinarySearchTree<ReentryKey, i32>,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }
        impl Eq for ReentryKey {}
        impl PartialOrd for ReentryKey {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for ReentryKey {
            fn cmp(&self, other: &Self) -> Ordering {
                if !self.map.is_null() {
                    // Look up the same tree from inside its own descent.
                    unsafe {
                        let m = &*self.map;
                        let _ = m.contains_key(other);
                    }
                }
                self.id.cmp(&other.id)
            }
        }

        let mut t: BinarySearchTree<ReentryKey, i32> = BinarySearchTree::new();
        t.put(
            ReentryKey {
                id: 1,
                map: core::ptr::null(),
            },
            1,
        );
        let query = ReentryKey {
            id: 2,
            map: &t as *const _,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.get(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
