//! twin-map: one key-value `Map` contract, two interchangeable backends.
//!
//! Internal Design:
//!
//! Summary
//! - `Map<K, V>`: the capability trait every caller programs against:
//!   put/get/contains_key/len/remove/remove_if_eq/clear/keys.
//! - `ChainedHashTable<K, V, S, B>`: array of buckets, each an unordered
//!   chain of entries. Grows by doubling whenever an insertion pushes
//!   `len / buckets` above the configured maximum load factor.
//! - `Bucket<K, V>`: the chain storage trait. `Vec` is the default chain;
//!   `VecDeque` is also provided (`DequeChainedHashTable`).
//! - `BinarySearchTree<K, V>`: unbalanced BST over a node arena; deletion
//!   uses Hibbard's rule with the in-order successor.
//! - `Entry<K, V>`: the owned key-value pair both backends store.
//!
//! Constraints
//! - Single-threaded: both backends are `!Send`/`!Sync`.
//! - Absence is always `Option::None`; operations never fail. Only
//!   construction with malformed tunables returns `ConfigError`.
//! - Hash table: each key lives in `buckets[hash(k) mod bucket_count]`
//!   under the current bucket count; removal never shrinks the table.
//! - Tree: strict BST order, `len()` equals the nodes reachable from the
//!   root, no rebalancing (worst case O(n) per operation).
//!
//! Hashing and rehashing
//! - Each hash-table slot caches the `u64` hash computed on insertion. A
//!   resize redistributes slots by that cached hash, so `K: Hash` is never
//!   called while the table is being rebuilt.
//! - The max load factor is bounded below by `MIN_LOAD_FACTOR` (1/1024) at
//!   construction, and doubling uses checked arithmetic, so growth can
//!   neither overflow the bucket count nor ask for an absurd allocation.
//!
//! Tree storage
//! - Nodes sit in a `slotmap::SlotMap` and point at children by key. With
//!   no parent links there are no back-pointers to keep in sync, and every
//!   descent is a loop, so list-shaped trees do not recurse deeply.
//!
//! Reentrancy policy
//! - Both backends run user code (`Hash`, `Eq`, `Ord`, `PartialEq` on
//!   values) while locating an entry. A debug-only guard is held for that
//!   stretch; nested entry into the same map panics in debug builds.
//!   Removed values are handed back (or dropped) only after the structure
//!   is consistent again.
//!
//! Iteration
//! - Keys are derived on demand from the storage itself (bucket scan or
//!   in-order walk); there is no mirrored key set to go stale. Each call to
//!   `keys()` starts a fresh traversal. Tree order is ascending; hash table
//!   order is unspecified.
//!
//! ```
//! use twin_map::{BinarySearchTree, ChainedHashTable, Map};
//!
//! fn fill<M: Map<u32, &'static str>>(m: &mut M) {
//!     m.put(2, "two");
//!     m.put(1, "one");
//!     m.put(2, "deux");
//! }
//!
//! let mut tree = BinarySearchTree::new();
//! let mut table = ChainedHashTable::new();
//! fill(&mut tree);
//! fill(&mut table);
//! assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [1, 2]);
//! assert_eq!(Map::get(&table, &2), Some(&"deux"));
//! assert_eq!(Map::len(&table), 2);
//! ```

pub mod binary_search_tree;
mod binary_search_tree_proptest;
pub mod chained_hash_table;
mod chained_hash_table_proptest;
pub mod config;
mod entry;
mod error;
mod map;
mod reentrancy;

// Public surface
pub use binary_search_tree::BinarySearchTree;
pub use chained_hash_table::{Bucket, ChainedHashTable, DequeChainedHashTable, Slot};
pub use config::{TableConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_LOAD_FACTOR, MIN_LOAD_FACTOR};
pub use entry::Entry;
pub use error::ConfigError;
pub use map::Map;
