//! Map: the capability contract shared by both backends.

/// Key-value associative container.
///
/// Absence is always reported as `None`; no operation fails once a map has
/// been constructed. A key mapped to a value that itself means "nothing"
/// (e.g. `V = Option<T>` holding `None`) is still present.
///
/// Iteration order is backend-defined: ascending for
/// [`BinarySearchTree`](crate::BinarySearchTree), unspecified for
/// [`ChainedHashTable`](crate::ChainedHashTable).
pub trait Map<K, V> {
    /// Restartable key traversal; every call to [`Map::keys`] starts over.
    type Keys<'a>: Iterator<Item = &'a K> + ExactSizeIterator + Clone
    where
        Self: 'a,
        K: 'a;

    /// Insert `key -> value`, or replace the stored value if `key` is present.
    /// Returns the replaced value.
    fn put(&mut self, key: K, value: V) -> Option<V>;

    /// The value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &K) -> Option<&V>;

    /// Mutable access to the value stored under `key`.
    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Whether `key` is present, even if its value means "nothing".
    fn contains_key(&self, key: &K) -> bool;

    /// Number of distinct keys present.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove `key`, returning its value if it was present.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Remove `key` only if its stored value equals `expected`.
    /// On mismatch (or absence) nothing changes and `None` is returned.
    fn remove_if_eq(&mut self, key: &K, expected: &V) -> Option<V>
    where
        V: PartialEq;

    /// Destroy every entry.
    fn clear(&mut self);

    /// Every present key exactly once, in the backend's iteration order.
    fn keys(&self) -> Self::Keys<'_>;
}
