//! Debug-only detection of a map being re-entered from its own callbacks.
//!
//! Lookups run caller code: `Hash` and `Eq` in [`ChainedHashTable`], `Ord`
//! in [`BinarySearchTree`], and `PartialEq` on values in `remove_if_eq`.
//! If that code reaches back into the same map, the storage it sees is
//! mid-operation. Each backend therefore holds a [`ReentryScope`] over:
//!
//! - `get`, `get_mut` and `contains_key`: the key search;
//! - `put`: hashing or the descent, the in-place replace or attach, and
//!   for the hash table any resize that follows;
//! - `remove` and `remove_if_eq`: the search and the value comparison.
//!   The tree releases the scope before splicing the node out; the hash
//!   table keeps it over its swap-remove;
//! - `clear`: detaching the storage. Entries drop after the scope ends.
//!
//! Debug builds panic on a nested scope. Release builds keep no state.
//!
//! [`ChainedHashTable`]: crate::ChainedHashTable
//! [`BinarySearchTree`]: crate::BinarySearchTree

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map flag recording whether an operation is in progress.
#[derive(Debug, Default)]
pub(crate) struct ReentryCheck {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // Raw-pointer marker: the owning map is !Send + !Sync.
    _single_thread: PhantomData<*mut ()>,
}

impl ReentryCheck {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _single_thread: PhantomData,
        }
    }

    /// Mark the map busy until the returned scope drops.
    #[inline]
    pub(crate) fn enter(&self) -> ReentryScope<'_> {
        #[cfg(debug_assertions)]
        {
            let was_busy = self.busy.replace(true);
            assert!(!was_busy, "map re-entered from a Hash, Eq or Ord callback");
        }
        ReentryScope {
            #[cfg(debug_assertions)]
            check: self,
            _borrow: PhantomData,
        }
    }

    #[cfg(all(test, debug_assertions))]
    fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

/// Clears the busy flag on drop, including during unwinding.
pub(crate) struct ReentryScope<'a> {
    #[cfg(debug_assertions)]
    check: &'a ReentryCheck,
    _borrow: PhantomData<&'a ReentryCheck>,
}

impl Drop for ReentryScope<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.check.busy.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::ReentryCheck;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn back_to_back_scopes() {
        let check = ReentryCheck::new();
        for _ in 0..3 {
            drop(check.enter());
        }
    }

    #[cfg(debug_assertions)]
    #[test]
    fn flag_tracks_scope_lifetime() {
        let check = ReentryCheck::default();
        assert!(!check.is_busy());
        let scope = check.enter();
        assert!(check.is_busy());
        drop(scope);
        assert!(!check.is_busy());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_scope_panics() {
        let check = ReentryCheck::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _outer = check.enter();
            let _inner = check.enter();
        }));
        let payload = outcome.unwrap_err();
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_default();
        assert!(msg.contains("re-entered"), "unexpected panic payload {msg:?}");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn panicking_callback_leaves_map_usable() {
        let check = ReentryCheck::new();
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _scope = check.enter();
            panic!("Ord impl blew up");
        }));
        assert!(!check.is_busy());
        let _scope = check.enter();
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn release_build_does_not_track() {
        let check = ReentryCheck::new();
        let _a = check.enter();
        let _b = check.enter();
    }
}
