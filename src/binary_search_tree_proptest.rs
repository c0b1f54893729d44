#![cfg(test)]

// Property tests for BinarySearchTree kept inside the crate so the
// structural checker (order, reachability, size) runs after every op.

use crate::binary_search_tree::BinarySearchTree;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Put(u8, i16),
    Get(u8),
    Remove(u8),
    RemoveIfEq(u8, i16),
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    // Narrow key and value ranges so hits, overwrites and matches are common.
    prop_oneof![
        5 => (0u8..48, -4i16..4).prop_map(|(k, v)| Op::Put(k, v)),
        2 => (0u8..48).prop_map(Op::Get),
        3 => (0u8..48).prop_map(Op::Remove),
        2 => (0u8..48, -4i16..4).prop_map(|(k, v)| Op::RemoveIfEq(k, v)),
        1 => Just(Op::Clear),
    ]
}

// Property: state-machine equivalence against std::collections::BTreeMap.
// After every op: strict ascending in-order walk, every arena node reachable
// exactly once, len parity, and key/value sequence equal to the model's.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_btreemap(ops in proptest::collection::vec(arb_op(), 1..200)) {
        let mut sut: BinarySearchTree<u8, i16> = BinarySearchTree::new();
        let mut model: BTreeMap<u8, i16> = BTreeMap::new();
        for op in ops {
            match op {
                Op::Put(k, v) => prop_assert_eq!(sut.put(k, v), model.insert(k, v)),
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k), model.get(&k));
                    prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(sut.remove(&k), model.remove(&k));
                    prop_assert!(!sut.contains_key(&k));
                }
                Op::RemoveIfEq(k, v) => {
                    let expected = match model.get(&k) {
                        Some(&cur) if cur == v => model.remove(&k),
                        _ => None,
                    };
                    prop_assert_eq!(sut.remove_if_eq(&k, &v), expected);
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            sut.check_invariants();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.height() <= sut.len());
            let pairs: Vec<(u8, i16)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
            let expected: Vec<(u8, i16)> = model.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(pairs, expected);
        }
    }
}

// Property: deleting every key of a random insertion order, in another
// random order, keeps the tree valid at each step and ends empty.
proptest! {
    #[test]
    fn prop_drain_in_any_order(
        keys in proptest::collection::btree_set(any::<i32>(), 0..64)
            .prop_map(|s| s.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
        removal_seed in proptest::collection::vec(any::<prop::sample::Index>(), 64),
    ) {
        let mut sut: BinarySearchTree<i32, i32> = keys.iter().map(|&k| (k, k.wrapping_mul(3))).collect();
        let mut remaining = keys.clone();
        for ix in removal_seed {
            if remaining.is_empty() {
                break;
            }
            let k = remaining.swap_remove(ix.index(remaining.len()));
            prop_assert_eq!(sut.remove(&k), Some(k.wrapping_mul(3)));
            sut.check_invariants();
            prop_assert_eq!(sut.len(), remaining.len());
        }
        // Anything the seed did not reach goes now.
        for k in remaining {
            prop_assert_eq!(sut.remove(&k), Some(k.wrapping_mul(3)));
        }
        prop_assert!(sut.is_empty());
        sut.check_invariants();
    }
}
