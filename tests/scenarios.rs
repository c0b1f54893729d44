// Literal scenarios for the two backends.
//
// - Deletion stress: a fixed insert/remove script against the tree, checking
//   the in-order walk after each stage.
// - Resize: a 4-bucket table with load factor 0.75 growing under keys 0..10.
// - Corner removals: conditional removal of a root with one or two children.
use twin_map::{BinarySearchTree, ChainedHashTable, ConfigError, TableConfig, MIN_LOAD_FACTOR};

fn in_order(t: &BinarySearchTree<i32, i32>) -> Vec<i32> {
    t.keys().copied().collect()
}

fn tree_of(keys: &[i32]) -> BinarySearchTree<i32, i32> {
    keys.iter().map(|&k| (k, k * 10)).collect()
}

#[test]
fn tree_deletion_stress() {
    let mut b = tree_of(&[8, 6, 10, 2, 7, 9, 13, 11, 12]);
    assert_eq!(in_order(&b), vec![2, 6, 7, 8, 9, 10, 11, 12, 13]);

    b.remove(&2);
    b.remove(&7);
    b.remove(&9);
    assert_eq!(in_order(&b), vec![6, 8, 10, 11, 12, 13]);

    b.remove(&13);
    b.remove(&11);
    assert_eq!(in_order(&b), vec![6, 8, 10, 12]);

    b.put(2, 20);
    b.put(7, 70);
    b.remove(&6);
    assert_eq!(in_order(&b), vec![2, 7, 8, 10, 12]);
    for k in [2, 7, 8, 10, 12] {
        assert_eq!(b.get(&k), Some(&(k * 10)));
    }
    assert_eq!(b.len(), 5);
}

#[test]
fn tree_conditional_root_removals() {
    let mut b = tree_of(&[8]);
    assert_eq!(b.remove_if_eq(&8, &70), None);
    assert_eq!(b.remove_if_eq(&8, &80), Some(80));
    assert!(b.is_empty());

    let mut b2 = tree_of(&[8, 6, 2, 10, 12]);
    assert_eq!(b2.remove_if_eq(&8, &80), Some(80));
    assert_eq!(in_order(&b2), vec![2, 6, 10, 12]);

    let mut b3 = tree_of(&[8, 6, 2, 10, 12, 7]);
    assert_eq!(b3.remove_if_eq(&8, &80), Some(80));
    assert_eq!(in_order(&b3), vec![2, 6, 7, 10, 12]);
    assert_eq!(format!("{b3:?}"), "{2: 20, 6: 60, 7: 70, 10: 100, 12: 120}");
}

#[test]
fn hash_table_resize_from_four() {
    let mut m = ChainedHashTable::with_capacity_and_load_factor(4, 0.75).unwrap();
    let mut grew = false;
    for k in 0..10 {
        m.put(k, k);
        grew |= m.bucket_count() > 4;
        assert!(m.len() as f64 / m.bucket_count() as f64 <= 0.75);
    }
    assert_eq!(m.len(), 10);
    for k in 0..10 {
        assert_eq!(m.get(&k), Some(&k));
    }
    assert!(grew, "bucket count never grew beyond 4");
}

#[test]
fn hash_table_config_errors() {
    let zero = ChainedHashTable::<i32, i32>::with_capacity(0);
    assert!(matches!(zero, Err(ConfigError::ZeroCapacity)));
    let nan = ChainedHashTable::<i32, i32>::with_config(TableConfig::default().max_load_factor(f64::NAN));
    assert!(matches!(nan, Err(ConfigError::InvalidLoadFactor(_))));
    let tiny = ChainedHashTable::<i32, i32>::with_capacity_and_load_factor(16, 1e-20);
    assert!(matches!(tiny, Err(ConfigError::InvalidLoadFactor(lf)) if lf == 1e-20));
    let ok = ChainedHashTable::<i32, i32>::with_config(TableConfig::new(3, 2.5)).unwrap();
    assert_eq!(ok.bucket_count(), 3);
    assert_eq!(ok.max_load_factor(), 2.5);
}

#[test]
fn hash_table_at_smallest_load_factor() {
    // Every put keeps at least 1024 buckets per entry and never overflows.
    let mut m = ChainedHashTable::with_capacity_and_load_factor(1, MIN_LOAD_FACTOR).unwrap();
    for k in 0..64u32 {
        m.put(k, k);
        assert!(m.bucket_count() >= 1024 * m.len());
    }
    assert_eq!(m.bucket_count(), 65536);
    assert!((0..64).all(|k| m.get(&k) == Some(&k)));
}

#[test]
fn hash_table_negative_keys() {
    // Keys whose Hash feeds negative integers still find valid buckets.
    let mut m = ChainedHashTable::with_capacity(7).unwrap();
    for k in -50i64..50 {
        m.put(k, -k);
    }
    for k in -50i64..50 {
        assert_eq!(m.get(&k), Some(&-k));
    }
    assert_eq!(m.len(), 100);
}
