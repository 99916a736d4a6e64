//! Balance and ordering scenarios for the on-disk AVL tree
//!
//! These tests drive the tree through the adversarial insertion orders
//! (ascending, descending) and verify the AVL height bounds after every
//! single structural mutation.

use std::path::Path;

use arborkv::AvlTree;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_tree(dir: &Path) -> AvlTree<i32, i32> {
    AvlTree::open(&dir.join("tree.bin"), &dir.join("data.bin")).unwrap()
}

/// AVL height bounds: ceil(log2(n+1)) <= h <= floor(1.44*log2(n+2) - 0.328)
/// for n > 0, and h == 0 for n == 0.
fn valid_height(n: i32, height: i32) -> bool {
    if n == 0 {
        return height == 0;
    }
    let n = n as f64;
    let min = (n + 1.0).log2().ceil() as i32;
    let max = (1.44 * (n + 2.0).log2() - 0.328).floor() as i32;
    height >= min && height <= max
}

// =============================================================================
// Balance Invariant Scenarios
// =============================================================================

#[test]
fn test_balances_on_ascending_insertion_and_removal() {
    let temp = TempDir::new().unwrap();
    let mut tree = open_tree(temp.path());
    let mut total = 0;

    let values: Vec<i32> = (-100..=100).collect();

    for &value in &values {
        tree.add(value, &value).unwrap();
        total += 1;
        let height = tree.height().unwrap();
        assert!(
            valid_height(total, height),
            "height {} out of AVL bounds for {} keys",
            height,
            total
        );
    }

    for &value in &values {
        tree.remove(&value).unwrap();
        total -= 1;
        let height = tree.height().unwrap();
        assert!(
            valid_height(total, height),
            "height {} out of AVL bounds for {} keys",
            height,
            total
        );
    }

    assert!(tree.is_empty().unwrap());
    assert_eq!(tree.height().unwrap(), 0);
}

#[test]
fn test_balances_on_descending_insertion_and_removal() {
    let temp = TempDir::new().unwrap();
    let mut tree = open_tree(temp.path());
    let mut total = 0;

    let values: Vec<i32> = (-100..=100).rev().collect();

    for &value in &values {
        tree.add(value, &value).unwrap();
        total += 1;
        assert!(valid_height(total, tree.height().unwrap()));
    }

    for &value in &values {
        tree.remove(&value).unwrap();
        total -= 1;
        assert!(valid_height(total, tree.height().unwrap()));
    }

    assert!(tree.is_empty().unwrap());
}

#[test]
fn test_balances_on_interleaved_removal() {
    let temp = TempDir::new().unwrap();
    let mut tree = open_tree(temp.path());

    for value in 0..64 {
        tree.add(value, &value).unwrap();
    }

    // Remove every other key; the survivors must stay balanced.
    let mut total = 64;
    for value in (0..64).step_by(2) {
        tree.remove(&value).unwrap();
        total -= 1;
        assert!(valid_height(total, tree.height().unwrap()));
    }

    for value in (1..64).step_by(2) {
        assert_eq!(tree.get(&value).unwrap(), value);
    }
}

// =============================================================================
// Ordering Invariant
// =============================================================================

#[test]
fn test_in_order_keys_strictly_ascending() {
    let temp = TempDir::new().unwrap();
    let mut tree = open_tree(temp.path());

    // A fixed shuffled order, no duplicates.
    let values = [13, 2, 29, 7, 41, 0, 23, 5, 37, 11, 3, 19, 31, 17];
    for &value in &values {
        tree.add(value, &value).unwrap();
    }

    let keys = tree.keys_in_order().unwrap();
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
}

// =============================================================================
// Round-trip / Values
// =============================================================================

#[test]
fn test_round_trip_survives_rebalancing() {
    let temp = TempDir::new().unwrap();
    let mut tree = open_tree(temp.path());

    for value in 0..100 {
        tree.add(value, &(value * 7)).unwrap();
    }

    // Every insertion along the way forced rotations; all values must
    // still resolve through the rewired positions.
    for value in 0..100 {
        assert_eq!(tree.get(&value).unwrap(), value * 7);
    }
}

#[test]
fn test_remove_half_keeps_other_half_intact() {
    let temp = TempDir::new().unwrap();
    let mut tree = open_tree(temp.path());

    for value in 0..50 {
        tree.add(value, &(value + 500)).unwrap();
    }
    for value in 25..50 {
        tree.remove(&value).unwrap();
    }

    for value in 0..25 {
        assert_eq!(tree.get(&value).unwrap(), value + 500);
    }
    for value in 25..50 {
        assert!(tree.get(&value).is_err());
    }
}
