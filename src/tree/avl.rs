//! The balancing engine
//!
//! Recursive insert/remove/lookup over stored positions, with AVL
//! rotations. Rotations never need parent back-references: the two slots
//! involved physically exchange contents (`BlockStore::swap`), so the
//! subtree's externally visible position never changes and no updated
//! child position has to propagate upward.
//!
//! Balance maintenance is incremental: each recursive call reports whether
//! its subtree grew (insert) or shrank (remove), and the parent frame
//! adjusts its own balance factor on the way back up. Rotation balance
//! factors are recomputed analytically from their pre-rotation values, not
//! by rescanning subtree heights.

use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write as _;
use std::path::Path;

use tracing::trace;

use crate::error::{ArborError, Result};
use crate::store::{FixedPayload, NIL};

use super::{Node, TreeStore};

/// Outcome of removing a key from a subtree
#[derive(Debug, Clone, Copy)]
struct RemoveOutcome {
    /// The subtree root itself was tombstoned; the parent must clear its
    /// child link. Only happens for childless nodes, so `gone` implies
    /// `shrunk`.
    gone: bool,
    /// The subtree's height decreased by one
    shrunk: bool,
}

/// A persistent AVL tree keyed by `K` with fixed-size `V` payloads.
pub struct AvlTree<K, V> {
    store: TreeStore<K, V>,
}

impl<K, V> AvlTree<K, V>
where
    K: FixedPayload + Ord + Clone,
    V: FixedPayload,
{
    /// Open or create the tree over its two backing files.
    pub fn open(node_path: &Path, value_path: &Path) -> Result<Self> {
        Ok(Self {
            store: TreeStore::open(node_path, value_path)?,
        })
    }

    /// Look up the value stored under `key`.
    pub fn get(&mut self, key: &K) -> Result<V> {
        let root = self.store.read_root_pos()?;
        self.get_recursive(key, root)
    }

    /// Insert `key` with `value`. Fails with `DuplicateKey` if the key is
    /// already present, leaving the tree unchanged.
    pub fn add(&mut self, key: K, value: &V) -> Result<()> {
        let root = self.store.read_root_pos()?;
        if root == NIL {
            let pos = self.store.write_data_node(key, value)?;
            self.store.write_root_pos(pos)?;
            return Ok(());
        }
        // Rotations keep subtree root positions stable, so the persisted
        // root pointer never moves once set.
        self.add_recursive(key, value, root)?;
        Ok(())
    }

    /// Remove `key` and its value. Fails with `KeyNotFound` if the tree is
    /// empty or the key is absent.
    pub fn remove(&mut self, key: &K) -> Result<()> {
        let root = self.store.read_root_pos()?;
        if root == NIL {
            return Err(ArborError::KeyNotFound);
        }
        let outcome = self.remove_recursive(key, root)?;
        if outcome.gone {
            self.store.write_root_pos(NIL)?;
        }
        Ok(())
    }

    /// Height of the tree: 0 when empty, computed by recursive descent.
    /// O(n) disk reads; diagnostics and tests only.
    pub fn height(&mut self) -> Result<i32> {
        let root = self.store.read_root_pos()?;
        self.subtree_height(root)
    }

    /// True iff the tree holds no keys
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.store.read_root_pos()? == NIL)
    }

    /// All live keys in ascending order (diagnostic; O(n) disk reads)
    pub fn keys_in_order(&mut self) -> Result<Vec<K>> {
        let root = self.store.read_root_pos()?;
        let mut keys = Vec::new();
        self.collect_in_order(root, &mut keys)?;
        Ok(keys)
    }

    /// Render the tree sideways (right subtree first, one indent level per
    /// depth) for human inspection.
    pub fn dump(&mut self) -> Result<String>
    where
        K: fmt::Debug,
    {
        let root = self.store.read_root_pos()?;
        let mut out = String::new();
        self.render(root, 0, &mut out)?;
        Ok(out)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    fn get_recursive(&mut self, key: &K, pos: i32) -> Result<V> {
        if pos == NIL {
            return Err(ArborError::KeyNotFound);
        }
        let node = self.store.read_node(pos)?;
        match key.cmp(&node.key) {
            Ordering::Equal => self.store.read_value(node.value_ref),
            Ordering::Greater => self.get_recursive(key, node.right),
            Ordering::Less => self.get_recursive(key, node.left),
        }
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert below `pos`, returning whether the subtree grew taller.
    /// An insertion rotation always restores the pre-insert height, so a
    /// rebalanced frame reports no growth.
    fn add_recursive(&mut self, key: K, value: &V, pos: i32) -> Result<bool> {
        let mut node = self.store.read_node(pos)?;
        match key.cmp(&node.key) {
            Ordering::Equal => Err(ArborError::DuplicateKey),
            Ordering::Greater => {
                let grew = if node.right == NIL {
                    node.right = self.store.write_data_node(key, value)?;
                    true
                } else {
                    self.add_recursive(key, value, node.right)?
                };
                if !grew {
                    return Ok(false);
                }
                node.balance += 1;
                self.store.update_node(pos, &node)?;
                if node.balance > 1 {
                    self.balance_node(pos)?;
                    return Ok(false);
                }
                Ok(node.balance != 0)
            }
            Ordering::Less => {
                let grew = if node.left == NIL {
                    node.left = self.store.write_data_node(key, value)?;
                    true
                } else {
                    self.add_recursive(key, value, node.left)?
                };
                if !grew {
                    return Ok(false);
                }
                node.balance -= 1;
                self.store.update_node(pos, &node)?;
                if node.balance < -1 {
                    self.balance_node(pos)?;
                    return Ok(false);
                }
                Ok(node.balance != 0)
            }
        }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    fn remove_recursive(&mut self, key: &K, pos: i32) -> Result<RemoveOutcome> {
        let mut node = self.store.read_node(pos)?;
        match key.cmp(&node.key) {
            Ordering::Less => {
                if node.left == NIL {
                    return Err(ArborError::KeyNotFound);
                }
                let child = self.remove_recursive(key, node.left)?;
                if child.gone {
                    node.left = NIL;
                }
                if child.shrunk {
                    node.balance += 1;
                }
                let shrunk = self.settle(pos, &node, child.shrunk)?;
                Ok(RemoveOutcome { gone: false, shrunk })
            }
            Ordering::Greater => {
                if node.right == NIL {
                    return Err(ArborError::KeyNotFound);
                }
                let child = self.remove_recursive(key, node.right)?;
                if child.gone {
                    node.right = NIL;
                }
                if child.shrunk {
                    node.balance -= 1;
                }
                let shrunk = self.settle(pos, &node, child.shrunk)?;
                Ok(RemoveOutcome { gone: false, shrunk })
            }
            Ordering::Equal => {
                if node.left != NIL {
                    // Promote the predecessor's key and value into this
                    // slot; only this node's own value payload dies.
                    let (donor_key, donor_ref, child) = self.take_max(node.left)?;
                    self.store.remove_value(node.value_ref)?;
                    node.key = donor_key;
                    node.value_ref = donor_ref;
                    if child.gone {
                        node.left = NIL;
                    }
                    if child.shrunk {
                        node.balance += 1;
                    }
                    let shrunk = self.settle(pos, &node, child.shrunk)?;
                    Ok(RemoveOutcome { gone: false, shrunk })
                } else if node.right != NIL {
                    let (donor_key, donor_ref, child) = self.take_min(node.right)?;
                    self.store.remove_value(node.value_ref)?;
                    node.key = donor_key;
                    node.value_ref = donor_ref;
                    if child.gone {
                        node.right = NIL;
                    }
                    if child.shrunk {
                        node.balance -= 1;
                    }
                    let shrunk = self.settle(pos, &node, child.shrunk)?;
                    Ok(RemoveOutcome { gone: false, shrunk })
                } else {
                    // Childless: tombstone both slots and tell the parent
                    // to clear its link.
                    self.store.remove_value(node.value_ref)?;
                    self.store.remove_node(pos)?;
                    Ok(RemoveOutcome {
                        gone: true,
                        shrunk: true,
                    })
                }
            }
        }
    }

    /// Extract the maximum-keyed node of the subtree at `pos`: its key and
    /// value reference move up to the caller (the value slot stays live),
    /// and the node itself is physically removed.
    fn take_max(&mut self, pos: i32) -> Result<(K, i32, RemoveOutcome)> {
        let mut node = self.store.read_node(pos)?;
        if node.right != NIL {
            let (key, value_ref, child) = self.take_max(node.right)?;
            if child.gone {
                node.right = NIL;
            }
            if child.shrunk {
                node.balance -= 1;
            }
            let shrunk = self.settle(pos, &node, child.shrunk)?;
            return Ok((key, value_ref, RemoveOutcome { gone: false, shrunk }));
        }

        let donor_key = node.key.clone();
        let donor_ref = node.value_ref;

        if node.left == NIL {
            self.store.remove_node(pos)?;
            return Ok((
                donor_key,
                donor_ref,
                RemoveOutcome {
                    gone: true,
                    shrunk: true,
                },
            ));
        }

        // The maximum has a left child; fill the hole with its own
        // predecessor and keep this slot alive under the promoted key.
        let (key, value_ref, child) = self.take_max(node.left)?;
        node.key = key;
        node.value_ref = value_ref;
        if child.gone {
            node.left = NIL;
        }
        if child.shrunk {
            node.balance += 1;
        }
        let shrunk = self.settle(pos, &node, child.shrunk)?;
        Ok((donor_key, donor_ref, RemoveOutcome { gone: false, shrunk }))
    }

    /// Mirror of [`take_max`](Self::take_max): extract the minimum-keyed
    /// node of the subtree at `pos`.
    fn take_min(&mut self, pos: i32) -> Result<(K, i32, RemoveOutcome)> {
        let mut node = self.store.read_node(pos)?;
        if node.left != NIL {
            let (key, value_ref, child) = self.take_min(node.left)?;
            if child.gone {
                node.left = NIL;
            }
            if child.shrunk {
                node.balance += 1;
            }
            let shrunk = self.settle(pos, &node, child.shrunk)?;
            return Ok((key, value_ref, RemoveOutcome { gone: false, shrunk }));
        }

        let donor_key = node.key.clone();
        let donor_ref = node.value_ref;

        if node.right == NIL {
            self.store.remove_node(pos)?;
            return Ok((
                donor_key,
                donor_ref,
                RemoveOutcome {
                    gone: true,
                    shrunk: true,
                },
            ));
        }

        let (key, value_ref, child) = self.take_min(node.right)?;
        node.key = key;
        node.value_ref = value_ref;
        if child.gone {
            node.right = NIL;
        }
        if child.shrunk {
            node.balance -= 1;
        }
        let shrunk = self.settle(pos, &node, child.shrunk)?;
        Ok((donor_key, donor_ref, RemoveOutcome { gone: false, shrunk }))
    }

    /// Persist an already-adjusted node and rebalance it if its child
    /// shrank. Returns whether the subtree rooted at `pos` shrank in turn:
    /// after absorbing a child's shrink, the subtree is shorter exactly
    /// when its (post-rotation) root balance lands on 0.
    fn settle(&mut self, pos: i32, node: &Node<K>, child_shrunk: bool) -> Result<bool> {
        self.store.update_node(pos, node)?;
        if !child_shrunk {
            return Ok(false);
        }
        let balance = self.balance_node(pos)?;
        Ok(balance == 0)
    }

    // =========================================================================
    // Balance Check & Rotation
    // =========================================================================

    /// Restore the AVL invariant at `pos` if it is violated. A balance of
    /// exactly ±1 is admissible and left untouched. Returns the balance
    /// now stored at `pos` (the subtree root after any rotation).
    fn balance_node(&mut self, pos: i32) -> Result<i32> {
        let node = self.store.read_node(pos)?;
        if node.balance > 1 {
            let right = self.store.read_node(node.right)?;
            if right.balance < 0 {
                self.rotate_double_left(pos)?;
            } else {
                self.rotate_left(pos)?;
            }
        } else if node.balance < -1 {
            let left = self.store.read_node(node.left)?;
            if left.balance > 0 {
                self.rotate_double_right(pos)?;
            } else {
                self.rotate_right(pos)?;
            }
        } else {
            return Ok(node.balance);
        }
        Ok(self.store.read_node(pos)?.balance)
    }

    /// Single left rotation at `pos` (right-heavy case). The slot at `pos`
    /// and its right child exchange contents so the subtree keeps its
    /// externally visible position.
    fn rotate_left(&mut self, pos: i32) -> Result<()> {
        let mut old_root = self.store.read_node(pos)?;
        let pivot_pos = old_root.right;
        let mut new_root = self.store.read_node(pivot_pos)?;

        self.store.swap_nodes(pos, pivot_pos)?;

        // After the swap: `pos` holds the pivot, `pivot_pos` holds the old
        // root. Rewire and fix both balance factors analytically.
        old_root.right = new_root.left;
        new_root.left = pivot_pos;
        old_root.balance = old_root.balance - 1 - new_root.balance.max(0);
        new_root.balance = new_root.balance - 1 + old_root.balance.min(0);

        self.store.update_node(pivot_pos, &old_root)?;
        self.store.update_node(pos, &new_root)?;
        trace!(pos, pivot = pivot_pos, "left rotation");
        Ok(())
    }

    /// Single right rotation at `pos` (left-heavy case); mirror of
    /// [`rotate_left`](Self::rotate_left).
    fn rotate_right(&mut self, pos: i32) -> Result<()> {
        let mut old_root = self.store.read_node(pos)?;
        let pivot_pos = old_root.left;
        let mut new_root = self.store.read_node(pivot_pos)?;

        self.store.swap_nodes(pos, pivot_pos)?;

        old_root.left = new_root.right;
        new_root.right = pivot_pos;
        old_root.balance = old_root.balance + 1 - new_root.balance.min(0);
        new_root.balance = new_root.balance + 1 + old_root.balance.max(0);

        self.store.update_node(pivot_pos, &old_root)?;
        self.store.update_node(pos, &new_root)?;
        trace!(pos, pivot = pivot_pos, "right rotation");
        Ok(())
    }

    /// Right rotation on the right child, then left rotation at `pos`.
    /// Resolves a right-heavy node whose right child leans left.
    fn rotate_double_left(&mut self, pos: i32) -> Result<()> {
        let node = self.store.read_node(pos)?;
        self.rotate_right(node.right)?;
        self.rotate_left(pos)
    }

    /// Left rotation on the left child, then right rotation at `pos`.
    fn rotate_double_right(&mut self, pos: i32) -> Result<()> {
        let node = self.store.read_node(pos)?;
        self.rotate_left(node.left)?;
        self.rotate_right(pos)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn subtree_height(&mut self, pos: i32) -> Result<i32> {
        if pos == NIL {
            return Ok(0);
        }
        let node = self.store.read_node(pos)?;
        let right = self.subtree_height(node.right)?;
        let left = self.subtree_height(node.left)?;
        Ok(right.max(left) + 1)
    }

    fn collect_in_order(&mut self, pos: i32, keys: &mut Vec<K>) -> Result<()> {
        if pos == NIL {
            return Ok(());
        }
        let node = self.store.read_node(pos)?;
        self.collect_in_order(node.left, keys)?;
        keys.push(node.key.clone());
        self.collect_in_order(node.right, keys)
    }

    fn render(&mut self, pos: i32, depth: usize, out: &mut String) -> Result<()>
    where
        K: fmt::Debug,
    {
        if pos == NIL {
            return Ok(());
        }
        let node = self.store.read_node(pos)?;
        self.render(node.right, depth + 1, out)?;
        let _ = writeln!(
            out,
            "{}{:?} (pos {}, bal {:+})",
            "    ".repeat(depth),
            node.key,
            pos,
            node.balance
        );
        self.render(node.left, depth + 1, out)
    }
}

// =============================================================================
// Unit Tests (internal invariants)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_tree(dir: &TempDir) -> AvlTree<i32, i32> {
        AvlTree::open(&dir.path().join("tree.bin"), &dir.path().join("data.bin")).unwrap()
    }

    /// Walk the tree verifying that every stored balance factor matches
    /// the actual subtree heights and stays within the AVL range.
    fn check_balances(tree: &mut AvlTree<i32, i32>, pos: i32) -> i32 {
        if pos == NIL {
            return 0;
        }
        let node = tree.store.read_node(pos).unwrap();
        let left = check_balances(tree, node.left);
        let right = check_balances(tree, node.right);
        assert_eq!(
            node.balance,
            right - left,
            "stored balance at pos {} disagrees with subtree heights",
            pos
        );
        assert!(node.balance.abs() <= 1, "AVL invariant violated at pos {}", pos);
        left.max(right) + 1
    }

    fn assert_invariants(tree: &mut AvlTree<i32, i32>) {
        let root = tree.store.read_root_pos().unwrap();
        check_balances(tree, root);
        let keys = tree.keys_in_order().unwrap();
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "in-order keys not strictly ascending: {:?}",
            keys
        );
    }

    #[test]
    fn in_order_stays_sorted_under_mixed_operations() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir);

        for key in [50, 20, 70, 10, 30, 60, 80, 25, 35, 65, 5] {
            tree.add(key, &(key * 10)).unwrap();
            assert_invariants(&mut tree);
        }
        for key in [20, 70, 50, 5] {
            tree.remove(&key).unwrap();
            assert_invariants(&mut tree);
        }

        let keys = tree.keys_in_order().unwrap();
        assert_eq!(keys, vec![10, 25, 30, 35, 60, 65, 80]);
    }

    #[test]
    fn ascending_insert_produces_balanced_tree() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir);

        for key in 1..=7 {
            tree.add(key, &key).unwrap();
        }

        // 7 keys inserted in ascending order must settle at height 3.
        assert_eq!(tree.height().unwrap(), 3);
        assert_invariants(&mut tree);
    }

    #[test]
    fn removing_internal_node_preserves_predecessor_value() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir);

        for key in [40, 20, 60, 10, 30, 50, 70] {
            tree.add(key, &(key + 1000)).unwrap();
        }

        // 40 is internal; its predecessor 30 gets promoted into its slot.
        tree.remove(&40).unwrap();
        assert!(matches!(tree.get(&40), Err(ArborError::KeyNotFound)));
        assert_eq!(tree.get(&30).unwrap(), 1030);
        for key in [10, 20, 50, 60, 70] {
            assert_eq!(tree.get(&key).unwrap(), key + 1000);
        }
        assert_invariants(&mut tree);
    }

    #[test]
    fn double_rotation_fixes_zigzag_insert() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir);

        // Left-right case: 30, 10, 20 forces a double rotation at the root.
        tree.add(30, &30).unwrap();
        tree.add(10, &10).unwrap();
        tree.add(20, &20).unwrap();

        assert_eq!(tree.height().unwrap(), 2);
        assert_invariants(&mut tree);
        assert_eq!(tree.keys_in_order().unwrap(), vec![10, 20, 30]);
    }
}
