//! Database Module
//!
//! The public façade over the on-disk AVL tree.
//!
//! ## Responsibilities
//! - Resolve backing file paths from the config
//! - Delegate operations to the balancing engine
//! - Expose diagnostics (height, tree dump)
//!
//! One `Database` instance assumes exclusive access to its pair of backing
//! files for its whole lifetime; concurrent external writers produce
//! undefined results.

use std::fmt;
use std::fs;

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::store::FixedPayload;
use crate::tree::AvlTree;

/// A disk-resident key-value store indexed by an on-disk AVL tree.
///
/// Keys and values are fixed-size payloads; every child pointer is a file
/// position, so the logical tree survives process restarts unchanged.
pub struct Database<K, V> {
    tree: AvlTree<K, V>,
}

impl<K, V> Database<K, V>
where
    K: FixedPayload + Ord + Clone,
    V: FixedPayload,
{
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const NODE_FILENAME: &'static str = "tree.bin";
    const VALUE_FILENAME: &'static str = "data.bin";

    /// Open or create a database in the configured data directory.
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let node_path = config.data_dir.join(Self::NODE_FILENAME);
        let value_path = config.data_dir.join(Self::VALUE_FILENAME);
        let tree = AvlTree::open(&node_path, &value_path)?;

        debug!(data_dir = %config.data_dir.display(), "database opened");
        Ok(Self { tree })
    }

    /// Insert a key-value pair.
    ///
    /// Fails with `DuplicateKey` if the key is already present; the tree
    /// is left unchanged in that case.
    pub fn add(&mut self, key: K, value: &V) -> Result<()> {
        self.tree.add(key, value)
    }

    /// Remove a key and its value.
    ///
    /// Fails with `KeyNotFound` if the key is absent or the tree is empty.
    pub fn remove(&mut self, key: &K) -> Result<()> {
        self.tree.remove(key)
    }

    /// Look up the value stored under `key`.
    ///
    /// Fails with `KeyNotFound` if the key is absent.
    pub fn get(&mut self, key: &K) -> Result<V> {
        self.tree.get(key)
    }

    /// Height of the tree (0 when empty). O(n) disk reads; intended for
    /// tests and diagnostics, not hot paths.
    pub fn get_height(&mut self) -> Result<i32> {
        self.tree.height()
    }

    /// True iff the tree holds no keys
    pub fn is_empty(&mut self) -> Result<bool> {
        self.tree.is_empty()
    }

    /// All live keys in ascending order (diagnostic)
    pub fn keys_in_order(&mut self) -> Result<Vec<K>> {
        self.tree.keys_in_order()
    }

    /// Sideways rendering of the tree (right subtree first) for human
    /// inspection.
    pub fn dump(&mut self) -> Result<String>
    where
        K: fmt::Debug,
    {
        self.tree.dump()
    }
}
