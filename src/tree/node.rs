//! Node records and the paired block stores backing the tree
//!
//! `TreeStore` is a thin typed wrapper over two independent block stores:
//! one holding node records (with a single header flag for the root
//! position), one holding raw value payloads (no header flags). Each value
//! payload is owned by exactly one node.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};
use crate::store::{BlockStore, FixedPayload, NIL};

/// Header flag index holding the persisted root position
const ROOT_FLAG: usize = 0;

/// On-disk tree node: key, value reference, balance factor, child links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node<K> {
    pub key: K,
    /// Position of this node's value payload in the value store
    pub value_ref: i32,
    /// height(right subtree) − height(left subtree), kept in [-1, 1]
    pub balance: i32,
    /// Position of the left child in the node store, -1 if absent
    pub left: i32,
    /// Position of the right child in the node store, -1 if absent
    pub right: i32,
}

impl<K> Node<K> {
    /// A fresh childless node referencing a value payload
    pub fn new(key: K, value_ref: i32) -> Self {
        Self {
            key,
            value_ref,
            balance: 0,
            left: NIL,
            right: NIL,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left == NIL && self.right == NIL
    }
}

impl<K: FixedPayload> FixedPayload for Node<K> {
    // key + value_ref + balance + left + right
    const SIZE: usize = K::SIZE + 16;
}

/// The node layer: node store + value store, opened as a pair.
pub struct TreeStore<K, V> {
    nodes: BlockStore<Node<K>>,
    values: BlockStore<V>,
}

impl<K: FixedPayload, V: FixedPayload> TreeStore<K, V> {
    /// Open or create both backing files.
    pub fn open(node_path: &Path, value_path: &Path) -> Result<Self> {
        Ok(Self {
            nodes: BlockStore::open(node_path, 1)?,
            values: BlockStore::open(value_path, 0)?,
        })
    }

    /// Write a fresh node for `key`: the value payload goes in first, then
    /// a childless node referencing it. Returns the node's position.
    pub fn write_data_node(&mut self, key: K, value: &V) -> Result<i32> {
        let value_ref = self.values.write(value)?;
        self.nodes.write(&Node::new(key, value_ref))
    }

    /// Read the node at `pos`, failing with `Corruption` if the slot is
    /// not live.
    pub fn read_node(&mut self, pos: i32) -> Result<Node<K>> {
        let block = self.nodes.read(pos)?;
        if !block.is_live() {
            return Err(ArborError::Corruption(format!(
                "node slot {} is tombstoned but still referenced",
                pos
            )));
        }
        Ok(block.payload)
    }

    /// Overwrite the node record at `pos` in place.
    pub fn update_node(&mut self, pos: i32, node: &Node<K>) -> Result<()> {
        self.nodes.write_at(node, pos)
    }

    /// Read the value payload at `value_ref`, failing with `Corruption` if
    /// the slot is not live.
    pub fn read_value(&mut self, value_ref: i32) -> Result<V> {
        let block = self.values.read(value_ref)?;
        if !block.is_live() {
            return Err(ArborError::Corruption(format!(
                "value slot {} is tombstoned but still referenced",
                value_ref
            )));
        }
        Ok(block.payload)
    }

    /// Tombstone a node slot
    pub fn remove_node(&mut self, pos: i32) -> Result<()> {
        self.nodes.remove(pos)
    }

    /// Tombstone a value slot
    pub fn remove_value(&mut self, value_ref: i32) -> Result<()> {
        self.values.remove(value_ref)
    }

    /// Exchange the contents of two node slots (rotation primitive)
    pub fn swap_nodes(&mut self, pos_a: i32, pos_b: i32) -> Result<()> {
        self.nodes.swap(pos_a, pos_b)
    }

    /// Persisted root position; -1 iff the tree is logically empty
    pub fn read_root_pos(&mut self) -> Result<i32> {
        self.nodes.read_flag(ROOT_FLAG)
    }

    /// Persist the root position
    pub fn write_root_pos(&mut self, pos: i32) -> Result<()> {
        self.nodes.write_flag(ROOT_FLAG, pos)
    }
}
