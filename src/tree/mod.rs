//! Tree Module
//!
//! The on-disk AVL tree: typed node records over two block stores plus the
//! recursive balancing engine.
//!
//! ## Node Record Format (node store, 1 header flag = root position)
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ [Valid: 4][Key: K::SIZE][ValueRef: 4][Balance: 4]          │
//! │ [Left: 4][Right: 4]                                        │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Child links and the value reference are positions into the respective
//! block stores; -1 means absent. `balance` is height(right) − height(left)
//! and every live node keeps it in [-1, 1].

mod avl;
mod node;

pub use avl::AvlTree;
pub use node::{Node, TreeStore};
