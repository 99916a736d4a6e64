//! # arborkv
//!
//! A disk-resident key-value store indexed by an AVL tree that lives
//! entirely on disk:
//! - Fixed-size records in flat binary files, no in-memory index
//! - Tombstone deletion with lazy first-fit slot reuse
//! - Child links and the root pointer are file positions, stable across
//!   process restarts
//! - Rotations rebalance the tree in place by swapping record slots
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Database Façade                            │
//! │          add / remove / get / get_height / dump              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Balancing Engine                            │
//! │        (recursive traversal + AVL rotations)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Node Layer                                │
//! │     (typed node records + root pointer bookkeeping)          │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!     ┌─────────────┐               ┌─────────────┐
//!     │ Block Store │               │ Block Store │
//!     │  tree.bin   │               │  data.bin   │
//!     └─────────────┘               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod tree;
pub mod db;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ArborError, Result};
pub use config::Config;
pub use db::Database;
pub use store::{BlockStore, FixedPayload, NIL};
pub use tree::AvlTree;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of arborkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
