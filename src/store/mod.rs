//! Block Store Module
//!
//! File-backed array of fixed-size, tombstone-markable records, plus a
//! small header region of persisted integer flags.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (flag_count × 4 bytes)                           │
//! │   Flag: i32 LE, one per header slot, initialized to -1  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Records (variable count, fixed size each)               │
//! │   [Valid: i32 LE][Payload: T::SIZE bytes]               │
//! │   ... repeated for each slot ...                        │
//! │   (Valid = 1 means live, anything else is a tombstone)  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Positions are zero-based slot indices. A slot's byte offset is
//! `flag_count * 4 + position * (4 + T::SIZE)`. Positions stay stable for
//! the lifetime of a record; a tombstoned slot may later be reused for an
//! unrelated record of the same type.

mod block;
mod payload;

pub use block::{BlockStore, FlaggedBlock};
pub use payload::FixedPayload;

// =============================================================================
// Shared Constants
// =============================================================================

/// Sentinel for an absent position (also the initial value of header flags)
pub const NIL: i32 = -1;

/// Size of the per-slot validity flag and of each header flag
pub(crate) const FLAG_SIZE: usize = 4;

/// Validity flag of a live record
pub(crate) const FLAG_LIVE: i32 = 1;

/// Validity flag of a tombstoned record
pub(crate) const FLAG_DEAD: i32 = 0;
