//! Generic block store
//!
//! Durable array-like storage of validity-flagged fixed-size records for
//! one payload type. Every operation performs an immediate seek-and-read
//! or seek-and-write against the backing file; there is no userspace
//! buffering layer, so a completed write survives process exit.
//!
//! Allocation policy: lazy first-fit reuse of tombstoned slots (linear
//! scan from slot 0), appending a fresh slot only when no tombstone
//! exists. No compaction, no free-list.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::{FixedPayload, FLAG_DEAD, FLAG_LIVE, FLAG_SIZE, NIL};

/// A record as stored on disk: validity flag plus payload.
///
/// A non-live flag means the slot is a tombstone; the payload bytes are
/// whatever was last written there (stale bytes are not zeroed on removal —
/// a documented design gap, not a hidden one).
#[derive(Debug, Clone)]
pub struct FlaggedBlock<T> {
    /// Validity flag: 1 = live, 0 = tombstoned, -1 = never written
    pub flag: i32,
    /// Decoded payload (stale if the flag is not live)
    pub payload: T,
}

impl<T> FlaggedBlock<T> {
    /// Whether this slot holds a live record
    pub fn is_live(&self) -> bool {
        self.flag == FLAG_LIVE
    }
}

/// File-backed array of fixed-size records with a flag header region.
///
/// Positions handed out by [`write`](BlockStore::write) stay valid until
/// the slot is tombstoned via [`remove`](BlockStore::remove); callers must
/// only read positions they previously received.
pub struct BlockStore<T> {
    file: File,
    path: PathBuf,
    flag_count: usize,
    _payload: PhantomData<T>,
}

impl<T: FixedPayload> BlockStore<T> {
    /// Open or create a block store at the given path.
    ///
    /// A newly created (empty) file gets all `flag_count` header flags
    /// initialized to -1.
    pub fn open(path: &Path, flag_count: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let mut store = Self {
            file,
            path: path.to_path_buf(),
            flag_count,
            _payload: PhantomData,
        };

        if store.file.metadata()?.len() == 0 {
            for i in 0..flag_count {
                store.write_flag(i, NIL)?;
            }
        }

        let records = store.record_count()?;
        tracing::debug!(path = %store.path.display(), records, "opened block store");

        Ok(store)
    }

    /// Read the i-th header flag
    pub fn read_flag(&mut self, index: usize) -> Result<i32> {
        let mut buf = [0u8; FLAG_SIZE];
        self.file.seek(SeekFrom::Start((index * FLAG_SIZE) as u64))?;
        self.file.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Write the i-th header flag
    pub fn write_flag(&mut self, index: usize, value: i32) -> Result<()> {
        self.file.seek(SeekFrom::Start((index * FLAG_SIZE) as u64))?;
        self.file.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Read the record at `pos` (flag plus payload).
    ///
    /// Reading a position beyond the current record count is a caller
    /// error; only positions previously returned by `write` are valid.
    pub fn read(&mut self, pos: i32) -> Result<FlaggedBlock<T>> {
        let raw = self.read_slot_raw(pos)?;
        let flag = i32::from_le_bytes(raw[..FLAG_SIZE].try_into().unwrap());
        let payload = bincode::deserialize(&raw[FLAG_SIZE..])?;
        Ok(FlaggedBlock { flag, payload })
    }

    /// Write a live record into the first tombstoned slot (first-fit scan
    /// from slot 0), appending a new slot if none is free. Returns the
    /// position used.
    pub fn write(&mut self, payload: &T) -> Result<i32> {
        let pos = self.insertion_pos()?;
        self.write_slot(pos, FLAG_LIVE, payload)?;
        Ok(pos)
    }

    /// Overwrite the record at an explicit, previously-returned position,
    /// marking it live. Used for in-place mutation, never for the original
    /// insert.
    pub fn write_at(&mut self, payload: &T, pos: i32) -> Result<()> {
        self.write_slot(pos, FLAG_LIVE, payload)
    }

    /// Tombstone the slot at `pos`. Payload bytes are left stale on disk.
    pub fn remove(&mut self, pos: i32) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.slot_offset(pos)))?;
        self.file.write_all(&FLAG_DEAD.to_le_bytes())?;
        Ok(())
    }

    /// Exchange the full slot contents (flag and payload bytes) of two
    /// positions. A position of -1 stands for an absent record: it
    /// contributes an invalid record to the other slot and receives no
    /// write itself.
    pub fn swap(&mut self, pos_a: i32, pos_b: i32) -> Result<()> {
        let raw_a = if pos_a == NIL {
            self.absent_slot()
        } else {
            self.read_slot_raw(pos_a)?
        };
        let raw_b = if pos_b == NIL {
            self.absent_slot()
        } else {
            self.read_slot_raw(pos_b)?
        };

        if pos_b != NIL {
            self.write_slot_raw(pos_b, &raw_a)?;
        }
        if pos_a != NIL {
            self.write_slot_raw(pos_a, &raw_b)?;
        }
        Ok(())
    }

    /// True iff the file holds zero records (header region only)
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.record_count()? == 0)
    }

    /// Number of record slots currently in the file (live or tombstoned)
    pub fn record_count(&mut self) -> Result<i32> {
        let len = self.file.metadata()?.len();
        let body = len.saturating_sub(self.header_size());
        Ok((body / self.slot_size()) as i32)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn header_size(&self) -> u64 {
        (self.flag_count * FLAG_SIZE) as u64
    }

    fn slot_size(&self) -> u64 {
        (FLAG_SIZE + T::SIZE) as u64
    }

    fn slot_offset(&self, pos: i32) -> u64 {
        debug_assert!(pos >= 0, "slot position must be non-negative");
        self.header_size() + pos as u64 * self.slot_size()
    }

    /// First-fit allocation: first non-live slot, else one past the end
    fn insertion_pos(&mut self) -> Result<i32> {
        let count = self.record_count()?;
        for pos in 0..count {
            if self.read_slot_flag(pos)? != FLAG_LIVE {
                tracing::trace!(pos, "reusing tombstoned slot");
                return Ok(pos);
            }
        }
        Ok(count)
    }

    fn read_slot_flag(&mut self, pos: i32) -> Result<i32> {
        let mut buf = [0u8; FLAG_SIZE];
        self.file.seek(SeekFrom::Start(self.slot_offset(pos)))?;
        self.file.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_slot_raw(&mut self, pos: i32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; FLAG_SIZE + T::SIZE];
        self.file.seek(SeekFrom::Start(self.slot_offset(pos)))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_slot_raw(&mut self, pos: i32, raw: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.slot_offset(pos)))?;
        self.file.write_all(raw)?;
        Ok(())
    }

    fn write_slot(&mut self, pos: i32, flag: i32, payload: &T) -> Result<()> {
        let mut raw = Vec::with_capacity(FLAG_SIZE + T::SIZE);
        raw.extend_from_slice(&flag.to_le_bytes());
        bincode::serialize_into(&mut raw, payload)?;
        debug_assert_eq!(
            raw.len(),
            FLAG_SIZE + T::SIZE,
            "payload encoding must match the declared fixed size"
        );
        self.write_slot_raw(pos, &raw)
    }

    /// Slot image standing in for position -1 in a swap
    fn absent_slot(&self) -> Vec<u8> {
        let mut raw = vec![0u8; FLAG_SIZE + T::SIZE];
        raw[..FLAG_SIZE].copy_from_slice(&NIL.to_le_bytes());
        raw
    }
}
