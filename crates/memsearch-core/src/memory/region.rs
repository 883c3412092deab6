//! Virtual memory region descriptors.

use serde::Serialize;
use strum::Display;

/// Page protection of a region, reduced to what the scanner cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Protection {
    ReadOnly,
    ReadWrite,
    ExecuteRead,
    ExecuteReadWrite,
    /// Guard pages fault on first access
    Guard,
    NoAccess,
    /// Execute-only, write-copy and anything else that is not plainly readable
    Other,
}

impl Protection {
    pub fn is_readable(self) -> bool {
        matches!(
            self,
            Protection::ReadOnly
                | Protection::ReadWrite
                | Protection::ExecuteRead
                | Protection::ExecuteReadWrite
        )
    }
}

/// Whether a region is backed by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum CommitState {
    Committed,
    Reserved,
    Free,
}

/// A contiguous range of the target's address space with uniform
/// protection and commit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub base: u64,
    pub size: u64,
    pub protection: Protection,
    pub state: CommitState,
}

impl Region {
    pub fn new(base: u64, size: u64, protection: Protection, state: CommitState) -> Self {
        Self {
            base,
            size,
            protection,
            state,
        }
    }

    /// Exclusive end address, saturating at `u64::MAX`
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    /// Only committed, plainly readable regions are scanned.
    pub fn is_scannable(&self) -> bool {
        self.state == CommitState::Committed && self.protection.is_readable()
    }

    /// Overlap between this region and `[min_address, max_address)` as
    /// `(start, length)`, or `None` when they do not overlap.
    ///
    /// The read never extends past `max_address`, so its length is at most
    /// `min(size, max_address - base)`.
    pub fn readable_span(&self, min_address: u64, max_address: u64) -> Option<(u64, usize)> {
        let start = self.base.max(min_address);
        let end = self.end().min(max_address);
        if end <= start {
            return None;
        }
        let len = usize::try_from(end - start).ok()?;
        Some((start, len))
    }

    /// Cursor position after visiting this region from `cursor`.
    ///
    /// Always moves forward by at least one address, even for zero-sized or
    /// stale descriptors.
    pub fn next_cursor(&self, cursor: u64) -> u64 {
        let next = self.end();
        if self.size == 0 || next <= cursor {
            cursor.saturating_add(1)
        } else {
            next
        }
    }
}
