//! Scripted in-memory address space for tests.
//!
//! ```
//! use memsearch_core::memory::mock::MockMemoryBuilder;
//! use memsearch_core::memory::Protection;
//!
//! let memory = MockMemoryBuilder::new()
//!     .region(0x1000, b"Hello WeChat".to_vec(), Protection::ReadOnly)
//!     .reserved(0x2000, 0x1000)
//!     .build();
//! # let _ = memory;
//! ```

use std::cell::{Cell, RefCell};

use crate::error::{Error, Result};

use super::reader::ReadMemory;
use super::region::{CommitState, Protection, Region};

#[derive(Debug, Clone)]
struct MockRegion {
    region: Region,
    data: Vec<u8>,
    fail_reads: bool,
    /// Cap on bytes transferred per read
    read_limit: Option<usize>,
}

/// Builder for [`MockMemory`]
#[derive(Debug, Default)]
pub struct MockMemoryBuilder {
    regions: Vec<MockRegion>,
    degenerate: bool,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed region holding `data`
    pub fn region(self, base: u64, data: Vec<u8>, protection: Protection) -> Self {
        self.push(base, data, protection, CommitState::Committed, false, None)
    }

    /// Committed, readable region whose reads always fail
    pub fn unreadable(self, base: u64, data: Vec<u8>) -> Self {
        self.push(base, data, Protection::ReadWrite, CommitState::Committed, true, None)
    }

    /// Committed, readable region whose reads transfer at most `limit` bytes
    pub fn short_read(self, base: u64, data: Vec<u8>, limit: usize) -> Self {
        self.push(
            base,
            data,
            Protection::ReadWrite,
            CommitState::Committed,
            false,
            Some(limit),
        )
    }

    /// Reserved (uncommitted) region of `size` bytes filled with `fill`
    pub fn reserved_with(self, base: u64, size: usize, fill: u8) -> Self {
        self.push(
            base,
            vec![fill; size],
            Protection::ReadWrite,
            CommitState::Reserved,
            false,
            None,
        )
    }

    pub fn reserved(self, base: u64, size: usize) -> Self {
        self.reserved_with(base, size, 0)
    }

    /// Zero-sized descriptor reported when the walk lands exactly on `base`
    pub fn zero_sized(self, base: u64) -> Self {
        self.push(
            base,
            Vec::new(),
            Protection::ReadWrite,
            CommitState::Committed,
            false,
            None,
        )
    }

    /// Every query reports a zero-sized region at the queried address
    pub fn degenerate(mut self) -> Self {
        self.degenerate = true;
        self
    }

    fn push(
        mut self,
        base: u64,
        data: Vec<u8>,
        protection: Protection,
        state: CommitState,
        fail_reads: bool,
        read_limit: Option<usize>,
    ) -> Self {
        self.regions.push(MockRegion {
            region: Region::new(base, data.len() as u64, protection, state),
            data,
            fail_reads,
            read_limit,
        });
        self
    }

    pub fn build(mut self) -> MockMemory {
        self.regions.sort_by_key(|r| r.region.base);
        MockMemory {
            regions: self.regions,
            degenerate: self.degenerate,
            queries: Cell::new(0),
            reads: RefCell::new(Vec::new()),
        }
    }
}

/// A fake address space implementing [`ReadMemory`].
///
/// Unmapped space between regions is reported as free. Queries past the
/// last region fail, which ends a walk.
#[derive(Debug)]
pub struct MockMemory {
    regions: Vec<MockRegion>,
    degenerate: bool,
    queries: Cell<usize>,
    reads: RefCell<Vec<u64>>,
}

impl MockMemory {
    /// Number of `query_region` calls so far
    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    /// Addresses passed to `read_bytes`, in call order
    pub fn read_addresses(&self) -> Vec<u64> {
        self.reads.borrow().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.borrow().len()
    }
}

impl ReadMemory for MockMemory {
    fn query_region(&self, address: u64) -> Result<Region> {
        self.queries.set(self.queries.get() + 1);

        if self.degenerate {
            return Ok(Region::new(
                address,
                0,
                Protection::ReadWrite,
                CommitState::Committed,
            ));
        }

        for mock in &self.regions {
            let region = mock.region;
            if region.size == 0 {
                if region.base == address {
                    return Ok(region);
                }
                continue;
            }
            if region.end() > address {
                if region.base > address {
                    return Ok(Region::new(
                        address,
                        region.base - address,
                        Protection::NoAccess,
                        CommitState::Free,
                    ));
                }
                return Ok(region);
            }
        }

        Err(Error::RegionQueryFailed {
            address,
            message: "no further regions".to_string(),
        })
    }

    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.reads.borrow_mut().push(address);

        let mock = self
            .regions
            .iter()
            .find(|m| m.region.base <= address && address < m.region.end())
            .ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: "unmapped".to_string(),
            })?;

        if mock.fail_reads {
            return Err(Error::MemoryReadFailed {
                address,
                message: "read failed".to_string(),
            });
        }

        let start = (address - mock.region.base) as usize;
        let mut len = size.min(mock.data.len() - start);
        if let Some(limit) = mock.read_limit {
            len = len.min(limit);
        }
        Ok(mock.data[start..start + len].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_reports_gaps_as_free() {
        let memory = MockMemoryBuilder::new()
            .region(0x1000, vec![1; 0x100], Protection::ReadOnly)
            .build();

        let gap = memory.query_region(0).unwrap();
        assert_eq!((gap.base, gap.size), (0, 0x1000));
        assert_eq!(gap.state, CommitState::Free);

        let region = memory.query_region(0x1010).unwrap();
        assert_eq!((region.base, region.size), (0x1000, 0x100));

        assert!(memory.query_region(0x1100).is_err());
        assert_eq!(memory.query_count(), 3);
    }

    #[test]
    fn test_reads_are_recorded_and_limited() {
        let memory = MockMemoryBuilder::new()
            .short_read(0x1000, b"abcdef".to_vec(), 4)
            .unreadable(0x2000, b"xyz".to_vec())
            .build();

        assert_eq!(memory.read_bytes(0x1001, 10).unwrap(), b"bcde".to_vec());
        assert!(memory.read_bytes(0x2000, 3).is_err());
        assert_eq!(memory.read_addresses(), vec![0x1001, 0x2000]);
    }
}
