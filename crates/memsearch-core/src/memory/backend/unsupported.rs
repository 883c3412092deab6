//! Fallback for platforms without a memory backend.

use crate::error::{Error, Result};
use crate::memory::region::Region;

pub struct RawProcess {
    _private: (),
}

impl RawProcess {
    pub fn open(_pid: u32) -> Result<Self> {
        Err(Error::Unsupported)
    }

    pub fn query_region(&self, _address: u64) -> Result<Region> {
        Err(Error::Unsupported)
    }

    pub fn read_bytes(&self, _address: u64, _size: usize) -> Result<Vec<u8>> {
        Err(Error::Unsupported)
    }
}

pub fn find_pids_by_name(_name: &str) -> Result<Vec<u32>> {
    Err(Error::Unsupported)
}
