use tracing::debug;

use crate::error::{Error, Result};

use super::backend::{self, RawProcess};
use super::reader::ReadMemory;
use super::region::Region;

/// An open, read-only handle to another process.
///
/// The OS handle is acquired in [`ProcessHandle::open`] and released when
/// the value is dropped.
pub struct ProcessHandle {
    pid: u32,
    raw: RawProcess,
}

impl ProcessHandle {
    pub fn open(pid: u32) -> Result<Self> {
        let raw = RawProcess::open(pid)?;
        debug!("Opened process {}", pid);
        Ok(Self { pid, raw })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle").field("pid", &self.pid).finish()
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        debug!("Closing process {}", self.pid);
    }
}

impl ReadMemory for ProcessHandle {
    fn query_region(&self, address: u64) -> Result<Region> {
        self.raw.query_region(address)
    }

    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.raw.read_bytes(address, size)
    }
}

/// Find all processes whose executable name equals `name` (case-insensitive).
///
/// Returns [`Error::ProcessNotFound`] when nothing matches. Enumeration
/// failures are reported as errors too; callers treat both as "nothing to
/// scan".
pub fn find_processes_by_name(name: &str) -> Result<Vec<u32>> {
    let pids = backend::find_pids_by_name(name)?;
    if pids.is_empty() {
        return Err(Error::ProcessNotFound(name.to_string()));
    }
    debug!("Found {} process(es) named {}: {:?}", pids.len(), name, pids);
    Ok(pids)
}
