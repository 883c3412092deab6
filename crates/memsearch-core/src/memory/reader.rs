use crate::error::Result;

use super::region::Region;

/// Access to another process's address space.
///
/// This is the seam between the platform-independent scanner and the
/// OS-specific backends. Implementations must be read-only.
pub trait ReadMemory {
    /// Describe the region containing `address`, or the next region after it.
    ///
    /// An error means there is nothing further to walk.
    fn query_region(&self, address: u64) -> Result<Region>;

    /// Read up to `size` bytes starting at `address`.
    ///
    /// The returned buffer holds only the bytes actually transferred and may
    /// be shorter than `size`.
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;
}

impl<R: ReadMemory + ?Sized> ReadMemory for &R {
    fn query_region(&self, address: u64) -> Result<Region> {
        (**self).query_region(address)
    }

    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}
