//! Windows backend: `VirtualQueryEx` / `ReadProcessMemory` / Toolhelp.

use std::ffi::c_void;
use std::mem;

use tracing::debug;
use windows::Win32::Foundation::{CloseHandle, ERROR_NO_MORE_FILES, HANDLE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
    TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Memory::{
    MEM_COMMIT, MEM_RESERVE, MEMORY_BASIC_INFORMATION, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
    PAGE_GUARD, PAGE_NOACCESS, PAGE_PROTECTION_FLAGS, PAGE_READONLY, PAGE_READWRITE,
    VirtualQueryEx,
};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ};

use crate::error::{Error, Result};
use crate::memory::region::{CommitState, Protection, Region};

/// Owned process handle, closed on drop
pub struct RawProcess {
    handle: HANDLE,
}

impl RawProcess {
    pub fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess has no memory-safety preconditions; the returned
        // handle is owned by RawProcess and closed exactly once in Drop.
        let handle = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid) }
            .map_err(|e| Error::ProcessOpenFailed {
                pid,
                message: e.to_string(),
            })?;
        Ok(Self { handle })
    }

    pub fn query_region(&self, address: u64) -> Result<Region> {
        let mut mbi = MEMORY_BASIC_INFORMATION::default();
        // SAFETY: mbi is a valid, writable MEMORY_BASIC_INFORMATION and the
        // length passed matches its size.
        let written = unsafe {
            VirtualQueryEx(
                self.handle,
                Some(address as usize as *const c_void),
                &mut mbi,
                mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        if written == 0 {
            return Err(Error::RegionQueryFailed {
                address,
                message: windows::core::Error::from_win32().to_string(),
            });
        }

        Ok(Region::new(
            mbi.BaseAddress as usize as u64,
            mbi.RegionSize as u64,
            classify_protection(mbi.Protect),
            if mbi.State == MEM_COMMIT {
                CommitState::Committed
            } else if mbi.State == MEM_RESERVE {
                CommitState::Reserved
            } else {
                CommitState::Free
            },
        ))
    }

    pub fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0usize;

        // SAFETY: buffer is valid for `size` writable bytes, and bytes_read
        // outlives the call.
        unsafe {
            ReadProcessMemory(
                self.handle,
                address as usize as *const c_void,
                buffer.as_mut_ptr().cast(),
                size,
                Some(&mut bytes_read as *mut usize),
            )
        }
        .map_err(|e| Error::MemoryReadFailed {
            address,
            message: e.to_string(),
        })?;

        buffer.truncate(bytes_read);
        Ok(buffer)
    }
}

impl Drop for RawProcess {
    fn drop(&mut self) {
        if self.handle.is_invalid() {
            return;
        }
        // SAFETY: the handle came from OpenProcess and is not used after this.
        if let Err(e) = unsafe { CloseHandle(self.handle) } {
            debug!("CloseHandle failed: {}", e);
        }
        self.handle = HANDLE::default();
    }
}

fn classify_protection(protect: PAGE_PROTECTION_FLAGS) -> Protection {
    if protect.0 & PAGE_GUARD.0 != 0 {
        return Protection::Guard;
    }
    if protect.0 & PAGE_NOACCESS.0 != 0 {
        return Protection::NoAccess;
    }

    // Low byte holds the base protection; PAGE_NOCACHE and friends live above it
    let base = protect.0 & 0xFF;
    if base == PAGE_READONLY.0 {
        Protection::ReadOnly
    } else if base == PAGE_READWRITE.0 {
        Protection::ReadWrite
    } else if base == PAGE_EXECUTE_READ.0 {
        Protection::ExecuteRead
    } else if base == PAGE_EXECUTE_READWRITE.0 {
        Protection::ExecuteReadWrite
    } else {
        Protection::Other
    }
}

struct Snapshot(HANDLE);

impl Drop for Snapshot {
    fn drop(&mut self) {
        // SAFETY: the handle came from CreateToolhelp32Snapshot.
        let _ = unsafe { CloseHandle(self.0) };
    }
}

/// Collect the PIDs whose executable name equals `name`, ignoring case.
pub fn find_pids_by_name(name: &str) -> Result<Vec<u32>> {
    // SAFETY: plain snapshot creation; the handle is closed by Snapshot.
    let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
        .map(Snapshot)
        .map_err(|e| Error::ProcessEnumerationFailed(e.to_string()))?;

    let mut entry = PROCESSENTRY32W {
        dwSize: mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    // SAFETY: entry is initialised with its own size as the API requires.
    unsafe { Process32FirstW(snapshot.0, &mut entry) }
        .map_err(|e| Error::ProcessEnumerationFailed(e.to_string()))?;

    let wanted = name.to_lowercase();
    let mut pids = Vec::new();
    loop {
        let len = entry
            .szExeFile
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(entry.szExeFile.len());
        let exe = String::from_utf16_lossy(&entry.szExeFile[..len]);
        if exe.to_lowercase() == wanted {
            pids.push(entry.th32ProcessID);
        }

        // SAFETY: same entry buffer as above.
        if let Err(e) = unsafe { Process32NextW(snapshot.0, &mut entry) } {
            if e.code() == ERROR_NO_MORE_FILES.to_hresult() {
                break;
            }
            return Err(Error::ProcessEnumerationFailed(e.to_string()));
        }
    }

    Ok(pids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::System::Memory::{PAGE_EXECUTE, PAGE_NOCACHE, PAGE_WRITECOPY};

    #[test]
    fn test_classify_protection() {
        assert_eq!(classify_protection(PAGE_READONLY), Protection::ReadOnly);
        assert_eq!(classify_protection(PAGE_READWRITE), Protection::ReadWrite);
        assert_eq!(
            classify_protection(PAGE_EXECUTE_READWRITE),
            Protection::ExecuteReadWrite
        );
        assert_eq!(
            classify_protection(PAGE_PROTECTION_FLAGS(PAGE_READWRITE.0 | PAGE_NOCACHE.0)),
            Protection::ReadWrite
        );
        assert_eq!(
            classify_protection(PAGE_PROTECTION_FLAGS(PAGE_READWRITE.0 | PAGE_GUARD.0)),
            Protection::Guard
        );
        assert_eq!(classify_protection(PAGE_NOACCESS), Protection::NoAccess);
        assert_eq!(classify_protection(PAGE_WRITECOPY), Protection::Other);
        assert_eq!(classify_protection(PAGE_EXECUTE), Protection::Other);
    }

    #[test]
    fn test_open_own_process_and_read() {
        let marker = *b"memsearch-win32-marker";
        let raw = RawProcess::open(std::process::id()).unwrap();
        let address = marker.as_ptr() as usize as u64;

        let region = raw.query_region(address).unwrap();
        assert!(region.base <= address && address < region.end());
        assert!(region.is_scannable());

        let bytes = raw.read_bytes(address, marker.len()).unwrap();
        assert_eq!(bytes, marker);
    }
}
