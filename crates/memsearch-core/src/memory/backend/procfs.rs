//! Linux backend: `/proc/<pid>/maps` for the region walk and
//! `/proc/<pid>/mem` for reads.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::memory::region::{CommitState, Protection, Region};

/// One parsed line of a maps file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MapEntry {
    start: u64,
    end: u64,
    protection: Protection,
}

/// Open `/proc/<pid>/mem` file, closed on drop
pub struct RawProcess {
    mem: File,
    maps_path: PathBuf,
}

impl RawProcess {
    pub fn open(pid: u32) -> Result<Self> {
        let proc_dir = PathBuf::from(format!("/proc/{}", pid));
        let mem = File::open(proc_dir.join("mem")).map_err(|e| Error::ProcessOpenFailed {
            pid,
            message: e.to_string(),
        })?;

        Ok(Self {
            mem,
            maps_path: proc_dir.join("maps"),
        })
    }

    pub fn query_region(&self, address: u64) -> Result<Region> {
        // Mappings change while the target runs, so every query reads a fresh copy
        let maps = fs::read_to_string(&self.maps_path).map_err(|e| Error::RegionQueryFailed {
            address,
            message: e.to_string(),
        })?;

        region_at(&maps, address).ok_or_else(|| Error::RegionQueryFailed {
            address,
            message: "no further regions".to_string(),
        })
    }

    pub fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut filled = 0usize;

        while filled < size {
            match self.mem.read_at(&mut buffer[filled..], address + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if filled == 0 => {
                    return Err(Error::MemoryReadFailed {
                        address,
                        message: e.to_string(),
                    });
                }
                // Keep what was transferred before the fault
                Err(_) => break,
            }
        }

        buffer.truncate(filled);
        Ok(buffer)
    }
}

fn parse_maps_line(line: &str) -> Option<MapEntry> {
    let mut fields = line.split_whitespace();
    let (start, end) = fields.next()?.split_once('-')?;
    let perms = fields.next()?.as_bytes();
    if perms.len() < 3 {
        return None;
    }

    let protection = match (perms[0] == b'r', perms[1] == b'w', perms[2] == b'x') {
        (true, false, false) => Protection::ReadOnly,
        (true, true, false) => Protection::ReadWrite,
        (true, false, true) => Protection::ExecuteRead,
        (true, true, true) => Protection::ExecuteReadWrite,
        (false, false, false) => Protection::NoAccess,
        _ => Protection::Other,
    };

    Some(MapEntry {
        start: u64::from_str_radix(start, 16).ok()?,
        end: u64::from_str_radix(end, 16).ok()?,
        protection,
    })
}

/// The mapping containing `address`, or the unmapped gap before the next one.
fn region_at(maps: &str, address: u64) -> Option<Region> {
    let entry = maps
        .lines()
        .filter_map(parse_maps_line)
        .find(|entry| entry.end > address)?;

    if entry.start > address {
        return Some(Region::new(
            address,
            entry.start - address,
            Protection::NoAccess,
            CommitState::Free,
        ));
    }

    Some(Region::new(
        entry.start,
        entry.end - entry.start,
        entry.protection,
        CommitState::Committed,
    ))
}

/// Collect the PIDs whose executable name equals `name`, ignoring case.
///
/// Both the `exe` link target and `comm` are compared, since `comm` is
/// truncated to 15 bytes and `exe` is unreadable for other users' processes.
pub fn find_pids_by_name(name: &str) -> Result<Vec<u32>> {
    let wanted = name.to_lowercase();
    let mut pids = Vec::new();

    for entry in fs::read_dir("/proc").map_err(|e| Error::ProcessEnumerationFailed(e.to_string()))? {
        let Ok(entry) = entry else { continue };
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };

        let exe_name = fs::read_link(entry.path().join("exe"))
            .ok()
            .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()));
        let comm = fs::read_to_string(entry.path().join("comm"))
            .ok()
            .map(|s| s.trim_end().to_string());

        if exe_name
            .iter()
            .chain(comm.iter())
            .any(|candidate| candidate.to_lowercase() == wanted)
        {
            pids.push(pid);
        }
    }

    pids.sort_unstable();
    Ok(pids)
}
