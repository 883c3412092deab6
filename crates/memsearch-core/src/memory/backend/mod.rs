//! Platform backends. Each exposes the same `RawProcess` and
//! `find_pids_by_name` surface.

#[cfg(target_os = "windows")]
mod win32;
#[cfg(target_os = "windows")]
pub(crate) use win32::{RawProcess, find_pids_by_name};

#[cfg(target_os = "linux")]
mod procfs;
#[cfg(target_os = "linux")]
pub(crate) use procfs::{RawProcess, find_pids_by_name};

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod unsupported;
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub(crate) use unsupported::{RawProcess, find_pids_by_name};
