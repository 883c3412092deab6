//! # memsearch-core
//!
//! Core library for searching another process's memory.
//!
//! This crate provides:
//! - AOB pattern compilation and wildcard matching (`pattern`)
//! - Read-only process memory access behind the `ReadMemory` seam, with
//!   Windows and Linux backends (`memory`)
//! - The region-walking scan engine with cooperative cancellation (`scan`)

pub mod cancel;
pub mod config;
pub mod error;
pub mod memory;
pub mod pattern;
pub mod scan;

pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use memory::{
    CommitState, ProcessHandle, Protection, ReadMemory, Region, find_processes_by_name,
};
pub use pattern::{
    Pattern, PatternMatcher, PatternToken, SearchEncoding, compile, compile_bytes,
};
pub use scan::{
    Address, Match, MatchStream, NullSink, ScanOptions, ScanOptionsBuilder, ScanOutcome,
    ScanSink, ScanState, ScanSummary, Scanner, SkipReason, TracingSink,
};
