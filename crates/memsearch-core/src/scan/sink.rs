//! Scan event sinks.
//!
//! A sink is handed to each scan invocation and receives its progress
//! events. The engine keeps no logging state of its own.

use strum::Display;
use tracing::{debug, trace};

use crate::memory::Region;

use super::options::ScanOptions;
use super::stream::ScanSummary;
use super::types::Match;

/// Why a region was not matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SkipReason {
    /// Uncommitted, guarded or not readable
    NotScannable,
    /// No overlap with the scan bounds
    OutOfBounds,
    /// The read failed, e.g. the region was unmapped concurrently
    ReadFailed,
    /// The read succeeded but transferred nothing
    EmptyRead,
}

/// Receiver for scan progress events. Every method defaults to a no-op.
pub trait ScanSink {
    fn scan_started(&mut self, _options: &ScanOptions) {}

    fn region_skipped(&mut self, _region: &Region, _reason: SkipReason) {}

    fn region_scanned(&mut self, _region: &Region, _bytes_read: usize, _hits: usize) {}

    fn match_found(&mut self, _found: &Match) {}

    fn scan_finished(&mut self, _summary: &ScanSummary) {}
}

/// Discards all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ScanSink for NullSink {}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ScanSink for TracingSink {
    fn scan_started(&mut self, options: &ScanOptions) {
        debug!(
            "Scanning 0x{:X}..0x{:X} (ignore_case={}) for {}",
            options.min_address, options.max_address, options.ignore_case, options.pattern
        );
    }

    fn region_skipped(&mut self, region: &Region, reason: SkipReason) {
        trace!(
            "Skipped region 0x{:X} (+0x{:X}, {}, {}): {}",
            region.base, region.size, region.protection, region.state, reason
        );
    }

    fn region_scanned(&mut self, region: &Region, bytes_read: usize, hits: usize) {
        if hits > 0 {
            debug!(
                "Region 0x{:X}: {} match(es) in {} bytes",
                region.base, hits, bytes_read
            );
        } else {
            trace!("Region 0x{:X}: no matches in {} bytes", region.base, bytes_read);
        }
    }

    fn match_found(&mut self, found: &Match) {
        trace!("Match at {}", found.address);
    }

    fn scan_finished(&mut self, summary: &ScanSummary) {
        debug!(
            "Scan {}: {} match(es), {} region(s) scanned, {} skipped, {} bytes read",
            summary.outcome,
            summary.matches,
            summary.regions_scanned,
            summary.regions_skipped,
            summary.bytes_scanned
        );
    }
}
