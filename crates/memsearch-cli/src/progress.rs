use std::io::Write;

use memsearch_core::config::report::PROGRESS_INTERVAL;
use memsearch_core::{
    Match, Region, ScanOptions, ScanSink, ScanSummary, SearchEncoding, SkipReason, TracingSink,
};

use crate::log_file::RunLog;
use crate::output::MatchRecord;

/// Scan sink for one process: progress on stderr, every match to the run
/// log, and region events to `tracing`.
pub struct ProgressSink<'a> {
    pid: u32,
    encoding: SearchEncoding,
    log: Option<&'a mut RunLog>,
    found: usize,
    tracing: TracingSink,
}

impl<'a> ProgressSink<'a> {
    pub fn new(pid: u32, encoding: SearchEncoding, log: Option<&'a mut RunLog>) -> Self {
        Self {
            pid,
            encoding,
            log,
            found: 0,
            tracing: TracingSink,
        }
    }

    pub fn found(&self) -> usize {
        self.found
    }
}

impl ScanSink for ProgressSink<'_> {
    fn scan_started(&mut self, options: &ScanOptions) {
        if let Some(log) = self.log.as_deref_mut() {
            log.line(format_args!("Scanning process {}", self.pid));
        }
        self.tracing.scan_started(options);
    }

    fn region_skipped(&mut self, region: &Region, reason: SkipReason) {
        self.tracing.region_skipped(region, reason);
    }

    fn region_scanned(&mut self, region: &Region, bytes_read: usize, hits: usize) {
        self.tracing.region_scanned(region, bytes_read, hits);
    }

    fn match_found(&mut self, found: &Match) {
        self.found += 1;

        if let Some(log) = self.log.as_deref_mut() {
            let record = MatchRecord::new(found, self.encoding);
            log.line(format_args!(
                "  [{}] {}: {}",
                self.found, record.address, record.content
            ));
        }

        if self.found % PROGRESS_INTERVAL == 0 {
            let mut stderr = std::io::stderr();
            let _ = write!(
                stderr,
                "\rProcess {}: {} match(es) so far...",
                self.pid, self.found
            );
            let _ = stderr.flush();
        }
        self.tracing.match_found(found);
    }

    fn scan_finished(&mut self, summary: &ScanSummary) {
        if self.found >= PROGRESS_INTERVAL {
            eprintln!();
        }
        if let Some(log) = self.log.as_deref_mut() {
            log.line(format_args!(
                "Process {}: {} match(es) ({})",
                self.pid, summary.matches, summary.outcome
            ));
        }
        self.tracing.scan_finished(summary);
    }
}
