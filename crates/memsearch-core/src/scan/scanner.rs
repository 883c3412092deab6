use std::ops::ControlFlow;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::memory::{ProcessHandle, ReadMemory};

use super::options::ScanOptions;
use super::sink::ScanSink;
use super::stream::{MatchStream, ScanSummary};
use super::types::Match;

/// Scans one target's memory for AOB patterns.
///
/// The scanner owns its memory source; for a live process that is a
/// [`ProcessHandle`], released when the scanner is dropped.
#[derive(Debug)]
pub struct Scanner<R: ReadMemory = ProcessHandle> {
    memory: R,
}

impl Scanner<ProcessHandle> {
    /// Attach to a running process.
    pub fn open(pid: u32) -> Result<Self> {
        Ok(Self::new(ProcessHandle::open(pid)?))
    }

    pub fn pid(&self) -> u32 {
        self.memory.pid()
    }
}

impl<R: ReadMemory> Scanner<R> {
    pub fn new(memory: R) -> Self {
        Self { memory }
    }

    pub fn memory(&self) -> &R {
        &self.memory
    }

    pub fn into_inner(self) -> R {
        self.memory
    }

    /// Start a lazy scan.
    ///
    /// Fails only when the pattern in `options` is invalid, before any
    /// memory is touched.
    pub fn matches<'s>(
        &'s self,
        options: &ScanOptions,
        cancel: &CancelToken,
        sink: &'s mut dyn ScanSink,
    ) -> Result<MatchStream<'s, R>> {
        MatchStream::new(&self.memory, options, cancel, sink)
    }

    /// Scan and push every match to `handler` until it breaks, the token is
    /// cancelled or the walk completes.
    ///
    /// Returns `Ok` in all three cases; the summary's outcome says which
    /// one happened and how many matches were delivered.
    pub fn scan<F>(
        &self,
        options: &ScanOptions,
        cancel: &CancelToken,
        sink: &mut dyn ScanSink,
        mut handler: F,
    ) -> Result<ScanSummary>
    where
        F: FnMut(Match) -> ControlFlow<()>,
    {
        let mut stream = self.matches(options, cancel, sink)?;

        while let Some(found) = stream.next() {
            if handler(found).is_break() {
                debug!("Match handler requested stop");
                stream.stop();
                break;
            }
        }

        Ok(stream.into_summary())
    }

    /// Collect all matches into a vector.
    pub fn scan_all(
        &self,
        options: &ScanOptions,
        cancel: &CancelToken,
        sink: &mut dyn ScanSink,
    ) -> Result<(Vec<Match>, ScanSummary)> {
        let mut found = Vec::new();
        let summary = self.scan(options, cancel, sink, |m| {
            found.push(m);
            ControlFlow::Continue(())
        })?;
        Ok((found, summary))
    }
}
