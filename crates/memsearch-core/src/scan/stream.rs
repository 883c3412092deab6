//! The region walk as a lazy, cancellable iterator of matches.

use std::iter::FusedIterator;

use serde::Serialize;
use strum::Display;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::memory::{ReadMemory, Region};
use crate::pattern::PatternMatcher;

use super::options::ScanOptions;
use super::sink::{ScanSink, SkipReason};
use super::types::{Address, Match};

/// How a scan ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ScanOutcome {
    /// The walk reached the upper bound or ran out of regions
    Completed,
    /// The consumer asked to stop early
    Stopped,
    /// The cancellation token was observed
    Cancelled,
}

/// Lifecycle of a [`MatchStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ScanState {
    Ready,
    Walking,
    Finished(ScanOutcome),
}

impl ScanState {
    pub fn is_finished(self) -> bool {
        matches!(self, ScanState::Finished(_))
    }
}

/// Totals for one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub outcome: ScanOutcome,
    /// Matches delivered to the consumer
    pub matches: usize,
    pub regions_scanned: usize,
    pub regions_skipped: usize,
    pub bytes_scanned: u64,
}

/// Matches found in one region, waiting to be delivered
struct RegionHits {
    start: u64,
    buffer: Vec<u8>,
    offsets: std::vec::IntoIter<usize>,
}

/// A finite, non-restartable stream of matches over a target's memory.
///
/// Regions are read lazily: nothing is read until the consumer asks for the
/// next match, and after [`MatchStream::stop`] or cancellation no further
/// region is queried or read. The final [`ScanState`] tells natural
/// exhaustion, early stop and cancellation apart.
pub struct MatchStream<'s, R: ReadMemory + ?Sized> {
    memory: &'s R,
    matcher: PatternMatcher,
    options: ScanOptions,
    cancel: CancelToken,
    sink: &'s mut dyn ScanSink,
    cursor: u64,
    pending: Option<RegionHits>,
    state: ScanState,
    matches: usize,
    regions_scanned: usize,
    regions_skipped: usize,
    bytes_scanned: u64,
}

impl<'s, R: ReadMemory + ?Sized> MatchStream<'s, R> {
    /// Validate the options and prepare a walk. Nothing is read yet.
    pub fn new(
        memory: &'s R,
        options: &ScanOptions,
        cancel: &CancelToken,
        sink: &'s mut dyn ScanSink,
    ) -> Result<Self> {
        let matcher = options.matcher()?;

        Ok(Self {
            memory,
            matcher,
            options: options.clone(),
            cancel: cancel.clone(),
            sink,
            cursor: options.min_address,
            pending: None,
            state: ScanState::Ready,
            matches: 0,
            regions_scanned: 0,
            regions_skipped: 0,
            bytes_scanned: 0,
        })
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Pattern length, which is also the length of every match payload
    pub fn pattern_len(&self) -> usize {
        self.matcher.len()
    }

    /// Totals once the stream has finished
    pub fn summary(&self) -> Option<ScanSummary> {
        match self.state {
            ScanState::Finished(outcome) => Some(self.summary_with(outcome)),
            _ => None,
        }
    }

    /// End the scan at the consumer's request.
    ///
    /// Pending matches of the current region are discarded and no further
    /// region is read. Has no effect on a stream that already finished.
    pub fn stop(&mut self) {
        if !self.state.is_finished() {
            self.finish(ScanOutcome::Stopped);
        }
    }

    /// Stop if still running and return the totals.
    pub fn into_summary(mut self) -> ScanSummary {
        self.stop();
        match self.state {
            ScanState::Finished(outcome) => self.summary_with(outcome),
            // stop() always finishes the stream
            _ => self.summary_with(ScanOutcome::Stopped),
        }
    }

    fn summary_with(&self, outcome: ScanOutcome) -> ScanSummary {
        ScanSummary {
            outcome,
            matches: self.matches,
            regions_scanned: self.regions_scanned,
            regions_skipped: self.regions_skipped,
            bytes_scanned: self.bytes_scanned,
        }
    }

    fn finish(&mut self, outcome: ScanOutcome) {
        if self.state == ScanState::Ready {
            self.sink.scan_started(&self.options);
        }
        self.pending = None;
        self.state = ScanState::Finished(outcome);
        let summary = self.summary_with(outcome);
        self.sink.scan_finished(&summary);
    }

    /// Read and match one region. Failures are absorbed: the region is skipped.
    fn scan_region(&mut self, region: &Region) -> Option<RegionHits> {
        if !region.is_scannable() {
            self.skip(region, SkipReason::NotScannable);
            return None;
        }

        let Some((start, len)) =
            region.readable_span(self.options.min_address, self.options.max_address)
        else {
            self.skip(region, SkipReason::OutOfBounds);
            return None;
        };

        let mut buffer = match self.memory.read_bytes(start, len) {
            Ok(buffer) => buffer,
            Err(e) => {
                debug!("Skipping region 0x{:X}: {}", region.base, e);
                self.skip(region, SkipReason::ReadFailed);
                return None;
            }
        };
        if buffer.is_empty() {
            self.skip(region, SkipReason::EmptyRead);
            return None;
        }
        buffer.truncate(len);

        let offsets = self.matcher.find(&buffer, self.options.ignore_case);
        self.regions_scanned += 1;
        self.bytes_scanned += buffer.len() as u64;
        self.sink.region_scanned(region, buffer.len(), offsets.len());

        if offsets.is_empty() {
            return None;
        }
        Some(RegionHits {
            start,
            buffer,
            offsets: offsets.into_iter(),
        })
    }

    fn skip(&mut self, region: &Region, reason: SkipReason) {
        self.regions_skipped += 1;
        self.sink.region_skipped(region, reason);
    }
}

impl<R: ReadMemory + ?Sized> Iterator for MatchStream<'_, R> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        match self.state {
            ScanState::Finished(_) => return None,
            ScanState::Ready => {
                self.sink.scan_started(&self.options);
                self.state = ScanState::Walking;
            }
            ScanState::Walking => {}
        }

        loop {
            // Deliver what is left of the current region first
            let next_offset = self.pending.as_mut().and_then(|hits| hits.offsets.next());
            if let Some(offset) = next_offset {
                if self.cancel.is_cancelled() {
                    self.finish(ScanOutcome::Cancelled);
                    return None;
                }

                let len = self.matcher.len();
                let hits = self.pending.as_ref()?;
                let found = Match::new(
                    Address(hits.start + offset as u64),
                    hits.buffer[offset..offset + len].to_vec(),
                );
                self.matches += 1;
                self.sink.match_found(&found);
                return Some(found);
            }
            self.pending = None;

            if self.cursor >= self.options.max_address {
                self.finish(ScanOutcome::Completed);
                return None;
            }
            if self.cancel.is_cancelled() {
                self.finish(ScanOutcome::Cancelled);
                return None;
            }

            let region = match self.memory.query_region(self.cursor) {
                Ok(region) => region,
                Err(e) => {
                    debug!("Region walk ended at 0x{:X}: {}", self.cursor, e);
                    self.finish(ScanOutcome::Completed);
                    return None;
                }
            };
            self.cursor = region.next_cursor(self.cursor);
            self.pending = self.scan_region(&region);
        }
    }
}

impl<R: ReadMemory + ?Sized> FusedIterator for MatchStream<'_, R> {}

impl<R: ReadMemory + ?Sized> Drop for MatchStream<'_, R> {
    fn drop(&mut self) {
        // An abandoned walk counts as an early stop
        if self.state == ScanState::Walking {
            self.finish(ScanOutcome::Stopped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemoryBuilder, Protection};
    use crate::scan::NullSink;

    fn options(pattern: &str) -> ScanOptions {
        ScanOptions::builder().pattern(pattern).build()
    }

    #[test]
    fn test_stream_is_lazy() {
        let memory = MockMemoryBuilder::new()
            .region(0x1000, b"AxxA".to_vec(), Protection::ReadOnly)
            .region(0x2000, b"AA".to_vec(), Protection::ReadOnly)
            .build();
        let mut sink = NullSink;
        let mut stream =
            MatchStream::new(&memory, &options("41"), &CancelToken::new(), &mut sink).unwrap();

        assert_eq!(stream.state(), ScanState::Ready);
        assert_eq!(memory.query_count(), 0);

        let first = stream.next().unwrap();
        assert_eq!(first.address, Address(0x1000));
        assert_eq!(stream.state(), ScanState::Walking);
        assert_eq!(memory.read_count(), 1);

        // Second hit of the same region comes from the buffered read
        assert_eq!(stream.next().unwrap().address, Address(0x1003));
        assert_eq!(memory.read_count(), 1);
    }

    #[test]
    fn test_stop_discards_pending_hits() {
        let memory = MockMemoryBuilder::new()
            .region(0x1000, b"AAAA".to_vec(), Protection::ReadWrite)
            .region(0x2000, b"AAAA".to_vec(), Protection::ReadWrite)
            .build();
        let mut sink = NullSink;
        let mut stream =
            MatchStream::new(&memory, &options("41"), &CancelToken::new(), &mut sink).unwrap();

        assert!(stream.next().is_some());
        stream.stop();
        assert_eq!(stream.state(), ScanState::Finished(ScanOutcome::Stopped));
        assert!(stream.next().is_none());
        assert_eq!(memory.read_count(), 1);

        let summary = stream.summary().unwrap();
        assert_eq!(summary.matches, 1);
        assert_eq!(summary.outcome, ScanOutcome::Stopped);
    }

    #[test]
    fn test_invalid_pattern_fails_before_access() {
        let memory = MockMemoryBuilder::new()
            .region(0x1000, b"AAAA".to_vec(), Protection::ReadWrite)
            .build();
        let mut sink = NullSink;
        let result = MatchStream::new(&memory, &options("4"), &CancelToken::new(), &mut sink);

        assert!(result.is_err_and(|e| e.is_configuration()));
        assert_eq!(memory.query_count(), 0);
        assert_eq!(memory.read_count(), 0);
    }

    #[test]
    fn test_into_summary_of_unstarted_stream() {
        let memory = MockMemoryBuilder::new().build();
        let mut sink = NullSink;
        let stream =
            MatchStream::new(&memory, &options("41"), &CancelToken::new(), &mut sink).unwrap();

        let summary = stream.into_summary();
        assert_eq!(summary.outcome, ScanOutcome::Stopped);
        assert_eq!(summary.matches, 0);
        assert_eq!(memory.query_count(), 0);
    }
}
