//! End-to-end scans over a scripted address space.

use std::ops::ControlFlow;

use memsearch_core::memory::{MockMemory, MockMemoryBuilder, Protection};
use memsearch_core::{
    Address, CancelToken, Match, NullSink, Region, ScanOptions, ScanOutcome, ScanSink,
    ScanSummary, Scanner, SkipReason, compile,
};

fn options(pattern: &str) -> ScanOptions {
    ScanOptions::builder().pattern(pattern).build()
}

fn addresses(found: &[Match]) -> Vec<u64> {
    found.iter().map(|m| m.address.value()).collect()
}

/// Three readable regions with two "AA" hits each
fn three_regions() -> MockMemory {
    MockMemoryBuilder::new()
        .region(0x1000, b"AAxAA".to_vec(), Protection::ReadOnly)
        .region(0x2000, b"xAAxAA".to_vec(), Protection::ReadWrite)
        .region(0x3000, b"AAxxAA".to_vec(), Protection::ExecuteRead)
        .build()
}

#[derive(Default)]
struct RecordingSink {
    started: usize,
    scanned: Vec<u64>,
    skipped: Vec<(u64, SkipReason)>,
    matches: usize,
    finished: Option<ScanSummary>,
}

impl ScanSink for RecordingSink {
    fn scan_started(&mut self, _options: &ScanOptions) {
        self.started += 1;
    }

    fn region_skipped(&mut self, region: &Region, reason: SkipReason) {
        self.skipped.push((region.base, reason));
    }

    fn region_scanned(&mut self, region: &Region, _bytes_read: usize, _hits: usize) {
        self.scanned.push(region.base);
    }

    fn match_found(&mut self, _found: &Match) {
        self.matches += 1;
    }

    fn scan_finished(&mut self, summary: &ScanSummary) {
        self.finished = Some(*summary);
    }
}

#[test]
fn full_walk_reports_every_region_in_order() {
    let scanner = Scanner::new(three_regions());
    let (found, summary) = scanner
        .scan_all(&options("41 41"), &CancelToken::new(), &mut NullSink)
        .unwrap();

    assert_eq!(
        addresses(&found),
        vec![0x1000, 0x1003, 0x2001, 0x2004, 0x3000, 0x3004]
    );
    assert!(found.iter().all(|m| m.data == b"AA".to_vec()));
    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert_eq!(summary.matches, 6);
    assert_eq!(summary.regions_scanned, 3);
}

#[test]
fn handler_stop_delivers_exactly_k_matches() {
    for k in 1..=6 {
        let scanner = Scanner::new(three_regions());
        let mut delivered = Vec::new();

        let summary = scanner
            .scan(&options("41 41"), &CancelToken::new(), &mut NullSink, |m| {
                delivered.push(m);
                if delivered.len() == k {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert_eq!(delivered.len(), k);
        assert_eq!(summary.matches, k);
        assert_eq!(summary.outcome, ScanOutcome::Stopped);

        // Two hits per region: stopping in region n means n regions were read
        let regions_needed = k.div_ceil(2);
        assert_eq!(scanner.memory().read_count(), regions_needed, "k = {}", k);
    }
}

#[test]
fn stop_performs_no_further_region_reads() {
    let scanner = Scanner::new(three_regions());
    let summary = scanner
        .scan(&options("41 41"), &CancelToken::new(), &mut NullSink, |_| {
            ControlFlow::Break(())
        })
        .unwrap();

    assert_eq!(summary.matches, 1);
    assert_eq!(scanner.memory().read_addresses(), vec![0x1000]);
    assert_eq!(scanner.memory().query_count(), 1);
}

#[test]
fn cancellation_mid_region_keeps_delivered_matches() {
    let scanner = Scanner::new(three_regions());
    let cancel = CancelToken::new();
    let mut delivered = Vec::new();

    let summary = scanner
        .scan(&options("41 41"), &cancel, &mut NullSink, |m| {
            delivered.push(m);
            if delivered.len() == 3 {
                // Observed before the next delivery, inside region 0x2000
                cancel.cancel();
            }
            ControlFlow::Continue(())
        })
        .unwrap();

    assert_eq!(summary.outcome, ScanOutcome::Cancelled);
    assert_eq!(summary.matches, 3);
    assert_eq!(addresses(&delivered), vec![0x1000, 0x1003, 0x2001]);
    assert_eq!(scanner.memory().read_count(), 2);
}

#[test]
fn cancellation_before_start_touches_nothing() {
    let scanner = Scanner::new(three_regions());
    let cancel = CancelToken::new();
    cancel.cancel();

    let (found, summary) = scanner
        .scan_all(&options("41 41"), &cancel, &mut NullSink)
        .unwrap();

    assert!(found.is_empty());
    assert_eq!(summary.outcome, ScanOutcome::Cancelled);
    assert_eq!(scanner.memory().query_count(), 0);
    assert_eq!(scanner.memory().read_count(), 0);
}

#[test]
fn invalid_pattern_is_a_configuration_error() {
    let scanner = Scanner::new(three_regions());

    for pattern in ["", "4", "41 GG", "41 ? 41"] {
        let err = scanner
            .scan_all(&options(pattern), &CancelToken::new(), &mut NullSink)
            .unwrap_err();
        assert!(err.is_configuration(), "pattern {:?}", pattern);
    }
    assert_eq!(scanner.memory().query_count(), 0);
}

#[test]
fn unscannable_regions_are_never_read() {
    let memory = MockMemoryBuilder::new()
        .reserved_with(0x1000, 0x10, b'A')
        .region(0x2000, b"AAAA".to_vec(), Protection::NoAccess)
        .region(0x3000, b"AAAA".to_vec(), Protection::Guard)
        .region(0x4000, b"AAAA".to_vec(), Protection::Other)
        .region(0x5000, b"xAx".to_vec(), Protection::ExecuteReadWrite)
        .build();
    let scanner = Scanner::new(memory);
    let mut sink = RecordingSink::default();

    let (found, _) = scanner
        .scan_all(&options("41"), &CancelToken::new(), &mut sink)
        .unwrap();

    assert_eq!(addresses(&found), vec![0x5001]);
    assert_eq!(scanner.memory().read_addresses(), vec![0x5000]);
    assert!(
        sink.skipped
            .iter()
            .any(|&(base, reason)| base == 0x1000 && reason == SkipReason::NotScannable)
    );
}

#[test]
fn failed_and_empty_reads_are_skipped() {
    let memory = MockMemoryBuilder::new()
        .unreadable(0x1000, b"AAAA".to_vec())
        .short_read(0x2000, b"AAAA".to_vec(), 0)
        .region(0x3000, b"A".to_vec(), Protection::ReadOnly)
        .build();
    let scanner = Scanner::new(memory);
    let mut sink = RecordingSink::default();

    let (found, summary) = scanner
        .scan_all(&options("41"), &CancelToken::new(), &mut sink)
        .unwrap();

    assert_eq!(addresses(&found), vec![0x3000]);
    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert!(sink.skipped.contains(&(0x1000, SkipReason::ReadFailed)));
    assert!(sink.skipped.contains(&(0x2000, SkipReason::EmptyRead)));
}

#[test]
fn partial_reads_only_match_transferred_bytes() {
    let memory = MockMemoryBuilder::new()
        .short_read(0x1000, b"xAxxxA".to_vec(), 3)
        .build();
    let scanner = Scanner::new(memory);

    let (found, summary) = scanner
        .scan_all(&options("41"), &CancelToken::new(), &mut NullSink)
        .unwrap();

    assert_eq!(addresses(&found), vec![0x1001]);
    assert_eq!(summary.bytes_scanned, 3);
}

#[test]
fn bounds_clip_the_reads() {
    let memory = MockMemoryBuilder::new()
        .region(0x1000, b"AxAxAxAx".to_vec(), Protection::ReadWrite)
        .build();
    let scanner = Scanner::new(memory);
    let options = ScanOptions::builder()
        .pattern("41")
        .min_address(0x1002)
        .max_address(0x1004)
        .build();

    let (found, _) = scanner
        .scan_all(&options, &CancelToken::new(), &mut NullSink)
        .unwrap();

    // The byte at max_address itself is not read
    assert_eq!(addresses(&found), vec![0x1002]);
    assert_eq!(scanner.memory().read_addresses(), vec![0x1002]);
}

#[test]
fn walk_stops_at_max_address() {
    let scanner = Scanner::new(three_regions());
    let options = ScanOptions::builder()
        .pattern("41 41")
        .max_address(0x2000)
        .build();

    let (found, summary) = scanner
        .scan_all(&options, &CancelToken::new(), &mut NullSink)
        .unwrap();

    assert_eq!(addresses(&found), vec![0x1000, 0x1003]);
    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert_eq!(scanner.memory().read_count(), 1);
}

#[test]
fn zero_sized_descriptors_do_not_stall_the_walk() {
    let memory = MockMemoryBuilder::new().degenerate().build();
    let scanner = Scanner::new(memory);
    let options = ScanOptions::builder()
        .pattern("41")
        .min_address(0x100)
        .max_address(0x110)
        .build();

    let (found, summary) = scanner
        .scan_all(&options, &CancelToken::new(), &mut NullSink)
        .unwrap();

    assert!(found.is_empty());
    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert_eq!(scanner.memory().query_count(), 0x10);
}

#[test]
fn zero_sized_descriptor_followed_by_data() {
    let memory = MockMemoryBuilder::new()
        .zero_sized(0x0)
        .region(0x1000, b"xA".to_vec(), Protection::ReadOnly)
        .build();
    let scanner = Scanner::new(memory);

    let (found, _) = scanner
        .scan_all(&options("41"), &CancelToken::new(), &mut NullSink)
        .unwrap();

    assert_eq!(addresses(&found), vec![0x1001]);
}

#[test]
fn padded_pattern_captures_trailing_bytes() {
    let memory = MockMemoryBuilder::new()
        .region(0x1000, b"..WeChat:hello..We".to_vec(), Protection::ReadWrite)
        .build();
    let scanner = Scanner::new(memory);
    let options = ScanOptions::builder()
        .pattern(compile("wechat", 12))
        .ignore_case(true)
        .build();

    let (found, _) = scanner
        .scan_all(&options, &CancelToken::new(), &mut NullSink)
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].address, Address(0x1002));
    assert_eq!(found[0].data.len(), 12);
    assert_eq!(found[0].content(), "WeChat:hello");
}

#[test]
fn sink_sees_the_whole_lifecycle() {
    let scanner = Scanner::new(three_regions());
    let mut sink = RecordingSink::default();

    let summary = scanner
        .scan(&options("41 41"), &CancelToken::new(), &mut sink, |_| {
            ControlFlow::Continue(())
        })
        .unwrap();

    assert_eq!(sink.started, 1);
    assert_eq!(sink.scanned, vec![0x1000, 0x2000, 0x3000]);
    assert_eq!(sink.matches, 6);
    assert_eq!(sink.finished, Some(summary));
}

#[test]
fn dropped_stream_reports_stop_to_sink() {
    let scanner = Scanner::new(three_regions());
    let mut sink = RecordingSink::default();

    {
        let stream = scanner
            .matches(&options("41 41"), &CancelToken::new(), &mut sink)
            .unwrap();
        let taken: Vec<Match> = stream.take(2).collect();
        assert_eq!(taken.len(), 2);
    }

    let finished = sink.finished.unwrap();
    assert_eq!(finished.outcome, ScanOutcome::Stopped);
    assert_eq!(finished.matches, 2);
}
