//! The scan engine.
//!
//! A [`Scanner`] walks the target's regions in address order, reads the
//! committed and readable ones, and reports every pattern occurrence as a
//! [`Match`] with its absolute address. Matches are produced lazily through
//! a [`MatchStream`], or pushed to a handler by [`Scanner::scan`].
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use memsearch_core::memory::{MockMemoryBuilder, Protection};
//! use memsearch_core::pattern::compile;
//! use memsearch_core::{CancelToken, NullSink, ScanOptions, ScanOutcome, Scanner};
//!
//! let memory = MockMemoryBuilder::new()
//!     .region(0x1000, b"Hello WeChat World".to_vec(), Protection::ReadWrite)
//!     .build();
//! let scanner = Scanner::new(memory);
//! let options = ScanOptions::builder().pattern(compile("wechat", 0)).ignore_case(true).build();
//!
//! let summary = scanner
//!     .scan(&options, &CancelToken::new(), &mut NullSink, |m| {
//!         assert_eq!(m.address.to_string(), "0x1006");
//!         ControlFlow::Continue(())
//!     })
//!     .unwrap();
//! assert_eq!(summary.outcome, ScanOutcome::Completed);
//! assert_eq!(summary.matches, 1);
//! ```

mod options;
mod scanner;
mod sink;
mod stream;
mod types;

pub use options::{ScanOptions, ScanOptionsBuilder};
pub use scanner::Scanner;
pub use sink::{NullSink, ScanSink, SkipReason, TracingSink};
pub use stream::{MatchStream, ScanOutcome, ScanState, ScanSummary};
pub use types::{Address, Match};
