use serde::{Deserialize, Serialize};

use crate::config::scan::{DEFAULT_MAX_ADDRESS, DEFAULT_MIN_ADDRESS};
use crate::error::Result;
use crate::pattern::PatternMatcher;

/// What to search for and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Hex pattern, e.g. `57 65 ?? 68`
    pub pattern: String,
    /// Compare ASCII letters case-insensitively
    pub ignore_case: bool,
    /// First address considered (inclusive)
    pub min_address: u64,
    /// Upper address bound; reads stop at this address
    pub max_address: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            ignore_case: false,
            min_address: DEFAULT_MIN_ADDRESS,
            max_address: DEFAULT_MAX_ADDRESS,
        }
    }
}

impl ScanOptions {
    /// Create a new options builder
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Validate the pattern and build its matcher.
    pub fn matcher(&self) -> Result<PatternMatcher> {
        PatternMatcher::parse(&self.pattern)
    }
}

/// Builder for ScanOptions
#[derive(Debug, Clone, Default)]
pub struct ScanOptionsBuilder {
    pattern: Option<String>,
    ignore_case: Option<bool>,
    min_address: Option<u64>,
    max_address: Option<u64>,
}

impl ScanOptionsBuilder {
    /// Set the hex pattern (anything `Display`, including a compiled `Pattern`)
    pub fn pattern(mut self, pattern: impl ToString) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = Some(ignore_case);
        self
    }

    pub fn min_address(mut self, address: u64) -> Self {
        self.min_address = Some(address);
        self
    }

    pub fn max_address(mut self, address: u64) -> Self {
        self.max_address = Some(address);
        self
    }

    /// Build the options
    pub fn build(self) -> ScanOptions {
        let default = ScanOptions::default();
        ScanOptions {
            pattern: self.pattern.unwrap_or(default.pattern),
            ignore_case: self.ignore_case.unwrap_or(default.ignore_case),
            min_address: self.min_address.unwrap_or(default.min_address),
            max_address: self.max_address.unwrap_or(default.max_address),
        }
    }
}
