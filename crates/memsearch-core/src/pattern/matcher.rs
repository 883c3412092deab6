//! Wildcard-aware byte pattern matching.

use memchr::{memchr_iter, memchr2_iter};

use super::compiler::{Pattern, PatternToken};
use crate::error::{Error, Result};

/// A parsed pattern split into byte and wildcard arrays.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    bytes: Vec<u8>,
    wildcard_mask: Vec<bool>,
    /// First literal position, used to skip windows that cannot match
    anchor: Option<usize>,
}

impl PatternMatcher {
    /// Build a matcher from a compiled pattern. Empty patterns are rejected.
    pub fn new(pattern: &Pattern) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidPattern("pattern is empty".to_string()));
        }

        let (bytes, wildcard_mask) = pattern
            .tokens()
            .iter()
            .map(|token| match token {
                PatternToken::Byte(value) => (*value, false),
                PatternToken::Wildcard => (0, true),
            })
            .unzip::<_, _, Vec<u8>, Vec<bool>>();
        let anchor = wildcard_mask.iter().position(|&wildcard| !wildcard);

        Ok(Self {
            bytes,
            wildcard_mask,
            anchor,
        })
    }

    /// Parse the hex pattern format (e.g. `"57 65 ?? 68"`).
    pub fn parse(pattern: &str) -> Result<Self> {
        Self::new(&pattern.parse()?)
    }

    /// Pattern length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Find every offset in `data` where the pattern matches.
    ///
    /// Overlapping occurrences are all reported. With `ignore_case`, ASCII
    /// letters compare case-insensitively; other bytes compare exactly.
    pub fn find(&self, data: &[u8], ignore_case: bool) -> Vec<usize> {
        let len = self.len();
        if len == 0 || len > data.len() {
            return Vec::new();
        }
        let last_start = data.len() - len;

        let Some(anchor) = self.anchor else {
            // All wildcards: every window matches
            return (0..=last_start).collect();
        };

        // Candidate anchor positions lie in data[anchor..=last_start + anchor]
        let haystack = &data[anchor..=last_start + anchor];
        let needle = self.bytes[anchor];
        let candidates: Box<dyn Iterator<Item = usize> + '_> =
            if ignore_case && needle.is_ascii_alphabetic() {
                Box::new(memchr2_iter(
                    needle.to_ascii_lowercase(),
                    needle.to_ascii_uppercase(),
                    haystack,
                ))
            } else {
                Box::new(memchr_iter(needle, haystack))
            };

        candidates
            .filter(|&start| self.matches_at(data, start, ignore_case))
            .collect()
    }

    fn matches_at(&self, data: &[u8], pos: usize, ignore_case: bool) -> bool {
        let window = &data[pos..pos + self.len()];
        self.bytes
            .iter()
            .zip(&self.wildcard_mask)
            .zip(window)
            .all(|((&expected, &wildcard), &actual)| {
                wildcard
                    || expected == actual
                    || (ignore_case && expected.eq_ignore_ascii_case(&actual))
            })
    }
}
