//! Search string to AOB pattern conversion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::scan::{WILDCARD_CHAR, WILDCARD_TOKEN};
use crate::error::{Error, Result};

/// One position of an AOB pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternToken {
    /// Matches exactly this byte
    Byte(u8),
    /// Matches any byte
    Wildcard,
}

impl fmt::Display for PatternToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternToken::Byte(value) => write!(f, "{:02X}", value),
            PatternToken::Wildcard => f.write_str(WILDCARD_TOKEN),
        }
    }
}

impl FromStr for PatternToken {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        if token == WILDCARD_TOKEN {
            return Ok(PatternToken::Wildcard);
        }

        // from_str_radix alone would accept a sign prefix such as "+F"
        if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidPattern(format!(
                "invalid hex token '{}'",
                token
            )));
        }

        u8::from_str_radix(token, 16)
            .map(PatternToken::Byte)
            .map_err(|e| Error::InvalidPattern(format!("invalid hex token '{}': {}", token, e)))
    }
}

/// An ordered, fixed-length sequence of pattern tokens.
///
/// Formats as whitespace-separated tokens, e.g. `57 65 ?? 68 61 74`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    tokens: Vec<PatternToken>,
}

impl Pattern {
    pub fn new(tokens: Vec<PatternToken>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of positions that must match a specific byte
    pub fn literal_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, PatternToken::Byte(_)))
            .count()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

impl FromStr for Pattern {
    type Err = Error;

    /// Parse the hex pattern format. Zero tokens is rejected.
    fn from_str(text: &str) -> Result<Self> {
        let tokens = text
            .split_whitespace()
            .map(PatternToken::from_str)
            .collect::<Result<Vec<_>>>()?;

        if tokens.is_empty() {
            return Err(Error::InvalidPattern("pattern is empty".to_string()));
        }

        Ok(Self { tokens })
    }
}

/// Convert a search string into a pattern.
///
/// Every byte of `search` becomes one token; `?` becomes a wildcard. The
/// result is right-padded with wildcards up to `min_length`. An empty
/// search string yields an empty pattern regardless of `min_length`.
pub fn compile(search: &str, min_length: usize) -> Pattern {
    compile_bytes(search.as_bytes(), min_length)
}

/// Same as [`compile`], for input that is already encoded.
pub fn compile_bytes(search: &[u8], min_length: usize) -> Pattern {
    if search.is_empty() {
        return Pattern::default();
    }

    let length = search.len().max(min_length);
    let mut tokens = Vec::with_capacity(length);
    tokens.extend(search.iter().map(|&b| {
        if b == WILDCARD_CHAR {
            PatternToken::Wildcard
        } else {
            PatternToken::Byte(b)
        }
    }));
    tokens.resize(length, PatternToken::Wildcard);

    Pattern { tokens }
}
