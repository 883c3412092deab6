use std::fmt;

use serde::{Serialize, Serializer};

use crate::pattern::decode_utf8_dropping_invalid;

/// A virtual address in the target process.
///
/// Displays as `0x` followed by uppercase hex without padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub u64);

impl Address {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One occurrence of the pattern in the target's memory.
///
/// `data` is a copy taken when the match was found and is exactly as long
/// as the pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub address: Address,
    pub data: Vec<u8>,
}

impl Match {
    pub fn new(address: impl Into<Address>, data: Vec<u8>) -> Self {
        Self {
            address: address.into(),
            data,
        }
    }

    /// The payload as UTF-8 text with invalid sequences dropped.
    ///
    /// For display only; `data` stays authoritative.
    pub fn content(&self) -> String {
        decode_utf8_dropping_invalid(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        assert_eq!(Address(0x0).to_string(), "0x0");
        assert_eq!(Address(0x1234).to_string(), "0x1234");
        assert_eq!(Address(0x7FFFFFFFFFFF).to_string(), "0x7FFFFFFFFFFF");
        assert_eq!(Address(0xdeadbeef).to_string(), "0xDEADBEEF");
    }

    #[test]
    fn test_match_content() {
        assert_eq!(Match::new(0u64, b"Hello World".to_vec()).content(), "Hello World");
        assert_eq!(Match::new(0u64, Vec::new()).content(), "");
        assert_eq!(Match::new(0u64, b"We\xC0Chat".to_vec()).content(), "WeChat");
    }
}
