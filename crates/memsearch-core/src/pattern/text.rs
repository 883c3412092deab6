//! Text encodings for search strings and match previews.

use encoding_rs::{Encoding, GBK, SHIFT_JIS};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Encoding applied to the search text before it is compiled to a pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum SearchEncoding {
    #[default]
    #[strum(to_string = "utf-8", serialize = "utf8")]
    #[serde(rename = "utf-8")]
    Utf8,
    #[strum(to_string = "gbk")]
    #[serde(rename = "gbk")]
    Gbk,
    #[strum(to_string = "shift-jis", serialize = "shift_jis", serialize = "sjis")]
    #[serde(rename = "shift-jis")]
    ShiftJis,
}

impl SearchEncoding {
    /// Encode `text` into the bytes that would appear in target memory.
    ///
    /// Unmappable characters are replaced by the encoder's numeric character
    /// reference, so results are best effort for non-UTF-8 encodings.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self.encoding() {
            None => text.as_bytes().to_vec(),
            Some(encoding) => {
                let (encoded, _, _) = encoding.encode(text);
                encoded.into_owned()
            }
        }
    }

    /// Decode raw bytes, dropping sequences that are invalid in this encoding.
    pub fn decode_lossy(self, bytes: &[u8]) -> String {
        match self.encoding() {
            None => decode_utf8_dropping_invalid(bytes),
            Some(encoding) => {
                let (decoded, _) = encoding.decode_without_bom_handling(bytes);
                decoded
                    .chars()
                    .filter(|&c| c != char::REPLACEMENT_CHARACTER)
                    .collect()
            }
        }
    }

    fn encoding(self) -> Option<&'static Encoding> {
        match self {
            SearchEncoding::Utf8 => None,
            SearchEncoding::Gbk => Some(GBK),
            SearchEncoding::ShiftJis => Some(SHIFT_JIS),
        }
    }
}

/// Decode UTF-8, skipping invalid sequences instead of substituting U+FFFD.
pub fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}
