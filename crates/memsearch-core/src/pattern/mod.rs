//! AOB pattern compilation and matching.
//!
//! A search string such as `We?Chat` is compiled into a [`Pattern`]
//! (`57 65 ?? 43 68 61 74`), which a [`PatternMatcher`] then locates inside
//! byte buffers.

mod compiler;
mod matcher;
mod text;

pub use compiler::{Pattern, PatternToken, compile, compile_bytes};
pub use matcher::PatternMatcher;
pub use text::{SearchEncoding, decode_utf8_dropping_invalid};
