//! Default values shared by the scanner and its front-ends.
//!
//! Constants are grouped by the concern they configure.

/// Address range and pattern defaults for a scan
pub mod scan {
    /// Lowest address scanned when no bound is given
    pub const DEFAULT_MIN_ADDRESS: u64 = 0;

    /// Highest user-mode address on 64-bit Windows (128 TiB)
    pub const DEFAULT_MAX_ADDRESS: u64 = 0x7FFF_FFFF_FFFF;

    /// Minimum pattern length used when a search string is shorter.
    /// Trailing wildcards capture the bytes following the string.
    pub const DEFAULT_PATTERN_LENGTH: usize = 1024;

    /// Wildcard character accepted in search strings
    pub const WILDCARD_CHAR: u8 = b'?';

    /// Wildcard token in the hex pattern format
    pub const WILDCARD_TOKEN: &str = "??";
}

/// Process discovery defaults
pub mod process {
    /// Executables scanned when no process is named explicitly
    pub const DEFAULT_TARGETS: &[&str] = &["WeChatAppEx.exe", "WechatBrowser.exe"];
}

/// Console and log presentation
pub mod report {
    /// Number of matches echoed to the console per process
    pub const CONSOLE_PREVIEW_COUNT: usize = 10;

    /// Maximum characters of match content shown on the console
    pub const CONSOLE_PREVIEW_CHARS: usize = 50;

    /// Progress is reported every N matches
    pub const PROGRESS_INTERVAL: usize = 100;

    /// Prefix of generated log file names
    pub const LOG_FILE_PREFIX: &str = "memsearch";
}
