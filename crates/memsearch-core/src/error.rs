use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process {pid}: {message}")]
    ProcessOpenFailed { pid: u32, message: String },

    #[error("Failed to enumerate processes: {0}")]
    ProcessEnumerationFailed(String),

    #[error("Failed to query memory region at address {address:#x}: {message}")]
    RegionQueryFailed { address: u64, message: String },

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Process memory access is not supported on this platform")]
    Unsupported,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors caused by the scan options themselves, raised before any
    /// process access happens.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::InvalidPattern(_))
    }

    /// Errors raised while acquiring the target process.
    pub fn is_access(&self) -> bool {
        matches!(
            self,
            Error::ProcessOpenFailed { .. } | Error::Unsupported
        )
    }
}
