//! Timestamped run log holding every match in full.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use memsearch_core::config::report::LOG_FILE_PREFIX;
use tracing::warn;

/// `memsearch_YYYY-MM-DD_HH-MM-SS.log`
pub fn default_file_name(now: DateTime<Local>) -> String {
    format!("{}_{}.log", LOG_FILE_PREFIX, now.format("%Y-%m-%d_%H-%M-%S"))
}

pub struct RunLog {
    writer: BufWriter<File>,
    path: PathBuf,
    failed: bool,
}

impl RunLog {
    /// Open `path` for appending, or a fresh timestamped file in the current
    /// directory when no path is given.
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(default_file_name(Local::now())),
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line. After the first write error the log
    /// goes quiet.
    pub fn line(&mut self, message: impl Display) {
        if self.failed {
            return;
        }
        let now = Local::now().format("%Y/%m/%d %H:%M:%S");
        if let Err(e) = writeln!(self.writer, "{} {}", now, message) {
            warn!("Writing to {} failed: {}", self.path.display(), e);
            self.failed = true;
        }
    }

    pub fn begin(&mut self, text: &str, length: usize) {
        self.line(format_args!(
            "=== Search started at {} ===",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        self.line(format_args!("Search text: '{}' (length: {})", text, length));
    }

    pub fn end(&mut self) {
        self.line(format_args!(
            "=== Search finished at {} ===",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        if let Err(e) = self.writer.flush() {
            warn!("Flushing {} failed: {}", self.path.display(), e);
        }
    }
}
