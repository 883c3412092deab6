//! Optional TOML defaults layered under the command line.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use memsearch_core::SearchEncoding;
use memsearch_core::config::{process, report, scan};
use serde::Deserialize;

/// Contents of a `memsearch.toml` file. Every key is optional.
///
/// ```toml
/// processes = ["WeChatAppEx.exe"]
/// length = 256
/// case_sensitive = false
/// min_address = "0x10000"
/// encoding = "gbk"
/// show = 20
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub processes: Option<Vec<String>>,
    pub length: Option<usize>,
    pub case_sensitive: Option<bool>,
    pub min_address: Option<String>,
    pub max_address: Option<String>,
    pub limit: Option<usize>,
    pub timeout: Option<u64>,
    pub encoding: Option<SearchEncoding>,
    pub show: Option<usize>,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Command-line values that override the config file when present
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub processes: Vec<String>,
    pub length: Option<usize>,
    pub case_sensitive: bool,
    pub min_address: Option<u64>,
    pub max_address: Option<u64>,
    pub limit: Option<usize>,
    pub timeout: Option<u64>,
    pub encoding: Option<SearchEncoding>,
    pub show: Option<usize>,
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub processes: Vec<String>,
    pub length: usize,
    pub ignore_case: bool,
    pub min_address: u64,
    pub max_address: u64,
    pub limit: Option<usize>,
    pub timeout: Option<u64>,
    pub encoding: SearchEncoding,
    pub show: usize,
}

impl Settings {
    /// Merge command line over config file over built-in defaults.
    pub fn resolve(overrides: Overrides, config: CliConfig) -> Result<Self> {
        let processes = if !overrides.processes.is_empty() {
            overrides.processes
        } else {
            config.processes.unwrap_or_else(|| {
                process::DEFAULT_TARGETS
                    .iter()
                    .map(|name| name.to_string())
                    .collect()
            })
        };

        let min_address = match overrides.min_address {
            Some(address) => address,
            None => config
                .min_address
                .as_deref()
                .map(parse_address)
                .transpose()
                .map_err(anyhow::Error::msg)
                .context("Invalid min_address in config")?
                .unwrap_or(scan::DEFAULT_MIN_ADDRESS),
        };
        let max_address = match overrides.max_address {
            Some(address) => address,
            None => config
                .max_address
                .as_deref()
                .map(parse_address)
                .transpose()
                .map_err(anyhow::Error::msg)
                .context("Invalid max_address in config")?
                .unwrap_or(scan::DEFAULT_MAX_ADDRESS),
        };
        if min_address >= max_address {
            anyhow::bail!(
                "Address range is empty: 0x{:X}..0x{:X}",
                min_address,
                max_address
            );
        }

        let length = overrides
            .length
            .or(config.length)
            .unwrap_or(scan::DEFAULT_PATTERN_LENGTH);
        if length == 0 {
            anyhow::bail!("Length must be a positive integer");
        }
        let limit = overrides.limit.or(config.limit);
        if limit == Some(0) {
            anyhow::bail!("Limit must be a positive integer");
        }

        Ok(Self {
            processes,
            length,
            ignore_case: !(overrides.case_sensitive || config.case_sensitive.unwrap_or(false)),
            min_address,
            max_address,
            limit,
            timeout: overrides.timeout.or(config.timeout),
            encoding: overrides.encoding.or(config.encoding).unwrap_or_default(),
            show: overrides
                .show
                .or(config.show)
                .unwrap_or(report::CONSOLE_PREVIEW_COUNT),
        })
    }
}

/// Parse a hex address, with or without a `0x` prefix.
pub fn parse_address(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(&digits.replace('_', ""), 16)
        .map_err(|e| format!("invalid hex address '{}': {}", s, e))
}
