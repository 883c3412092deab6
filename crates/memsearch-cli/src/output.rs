//! Console and JSON rendering of scan results.

use clap::ValueEnum;
use memsearch_core::config::report::CONSOLE_PREVIEW_CHARS;
use memsearch_core::{Address, Match, ScanOutcome, ScanSummary, SearchEncoding};
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One match as reported to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub address: Address,
    pub content: String,
}

impl MatchRecord {
    pub fn new(found: &Match, encoding: SearchEncoding) -> Self {
        let content = match encoding {
            SearchEncoding::Utf8 => found.content(),
            other => other.decode_lossy(&found.data),
        };
        Self {
            address: found.address,
            content,
        }
    }
}

/// Result of scanning one process
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub pid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ScanSummary>,
    pub matches: Vec<MatchRecord>,
}

impl ProcessReport {
    pub fn failed(pid: u32, error: String) -> Self {
        Self {
            pid,
            error: Some(error),
            summary: None,
            matches: Vec::new(),
        }
    }

    pub fn outcome(&self) -> Option<ScanOutcome> {
        self.summary.map(|s| s.outcome)
    }
}

/// Everything a run produced, for `--format json`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pattern: String,
    pub pattern_length: usize,
    pub ignore_case: bool,
    pub processes: Vec<ProcessReport>,
    pub total_matches: usize,
    pub cancelled: bool,
}

/// Escape control whitespace and cap the preview at `max_chars` characters.
pub fn format_for_console(content: &str, max_chars: usize) -> String {
    let escaped = content
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    truncate(&escaped, max_chars)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return s.chars().take(max_chars).collect();
    }
    let mut truncated: String = s.chars().take(max_chars - 3).collect();
    truncated.push_str("...");
    truncated
}

/// Print one process's results, previewing at most `show` matches.
pub fn print_process(report: &ProcessReport, show: usize) {
    if let Some(ref error) = report.error {
        println!(
            "{} process {}: {}",
            "Failed to scan".red(),
            report.pid,
            error
        );
        println!();
        return;
    }

    if report.matches.is_empty() {
        println!("No matches in process {}", report.pid);
    } else {
        println!(
            "Found {} match(es) in process {}:",
            report.matches.len().green(),
            report.pid
        );
        for (i, record) in report.matches.iter().take(show).enumerate() {
            println!(
                "  [{}] {}: '{}'",
                i + 1,
                record.address.cyan(),
                format_for_console(&record.content, CONSOLE_PREVIEW_CHARS)
            );
        }
        if report.matches.len() > show {
            println!(
                "  ... ({} more not shown, see the log file)",
                report.matches.len() - show
            );
        }
    }

    if let Some(ScanOutcome::Cancelled) = report.outcome() {
        println!("  {}", "(scan cancelled)".yellow());
    }
    println!();
}

pub fn print_json(report: &RunReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_console_escapes() {
        assert_eq!(format_for_console("a\nb\rc\td", 50), "a\\nb\\rc\\td");
    }

    #[test]
    fn test_format_for_console_truncates() {
        let long = "x".repeat(60);
        let shown = format_for_console(&long, 50);
        assert_eq!(shown.chars().count(), 50);
        assert!(shown.ends_with("..."));

        assert_eq!(format_for_console("exactly", 7), "exactly");
        assert_eq!(format_for_console("abcdef", 2), "ab");
    }

    #[test]
    fn test_truncate_counts_characters() {
        let text = "微信".repeat(30);
        let shown = truncate(&text, 10);
        assert_eq!(shown, format!("{}...", "微信微信微信微"));
    }

    #[test]
    fn test_match_record_decodes_content() {
        let found = Match::new(0x1000u64, b"WeChat\xFF\x00".to_vec());
        let record = MatchRecord::new(&found, SearchEncoding::Utf8);
        assert_eq!(record.content, "WeChat\0");
        assert_eq!(record.address, Address(0x1000));
    }

    #[test]
    fn test_run_report_json() {
        let report = RunReport {
            pattern: "41 ??".to_string(),
            pattern_length: 2,
            ignore_case: true,
            processes: vec![ProcessReport {
                pid: 42,
                error: None,
                summary: None,
                matches: vec![MatchRecord {
                    address: Address(0x1A2B),
                    content: "A!".to_string(),
                }],
            }],
            total_matches: 1,
            cancelled: false,
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(json["processes"][0]["pid"], 42);
        assert_eq!(json["processes"][0]["matches"][0]["address"], "0x1A2B");
        assert!(json["processes"][0].get("error").is_none());
    }
}
