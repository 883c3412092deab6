mod config;
mod interrupt;
mod log_file;
mod output;
mod progress;

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use memsearch_core::{
    CancelToken, Error, Pattern, ScanOptions, Scanner, SearchEncoding, compile_bytes,
    find_processes_by_name,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, Overrides, Settings, parse_address};
use crate::log_file::RunLog;
use crate::output::{MatchRecord, OutputFormat, ProcessReport, RunReport};
use crate::progress::ProgressSink;

#[derive(Parser)]
#[command(name = "memsearch", version)]
#[command(about = "Search the memory of running processes for text or byte patterns")]
struct Args {
    /// Text to search for; `?` matches any single byte
    text: String,

    /// Treat TEXT as a hex pattern such as "57 65 ?? 68"
    #[arg(long)]
    hex_pattern: bool,

    /// Minimum pattern length in bytes; shorter text is padded with wildcards
    #[arg(short, long, env = "MEMSEARCH_LENGTH")]
    length: Option<usize>,

    /// Executable name to scan (repeatable)
    #[arg(
        short = 'p',
        long = "process",
        value_name = "NAME",
        env = "MEMSEARCH_PROCESS",
        value_delimiter = ','
    )]
    processes: Vec<String>,

    /// Scan these process IDs instead of searching by name (repeatable)
    #[arg(long = "pid", value_name = "PID")]
    pids: Vec<u32>,

    /// Compare ASCII letters exactly
    #[arg(long)]
    case_sensitive: bool,

    /// Lowest address to scan (hex)
    #[arg(long, value_parser = parse_address)]
    min_address: Option<u64>,

    /// Address at which scanning stops (hex)
    #[arg(long, value_parser = parse_address)]
    max_address: Option<u64>,

    /// Stop scanning a process after this many matches
    #[arg(long)]
    limit: Option<usize>,

    /// Cancel the search after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Encoding of the search text (utf-8, gbk, shift-jis)
    #[arg(long)]
    encoding: Option<SearchEncoding>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Matches previewed on the console per process
    #[arg(long, value_name = "N")]
    show: Option<usize>,

    /// Log every match; without PATH a timestamped file is created
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    /// TOML file with default settings
    #[arg(short, long, env = "MEMSEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            processes: self.processes.clone(),
            length: self.length,
            case_sensitive: self.case_sensitive,
            min_address: self.min_address,
            max_address: self.max_address,
            limit: self.limit,
            timeout: self.timeout,
            encoding: self.encoding,
            show: self.show,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let directive = if args.verbose {
        "memsearch=debug"
    } else {
        "memsearch=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Load config
    let config = match args.config {
        Some(ref path) => match CliConfig::load(path) {
            Ok(c) => {
                info!("Loaded config from {:?}", path);
                c
            }
            Err(e) => {
                warn!("Failed to load config: {:#}, using defaults", e);
                CliConfig::default()
            }
        },
        None => CliConfig::default(),
    };
    let settings = Settings::resolve(args.overrides(), config)?;

    run(&args, &settings)
}

fn run(args: &Args, settings: &Settings) -> Result<()> {
    let text = args.text.trim();
    if text.is_empty() {
        bail!("Search text must not be empty");
    }

    let pattern = if args.hex_pattern {
        text.parse::<Pattern>().context("Invalid hex pattern")?
    } else {
        compile_bytes(&settings.encoding.encode(text), settings.length)
    };
    let options = ScanOptions::builder()
        .pattern(&pattern)
        .ignore_case(settings.ignore_case)
        .min_address(settings.min_address)
        .max_address(settings.max_address)
        .build();
    debug!("Pattern: {}", options.pattern);

    let text_output = args.format == OutputFormat::Text;
    if text_output {
        println!("Searching for '{}' ({} bytes)", text, pattern.len());
        println!("Press Ctrl+C to stop at any time");
        println!();
    }

    let pids = if args.pids.is_empty() {
        discover(&settings.processes)
    } else {
        args.pids.clone()
    };
    if pids.is_empty() {
        println!("No process found among: {}", settings.processes.join(", "));
        return Ok(());
    }
    info!("Scanning {} process(es): {:?}", pids.len(), pids);

    let cancel = CancelToken::new();
    interrupt::cancel_on_ctrlc(&cancel)?;
    if let Some(secs) = settings.timeout {
        interrupt::cancel_after(&cancel, Duration::from_secs(secs));
    }

    let mut log = match args.log_file {
        Some(ref path) => match RunLog::create(path.as_deref()) {
            Ok(log) => {
                info!("Logging matches to {}", log.path().display());
                Some(log)
            }
            Err(e) => {
                warn!("{:#}", e);
                None
            }
        },
        None => None,
    };
    if let Some(log) = log.as_mut() {
        log.begin(text, pattern.len());
        log.line(format_args!("Processes: {:?}", pids));
    }

    let mut reports = Vec::new();
    for pid in pids {
        if cancel.is_cancelled() {
            break;
        }
        if text_output {
            println!("Scanning process {}...", pid);
        }

        let report = scan_process(pid, &options, &cancel, settings, log.as_mut());
        if text_output {
            output::print_process(&report, settings.show);
        }
        reports.push(report);
    }

    let total_matches = reports.iter().map(|r| r.matches.len()).sum();
    if let Some(log) = log.as_mut() {
        log.line(format_args!("Total: {} match(es)", total_matches));
        log.end();
    }

    if text_output {
        println!("Search finished, {} match(es) in total", total_matches);
        if let Some(ref log) = log {
            println!("Full results in {}", log.path().display());
        }
        Ok(())
    } else {
        output::print_json(&RunReport {
            pattern: options.pattern.clone(),
            pattern_length: pattern.len(),
            ignore_case: settings.ignore_case,
            processes: reports,
            total_matches,
            cancelled: cancel.is_cancelled(),
        })
    }
}

/// Resolve executable names to PIDs, keeping the order of `names`.
fn discover(names: &[String]) -> Vec<u32> {
    let mut pids = Vec::new();
    for name in names {
        match find_processes_by_name(name) {
            Ok(found) => {
                info!("Found {} {} process(es)", found.len(), name);
                for pid in found {
                    if !pids.contains(&pid) {
                        pids.push(pid);
                    }
                }
            }
            Err(Error::ProcessNotFound(_)) => debug!("No {} process", name),
            Err(e) => warn!("Failed to look up {}: {}", name, e),
        }
    }
    pids
}

fn scan_process(
    pid: u32,
    options: &ScanOptions,
    cancel: &CancelToken,
    settings: &Settings,
    log: Option<&mut RunLog>,
) -> ProcessReport {
    let scanner = match Scanner::open(pid) {
        Ok(scanner) => scanner,
        Err(e) => {
            warn!("Failed to open process {}: {}", pid, e);
            if let Some(log) = log {
                log.line(format_args!("Failed to open process {}: {}", pid, e));
            }
            return ProcessReport::failed(pid, e.to_string());
        }
    };

    let mut sink = ProgressSink::new(pid, settings.encoding, log);
    let mut matches = Vec::new();
    let result = scanner.scan(options, cancel, &mut sink, |found| {
        matches.push(MatchRecord::new(&found, settings.encoding));
        match settings.limit {
            Some(limit) if matches.len() >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });

    match result {
        Ok(summary) => ProcessReport {
            pid,
            error: None,
            summary: Some(summary),
            matches,
        },
        Err(e) => ProcessReport::failed(pid, e.to_string()),
    }
}
