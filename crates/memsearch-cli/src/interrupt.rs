//! Wiring of Ctrl+C and `--timeout` to the scan's cancellation token.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use memsearch_core::CancelToken;
use tracing::info;

/// Cancel `token` on Ctrl+C. Can only be installed once per process.
pub fn cancel_on_ctrlc(token: &CancelToken) -> Result<()> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Interrupted, stopping the search...");
        token.cancel();
    })
    .context("Failed to set Ctrl+C handler")
}

/// Cancel `token` once `timeout` elapses, unless it is cancelled first.
pub fn cancel_after(token: &CancelToken, timeout: Duration) -> thread::JoinHandle<()> {
    let token = token.clone();
    thread::spawn(move || {
        if !token.wait(timeout) {
            info!("Timeout of {:?} reached, cancelling", timeout);
            token.cancel();
        }
    })
}
