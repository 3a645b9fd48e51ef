// src/progress.rs

//! Progress reporting for checksum resolution
//!
//! Reporters are observers only; nothing they do affects the outcome of a run.

use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const TEMPLATE: &str = " {pos} / {len} [{wide_bar}] {percent}% ({eta} ETA)";

/// Receives one call per resolved package
pub trait ProgressReporter: Send + Sync {
    /// `completed` increases by one per call, from 1 up to `total`
    fn report(&self, elapsed: Duration, completed: usize, total: usize);
}

/// Reporter that discards all updates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _elapsed: Duration, _completed: usize, _total: usize) {}
}

/// Single-line progress bar with ETA, redrawn in place on stderr
///
/// The bar stays hidden until the first report and is sized to the terminal.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    /// Progress bar drawing to stderr
    pub fn new() -> Result<Self> {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Result<Self> {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .map_err(|e| Error::Config(format!("Invalid progress bar template: {}", e)))?
            .progress_chars("= ");

        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_style(style);
        Ok(Self { bar })
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, _elapsed: Duration, completed: usize, total: usize) {
        if total == 0 {
            return;
        }
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
        if completed >= total {
            self.bar.finish();
        }
    }
}
