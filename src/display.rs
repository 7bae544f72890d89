//! Colored terminal status lines.
//!
//! Everything else goes through `tracing`; these are the few lines an
//! operator sees when running a lifecycle action by hand.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::daemon::StopOutcome;
use crate::pipeline::PipelineStats;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Print where the daemon is watching and logging.
pub fn print_starting(watch_dir: &Path, log_file: &Path) {
    println!(
        "{} {} watching {}, logging to {}",
        timestamp().dimmed(),
        "[START]".green().bold(),
        watch_dir.display().cyan(),
        log_file.display().cyan()
    );
    let _ = io::stdout().flush();
}

/// Print the result of a stop action.
pub fn print_stop_outcome(outcome: StopOutcome) {
    let ts = timestamp();
    match outcome {
        StopOutcome::Stopped { pid } => println!(
            "{} {} pid {}",
            ts.dimmed(),
            "[STOPPED]".yellow().bold(),
            pid
        ),
        StopOutcome::NotRunning => println!(
            "{} {} not running",
            ts.dimmed(),
            "[STOP]".yellow().bold()
        ),
        StopOutcome::StaleRemoved { pid } => println!(
            "{} {} removed stale pid file for {}",
            ts.dimmed(),
            "[STOP]".yellow().bold(),
            pid
        ),
    }
    let _ = io::stdout().flush();
}

/// Print the counters of a finished run.
pub fn print_summary(stats: &PipelineStats) {
    let failures = stats.finished() - stats.converted;
    let failures = if failures == 0 {
        failures.green().to_string()
    } else {
        failures.red().to_string()
    };
    println!(
        "{} {} jobs={}, converted={}, failed={}, tag_failures={}",
        timestamp().dimmed(),
        "[SUMMARY]".blue().bold(),
        stats.finished(),
        stats.converted,
        failures,
        stats.tag_failures
    );
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!(
        "{} {} {}",
        timestamp().dimmed(),
        "[ERROR]".red().bold(),
        message.red()
    );
}
