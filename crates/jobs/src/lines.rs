// crates/jobs/src/lines.rs
//! Formatting for the log lines a build emits.

use crate::types::JobId;

/// Local wall-clock time as `HH:MM:SS`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

pub fn phase_started(ts: &str, phase: &str) -> String {
    format!("[{ts}] \u{279c} {phase} \u{2026}")
}

/// `n` is 1-based.
pub fn phase_detail(ts: &str, phase: &str, n: usize) -> String {
    format!("[{ts}]     {phase} \u{2014} detail {n}")
}

pub fn phase_completed(ts: &str, phase: &str) -> String {
    format!("[{ts}] \u{2713} {phase} completed")
}

pub fn build_succeeded(ts: &str, id: &JobId) -> String {
    format!("[{ts}] \u{1f389} Build {id} completed successfully")
}

/// Strip the leading `[HH:MM:SS] ` so lines can be compared without the clock.
pub fn without_timestamp(line: &str) -> &str {
    match line.find("] ") {
        Some(idx) if line.starts_with('[') => &line[idx + 2..],
        _ => line,
    }
}
