//! Text summary builder for CLI output.
//!
//! This module computes metrics and formats human-readable lines for text mode.

use crate::metrics;
use crate::model::RunResult;
use std::time::Duration;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished or cancelled run.
pub(crate) fn build_text_summary(result: &RunResult) -> TextSummary {
    let mut lines = Vec::new();

    let status = if result.completed {
        "completed"
    } else {
        "cancelled"
    };
    lines.push(format!(
        "Status: {status} ({}/{} primes)",
        result.found(),
        result.target_count
    ));

    match result.last_value() {
        Some(last) if result.completed => {
            lines.push(format!("Last prime: {last}"));
        }
        Some(last) => lines.push(format!("Last prime before cancel: {last}")),
        None => lines.push("No primes found".to_string()),
    }

    let elapsed = Duration::from_millis(result.elapsed_ms);
    lines.push(format!(
        "Elapsed: {} ({:.2} primes/s, delay {})",
        humantime::format_duration(elapsed),
        metrics::primes_per_second(result.found(), result.elapsed_ms),
        humantime::format_duration(result.pacing_delay)
    ));

    if let Some((mean, median, p25, p75)) = metrics::compute_gap_metrics(&result.primes) {
        lines.push(format!(
            "Prime gaps: avg {:.2} med {:.0} p25 {:.0} p75 {:.0} (max {})",
            mean,
            median,
            p25,
            p75,
            result.gaps().iter().max().copied().unwrap_or(0)
        ));
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(primes: Vec<u64>, completed: bool) -> RunResult {
        RunResult {
            timestamp_utc: String::new(),
            run_id: 1,
            target_count: 5,
            pacing_delay: Duration::from_millis(500),
            primes,
            completed,
            elapsed_ms: 2_000,
        }
    }

    #[test]
    fn completed_run_summary() {
        let summary = build_text_summary(&result(vec![2, 3, 5, 7, 11], true));
        assert_eq!(summary.lines[0], "Status: completed (5/5 primes)");
        assert_eq!(summary.lines[1], "Last prime: 11");
        assert!(summary.lines[2].starts_with("Elapsed: 2s"));
        assert!(summary.lines[3].starts_with("Prime gaps: avg 2.25"));
    }

    #[test]
    fn cancelled_run_without_primes() {
        let summary = build_text_summary(&result(Vec::new(), false));
        assert_eq!(summary.lines[0], "Status: cancelled (0/5 primes)");
        assert_eq!(summary.lines[1], "No primes found");
        assert_eq!(summary.lines.len(), 3);
    }
}
