use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of primes a run looks for unless overridden on the command line.
pub const DEFAULT_TARGET_COUNT: u32 = 100;
/// Pause inserted after every discovered prime to pace UI feedback.
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub target_count: u32,
    #[serde(with = "humantime_serde")]
    pub pacing_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
            pacing_delay: DEFAULT_PACING_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputationState {
    Idle,
    Running,
    Cancelled,
    Completed,
}

impl ComputationState {
    pub fn label(self) -> &'static str {
        match self {
            ComputationState::Idle => "Idle",
            ComputationState::Running => "Running",
            ComputationState::Cancelled => "Cancelled",
            ComputationState::Completed => "Completed",
        }
    }
}

/// The k-th prime discovered by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Count of primes found so far, starting at 1.
    pub sequence_index: u32,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ComputeEvent {
    StateChanged {
        state: ComputationState,
    },
    RunStarted {
        run_id: u64,
        target_count: u32,
    },
    Progress {
        run_id: u64,
        progress: ProgressEvent,
    },
    RunCompleted {
        run_id: u64,
        // Boxed so the hot Progress variant stays small.
        result: Box<RunResult>,
    },
    /// The controller discarded the current run; consumers clear visible progress.
    Reset,
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    Cancelled { found: u32 },
    WorkerFailed { reason: String },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Cancelled { found } => {
                format!("Cancelled after {} prime(s)", found)
            }
            InfoEvent::WorkerFailed { reason } => format!("Worker failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default)]
    pub timestamp_utc: String,
    pub run_id: u64,
    pub target_count: u32,
    #[serde(with = "humantime_serde")]
    pub pacing_delay: Duration,
    pub primes: Vec<u64>,
    pub completed: bool,
    pub elapsed_ms: u64,
}

impl RunResult {
    pub fn found(&self) -> u32 {
        self.primes.len() as u32
    }

    pub fn last_value(&self) -> Option<u64> {
        self.primes.last().copied()
    }

    /// Distances between consecutive primes, as plotted and summarised by the front-ends.
    pub fn gaps(&self) -> Vec<u64> {
        self.primes.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(primes: Vec<u64>) -> RunResult {
        RunResult {
            timestamp_utc: String::new(),
            run_id: 1,
            target_count: primes.len() as u32,
            pacing_delay: Duration::ZERO,
            primes,
            completed: true,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn gaps_between_consecutive_primes() {
        let r = result_with(vec![2, 3, 5, 7, 11]);
        assert_eq!(r.gaps(), vec![1, 2, 2, 4]);
        assert_eq!(r.last_value(), Some(11));
        assert_eq!(r.found(), 5);
    }

    #[test]
    fn empty_result_has_no_last_value() {
        let r = result_with(Vec::new());
        assert!(r.gaps().is_empty());
        assert_eq!(r.last_value(), None);
    }

    #[test]
    fn run_result_serializes_delay_as_humantime() {
        let mut r = result_with(vec![2, 3]);
        r.pacing_delay = Duration::from_millis(500);
        let json = serde_json::to_value(&r).expect("serialize");
        assert_eq!(json["pacing_delay"], "500ms");
        assert_eq!(json["primes"], serde_json::json!([2, 3]));
    }
}
