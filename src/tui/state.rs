use crate::model::{ComputationState, ProgressEvent};
use crate::orchestrator::ProgressView;
use std::time::{Duration, Instant};

pub const IDLE_TEXT: &str = "Press Start to begin";

pub struct UiState {
    pub tab: usize,
    pub computation: ComputationState,
    pub target_count: u32,
    pub found: u32,
    pub last_value: Option<u64>,
    pub status: String,
    pub info: String,

    // Newest last; bounded by RECENT_MAX.
    pub recent: Vec<u64>,
    pub gap_series: Vec<u64>,

    pub run_start: Option<Instant>,
    pub finished_in: Option<Duration>,
}

impl UiState {
    pub fn new(target_count: u32) -> Self {
        Self {
            tab: 0,
            computation: ComputationState::Idle,
            target_count,
            found: 0,
            last_value: None,
            status: IDLE_TEXT.to_string(),
            info: String::new(),
            recent: Vec::new(),
            gap_series: Vec::new(),
            run_start: None,
            finished_in: None,
        }
    }

    /// Start is disabled while a run is in progress.
    pub fn can_start(&self) -> bool {
        self.computation != ComputationState::Running
    }

    pub fn ratio(&self) -> f64 {
        if self.target_count == 0 {
            return 0.0;
        }
        (self.found as f64 / self.target_count as f64).clamp(0.0, 1.0)
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.finished_in
            .or_else(|| self.run_start.map(|t0| t0.elapsed()))
    }

    pub fn push_series(series: &mut Vec<u64>, v: u64) {
        const MAX: usize = 120;
        series.push(v);
        if series.len() > MAX {
            let _ = series.drain(0..(series.len() - MAX));
        }
    }

    fn push_recent(&mut self, v: u64) {
        const RECENT_MAX: usize = 64;
        self.recent.push(v);
        if self.recent.len() > RECENT_MAX {
            let _ = self.recent.drain(0..(self.recent.len() - RECENT_MAX));
        }
    }

    fn clear_progress(&mut self) {
        self.found = 0;
        self.last_value = None;
        self.recent.clear();
        self.gap_series.clear();
        self.finished_in = None;
    }
}

impl ProgressView for UiState {
    fn on_progress(&mut self, event: ProgressEvent) {
        if let Some(prev) = self.last_value {
            UiState::push_series(&mut self.gap_series, event.value.saturating_sub(prev));
        }
        self.found = event.sequence_index;
        self.last_value = Some(event.value);
        self.push_recent(event.value);
        self.status = format!(
            "Prime found: {} (Total: {}/{})",
            event.value, event.sequence_index, self.target_count
        );
    }

    fn on_completed(&mut self, last_value: u64) {
        self.status = format!("Computation complete! Last prime: {last_value}");
        self.finished_in = self.run_start.map(|t0| t0.elapsed());
    }

    fn on_reset(&mut self) {
        self.clear_progress();
        self.run_start = None;
        self.status = IDLE_TEXT.to_string();
    }

    fn on_started(&mut self, target_count: u32) {
        self.clear_progress();
        self.target_count = target_count;
        self.run_start = Some(Instant::now());
        self.status = "Searching…".to_string();
    }

    fn on_state(&mut self, state: ComputationState) {
        self.computation = state;
    }

    fn on_info(&mut self, message: String) {
        self.info = message;
    }
}
