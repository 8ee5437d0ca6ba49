//! Consumer side of the event channel.
//!
//! A run may still deliver progress after the user asked to stop it, because the
//! worker can be mid-step when the flag is set. The presenter remembers which run
//! is live and drops anything else before it reaches the view.

use crate::model::{ComputationState, ComputeEvent, ProgressEvent};

/// Presentation collaborator. Called only from the consuming context.
pub(crate) trait ProgressView {
    fn on_progress(&mut self, event: ProgressEvent);
    fn on_completed(&mut self, last_value: u64);
    fn on_reset(&mut self);

    fn on_started(&mut self, _target_count: u32) {}
    fn on_state(&mut self, _state: ComputationState) {}
    fn on_info(&mut self, _message: String) {}
}

pub(crate) struct Presenter<V> {
    view: V,
    active_run: Option<u64>,
}

impl<V: ProgressView> Presenter<V> {
    pub fn new(view: V) -> Self {
        Self {
            view,
            active_run: None,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Stop accepting events from the current run and clear the view.
    ///
    /// UI layers call this the moment the user resets, ahead of the
    /// controller's own `Reset` event.
    pub fn reset(&mut self) {
        self.suspend();
        self.view.on_reset();
    }

    /// Stop accepting events from the current run but keep what is on screen.
    pub fn suspend(&mut self) {
        self.active_run = None;
    }

    pub fn apply(&mut self, ev: ComputeEvent) {
        match ev {
            ComputeEvent::StateChanged { state } => {
                // Progress queued behind a cancel or reset belongs to a dead run.
                if matches!(state, ComputationState::Cancelled | ComputationState::Idle) {
                    self.suspend();
                }
                self.view.on_state(state);
            }
            ComputeEvent::RunStarted {
                run_id,
                target_count,
            } => {
                self.active_run = Some(run_id);
                self.view.on_started(target_count);
            }
            ComputeEvent::Progress { run_id, progress } => {
                if self.is_active(run_id) {
                    self.view.on_progress(progress);
                } else {
                    tracing::debug!(
                        run_id,
                        index = progress.sequence_index,
                        "discarding progress from inactive run"
                    );
                }
            }
            ComputeEvent::RunCompleted { run_id, result } => {
                if !self.is_active(run_id) {
                    tracing::debug!(run_id, "discarding completion from inactive run");
                    return;
                }
                if let Some(last) = result.last_value() {
                    self.view.on_completed(last);
                }
            }
            ComputeEvent::Reset => self.reset(),
            ComputeEvent::Info(info) => self.view.on_info(info.to_message()),
        }
    }

    fn is_active(&self, run_id: u64) -> bool {
        self.active_run == Some(run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InfoEvent, RunResult};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct RecordingView {
        progress: Vec<ProgressEvent>,
        completed: Vec<u64>,
        resets: usize,
        infos: Vec<String>,
    }

    impl ProgressView for RecordingView {
        fn on_progress(&mut self, event: ProgressEvent) {
            self.progress.push(event);
        }

        fn on_completed(&mut self, last_value: u64) {
            self.completed.push(last_value);
        }

        fn on_reset(&mut self) {
            self.progress.clear();
            self.resets += 1;
        }

        fn on_info(&mut self, message: String) {
            self.infos.push(message);
        }
    }

    fn progress(run_id: u64, sequence_index: u32, value: u64) -> ComputeEvent {
        ComputeEvent::Progress {
            run_id,
            progress: ProgressEvent {
                sequence_index,
                value,
            },
        }
    }

    fn completed(run_id: u64, primes: Vec<u64>) -> ComputeEvent {
        ComputeEvent::RunCompleted {
            run_id,
            result: Box::new(RunResult {
                timestamp_utc: String::new(),
                run_id,
                target_count: primes.len() as u32,
                pacing_delay: Duration::ZERO,
                primes,
                completed: true,
                elapsed_ms: 0,
            }),
        }
    }

    fn started(run_id: u64) -> ComputeEvent {
        ComputeEvent::RunStarted {
            run_id,
            target_count: 5,
        }
    }

    #[test]
    fn forwards_events_of_active_run() {
        let mut p = Presenter::new(RecordingView::default());
        p.apply(started(1));
        p.apply(progress(1, 1, 2));
        p.apply(progress(1, 2, 3));
        p.apply(completed(1, vec![2, 3]));

        assert_eq!(p.view().progress.len(), 2);
        assert_eq!(p.view().completed, vec![3]);
    }

    #[test]
    fn trailing_event_after_local_reset_is_discarded() {
        let mut p = Presenter::new(RecordingView::default());
        p.apply(started(1));
        p.apply(progress(1, 1, 2));

        p.reset();
        // Already in the channel when the user pressed Reset.
        p.apply(progress(1, 2, 3));
        p.apply(ComputeEvent::Reset);

        assert!(p.view().progress.is_empty());
        assert_eq!(p.view().resets, 2);
    }

    #[test]
    fn suspend_keeps_view_but_drops_late_events() {
        let mut p = Presenter::new(RecordingView::default());
        p.apply(started(1));
        p.apply(progress(1, 1, 2));
        p.suspend();
        p.apply(progress(1, 2, 3));

        assert_eq!(p.view().progress.len(), 1);
        assert_eq!(p.view().resets, 0);
    }

    #[test]
    fn cancelled_state_on_the_channel_stops_the_run() {
        let mut p = Presenter::new(RecordingView::default());
        p.apply(started(1));
        p.apply(progress(1, 1, 2));
        p.apply(ComputeEvent::StateChanged {
            state: ComputationState::Cancelled,
        });
        p.apply(progress(1, 2, 3));

        assert_eq!(
            p.view().progress,
            vec![ProgressEvent {
                sequence_index: 1,
                value: 2
            }]
        );
        assert_eq!(p.view().resets, 0);
    }

    #[test]
    fn completed_state_keeps_the_run_active() {
        let mut p = Presenter::new(RecordingView::default());
        p.apply(started(1));
        p.apply(progress(1, 1, 2));
        p.apply(ComputeEvent::StateChanged {
            state: ComputationState::Completed,
        });
        p.apply(completed(1, vec![2]));

        assert_eq!(p.view().completed, vec![2]);
    }

    #[test]
    fn events_before_any_run_are_ignored() {
        let mut p = Presenter::new(RecordingView::default());
        p.apply(progress(3, 1, 2));
        p.apply(completed(3, vec![2]));

        assert!(p.view().progress.is_empty());
        assert!(p.view().completed.is_empty());
    }

    #[test]
    fn new_run_is_accepted_and_stale_one_is_not() {
        let mut p = Presenter::new(RecordingView::default());
        p.apply(started(1));
        p.reset();
        p.apply(started(2));
        p.apply(progress(1, 2, 3));
        p.apply(progress(2, 1, 2));
        p.apply(completed(1, vec![2, 3]));

        assert_eq!(
            p.view().progress,
            vec![ProgressEvent {
                sequence_index: 1,
                value: 2
            }]
        );
        assert!(p.view().completed.is_empty());
    }

    #[test]
    fn info_is_rendered_as_message() {
        let mut p = Presenter::new(RecordingView::default());
        p.apply(ComputeEvent::Info(InfoEvent::Cancelled { found: 4 }));
        assert_eq!(p.view().infos, vec!["Cancelled after 4 prime(s)".to_string()]);
    }
}
