//! Run lifecycle controller.
//!
//! Owns the worker handle, its cancellation token and the computation state
//! machine, and emits events for presentation layers.

use crate::engine::{CancelToken, PrimeEngine};
use crate::model::{ComputationState, ComputeEvent, InfoEvent, RunConfig, RunResult};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinError, JoinHandle};

/// Commands emitted by UI layers to control the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Start,
    Reset,
    Quit,
}

/// Internal handle for a running worker.
struct RunCtx {
    run_id: u64,
    cancel: CancelToken,
    handle: Option<JoinHandle<RunResult>>,
}

pub(crate) struct Controller {
    cfg: RunConfig,
    state: ComputationState,
    event_tx: UnboundedSender<ComputeEvent>,
    run: Option<RunCtx>,
    next_run_id: u64,
}

impl Controller {
    pub fn new(cfg: RunConfig, event_tx: UnboundedSender<ComputeEvent>) -> Self {
        Self {
            cfg,
            state: ComputationState::Idle,
            event_tx,
            run: None,
            next_run_id: 1,
        }
    }

    pub fn state(&self) -> ComputationState {
        self.state
    }

    /// Launch a worker. Returns `false` when a run is already in progress.
    ///
    /// A finished or cancelled run is reset first, which joins its worker, so two
    /// workers never overlap.
    pub async fn start(&mut self) -> bool {
        match self.state {
            ComputationState::Running => {
                tracing::debug!("start ignored: computation already running");
                return false;
            }
            ComputationState::Cancelled | ComputationState::Completed => self.reset().await,
            ComputationState::Idle => {}
        }

        let run_id = self.next_run_id;
        self.next_run_id += 1;
        let cancel = CancelToken::new();

        self.transition(ComputationState::Running);
        let _ = self.event_tx.send(ComputeEvent::RunStarted {
            run_id,
            target_count: self.cfg.target_count,
        });

        let engine = PrimeEngine::new(self.cfg.clone());
        let event_tx = self.event_tx.clone();
        let worker_cancel = cancel.clone();
        let handle = tokio::spawn(async move { engine.run(run_id, event_tx, worker_cancel).await });

        tracing::info!(
            run_id,
            target = self.cfg.target_count,
            delay = %humantime::format_duration(self.cfg.pacing_delay),
            "computation started"
        );
        self.run = Some(RunCtx {
            run_id,
            cancel,
            handle: Some(handle),
        });
        true
    }

    /// Ask the running worker to stop. Returns `false` when nothing was running.
    ///
    /// Progress already queued by the worker is not retracted; consumers drop it.
    pub fn cancel(&mut self) -> bool {
        if self.state != ComputationState::Running {
            return false;
        }
        if let Some(ctx) = &self.run {
            ctx.cancel.cancel();
            tracing::info!(run_id = ctx.run_id, "cancellation requested");
        }
        self.transition(ComputationState::Cancelled);
        true
    }

    /// Cancel, join the worker and return to `Idle`.
    pub async fn reset(&mut self) {
        if self.cancel() {
            let _ = self
                .event_tx
                .send(ComputeEvent::Info(InfoEvent::Message("Cancelling…".into())));
        }
        if let Some(result) = self.join_worker().await {
            tracing::debug!(
                run_id = result.run_id,
                found = result.found(),
                "discarding run on reset"
            );
        }
        self.transition(ComputationState::Idle);
        let _ = self.event_tx.send(ComputeEvent::Reset);
    }

    /// Cancel and join without notifying presentation layers.
    pub async fn shutdown(&mut self) {
        if let Some(ctx) = &self.run {
            ctx.cancel.cancel();
        }
        let _ = self.join_worker().await;
    }

    /// Resolves when the current worker exits; pending forever when there is none.
    ///
    /// The handle stays in place until `finish_run` takes it, so dropping this
    /// future (e.g. a losing `select!` branch) never loses the worker's result.
    pub async fn worker_finished(&mut self) -> std::result::Result<RunResult, JoinError> {
        match self.run.as_mut().and_then(|ctx| ctx.handle.as_mut()) {
            Some(handle) => handle.await,
            None => futures::future::pending().await,
        }
    }

    /// Record the outcome of a worker observed through `worker_finished`.
    pub fn finish_run(
        &mut self,
        join_res: std::result::Result<RunResult, JoinError>,
    ) -> Option<RunResult> {
        let ctx = self.run.take()?;
        match join_res {
            Ok(result) => {
                if result.completed && self.state == ComputationState::Running {
                    tracing::info!(
                        run_id = ctx.run_id,
                        last = result.last_value(),
                        elapsed_ms = result.elapsed_ms,
                        "computation completed"
                    );
                    self.transition(ComputationState::Completed);
                    let _ = self.event_tx.send(ComputeEvent::RunCompleted {
                        run_id: ctx.run_id,
                        result: Box::new(result.clone()),
                    });
                } else {
                    // The worker can stop on its own, e.g. when the receiver is gone.
                    if self.state == ComputationState::Running {
                        self.transition(ComputationState::Cancelled);
                    }
                    let _ = self.event_tx.send(ComputeEvent::Info(InfoEvent::Cancelled {
                        found: result.found(),
                    }));
                }
                Some(result)
            }
            Err(e) => {
                tracing::warn!(run_id = ctx.run_id, error = %e, "worker task failed");
                let _ = self.event_tx.send(ComputeEvent::Info(InfoEvent::WorkerFailed {
                    reason: e.to_string(),
                }));
                if self.state == ComputationState::Running {
                    self.transition(ComputationState::Cancelled);
                }
                None
            }
        }
    }

    async fn join_worker(&mut self) -> Option<RunResult> {
        let ctx = self.run.take()?;
        let handle = ctx.handle?;
        match handle.await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(run_id = ctx.run_id, error = %e, "worker join failed");
                None
            }
        }
    }

    fn transition(&mut self, next: ComputationState) {
        if self.state == next {
            return;
        }
        tracing::debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
        let _ = self.event_tx.send(ComputeEvent::StateChanged { state: next });
    }
}

/// Translate UI commands into controller calls until the UI quits.
pub(crate) async fn run_controller(
    cfg: RunConfig,
    start_on_launch: bool,
    event_tx: UnboundedSender<ComputeEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut controller = Controller::new(cfg, event_tx);
    if start_on_launch {
        controller.start().await;
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Start) => {
                        if !controller.start().await {
                            tracing::debug!(state = ?controller.state(), "start command ignored");
                        }
                    }
                    Some(UiCommand::Reset) => controller.reset().await,
                    Some(UiCommand::Quit) | None => {
                        controller.shutdown().await;
                        break;
                    }
                }
            }
            done = controller.worker_finished() => {
                controller.finish_run(done);
            }
        }
    }

    Ok(())
}
