mod cancel;
mod primality;

pub use cancel::CancelToken;
pub use primality::is_prime;

use crate::model::{ComputeEvent, ProgressEvent, RunConfig, RunResult};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

pub struct PrimeEngine {
    cfg: RunConfig,
}

impl PrimeEngine {
    pub fn new(cfg: RunConfig) -> Self {
        Self { cfg }
    }

    /// Enumerate primes from 2 until `target_count` are found or `cancel` fires.
    ///
    /// Every prime is sent as a `Progress` event tagged with `run_id`. The loop has
    /// two poll points: the top of each iteration and the pacing delay.
    pub async fn run(
        self,
        run_id: u64,
        event_tx: mpsc::UnboundedSender<ComputeEvent>,
        cancel: CancelToken,
    ) -> RunResult {
        let started = Instant::now();
        let target = self.cfg.target_count;
        let mut primes: Vec<u64> = Vec::with_capacity(target as usize);
        let mut candidate: u64 = 2;

        let completed = loop {
            if cancel.is_cancelled() {
                break false;
            }

            if is_prime(candidate) {
                primes.push(candidate);
                let progress = ProgressEvent {
                    sequence_index: primes.len() as u32,
                    value: candidate,
                };
                if event_tx
                    .send(ComputeEvent::Progress { run_id, progress })
                    .is_err()
                {
                    tracing::debug!(run_id, "event receiver dropped, stopping worker");
                    cancel.cancel();
                    break false;
                }

                if progress.sequence_index >= target {
                    break true;
                }

                if !pace(self.cfg.pacing_delay, &cancel).await {
                    // Interrupted mid-delay: keep the flag set for anyone else polling it.
                    cancel.cancel();
                    break false;
                }
            }

            candidate += 1;
        };

        tracing::debug!(
            run_id,
            found = primes.len(),
            completed,
            "worker loop finished"
        );

        RunResult {
            timestamp_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            run_id,
            target_count: target,
            pacing_delay: self.cfg.pacing_delay,
            primes,
            completed,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Wait out the pacing delay. Returns `false` if cancellation interrupted the wait.
async fn pace(delay: Duration, cancel: &CancelToken) -> bool {
    if delay.is_zero() {
        // Still give the scheduler (and the controller) a turn between primes.
        tokio::task::yield_now().await;
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => !cancel.is_cancelled(),
        _ = cancel.cancelled() => false,
    }
}
