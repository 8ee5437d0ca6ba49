use crate::model::{ProgressEvent, RunConfig, RunResult};
use crate::orchestrator::{Controller, Presenter, ProgressView};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "prime-progress",
    version,
    about = "Sequential prime search with live progress, cancel and reset"
)]
pub struct Cli {
    /// Number of primes to find before the run completes
    #[arg(long, default_value_t = crate::model::DEFAULT_TARGET_COUNT, value_parser = clap::value_parser!(u32).range(1..))]
    pub target: u32,

    /// Pause after each prime found (e.g. 500ms, 1s, 0s)
    #[arg(long, default_value_t = humantime::Duration::from(crate::model::DEFAULT_PACING_DELAY))]
    pub delay: humantime::Duration,

    /// Print progress and a text summary, then exit (no TUI)
    #[arg(long, conflicts_with = "json")]
    pub text: bool,

    /// Print the run result as JSON, then exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Start computing as soon as the TUI opens instead of waiting for Start
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub start_on_launch: bool,

    /// Write logs here instead of the default cache location (TUI mode)
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
}

impl Cli {
    pub fn is_headless(&self) -> bool {
        self.text || self.json
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args).await;
    }

    run_text(args).await
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> RunConfig {
    RunConfig {
        target_count: args.target,
        pacing_delay: Duration::from(args.delay),
    }
}

/// Drive a single run to its end without a UI. Ctrl-C cancels the run.
async fn run_headless<V: ProgressView>(
    cfg: RunConfig,
    presenter: &mut Presenter<V>,
) -> Result<RunResult> {
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
    let mut controller = Controller::new(cfg, evt_tx);
    controller.start().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    let finished = loop {
        tokio::select! {
            Some(ev) = evt_rx.recv() => presenter.apply(ev),
            done = controller.worker_finished() => break controller.finish_run(done),
            res = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                res.context("listen for ctrl-c")?;
                presenter.suspend();
                controller.cancel();
            }
        }
    };

    // Progress queued before the worker exited, plus the completion itself.
    while let Ok(ev) = evt_rx.try_recv() {
        presenter.apply(ev);
    }

    finished.context("prime worker task failed")
}

/// Prints each prime to stderr as it arrives.
struct TextView {
    out_tx: mpsc::UnboundedSender<OutputLine>,
    target_count: u32,
}

impl ProgressView for TextView {
    fn on_progress(&mut self, event: ProgressEvent) {
        let _ = self.out_tx.send(OutputLine::Stderr(format!(
            "Prime found: {} (Total: {}/{})",
            event.value, event.sequence_index, self.target_count
        )));
    }

    fn on_completed(&mut self, last_value: u64) {
        let _ = self.out_tx.send(OutputLine::Stderr(format!(
            "Computation complete! Last prime: {last_value}"
        )));
    }

    fn on_reset(&mut self) {}

    fn on_started(&mut self, target_count: u32) {
        self.target_count = target_count;
    }

    fn on_info(&mut self, message: String) {
        let _ = self.out_tx.send(OutputLine::Stderr(message));
    }
}

/// Consumes events without output; the JSON dump is the only product.
struct SilentView;

impl ProgressView for SilentView {
    fn on_progress(&mut self, _event: ProgressEvent) {}
    fn on_completed(&mut self, _last_value: u64) {}
    fn on_reset(&mut self) {}
}

async fn run_text(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let (out_tx, out_handle) = spawn_output_writer();
    let mut presenter = Presenter::new(TextView {
        out_tx: out_tx.clone(),
        target_count: cfg.target_count,
    });

    let result = run_headless(cfg, &mut presenter).await?;

    let summary = crate::text_summary::build_text_summary(&result);
    for line in summary.lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    drop(presenter);
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_json(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let mut presenter = Presenter::new(SilentView);
    let result = run_headless(cfg, &mut presenter).await?;

    let (out_tx, out_handle) = spawn_output_writer();
    let out = serde_json::to_string_pretty(&result).context("serialize run result")?;
    let _ = out_tx.send(OutputLine::Stdout(out));
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_100_primes_and_500ms() {
        let args = Cli::try_parse_from(["prime-progress"]).expect("parse");
        let cfg = build_config(&args);
        assert_eq!(cfg, RunConfig::default());
        assert_eq!(cfg.target_count, 100);
        assert_eq!(cfg.pacing_delay, Duration::from_millis(500));
        assert!(!args.is_headless());
        assert!(!args.start_on_launch);
    }

    #[test]
    fn parses_target_and_delay() {
        let args =
            Cli::try_parse_from(["prime-progress", "--target", "5", "--delay", "0s", "--text"])
                .expect("parse");
        let cfg = build_config(&args);
        assert_eq!(cfg.target_count, 5);
        assert_eq!(cfg.pacing_delay, Duration::ZERO);
        assert!(args.is_headless());
    }

    #[test]
    fn rejects_zero_target() {
        assert!(Cli::try_parse_from(["prime-progress", "--target", "0"]).is_err());
    }

    #[test]
    fn text_and_json_conflict() {
        assert!(Cli::try_parse_from(["prime-progress", "--text", "--json"]).is_err());
    }

    #[tokio::test]
    async fn headless_run_prints_each_prime() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let mut presenter = Presenter::new(TextView {
            out_tx,
            target_count: 0,
        });
        let cfg = RunConfig {
            target_count: 5,
            pacing_delay: Duration::ZERO,
        };

        let result = run_headless(cfg, &mut presenter).await.expect("run");
        assert!(result.completed);
        assert_eq!(result.primes, vec![2, 3, 5, 7, 11]);

        let mut lines = Vec::new();
        while let Ok(OutputLine::Stderr(line)) = out_rx.try_recv() {
            lines.push(line);
        }
        assert_eq!(
            lines,
            vec![
                "Prime found: 2 (Total: 1/5)",
                "Prime found: 3 (Total: 2/5)",
                "Prime found: 5 (Total: 3/5)",
                "Prime found: 7 (Total: 4/5)",
                "Prime found: 11 (Total: 5/5)",
                "Computation complete! Last prime: 11",
            ]
        );
    }
}
