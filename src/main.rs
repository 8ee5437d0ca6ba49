mod cli;
mod engine;
mod logging;
mod metrics;
mod model;
mod orchestrator;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_headless = args.is_headless();

    let log_target = if is_headless || cfg!(not(feature = "tui")) {
        logging::LogTarget::Stderr
    } else {
        logging::LogTarget::File(
            args.log_file
                .clone()
                .unwrap_or_else(logging::default_log_path),
        )
    };
    logging::init(log_target)?;

    cli::run(args).await
}
