use clap::Parser;
use cli::Cli;
use pipeline::{RunPlan, load_settings, run};
use skyfeed_common::observability::{LogConfig, LogFormat, init_logging};
use skyfeed_common::{ExitCode, Result, SkyfeedError};
mod cli;
mod pipeline;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        emit_stderr: cli.verbose,
        format: LogFormat::from_env(),
        ..LogConfig::default()
    };
    if let Err(err) = init_logging(log_config) {
        // Logging is best-effort; the feed still gets written.
        eprintln!("warning: {err:#}");
    }

    match execute(&cli).await {
        Ok(summary) => {
            println!(
                "Wrote {} posts to {}",
                summary.posts,
                summary.output.display()
            );
            std::process::ExitCode::from(ExitCode::Success.code())
        }
        Err(err) => {
            tracing::error!(error = %err, "skyfeed.run.failed");
            match &err {
                SkyfeedError::Fetch(_) => eprintln!("Failed to fetch Bluesky feed: {err}"),
                _ => eprintln!("{err}"),
            }
            std::process::ExitCode::from(err.exit_code().code())
        }
    }
}

async fn execute(cli: &Cli) -> Result<pipeline::RunSummary> {
    // Settings are fully validated before any request goes out.
    let cfg = load_settings(cli)?;
    let plan = RunPlan::from_settings(&cfg)?;
    run(plan).await
}
