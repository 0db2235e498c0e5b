//! Gantry - build a mobile solution and submit its UI tests to a device cloud

mod cli;
mod pipeline;
mod report;

use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use report::{EnvFileSink, ResultSink};

fn main() -> anyhow::Result<()> {
    let _guard = init_tracing();

    let cli = cli::Cli::parse();
    cli.validate()?;
    cli.print_configs();

    let sink = EnvFileSink::from_env();
    let mut pipeline = pipeline::Pipeline::new(cli.into_options());
    let outcome = pipeline.run();

    sink.report(outcome.is_ok(), pipeline.result_log().unwrap_or(""));

    match outcome {
        Ok(()) => {
            println!("{}", style("Device-cloud run succeeded").green());
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", style(format!("Device-cloud run failed: {err}")).red());
            std::process::exit(1);
        }
    }
}

/// Set up tracing with two layers:
/// - Console: controlled by RUST_LOG (default: info)
/// - File: always debug-level JSON to ~/.gantry/logs/
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(log_dir) = log_directory() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "gantry.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_filter(console_filter),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_filter(EnvFilter::new("debug")),
            )
            .init();

        return Some(guard);
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(console_filter),
        )
        .init();

    None
}

/// Returns the log directory path, creating it if needed.
fn log_directory() -> Option<std::path::PathBuf> {
    let log_dir = dirs::home_dir()?.join(".gantry").join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;
    Some(log_dir)
}
