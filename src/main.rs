use anyhow::Context;
use clap::Parser;
use sshsweep::cli::Cli;
use sshsweep::config::AppSettings;
use sshsweep::output;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => AppSettings::load_from(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => AppSettings::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable settings file");
            AppSettings::default()
        }),
    };

    // Every in-flight SSH attempt occupies a blocking thread.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(cli.scan.blocking_threads(&settings))
        .thread_name("sshsweep-worker")
        .build()
        .context("starting async runtime")?;

    runtime.block_on(cli.scan.execute(&settings, cli.quiet))?;
    Ok(())
}
