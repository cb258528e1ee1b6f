//! ssub - submit shell commands as SLURM batch jobs.

mod submit;

use clap::Parser;
use crossterm::style::Stylize;
use miette::{IntoDiagnostic, Result};
use ssub_cli::Args;
use ssub_store::{DefaultsStore, HistoryLog, SsubPaths};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let paths = SsubPaths::from_home().into_diagnostic()?;

    if let Some(path) = &args.use_config {
        let absolute = DefaultsStore::new(paths.clone())
            .set_config_path(path)
            .into_diagnostic()?;
        eprintln!("{} {}", "Using defaults from".green(), absolute);
    }

    if let Some(n) = args.history {
        show_history(&paths, n)?;
    }

    if args.command.is_empty() {
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime.block_on(submit::run(&args, &paths))
}

/// Log to stderr, filtered by `SSUB_LOG` or the `-v` count.
fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_env("SSUB_LOG").unwrap_or_else(|_| EnvFilter::new(args.log_level()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn show_history(paths: &SsubPaths, n: usize) -> Result<()> {
    let entries = HistoryLog::new(paths.history.clone())
        .recent(n)
        .into_diagnostic()?;

    if entries.is_empty() {
        eprintln!("{}", "No jobs submitted yet".dark_grey());
    }
    for entry in entries {
        println!("{}\t{}", entry.job_name.bold(), entry.output);
    }
    Ok(())
}
