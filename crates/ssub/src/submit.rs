//! The submission pipeline: resolve, validate, derive logs, render, wait
//! for capacity, submit, record.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use crossterm::style::Stylize;
use miette::{IntoDiagnostic, Result, miette};
use ssub_cli::Args;
use ssub_core::{
    ParameterSet, Resolver, Throttle, ThrottleConfig, TokioClock, derive_log_paths, uniquify,
    validate,
};
use ssub_parsers::format_duration;
use ssub_slurm::{JobScript, Sbatch, SqueueUsage, Submission};
use ssub_store::{DefaultsStore, HistoryEntry, HistoryLog, SsubPaths, annotate_logs};

pub async fn run(args: &Args, paths: &SsubPaths) -> Result<()> {
    let cwd = current_dir()?;
    submit(args, paths, &cwd, &Sbatch::default()).await
}

async fn submit(args: &Args, paths: &SsubPaths, cwd: &Utf8Path, sbatch: &Sbatch) -> Result<()> {
    let resolver = Resolver::new(args.explicit_params(), DefaultsStore::new(paths.clone()));
    let mut params = resolver.resolve().into_diagnostic()?;
    validate(&mut params).into_diagnostic()?;

    params.logs =
        derive_log_paths(params.output.as_deref(), &params.job_name, cwd).into_diagnostic()?;
    uniquify(&mut params);

    let command = args.command_line();
    let script = JobScript::render(&params, &command);

    if args.dry_run {
        eprintln!("{}", "Dry run: job not submitted".yellow());
        print!("{script}");
        return Ok(());
    }

    let script_file = match &args.script {
        Some(path) => script.write_to(path, args.keep_script),
        None => script.write_temp(args.keep_script),
    }
    .into_diagnostic()?;
    tracing::debug!("Wrote job script {}", script_file.path());

    // Dropping the script file on any early return removes it.
    let submission = tokio::select! {
        result = wait_and_submit(args, &params, sbatch, script_file.path()) => result?,
        _ = tokio::signal::ctrl_c() => {
            return Err(miette!(
                "Submission of {} interrupted; sbatch was stopped but the job may already be queued",
                params.job_name
            ));
        }
    };

    println!(
        "{} {} ({})",
        "Submitted batch job".green(),
        submission.job_id.as_str().bold(),
        params.job_name
    );
    if script_file.is_kept() {
        eprintln!("{} {}", "Job script kept at".dark_grey(), script_file.path());
    }

    annotate_logs(&params.logs, &command, Local::now()).into_diagnostic()?;

    HistoryLog::new(paths.history.clone())
        .append(&HistoryEntry {
            job_name: params.job_name.clone(),
            output: cwd.join(&params.logs.output),
        })
        .into_diagnostic()?;

    Ok(())
}

async fn wait_and_submit(
    args: &Args,
    params: &ParameterSet,
    sbatch: &Sbatch,
    script: &Utf8Path,
) -> Result<Submission> {
    if let Some(ceiling) = args.max_cores {
        let requested = params.requested_cores().into_diagnostic()?;
        let probe = SqueueUsage::for_current_user().into_diagnostic()?;
        let config = ThrottleConfig {
            ceiling: Some(ceiling),
            give_up_after: args.give_up,
        };

        let report = Throttle::new(config, TokioClock, probe)
            .wait(requested)
            .await
            .into_diagnostic()?;
        if report.attempts > 1 {
            eprintln!(
                "{} {} for {} cores",
                "Waited".cyan(),
                format_duration(report.waited),
                requested
            );
        }
    }

    sbatch.submit(script).await.into_diagnostic()
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    Utf8PathBuf::try_from(cwd).into_diagnostic()
}
