//! CLI argument parsing for ssub.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use ssub_core::{ExplicitParams, Param};
use ssub_parsers::parse_duration;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ssub")]
#[command(about = "Submit shell commands as SLURM batch jobs")]
#[command(version)]
pub struct Args {
    /// Job name
    #[arg(short = 'J', long)]
    pub job_name: Option<String>,

    /// Partition to submit to
    #[arg(short, long)]
    pub partition: Option<String>,

    /// Account to charge
    #[arg(short = 'A', long)]
    pub account: Option<String>,

    /// Number of nodes (derived from --nodelist when omitted)
    #[arg(short = 'N', long)]
    pub nodes: Option<String>,

    /// Number of tasks
    #[arg(short, long)]
    pub ntasks: Option<String>,

    /// CPUs per task
    #[arg(short, long)]
    pub cpus_per_task: Option<String>,

    /// Memory per node, e.g. 16G
    #[arg(long)]
    pub mem: Option<String>,

    /// Time limit, e.g. 1-00:00:00
    #[arg(short, long)]
    pub time: Option<String>,

    /// Comma-separated nodes to run on
    #[arg(short = 'w', long)]
    pub nodelist: Option<String>,

    /// Comma-separated nodes to avoid
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,

    /// Address for job notifications
    #[arg(long)]
    pub mail_user: Option<String>,

    /// Events that trigger notifications (NONE, BEGIN, END, FAIL, ALL)
    #[arg(long)]
    pub mail_type: Option<String>,

    /// Log file or directory; `OUT,ERR` splits stdout and stderr
    #[arg(short, long)]
    pub output: Option<String>,

    /// Token appended to the job name and log paths
    #[arg(long)]
    pub seed: Option<String>,

    /// Number of GPUs
    #[arg(long)]
    pub gpus: Option<String>,

    /// Memory per GPU
    #[arg(long)]
    pub gpu_mem: Option<String>,

    /// Keep the job name and log paths as given
    #[arg(long)]
    pub no_unique: bool,

    /// Write the job script here instead of a temporary file (removed after
    /// submission unless --keep-script is given)
    #[arg(long)]
    pub script: Option<Utf8PathBuf>,

    /// Keep the job script after submission
    #[arg(long)]
    pub keep_script: bool,

    /// Wait until your running cores plus this job fit under N
    #[arg(long, value_name = "N")]
    pub max_cores: Option<u64>,

    /// Stop waiting for capacity after this long, e.g. 30:00
    #[arg(long, value_name = "DURATION", value_parser = parse_give_up, requires = "max_cores")]
    pub give_up: Option<Duration>,

    /// Print the job script and exit without submitting
    #[arg(long)]
    pub dry_run: bool,

    /// Show the last N submitted jobs
    #[arg(long, value_name = "N")]
    pub history: Option<usize>,

    /// Use PATH as the defaults file from now on
    #[arg(long, value_name = "PATH")]
    pub use_config: Option<Utf8PathBuf>,

    /// Increase logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Command to run in the job
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present_any = ["history", "use_config"]
    )]
    pub command: Vec<String>,
}

impl Args {
    /// Parameters given on the command line.
    pub fn explicit_params(&self) -> ExplicitParams {
        let mut explicit = ExplicitParams::new();
        explicit
            .set(Param::JobName, self.job_name.clone())
            .set(Param::Partition, self.partition.clone())
            .set(Param::Account, self.account.clone())
            .set(Param::Nodes, self.nodes.clone())
            .set(Param::Ntasks, self.ntasks.clone())
            .set(Param::CpusPerTask, self.cpus_per_task.clone())
            .set(Param::Mem, self.mem.clone())
            .set(Param::Time, self.time.clone())
            .set(Param::Nodelist, self.nodelist.clone())
            .set(Param::Exclude, self.exclude.clone())
            .set(Param::MailUser, self.mail_user.clone())
            .set(Param::MailType, self.mail_type.clone())
            .set(Param::Output, self.output.clone())
            .set(Param::Seed, self.seed.clone())
            .set(Param::Gpus, self.gpus.clone())
            .set(Param::GpuMem, self.gpu_mem.clone())
            .set(Param::NoUnique, self.no_unique.then_some("1"));
        explicit
    }

    /// The command as one shell string.
    pub fn command_line(&self) -> String {
        shell_join(&self.command)
    }

    /// Default log level for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

fn parse_give_up(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration '{s}', expected [D-]HH:MM:SS, MM:SS or seconds"))
}

/// Join command words for a shell.
///
/// A single word is taken verbatim so `ssub "a && b"` runs both commands.
/// Multiple words are quoted where needed.
pub fn shell_join(words: &[String]) -> String {
    if let [single] = words {
        return single.clone();
    }
    words
        .iter()
        .map(|w| shell_quote(w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
