//! procsnap - prints one snapshot of Linux process and system counters as JSON.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, debug, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use procsnap::collector::{
    CollectError, CpuVmStatsCollector, DiskStatsCollector, MemoryStatsCollector,
    ProcessTableCollector, RealFs,
};
use procsnap::model::{DetailPolicy, ProcessFilter, ProcessState};
use procsnap::util::{page_size, ticks_per_second};

/// Linux process and system counter snapshots.
#[derive(Parser)]
#[command(name = "procsnap", about = "Prints one snapshot of kernel counters as JSON", version)]
struct Cli {
    /// Path to /proc filesystem (for testing/snapshots).
    #[arg(long, global = true, env = "PROCSNAP_PROC_PATH", default_value = "/proc")]
    proc_path: String,

    /// Path to /sys filesystem.
    #[arg(long, global = true, env = "PROCSNAP_SYS_PATH", default_value = "/sys")]
    sys_path: String,

    /// Single-line JSON instead of pretty-printed.
    #[arg(long, global = true)]
    compact: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace). Default is warn level.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process table.
    Procs(ProcsArgs),
    /// Memory counters from /proc/meminfo.
    Mem {
        /// Unit shift: 0 = bytes, 10 = kB, 20 = MB.
        #[arg(long, default_value_t = 10)]
        shift: u32,
        /// Print the historical positional array (32-bit) instead of named fields.
        #[arg(long)]
        positional: bool,
    },
    /// CPU and VM counters from /proc/stat and /proc/vmstat.
    Stat {
        /// Print the historical positional array (32-bit) instead of named fields.
        #[arg(long)]
        positional: bool,
    },
    /// Disk and partition counters.
    Disk,
    /// Clock ticks per second and page size.
    Hertz,
}

#[derive(Args)]
struct ProcsArgs {
    /// Collect every optional field.
    #[arg(long)]
    full: bool,
    #[arg(long)]
    cmdline: bool,
    #[arg(long)]
    environ: bool,
    /// Collect statm memory figures.
    #[arg(long)]
    memory: bool,
    #[arg(long)]
    status: bool,

    /// Only these pids (repeatable).
    #[arg(long = "pid", conflicts_with_all = ["uids", "states"])]
    pids: Vec<u32>,
    /// Only processes owned by these uids (repeatable).
    #[arg(long = "uid", conflicts_with = "states")]
    uids: Vec<u32>,
    /// Only processes in these states, as stat letters (repeatable).
    #[arg(long = "state", value_parser = parse_state)]
    states: Vec<ProcessState>,

    /// Fail instead of returning more than this many processes.
    #[arg(long)]
    limit: Option<usize>,
    /// Page size for statm conversion, when reading a snapshot from another host.
    #[arg(long)]
    page_size: Option<u64>,
}

impl ProcsArgs {
    fn policy(&self) -> DetailPolicy {
        let mut policy = if self.full {
            DetailPolicy::full()
        } else {
            DetailPolicy::basic()
        };
        policy.cmdline |= self.cmdline;
        policy.environ |= self.environ;
        policy.memory |= self.memory;
        policy.status |= self.status;

        if !self.pids.is_empty() {
            policy = policy.with_filter(ProcessFilter::Pids(self.pids.iter().copied().collect()));
        } else if !self.uids.is_empty() {
            policy = policy.with_filter(ProcessFilter::Uids(self.uids.iter().copied().collect()));
        } else if !self.states.is_empty() {
            let states: BTreeSet<ProcessState> = self.states.iter().copied().collect();
            policy = policy.with_filter(ProcessFilter::States(states));
        }
        policy
    }
}

fn parse_state(s: &str) -> Result<ProcessState, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(ProcessState::from_char(c)),
        _ => Err(format!("expected a single state letter, got '{}'", s)),
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr so stdout stays valid JSON.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[derive(Serialize)]
struct Hertz {
    ticks_per_second: u64,
    page_size: u64,
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), CliError> {
    write_json(io::stdout().lock(), value, compact)
}

fn write_json<W, T>(mut out: W, value: &T, compact: bool) -> Result<(), CliError>
where
    W: Write,
    T: Serialize,
{
    if compact {
        serde_json::to_writer(&mut out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut out, value)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let fs = RealFs::new();
    let proc_path = cli.proc_path.as_str();

    match &cli.command {
        Command::Procs(args) => {
            let mut collector = ProcessTableCollector::new(fs, proc_path);
            if let Some(page_size) = args.page_size {
                collector = collector.with_page_size(page_size);
            }
            if let Some(limit) = args.limit {
                collector = collector.with_capacity_limit(limit)?;
            }
            let records = collector.scan(&args.policy())?;
            debug!(count = records.len(), "processes collected");
            print_json(&records, cli.compact)
        }
        Command::Mem { shift, positional } => {
            let stats = MemoryStatsCollector::new(fs, proc_path).collect(*shift)?;
            if *positional {
                print_json(&stats.to_positional_u32()?.to_vec(), cli.compact)
            } else {
                print_json(&stats, cli.compact)
            }
        }
        Command::Stat { positional } => {
            let stats = CpuVmStatsCollector::new(fs, proc_path).collect()?;
            if *positional {
                print_json(&stats.to_positional_u32()?.to_vec(), cli.compact)
            } else {
                print_json(&stats, cli.compact)
            }
        }
        Command::Disk => {
            let snapshot = DiskStatsCollector::new(fs, proc_path, cli.sys_path.as_str()).collect()?;
            print_json(&snapshot, cli.compact)
        }
        Command::Hertz => print_json(
            &Hertz {
                ticks_per_second: ticks_per_second(),
                page_size: page_size(),
            },
            cli.compact,
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
