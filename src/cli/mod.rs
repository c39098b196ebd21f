// CLI module - Demo daemon and signal exiter commands

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crate::config::SupervisorConfig;
use crate::daemon::{self, Role};
use crate::process::EXIT_FINISHED;
use crate::signals::SigExiter;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// dmode - run a program as a self-supervising daemon
#[derive(Parser)]
#[command(name = "dmode")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemonize, then run a sample worker
    Run(RunArgs),

    /// Stay in the foreground and exit on the first termination signal
    Exiter,
}

#[derive(Args)]
struct RunArgs {
    /// Load supervisor options from a TOML or JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record the supervisor PID in this file
    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// Background the worker only, without a supervisor
    #[arg(long)]
    no_restart: bool,

    /// Delay before restarting a worker after a nonzero exit
    #[arg(long)]
    restart_delay_ms: Option<u64>,

    /// Keep stderr attached (shows the log output)
    #[arg(long)]
    keep_stderr: bool,

    /// Pause for a second before the launcher exits
    #[arg(long)]
    settle_delay: bool,

    /// Call daemonize a second time in the worker
    #[arg(long)]
    repeat_daemonize: bool,

    /// Worker appends "<pid> <role> <sid>" to this file on start
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Worker exits with this status instead of waiting for a signal
    #[arg(long)]
    exit_code: Option<i32>,

    /// How long the worker runs before exiting with --exit-code
    #[arg(long, default_value = "0")]
    lifetime_ms: u64,
}

impl Cli {
    /// Parse arguments, set up logging and execute the command
    pub fn run() -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();

        let cli = Cli::parse();

        match cli.command {
            Commands::Run(args) => run(args),
            Commands::Exiter => exiter(),
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;

    daemon::daemonize(&config);
    if args.repeat_daemonize {
        daemon::daemonize(&config);
    }

    // Subscribe before announcing the worker so no signal is missed
    let exiter = match args.exit_code {
        Some(_) => None,
        None => Some(SigExiter::install()?),
    };

    if let Some(ref path) = args.state_file {
        record_state(path)?;
    }

    match (exiter, args.exit_code) {
        (Some(exiter), _) => exiter.wait(),
        (None, code) => {
            let code = code.unwrap_or(EXIT_FINISHED);
            std::thread::sleep(Duration::from_millis(args.lifetime_ms));
            tracing::info!("Worker exiting with status {}", code);
            std::process::exit(code)
        }
    }
}

fn build_config(args: &RunArgs) -> Result<SupervisorConfig> {
    let mut builder = match args.config {
        Some(ref path) => SupervisorConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?
            .to_builder(),
        None => SupervisorConfig::builder(),
    };

    // Flags override the file
    if let Some(ref pid_file) = args.pid_file {
        builder = builder.pid_file(pid_file);
    }
    if args.no_restart {
        builder = builder.no_restart();
    }
    if let Some(ms) = args.restart_delay_ms {
        builder = builder.restart_delay(Duration::from_millis(ms));
    }
    if args.keep_stderr {
        builder = builder.keep_stderr();
    }
    if args.settle_delay {
        builder = builder.startup_settle_delay();
    }

    Ok(builder.build()?)
}

fn record_state(path: &Path) -> Result<()> {
    let sid = nix::unistd::getsid(None).context("reading session id")?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    writeln!(file, "{} {} {}", std::process::id(), Role::current(), sid)?;
    Ok(())
}

fn exiter() -> Result<()> {
    let exiter = SigExiter::install()?;

    let mut stdout = std::io::stdout();
    writeln!(stdout, "ready")?;
    stdout.flush()?;

    exiter.wait()
}
