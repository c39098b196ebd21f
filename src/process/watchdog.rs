use crate::config::SupervisorConfig;
use crate::daemon::PidFile;
use crate::error::{DaemonError, Result};
use crate::process::exit::WorkerExit;
use crate::process::{spawner, Invocation};
use crate::signals::{SignalRelay, TerminationSignals};
use nix::unistd::Pid;
use std::fmt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Watchdog loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Spawning,
    Running,
    Stopping,
    Restarting,
    Done,
    Fatal,
}

impl fmt::Display for WatchdogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchdogState::Spawning => write!(f, "spawning"),
            WatchdogState::Running => write!(f, "running"),
            WatchdogState::Stopping => write!(f, "stopping"),
            WatchdogState::Restarting => write!(f, "restarting"),
            WatchdogState::Done => write!(f, "done"),
            WatchdogState::Fatal => write!(f, "fatal"),
        }
    }
}

/// Summary of a watchdog run that ended with a clean worker exit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchdogReport {
    /// Workers started, including the first
    pub spawned: usize,
    /// Restarts after a nonzero exit status
    pub restarts: usize,
    /// Immediate respawns after a worker died abnormally
    pub respawns: usize,
    /// Signals forwarded to workers
    pub signals_relayed: usize,
}

/// Keeps a worker instance of the binary running
///
/// The worker is the same executable re-run with the worker role. Exit
/// status 0 ends the loop; a nonzero status restarts it after the configured
/// delay; a worker killed by a signal is respawned at once.
pub struct Watchdog {
    config: SupervisorConfig,
    invocation: Invocation,
    state: WatchdogState,
    report: WatchdogReport,
}

impl Watchdog {
    pub fn new(config: SupervisorConfig, invocation: Invocation) -> Self {
        Self {
            config,
            invocation,
            state: WatchdogState::Spawning,
            report: WatchdogReport::default(),
        }
    }

    /// Run until a worker exits with status 0 or a worker cannot be started
    ///
    /// Must run inside a Tokio runtime with signal and time drivers enabled.
    pub async fn run(mut self) -> Result<WatchdogReport> {
        // Subscribe before the first spawn so operator signals never hit the
        // default action in the supervisor
        let mut signals = TerminationSignals::register()?;

        let pid_file = self.config.pid_file().map(PidFile::with_path);
        if let Some(ref pid_file) = pid_file {
            if let Err(e) = pid_file.write(Some(&self.invocation)) {
                warn!("Continuing without PID file: {}", e);
            }
        }

        info!(
            "Supervising {} (restart delay: {:?})",
            self.invocation.command_line(),
            self.config.restart_delay()
        );

        loop {
            self.transition(WatchdogState::Spawning);
            let mut child = match spawner::spawn_worker(&self.invocation, self.config.keep_stderr())
            {
                Ok(child) => child,
                Err(e) => {
                    self.transition(WatchdogState::Fatal);
                    error!("Failed to start worker: {}", e);
                    return Err(e);
                }
            };
            self.report.spawned += 1;

            let Some(worker) = child.id().map(|id| Pid::from_raw(id as i32)) else {
                self.transition(WatchdogState::Fatal);
                return Err(DaemonError::Spawn {
                    program: self.invocation.program().display().to_string(),
                    source: std::io::Error::other("worker exited before its PID was read"),
                });
            };
            info!("Worker {} started", worker);
            let mut relay = SignalRelay::new(worker);

            self.transition(WatchdogState::Running);
            let status = relay.wait(&mut child, &mut signals).await;
            drop(child);

            self.transition(WatchdogState::Stopping);
            self.report.signals_relayed += relay.forwarded();

            let exit = match status {
                Ok(status) => WorkerExit::from_status(status),
                Err(e) => {
                    self.transition(WatchdogState::Fatal);
                    error!("Failed to wait for worker: {}", e);
                    return Err(DaemonError::Io(e));
                }
            };

            match exit {
                WorkerExit::Finished => {
                    self.transition(WatchdogState::Done);
                    info!("Worker finished, stopping supervisor");
                    if let Some(ref pid_file) = pid_file {
                        pid_file.remove();
                    }
                    return Ok(self.report);
                }
                WorkerExit::Killed(_) => {
                    warn!("Worker {}, respawning", exit);
                    self.report.respawns += 1;
                }
                WorkerExit::Restart(_) => {
                    self.transition(WatchdogState::Restarting);
                    info!(
                        "Worker {}, restarting in {:?}",
                        exit,
                        self.config.restart_delay()
                    );
                    self.report.restarts += 1;
                    sleep(self.config.restart_delay()).await;
                }
            }
        }
    }

    fn transition(&mut self, next: WatchdogState) {
        debug!("Watchdog {} -> {}", self.state, next);
        self.state = next;
    }
}
