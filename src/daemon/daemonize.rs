// Daemonization by re-executing the running binary

use super::Role;
use crate::config::{SupervisorConfig, STARTUP_SETTLE_DELAY};
use crate::error::{DaemonError, Result};
use crate::process::exit::{EXIT_FATAL, EXIT_FINISHED};
use crate::process::{spawner, Invocation, Watchdog};
use tracing::{debug, info};

/// Run the calling program as a daemon
///
/// On the first, foreground invocation this re-executes the binary in the
/// background and exits with status 0. In the background supervisor it runs
/// the watchdog loop and never returns. In the worker it returns, and the
/// caller carries on with its own program logic; calling it again in the
/// worker returns immediately.
///
/// Setup errors are reported on stderr and end the process with status 2.
///
/// Call this before starting an async runtime: the supervisor builds its own.
pub fn daemonize(config: &SupervisorConfig) {
    if let Err(e) = try_daemonize(config) {
        eprintln!("cannot daemonize: {}", e);
        std::process::exit(EXIT_FATAL);
    }
}

/// Same as [`daemonize`], but setup errors are returned to the caller
pub fn try_daemonize(config: &SupervisorConfig) -> Result<()> {
    let invocation = Invocation::current()?;

    match Role::current() {
        Role::Unset => launch(config, &invocation),
        Role::Worker => {
            detach_session();
            Ok(())
        }
        Role::Supervisor => {
            detach_session();
            supervise(config, invocation)
        }
    }
}

/// Role the launcher hands to the background instance
pub fn launch_role(config: &SupervisorConfig) -> Role {
    if config.single_process() {
        Role::Worker
    } else {
        Role::Supervisor
    }
}

fn launch(config: &SupervisorConfig, invocation: &Invocation) -> Result<()> {
    let role = launch_role(config);
    let pid = spawner::spawn_detached(invocation, role, config.keep_stderr())?;
    info!("Started background {} (PID: {})", role, pid);

    if config.startup_settle_delay() {
        std::thread::sleep(STARTUP_SETTLE_DELAY);
    }

    std::process::exit(EXIT_FINISHED)
}

fn supervise(config: &SupervisorConfig, invocation: Invocation) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DaemonError::Runtime(e.to_string()))?;

    let report = runtime.block_on(Watchdog::new(config.clone(), invocation).run())?;
    info!(
        "Supervisor done after {} worker(s), {} restart(s)",
        report.spawned, report.restarts
    );

    std::process::exit(EXIT_FINISHED)
}

/// Leave the controlling terminal's session, once per process
#[cfg(unix)]
fn detach_session() {
    static DETACH: std::sync::Once = std::sync::Once::new();

    DETACH.call_once(|| {
        // EPERM means we already lead a process group; nothing to detach from
        if let Err(e) = nix::unistd::setsid() {
            debug!("setsid failed: {}", e);
        }
    });
}

#[cfg(not(unix))]
fn detach_session() {}
