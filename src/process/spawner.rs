use crate::daemon::Role;
use crate::error::{DaemonError, Result};
use crate::process::Invocation;
use std::process::{Command, Stdio};

/// Build the command that re-executes `invocation` in the given role
///
/// Standard input and output are attached to the null device. Standard
/// error goes to the null device as well unless `keep_stderr` is set, in
/// which case it is inherited from the caller. The child sees the caller's
/// environment plus the role marker.
pub fn worker_command(invocation: &Invocation, role: Role, keep_stderr: bool) -> Command {
    let mut command = Command::new(invocation.program());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        if let Some(arg0) = invocation.arg0() {
            command.arg0(arg0);
        }
    }

    command.args(invocation.arguments());
    role.apply(&mut command);

    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    if keep_stderr {
        command.stderr(Stdio::inherit());
    } else {
        command.stderr(Stdio::null());
    }

    command
}

/// Spawn a detached instance that nobody waits on (used by the launcher)
pub fn spawn_detached(invocation: &Invocation, role: Role, keep_stderr: bool) -> Result<u32> {
    let child = worker_command(invocation, role, keep_stderr)
        .spawn()
        .map_err(|e| spawn_error(invocation, e))?;

    Ok(child.id())
}

/// Spawn a worker the watchdog will wait on
pub fn spawn_worker(invocation: &Invocation, keep_stderr: bool) -> Result<tokio::process::Child> {
    let command = worker_command(invocation, Role::Worker, keep_stderr);

    tokio::process::Command::from(command)
        .spawn()
        .map_err(|e| spawn_error(invocation, e))
}

fn spawn_error(invocation: &Invocation, source: std::io::Error) -> DaemonError {
    DaemonError::Spawn {
        program: invocation.program().display().to_string(),
        source,
    }
}
