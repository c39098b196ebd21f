use std::fmt;
use std::process::ExitStatus;

/// Worker exit code asking the supervisor to stop the whole daemon tree
pub const EXIT_FINISHED: i32 = 0;

/// Worker exit code asking to be restarted (any nonzero code does the same)
pub const EXIT_RESTART: i32 = 1;

/// Exit code for unrecoverable setup errors
pub const EXIT_FATAL: i32 = 2;

/// How a worker process ended, from the supervisor's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Exited with status 0
    Finished,
    /// Exited normally with a nonzero status
    Restart(i32),
    /// Did not exit normally; carries the terminating signal when known
    Killed(Option<i32>),
}

impl WorkerExit {
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(EXIT_FINISHED) => WorkerExit::Finished,
            Some(code) => WorkerExit::Restart(code),
            None => WorkerExit::Killed(terminating_signal(&status)),
        }
    }
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerExit::Finished => write!(f, "finished"),
            WorkerExit::Restart(code) => write!(f, "exited with status {}", code),
            WorkerExit::Killed(Some(signal)) => write!(f, "killed by signal {}", signal),
            WorkerExit::Killed(None) => write!(f, "terminated abnormally"),
        }
    }
}
