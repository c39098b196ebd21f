// PID file management for the supervisor process

use crate::error::{DaemonError, Result};
use crate::process::Invocation;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manages the supervisor PID file
///
/// Line one holds the PID in decimal. Line two, when present, is a comment
/// with the command line: `# <executable> <args...>`.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Create a new PID file manager for the given path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write the current process PID to the file, truncating it
    ///
    /// The command-line comment is best-effort: a failure to write it leaves
    /// the PID line alone and is not reported.
    pub fn write(&self, command: Option<&Invocation>) -> Result<()> {
        let mut file = File::create(&self.path).map_err(|e| {
            DaemonError::PidFile(format!("Failed to create {}: {}", self.path.display(), e))
        })?;

        writeln!(file, "{}", std::process::id()).map_err(|e| {
            DaemonError::PidFile(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        if let Some(command) = command {
            if let Err(e) = writeln!(file, "# {}", command.command_line()) {
                debug!("Skipping command line in PID file: {}", e);
            }
        }

        Ok(())
    }

    /// Read the PID from the first line of the file
    pub fn read(&self) -> Result<u32> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| DaemonError::PidFile(format!("Failed to read PID file: {}", e)))?;

        content
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .parse::<u32>()
            .map_err(|e| DaemonError::PidFile(format!("Invalid PID in file: {}", e)))
    }

    /// Check if the PID file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove the PID file; the file may already be gone, so errors are ignored
    pub fn remove(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!("Could not remove PID file {}: {}", self.path.display(), e);
        }
    }

    /// Check whether the process recorded in the file is alive
    pub fn is_running(&self) -> bool {
        match self.read() {
            Ok(pid) => is_process_alive(pid),
            Err(_) => false,
        }
    }

    /// Get the path to the PID file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };

    // Signal 0 only checks for existence
    match kill(Pid::from_raw(raw), None) {
        Ok(_) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    false
}
