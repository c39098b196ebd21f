use crate::error::{DaemonError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default delay before restarting a worker that exited with nonzero status
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(5);

/// Pause before the launcher exits when the settle delay is enabled
pub const STARTUP_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Supervisor configuration, read-only once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    keep_stderr: bool,
    single_process: bool,
    startup_settle_delay: bool,
    restart_delay: Duration,
    pid_file: Option<PathBuf>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            keep_stderr: false,
            single_process: false,
            startup_settle_delay: false,
            restart_delay: DEFAULT_RESTART_DELAY,
            pid_file: None,
        }
    }
}

impl SupervisorConfig {
    /// Start from the defaults
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::default()
    }

    /// Layer more options on top of this configuration
    pub fn to_builder(&self) -> SupervisorConfigBuilder {
        SupervisorConfigBuilder {
            config: self.clone(),
        }
    }

    /// Inherit the caller's stderr instead of the null device
    pub fn keep_stderr(&self) -> bool {
        self.keep_stderr
    }

    /// Background the worker only, without a supervisor
    pub fn single_process(&self) -> bool {
        self.single_process
    }

    /// Pause before the launcher exits
    pub fn startup_settle_delay(&self) -> bool {
        self.startup_settle_delay
    }

    pub fn restart_delay(&self) -> Duration {
        self.restart_delay
    }

    pub fn pid_file(&self) -> Option<&Path> {
        self.pid_file.as_deref()
    }

    /// Load configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<SupervisorConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let file = match extension {
            "toml" => toml::from_str::<ConfigFile>(&contents)
                .map_err(|e| DaemonError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str::<ConfigFile>(&contents)
                .map_err(|e| DaemonError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(DaemonError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        file.into_builder().build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref pid_file) = self.pid_file {
            if pid_file.as_os_str().is_empty() {
                return Err(DaemonError::ConfigValidation(
                    "pid_file must not be empty".to_string(),
                ));
            }
            if pid_file.is_dir() {
                return Err(DaemonError::ConfigValidation(format!(
                    "pid_file is a directory: {}",
                    pid_file.display()
                )));
            }
        }

        Ok(())
    }
}

/// Applies options in call order; the last write to a field wins
#[derive(Debug, Clone, Default)]
pub struct SupervisorConfigBuilder {
    config: SupervisorConfig,
}

impl SupervisorConfigBuilder {
    /// Record the supervisor PID in `path`
    pub fn pid_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.pid_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Run the worker alone, without a watchdog process restarting it
    pub fn no_restart(mut self) -> Self {
        self.config.single_process = true;
        self
    }

    /// Delay before restarting a worker that exited with nonzero status
    pub fn restart_delay(mut self, delay: Duration) -> Self {
        self.config.restart_delay = delay;
        self
    }

    /// Keep stderr attached to the caller's stderr
    pub fn keep_stderr(mut self) -> Self {
        self.config.keep_stderr = true;
        self
    }

    /// Pause briefly before the launcher exits.
    ///
    /// Only useful when the executable is deleted right after it runs, as
    /// with test harness binaries.
    pub fn startup_settle_delay(mut self) -> Self {
        self.config.startup_settle_delay = true;
        self
    }

    pub fn build(self) -> Result<SupervisorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// On-disk form, every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    pid_file: Option<String>,
    #[serde(default)]
    no_restart: bool,
    #[serde(default)]
    restart_delay_ms: Option<u64>,
    #[serde(default)]
    keep_stderr: bool,
    #[serde(default)]
    startup_settle_delay: bool,
}

impl ConfigFile {
    fn into_builder(self) -> SupervisorConfigBuilder {
        let mut builder = SupervisorConfig::builder();

        if let Some(pid_file) = self.pid_file {
            builder = builder.pid_file(expand_env_in_string(&pid_file));
        }
        if self.no_restart {
            builder = builder.no_restart();
        }
        if let Some(ms) = self.restart_delay_ms {
            builder = builder.restart_delay(Duration::from_millis(ms));
        }
        if self.keep_stderr {
            builder = builder.keep_stderr();
        }
        if self.startup_settle_delay {
            builder = builder.startup_settle_delay();
        }

        builder
    }
}

/// Expand `$VAR` and `${VAR}` from the environment
fn expand_env_in_string(s: &str) -> String {
    let mut vars: Vec<(String, String)> = std::env::vars().collect();
    // Longest names first so $HOME_DIR is not clobbered by $HOME
    vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut result = s.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("${{{}}}", key), &value);
        result = result.replace(&format!("${}", key), &value);
    }

    result
}
