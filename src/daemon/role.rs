// Role marker carried across re-execution of the same binary

use std::ffi::OsStr;
use std::fmt;
use std::process::Command;
use std::sync::OnceLock;
use tracing::warn;

/// Environment key carrying the role of a re-executed instance.
///
/// Programs run under dmode must not define this key themselves.
pub const ROLE_ENV: &str = "_DMODE";

const SUPERVISOR_TOKEN: &str = "1";
const WORKER_TOKEN: &str = "2";

static CURRENT: OnceLock<Role> = OnceLock::new();

/// The part a process instance plays in the daemon tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// First, foreground invocation
    Unset,
    /// Background watchdog that spawns and restarts the worker
    Supervisor,
    /// Background instance running the program logic
    Worker,
}

impl Role {
    /// Role of the running process.
    ///
    /// The environment is read on the first call only; later calls return
    /// the cached value, so the role never changes within a process.
    pub fn current() -> Role {
        *CURRENT.get_or_init(|| {
            let value = std::env::var_os(ROLE_ENV);
            Role::from_env_value(value.as_deref())
        })
    }

    /// Parse the raw environment value.
    ///
    /// Absent or empty means first run. Unrecognized non-empty values are
    /// treated as the supervisor role.
    pub fn from_env_value(value: Option<&OsStr>) -> Role {
        let Some(value) = value else {
            return Role::Unset;
        };

        if value.is_empty() {
            return Role::Unset;
        }

        match value.to_str() {
            Some(SUPERVISOR_TOKEN) => Role::Supervisor,
            Some(WORKER_TOKEN) => Role::Worker,
            _ => {
                warn!(
                    "Unrecognized {} value {:?}, running as supervisor",
                    ROLE_ENV, value
                );
                Role::Supervisor
            }
        }
    }

    /// Environment token for this role, `None` for [`Role::Unset`]
    pub fn token(self) -> Option<&'static str> {
        match self {
            Role::Unset => None,
            Role::Supervisor => Some(SUPERVISOR_TOKEN),
            Role::Worker => Some(WORKER_TOKEN),
        }
    }

    /// Mark a re-exec command so the next instance observes this role
    pub fn apply(self, command: &mut Command) {
        match self.token() {
            Some(token) => command.env(ROLE_ENV, token),
            None => command.env_remove(ROLE_ENV),
        };
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Unset => write!(f, "unset"),
            Role::Supervisor => write!(f, "supervisor"),
            Role::Worker => write!(f, "worker"),
        }
    }
}
