// Library exports for dmode, a self-re-executing process supervisor

pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod process;
pub mod signals;

pub use config::SupervisorConfig;
pub use daemon::{daemonize, try_daemonize, Role};
pub use error::{DaemonError, Result};
pub use signals::{sig_exiter, SigExiter};
