// Daemon module - Launcher, role marker and PID file

pub mod daemonize;
pub mod pid;
pub mod role;

pub use daemonize::{daemonize, try_daemonize};
pub use pid::PidFile;
pub use role::{Role, ROLE_ENV};
