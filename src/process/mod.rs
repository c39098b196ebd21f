pub mod exit;
pub mod invocation;
pub mod spawner;
pub mod watchdog;

pub use exit::{WorkerExit, EXIT_FATAL, EXIT_FINISHED, EXIT_RESTART};
pub use invocation::Invocation;
pub use watchdog::{Watchdog, WatchdogReport, WatchdogState};
