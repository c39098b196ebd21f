// Signals module - Termination signal subscription, relay and exiter

pub mod exiter;
pub mod relay;

pub use exiter::{exit_code_for, sig_exiter, SigExiter};
pub use relay::SignalRelay;

use crate::error::{DaemonError, Result};
use nix::sys::signal::Signal;
use tokio::signal::unix::{signal, Signal as SignalStream, SignalKind};

/// Subscription to the termination-class signals
///
/// Once registered, these signals no longer run their default action in this
/// process; they queue up until [`TerminationSignals::recv`] takes them.
/// Must be created from within a Tokio runtime.
#[derive(Debug)]
pub struct TerminationSignals {
    interrupt: SignalStream,
    terminate: SignalStream,
    quit: SignalStream,
    hangup: SignalStream,
}

impl TerminationSignals {
    pub fn register() -> Result<Self> {
        Ok(Self {
            interrupt: listen(SignalKind::interrupt(), "SIGINT")?,
            terminate: listen(SignalKind::terminate(), "SIGTERM")?,
            quit: listen(SignalKind::quit(), "SIGQUIT")?,
            hangup: listen(SignalKind::hangup(), "SIGHUP")?,
        })
    }

    /// Wait for the next signal; `None` once the runtime stops delivering them
    pub async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|_| Signal::SIGINT),
            received = self.terminate.recv() => received.map(|_| Signal::SIGTERM),
            received = self.quit.recv() => received.map(|_| Signal::SIGQUIT),
            received = self.hangup.recv() => received.map(|_| Signal::SIGHUP),
        }
    }
}

fn listen(kind: SignalKind, name: &str) -> Result<SignalStream> {
    signal(kind).map_err(|e| DaemonError::Signal(format!("Failed to listen for {}: {}", name, e)))
}
