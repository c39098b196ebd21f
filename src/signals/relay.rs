use super::TerminationSignals;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::ExitStatus;
use tokio::process::Child;
use tracing::{debug, info};

/// Forwards termination signals to one running worker
///
/// One relay exists per worker. Signals are only forwarded while the worker
/// has not been reaped; anything still queued on the subscription when the
/// worker exits stays there for the next worker.
#[derive(Debug)]
pub struct SignalRelay {
    worker: Pid,
    forwarded: usize,
}

impl SignalRelay {
    pub fn new(worker: Pid) -> Self {
        Self {
            worker,
            forwarded: 0,
        }
    }

    /// Number of signals forwarded so far
    pub fn forwarded(&self) -> usize {
        self.forwarded
    }

    /// Wait for `child` to exit, relaying signals to it in the meantime
    pub async fn wait(
        &mut self,
        child: &mut Child,
        signals: &mut TerminationSignals,
    ) -> std::io::Result<ExitStatus> {
        loop {
            tokio::select! {
                // Exit first: once reaped, the pid may belong to someone else
                biased;

                status = child.wait() => return status,
                Some(signal) = signals.recv() => self.forward(signal),
            }
        }
    }

    fn forward(&mut self, signal: Signal) {
        info!("Relaying {} to worker {}", signal, self.worker);

        match kill(self.worker, signal) {
            Ok(()) => self.forwarded += 1,
            Err(e) => debug!("Could not relay {} to worker {}: {}", signal, self.worker, e),
        }
    }
}
