use super::TerminationSignals;
use crate::error::{DaemonError, Result};
use crate::process::exit::EXIT_FATAL;
use nix::sys::signal::Signal;
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};

/// Exit code a process uses after receiving `signal`
///
/// `SIGINT`, `SIGTERM` and `SIGQUIT` mean a clean stop (0). `SIGHUP` asks a
/// supervisor for a restart (1). Anything else is unexpected (2).
pub fn exit_code_for(signal: Signal) -> i32 {
    match signal {
        Signal::SIGINT | Signal::SIGTERM | Signal::SIGQUIT => 0,
        Signal::SIGHUP => 1,
        _ => 2,
    }
}

/// Exits the process on the first termination signal
///
/// Owns a private current-thread runtime, so it works in programs that have
/// no async runtime of their own. Do not use it from inside a Tokio runtime.
pub struct SigExiter {
    runtime: Runtime,
    signals: TerminationSignals,
}

impl SigExiter {
    /// Subscribe to the termination signals
    ///
    /// From this point on those signals are held for [`SigExiter::wait`]
    /// instead of killing the process.
    pub fn install() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DaemonError::Runtime(e.to_string()))?;

        let signals = {
            let _guard = runtime.enter();
            TerminationSignals::register()?
        };

        Ok(Self { runtime, signals })
    }

    /// Block until the next termination signal
    pub fn next_signal(&mut self) -> Option<Signal> {
        let signals = &mut self.signals;
        self.runtime.block_on(signals.recv())
    }

    /// Block until a termination signal arrives, then exit
    pub fn wait(mut self) -> ! {
        match self.next_signal() {
            Some(signal) => {
                let code = exit_code_for(signal);
                info!("Received {}, exiting with status {}", signal, code);
                std::process::exit(code)
            }
            None => {
                error!("Signal delivery stopped, exiting");
                std::process::exit(EXIT_FATAL)
            }
        }
    }
}

/// Block until a termination signal arrives and exit with [`exit_code_for`]
pub fn sig_exiter() -> ! {
    match SigExiter::install() {
        Ok(exiter) => exiter.wait(),
        Err(e) => {
            eprintln!("cannot wait for signals: {}", e);
            std::process::exit(EXIT_FATAL)
        }
    }
}
