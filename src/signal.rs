//! Operator-driven termination.
//!
//! After apply the session blocks in [`TerminationSignal::wait`] until the
//! operator is done with the gateway. [`OperatorInterrupt`] returns on the
//! first SIGINT or SIGTERM; [`oneshot`] builds a programmatic trigger.
//! There is no timeout.

use std::io;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Mutex;
use tracing::debug;

/// Blocks until the session should end.
pub trait TerminationSignal {
    fn wait(&self) -> io::Result<()>;
}

/// Create a one-shot termination pair. Firing the sender (or dropping it)
/// releases the waiter exactly once.
pub fn oneshot() -> (TerminationSender, ChannelTermination) {
    let (tx, rx) = mpsc::sync_channel(1);
    (
        TerminationSender { tx },
        ChannelTermination {
            rx: Mutex::new(Some(rx)),
        },
    )
}

#[derive(Debug, Clone)]
pub struct TerminationSender {
    tx: SyncSender<()>,
}

impl TerminationSender {
    pub fn fire(&self) {
        // Full or disconnected both mean the waiter is already released.
        if self.tx.try_send(()).is_err() {
            debug!("termination already signalled");
        }
    }
}

#[derive(Debug)]
pub struct ChannelTermination {
    rx: Mutex<Option<Receiver<()>>>,
}

impl TerminationSignal for ChannelTermination {
    fn wait(&self) -> io::Result<()> {
        let rx = self
            .rx
            .lock()
            .map_err(|_| io::Error::other("termination receiver poisoned"))?
            .take();
        match rx {
            Some(rx) => {
                if rx.recv().is_err() {
                    debug!("termination sender dropped, ending wait");
                }
                Ok(())
            }
            None => Err(io::Error::other("termination signal already consumed")),
        }
    }
}

/// Waits for Ctrl+C (SIGINT) or SIGTERM.
///
/// Handlers are only installed for the duration of the wait, so an
/// interrupt during apply still terminates the process the usual way.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorInterrupt;

#[cfg(unix)]
impl TerminationSignal for OperatorInterrupt {
    fn wait(&self) -> io::Result<()> {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let handle = signals.handle();
        let (sender, waiter) = oneshot();
        let listener = std::thread::Builder::new()
            .name("termination-listener".to_string())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    debug!(signal, "termination signal received");
                    sender.fire();
                }
            })?;

        let result = waiter.wait();
        handle.close();
        if listener.join().is_err() {
            debug!("termination listener panicked");
        }
        result
    }
}

#[cfg(not(unix))]
impl TerminationSignal for OperatorInterrupt {
    fn wait(&self) -> io::Result<()> {
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(())
    }
}
