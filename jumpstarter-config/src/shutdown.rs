//! Signal-driven graceful shutdown.

use tokio::signal::unix::{signal, SignalKind};
use tracing::debug;

pub use drain::Watch;

/// Drives shutdown by watching SIGINT and SIGTERM.
#[derive(Debug)]
#[must_use = "call `Shutdown::on_signal` to await a signal"]
pub struct Shutdown(drain::Signal);

/// Indicates whether shutdown completed gracefully or was forced by a second
/// signal.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Completion {
    /// All watches were released before shutdown completed.
    Graceful,

    /// A second signal arrived while draining.
    Aborted,
}

/// Creates a shutdown channel.
///
/// When a signal is received, [`Watch`] instances are notified; once every
/// watch is dropped the shutdown is complete. A second signal while waiting
/// aborts the drain.
pub fn channel() -> (Shutdown, Watch) {
    let (tx, rx) = drain::channel();
    (Shutdown(tx), rx)
}

impl Shutdown {
    /// Watches for signals and drives shutdown.
    ///
    /// An error is returned only when signal registration fails.
    pub async fn on_signal(self) -> std::io::Result<Completion> {
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = interrupt.recv() => {
                debug!("Received SIGINT; draining");
            },

            _ = terminate.recv() => {
                debug!("Received SIGTERM; draining");
            }
        }

        tokio::select! {
            _ = self.0.drain() => {
                debug!("Drained");
                Ok(Completion::Graceful)
            },

            _ = interrupt.recv() => {
                debug!("Received SIGINT; aborting");
                Ok(Completion::Aborted)
            },

            _ = terminate.recv() => {
                debug!("Received SIGTERM; aborting");
                Ok(Completion::Aborted)
            }
        }
    }
}
