use log::{info, warn};
use std::io;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

/// Installs handlers for SIGTERM, SIGINT and SIGHUP.
/// The returned receiver flips to `true` once a termination signal arrives.
pub fn listen() -> io::Result<watch::Receiver<bool>> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = terminate.recv() => break,
                _ = interrupt.recv() => break,
                _ = hangup.recv() => {
                    warn!("Received SIGHUP signal, configuration reload is not supported");
                }
            }
        }
        info!("Daemon exiting");
        let _ = tx.send(true);
    });

    Ok(rx)
}
