//! OS signal forwarding.

use gogbackup_pipeline::ShutdownSignal;
use tokio::sync::mpsc;

/// Forward SIGINT (and SIGTERM on Unix) into a channel for the
/// [`ShutdownCoordinator`](gogbackup_pipeline::ShutdownCoordinator).
///
/// Handlers are installed before this returns, so no signal is lost between
/// startup and the first `recv`.
pub fn forward_signals() -> std::io::Result<mpsc::Receiver<ShutdownSignal>> {
    let (tx, rx) = mpsc::channel(4);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    Some(()) = interrupt.recv() => ShutdownSignal::Interrupt,
                    Some(()) = terminate.recv() => ShutdownSignal::Terminate,
                    else => break,
                };
                if tx.send(received).await.is_err() {
                    break;
                }
            }
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(ShutdownSignal::Interrupt).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}
