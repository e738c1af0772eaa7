//! Shutdown coordination: Running → Draining → `ForceExit`.
//!
//! The first signal cancels discovery and starts the drain countdown.
//! Everything already queued keeps flowing. A second signal, or the countdown
//! expiring, ends the drain and the caller is expected to terminate the
//! process without further cleanup.

use std::fmt;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Exit status used when the drain is cut short.
pub const FORCE_EXIT_CODE: i32 = 130;

/// An OS-level request to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "interrupt"),
            Self::Terminate => write!(f, "terminate"),
        }
    }
}

/// Why the drain ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceExit {
    /// A second signal arrived while draining.
    SecondSignal(ShutdownSignal),
    /// The drain countdown expired.
    DrainTimeout,
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// No signal received yet.
    Running,
    /// Discovery cancelled; queued work is finishing.
    Draining,
    /// The drain was cut short; the process should exit now.
    ForceExit,
}

/// Turns signals into a one-shot cancellation plus a bounded drain.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    drain_timeout: Duration,
    cancel: CancellationToken,
    phase: watch::Sender<ShutdownPhase>,
}

impl ShutdownCoordinator {
    /// Create a coordinator in the `Running` phase.
    pub fn new(drain_timeout: Duration) -> Self {
        let (phase, _) = watch::channel(ShutdownPhase::Running);
        Self {
            drain_timeout,
            cancel: CancellationToken::new(),
            phase,
        }
    }

    /// Token cancelled on the first signal. Only discovery observes it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current phase.
    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.borrow()
    }

    /// Watch for signals until the drain must end.
    ///
    /// Never completes if no signal arrives; callers race it against the
    /// pipeline. If the signal source closes while draining, the countdown
    /// still applies.
    pub async fn supervise(&self, mut signals: mpsc::Receiver<ShutdownSignal>) -> ForceExit {
        let Some(first) = signals.recv().await else {
            return std::future::pending().await;
        };

        let deadline = Instant::now() + self.drain_timeout;
        self.phase.send_replace(ShutdownPhase::Draining);
        self.cancel.cancel();
        tracing::info!(
            signal = %first,
            timeout_secs = self.drain_timeout.as_secs(),
            "Received signal, finishing in-flight transfers before exiting"
        );

        let mut open = true;
        let reason = loop {
            tokio::select! {
                biased;
                received = signals.recv(), if open => match received {
                    Some(signal) => {
                        tracing::warn!(
                            signal = %signal,
                            "Received a second signal, exiting without cleanup"
                        );
                        break ForceExit::SecondSignal(signal);
                    }
                    None => open = false,
                },
                () = sleep_until(deadline) => {
                    tracing::warn!(
                        timeout_secs = self.drain_timeout.as_secs(),
                        "Drain timeout reached, exiting"
                    );
                    break ForceExit::DrainTimeout;
                }
            }
        };

        self.phase.send_replace(ShutdownPhase::ForceExit);
        reason
    }
}
