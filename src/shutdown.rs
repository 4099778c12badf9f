//! Operator-requested shutdown.
//!
//! A shutdown request does not kill running jobs. Each pipeline finishes
//! the delivery it is in the middle of, skips the rest of its batch and
//! persists what it has sent.

use std::future;

use tokio::sync::watch;

/// Sending half, held by whoever decides to stop.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half, cloned into every job.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl Shutdown {
    /// A handle that is never triggered.
    pub fn never() -> Self {
        channel().1
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested.
    pub async fn requested(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Trigger dropped without firing.
                future::pending::<()>().await;
            }
        }
    }
}

/// Triggers shutdown on Ctrl-C (and SIGTERM on unix).
pub fn spawn_signal_listener(trigger: ShutdownTrigger) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::warn!("Interrupted, letting running jobs save their state");
        trigger.trigger();
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::error!("Failed to set up SIGTERM handler: {}", e);
            if tokio::signal::ctrl_c().await.is_err() {
                future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {},
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                sigterm.recv().await;
            }
        },
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        future::pending::<()>().await;
    }
}
