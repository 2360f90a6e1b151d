//! Viewport-stationary signal.
//!
//! Raw "view changed" notifications go in; a stationary event comes out once
//! the view has been quiet for the configured window. At most one event is
//! emitted per quiet window, carrying the last snapshot received before the
//! view settled.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::models::ViewportSnapshot;

const CHANNEL_CAPACITY: usize = 64;

/// Sending half of the debouncer.
#[derive(Clone)]
pub struct StationaryDebouncer {
    changes: mpsc::Sender<ViewportSnapshot>,
    quiet: Duration,
}

impl StationaryDebouncer {
    /// Start the debounce task. Settled snapshots arrive on the returned receiver.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(quiet: Duration) -> (Self, mpsc::Receiver<ViewportSnapshot>) {
        let (changes, mut incoming) = mpsc::channel::<ViewportSnapshot>(CHANNEL_CAPACITY);
        let (settled_tx, settled_rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            while let Some(mut latest) = incoming.recv().await {
                loop {
                    tokio::select! {
                        next = incoming.recv() => match next {
                            Some(snapshot) => latest = snapshot,
                            None => {
                                // Flush the pending snapshot before shutting down.
                                let _ = settled_tx.send(latest).await;
                                return;
                            }
                        },
                        _ = tokio::time::sleep(quiet) => {
                            if settled_tx.send(latest).await.is_err() {
                                return;
                            }
                            break;
                        }
                    }
                }
            }
            log::debug!("Stationary debouncer stopped");
        });

        (Self { changes, quiet }, settled_rx)
    }

    /// Report that the view moved. Returns `false` once the debouncer has stopped.
    pub async fn view_changed(&self, snapshot: ViewportSnapshot) -> bool {
        self.changes.send(snapshot).await.is_ok()
    }

    pub fn quiet_window(&self) -> Duration {
        self.quiet
    }
}
