//! The grace period between showing the payment QR and mailing the
//! confirmation. It elapses on its own, or ends early on an explicit
//! confirm or cancel from the UI.

use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    Elapsed,
    Confirmed,
    Cancelled,
}

/// Held by whoever can end the window early.
#[derive(Debug)]
pub struct PaymentWindowHandle {
    signal: Option<oneshot::Sender<WindowOutcome>>,
}

/// Awaited by whoever acts once the window is over.
#[derive(Debug)]
pub struct PaymentWindow {
    duration: Duration,
    signal: oneshot::Receiver<WindowOutcome>,
}

pub fn open(duration: Duration) -> (PaymentWindowHandle, PaymentWindow) {
    let (tx, rx) = oneshot::channel();
    (
        PaymentWindowHandle { signal: Some(tx) },
        PaymentWindow {
            duration,
            signal: rx,
        },
    )
}

impl PaymentWindowHandle {
    /// Ends the window now; the confirmation goes out immediately.
    pub fn confirm(&mut self) -> bool {
        self.finish(WindowOutcome::Confirmed)
    }

    /// Ends the window now; no confirmation is sent.
    pub fn cancel(&mut self) -> bool {
        self.finish(WindowOutcome::Cancelled)
    }

    pub fn is_open(&self) -> bool {
        self.signal.as_ref().map_or(false, |tx| !tx.is_closed())
    }

    fn finish(&mut self, outcome: WindowOutcome) -> bool {
        match self.signal.take() {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }
}

impl PaymentWindow {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Resolves when the window elapses or the handle ends it.
    /// A handle dropped without a decision counts as a cancellation.
    pub async fn wait(self) -> WindowOutcome {
        match tokio::time::timeout(self.duration, self.signal).await {
            Err(_) => WindowOutcome::Elapsed,
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => WindowOutcome::Cancelled,
        }
    }
}
