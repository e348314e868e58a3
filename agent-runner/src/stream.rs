//! Event stream handed to the caller of a turn

use sa_core::Event;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Ordered events of one turn
///
/// Exactly one consumer reads a stream. Once the token is cancelled no
/// further events are yielded, even ones already buffered.
pub struct EventStream {
    rx: mpsc::Receiver<Result<Event>>,
    cancel: CancellationToken,
}

impl EventStream {
    pub fn new(rx: mpsc::Receiver<Result<Event>>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Wait for the next event, or `None` when the turn is over or cancelled
    pub async fn next(&mut self) -> Option<Result<Event>> {
        if self.cancel.is_cancelled() {
            self.rx.close();
            return None;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.rx.close();
                None
            }
            item = self.rx.recv() => item,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
