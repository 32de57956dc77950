//! Channel-backed input source for tests.

use a11y_core::RawEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{CaptureError, InputSource};

/// An [`InputSource`] fed by a test through [`MockInputSource::sender`].
///
/// Dropping every sender ends the stream (`Ok(None)`).
pub struct MockInputSource {
    tx: Option<mpsc::UnboundedSender<RawEvent>>,
    rx: mpsc::UnboundedReceiver<RawEvent>,
}

impl MockInputSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx: Some(tx), rx }
    }

    /// A handle that injects events as if captured from hardware.
    pub fn sender(&self) -> Option<mpsc::UnboundedSender<RawEvent>> {
        self.tx.clone()
    }

    /// Injects one event.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Closed`] after [`MockInputSource::close`].
    pub fn inject_event(&self, event: RawEvent) -> Result<(), CaptureError> {
        let tx = self.tx.as_ref().ok_or(CaptureError::Closed)?;
        tx.send(event).map_err(|_| CaptureError::Closed)
    }

    /// Drops the built-in sender so the stream ends once outside senders are gone.
    pub fn close(&mut self) {
        self.tx = None;
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputSource for MockInputSource {
    async fn next_event(&mut self) -> Result<Option<RawEvent>, CaptureError> {
        Ok(self.rx.recv().await)
    }
}
