//! Platform input boundary.
//!
//! The pipeline does not care where events come from; it only needs something
//! that yields [`RawEvent`]s one at a time. The binary reads newline-delimited
//! JSON from stdin through [`JsonLinesSource`]; tests push events through
//! [`mock::MockInputSource`].
//!
//! # Wire format
//!
//! One JSON object per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"pointer","pointer_id":0,"action":"down","position":{"x":10.0,"y":20.0},"timestamp":0,"source":"touchscreen"}
//! {"kind":"key","code":4,"action":"down","timestamp":1000}
//! ```
//!
//! Blank lines are skipped. Lines that fail to parse are logged and skipped;
//! a bad line never stops the stream.

use a11y_core::RawEvent;
use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::warn;

pub mod mock;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("input source has already been closed")]
    Closed,
}

/// Produces platform input events in delivery order.
#[async_trait]
pub trait InputSource: Send {
    /// Waits for the next event. `Ok(None)` means the source is exhausted.
    async fn next_event(&mut self) -> Result<Option<RawEvent>, CaptureError>;
}

/// Reads JSON-encoded events, one per line.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> InputSource for JsonLinesSource<R> {
    async fn next_event(&mut self) -> Result<Option<RawEvent>, CaptureError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawEvent>(trimmed) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => warn!(line = self.line_no, error = %e, "skipping malformed input line"),
            }
        }
        Ok(None)
    }
}
