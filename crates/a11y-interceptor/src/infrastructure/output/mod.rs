//! Production adapters for the collaborator ports.
//!
//! The headless binary has no window system to talk to, so every adapter
//! here either writes events out as JSON lines or reports what it was asked
//! to do through `tracing`. A platform build swaps these for real bindings
//! without touching the application layer.

use std::io::{self, Write};
use std::sync::Mutex;

use a11y_core::{Point, RawEvent};
use tracing::{debug, info};

use crate::application::ports::{
    AccessibilityNotifier, ElementRef, EmitError, FocusQuery, FocusedElement, InjectionCaller,
    InjectionTarget, InputInterest, InputRegistration, MagnificationController, Notification,
    RegistrationError,
};

// ── Injection target ──────────────────────────────────────────────────────────

/// Writes every re-emitted event to `W` as one JSON object per line.
///
/// The output uses the same format [`crate::infrastructure::input_source::JsonLinesSource`]
/// reads, so two processes can be piped together.
pub struct JsonLinesTarget<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesTarget<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the target and returns the writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Event sink for the binary: JSON lines on standard output.
pub type StdoutTarget = JsonLinesTarget<io::Stdout>;

impl StdoutTarget {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> InjectionTarget for JsonLinesTarget<W> {
    fn emit(&self, event: &RawEvent) -> Result<(), EmitError> {
        let line = serde_json::to_string(event).map_err(|e| EmitError::Rejected(e.to_string()))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| EmitError::Rejected("writer lock poisoned".into()))?;
        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|e| EmitError::Rejected(e.to_string()))
    }
}

// ── Logging collaborators ─────────────────────────────────────────────────────

/// Reports accessibility notifications through the log.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

impl AccessibilityNotifier for LoggingNotifier {
    fn notify(&self, notification: Notification) {
        info!(
            kind = ?notification.kind,
            location = ?notification.location,
            element = ?notification.element,
            "accessibility notification"
        );
    }
}

/// A focus query for a screen with nothing on it.
#[derive(Debug, Default)]
pub struct NullFocus;

impl FocusQuery for NullFocus {
    fn element_at(&self, _point: Point) -> Option<ElementRef> {
        None
    }

    fn focused_element(&self) -> Option<FocusedElement> {
        None
    }
}

#[derive(Debug, Default)]
pub struct LoggingMagnifier;

impl MagnificationController for LoggingMagnifier {
    fn zoom_in(&self, center: Point, scale: f64) {
        info!(x = center.x, y = center.y, scale, "magnifier zoom in");
    }

    fn zoom_out(&self) {
        info!("magnifier zoom out");
    }

    fn pan_by(&self, dx: f64, dy: f64) {
        debug!(dx, dy, "magnifier pan");
    }

    fn set_scale(&self, scale: f64, center: Point) {
        debug!(scale, x = center.x, y = center.y, "magnifier scale");
    }
}

/// Accepts every registration and logs it.
#[derive(Debug, Default)]
pub struct LoggingRegistration;

impl InputRegistration for LoggingRegistration {
    fn register(&self, interest: InputInterest) -> Result<(), RegistrationError> {
        info!(pointer = interest.pointer, key = interest.key, "registered with input source");
        Ok(())
    }

    fn unregister(&self) {
        info!("unregistered from input source");
    }
}

/// Logs the outcome of injections requested from the command line.
#[derive(Debug, Default)]
pub struct LoggingCaller;

impl InjectionCaller for LoggingCaller {
    fn notify_result(&self, sequence_id: u32, success: bool) {
        info!(sequence_id, success, "gesture injection finished");
    }
}
