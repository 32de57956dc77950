//! Recording collaborator doubles.
//!
//! # Why recording doubles? (for beginners)
//!
//! The production collaborators talk to the platform: they inject real input,
//! announce things to a screen reader and zoom the display. None of that can
//! be observed from a test. These doubles replace every port with an
//! in-memory recorder so a test can assert exactly what the pipeline did and
//! in what order.
//!
//! Every record lives in a `Mutex<Vec<..>>` so the doubles can be shared
//! behind an `Arc` across the tokio runtime in integration tests.
//!
//! Set `should_fail` to simulate a platform that refuses calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use a11y_core::{KeyEvent, Point, RawEvent};

use crate::application::ports::{
    AccessibilityNotifier, ElementRef, EmitError, FocusQuery, FocusedElement, InjectionCaller,
    InjectionTarget, InputInterest, InputRegistration, KeyListener, MagnificationController,
    Notification, NotificationKind, RegistrationError,
};

// ── Injection target ──────────────────────────────────────────────────────────

/// Records every event the chain re-emits to the platform.
pub struct RecordingTarget {
    pub events: Mutex<Vec<RawEvent>>,
    /// When `true`, `emit` returns `EmitError::Rejected` and records nothing.
    pub should_fail: bool,
    available: AtomicBool,
}

impl Default for RecordingTarget {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            should_fail: false,
            available: AtomicBool::new(true),
        }
    }
}

impl RecordingTarget {
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<RawEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }
}

impl InjectionTarget for RecordingTarget {
    fn emit(&self, event: &RawEvent) -> Result<(), EmitError> {
        if self.should_fail {
            return Err(EmitError::Rejected("mock failure".into()));
        }
        self.events.lock().expect("lock poisoned").push(*event);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

// ── Notifier ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().expect("lock poisoned").clone()
    }

    /// Just the kinds, in order.
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notifications().into_iter().map(|n| n.kind).collect()
    }
}

impl AccessibilityNotifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().expect("lock poisoned").push(notification);
    }
}

// ── Focus ─────────────────────────────────────────────────────────────────────

/// Answers every query with the same canned element.
#[derive(Default)]
pub struct StaticFocus {
    pub element: Option<ElementRef>,
    pub focused: Option<FocusedElement>,
}

impl FocusQuery for StaticFocus {
    fn element_at(&self, _point: Point) -> Option<ElementRef> {
        self.element
    }

    fn focused_element(&self) -> Option<FocusedElement> {
        self.focused
    }
}

// ── Magnifier ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum MagnifierCall {
    ZoomIn { center: Point, scale: f64 },
    ZoomOut,
    PanBy { dx: f64, dy: f64 },
    SetScale { scale: f64, center: Point },
}

#[derive(Default)]
pub struct RecordingMagnifier {
    pub calls: Mutex<Vec<MagnifierCall>>,
}

impl RecordingMagnifier {
    pub fn calls(&self) -> Vec<MagnifierCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    fn record(&self, call: MagnifierCall) {
        self.calls.lock().expect("lock poisoned").push(call);
    }
}

impl MagnificationController for RecordingMagnifier {
    fn zoom_in(&self, center: Point, scale: f64) {
        self.record(MagnifierCall::ZoomIn { center, scale });
    }

    fn zoom_out(&self) {
        self.record(MagnifierCall::ZoomOut);
    }

    fn pan_by(&self, dx: f64, dy: f64) {
        self.record(MagnifierCall::PanBy { dx, dy });
    }

    fn set_scale(&self, scale: f64, center: Point) {
        self.record(MagnifierCall::SetScale { scale, center });
    }
}

// ── Callers and listeners ─────────────────────────────────────────────────────

/// Records `(sequence_id, success)` for every finished injection.
#[derive(Default)]
pub struct RecordingCaller {
    pub results: Mutex<Vec<(u32, bool)>>,
}

impl RecordingCaller {
    pub fn results(&self) -> Vec<(u32, bool)> {
        self.results.lock().expect("lock poisoned").clone()
    }
}

impl InjectionCaller for RecordingCaller {
    fn notify_result(&self, sequence_id: u32, success: bool) {
        self.results.lock().expect("lock poisoned").push((sequence_id, success));
    }
}

/// Records every key offered to it with its sequence number.
#[derive(Default)]
pub struct RecordingKeyListener {
    pub events: Mutex<Vec<(KeyEvent, u32)>>,
}

impl RecordingKeyListener {
    pub fn events(&self) -> Vec<(KeyEvent, u32)> {
        self.events.lock().expect("lock poisoned").clone()
    }
}

impl KeyListener for RecordingKeyListener {
    fn on_key_event(&self, event: &KeyEvent, sequence: u32) {
        self.events.lock().expect("lock poisoned").push((*event, sequence));
    }
}

// ── Registration ──────────────────────────────────────────────────────────────

/// Records registrations as `Some(interest)` and unregistrations as `None`.
#[derive(Default)]
pub struct MockRegistration {
    pub calls: Mutex<Vec<Option<InputInterest>>>,
    pub should_fail: bool,
}

impl MockRegistration {
    pub fn calls(&self) -> Vec<Option<InputInterest>> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

impl InputRegistration for MockRegistration {
    fn register(&self, interest: InputInterest) -> Result<(), RegistrationError> {
        self.calls.lock().expect("lock poisoned").push(Some(interest));
        if self.should_fail {
            return Err(RegistrationError("mock failure".into()));
        }
        Ok(())
    }

    fn unregister(&self) {
        self.calls.lock().expect("lock poisoned").push(None);
    }
}
