//! Narrow interfaces to everything outside the pipeline.
//!
//! The chain links only ever talk to the platform and to the wider
//! accessibility service through these traits. Production adapters live in
//! `infrastructure::output`; recording doubles live in `infrastructure::mock`.

use std::sync::Arc;

use a11y_core::{Gesture, KeyEvent, Point, RawEvent, Rect};
use thiserror::Error;

// ── Output boundary ───────────────────────────────────────────────────────────

/// Error returned by the platform's synthetic-input facility.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("platform rejected event: {0}")]
    Rejected(String),
    #[error("injection target unavailable")]
    Unavailable,
}

/// The terminal sink: re-emits forwarded and synthesized events to the OS.
pub trait InjectionTarget: Send + Sync {
    /// Re-emits one event.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] if the platform refuses the event.
    fn emit(&self, event: &RawEvent) -> Result<(), EmitError>;

    /// Whether the facility can accept events right now.
    fn is_available(&self) -> bool {
        true
    }
}

// ── Accessibility notifications ───────────────────────────────────────────────

/// Opaque handle to an on-screen element, as returned by the focus query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub i64);

/// The element that currently holds accessibility focus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusedElement {
    pub element: ElementRef,
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    TouchBegin,
    TouchEnd,
    TouchGuideBegin,
    TouchGuideEnd,
    TouchGuideGestureBegin,
    TouchGuideGestureEnd,
    HoverEnter,
    GestureCompleted(Gesture),
    GestureCancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub location: Option<Point>,
    pub element: Option<ElementRef>,
}

impl Notification {
    pub fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            location: None,
            element: None,
        }
    }

    pub fn at(kind: NotificationKind, location: Point) -> Self {
        Self {
            kind,
            location: Some(location),
            element: None,
        }
    }
}

/// Fire-and-forget channel to the broader accessibility service.
pub trait AccessibilityNotifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Looks up on-screen elements for touch exploration.
#[cfg_attr(test, mockall::automock)]
pub trait FocusQuery: Send + Sync {
    fn element_at(&self, point: Point) -> Option<ElementRef>;

    /// The element holding accessibility focus, if any.
    fn focused_element(&self) -> Option<FocusedElement>;
}

/// Drives the screen magnifier.
pub trait MagnificationController: Send + Sync {
    fn zoom_in(&self, center: Point, scale: f64);
    fn zoom_out(&self);
    fn pan_by(&self, dx: f64, dy: f64);
    fn set_scale(&self, scale: f64, center: Point);
}

// ── Callers and listeners ─────────────────────────────────────────────────────

/// Capability handle of whoever requested a gesture injection.
pub trait InjectionCaller: Send + Sync {
    fn notify_result(&self, sequence_id: u32, success: bool);
}

/// A connected assistive application that may intercept key events.
///
/// Delivery is fire-and-forget; the answer comes back later through
/// `InputInterceptor::key_listener_result`.
pub trait KeyListener: Send + Sync {
    fn on_key_event(&self, event: &KeyEvent, sequence: u32);
}

// ── Input boundary ────────────────────────────────────────────────────────────

/// Which event kinds the pipeline wants from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputInterest {
    pub pointer: bool,
    pub key: bool,
}

impl InputInterest {
    pub fn is_none(&self) -> bool {
        !self.pointer && !self.key
    }
}

#[derive(Debug, Error)]
#[error("input registration failed: {0}")]
pub struct RegistrationError(pub String);

/// The platform input source's consumer registration.
pub trait InputRegistration: Send + Sync {
    /// Registers (or re-registers with new interest) as the sole consumer.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if the platform refuses.
    fn register(&self, interest: InputInterest) -> Result<(), RegistrationError>;

    fn unregister(&self);
}

/// Every collaborator the pipeline needs, bundled for construction.
#[derive(Clone)]
pub struct Collaborators {
    pub target: Arc<dyn InjectionTarget>,
    pub notifier: Arc<dyn AccessibilityNotifier>,
    pub focus: Arc<dyn FocusQuery>,
    pub magnifier: Arc<dyn MagnificationController>,
    pub registration: Arc<dyn InputRegistration>,
}
