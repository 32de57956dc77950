//! The raw event model.
//!
//! # How events flow (for beginners)
//!
//! The platform input source delivers one [`RawEvent`] at a time. Each chain
//! link receives it *by value*: it either keeps it (the event is "handled" and
//! goes no further) or hands a value to the next link. Because ownership moves
//! with the event, a link physically cannot change an event after it has
//! passed it on. When a link needs a different event it builds a new one with
//! the `with_*` helpers below.
//!
//! Every pointer event describes a single pointer (one finger, one stylus tip
//! or the mouse). Multi-finger gestures arrive as interleaved events with
//! distinct `pointer_id`s.

use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::time::Duration;

use super::geometry::Point;

// ── Timestamp ─────────────────────────────────────────────────────────────────

/// Monotonic event time in microseconds since an arbitrary origin.
///
/// The origin is whatever the input source uses; the pipeline only ever
/// compares timestamps with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * 1_000)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is in the future.
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(micros))
    }
}

// ── Event flags ───────────────────────────────────────────────────────────────

/// Provenance bits carried by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventFlags(pub u8);

impl EventFlags {
    /// Produced by a chain link rather than read from hardware.
    pub const SYNTHETIC: u8 = 1 << 0;
    /// Produced by gesture injection on behalf of a privileged caller.
    pub const INJECTED: u8 = 1 << 1;

    pub fn is_synthetic(&self) -> bool {
        self.0 & Self::SYNTHETIC != 0
    }

    pub fn is_injected(&self) -> bool {
        self.0 & Self::INJECTED != 0
    }
}

// ── Pointer events ────────────────────────────────────────────────────────────

/// Which kind of device produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Touchscreen,
    Mouse,
    Stylus,
}

/// What touched the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    #[default]
    Finger,
    Pen,
    Knuckle,
    Mouse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// The action a pointer event reports.
///
/// Raw hardware produces `Down`/`Move`/`Up`/`Cancel` (plus the button actions
/// for a mouse). The hover actions only ever appear on synthetic events made
/// by touch exploration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerAction {
    Down,
    Move,
    Up,
    Cancel,
    HoverEnter,
    HoverMove,
    HoverExit,
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
}

/// A single-pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub action: PointerAction,
    pub position: Point,
    pub timestamp: Timestamp,
    pub source: SourceKind,
    #[serde(default)]
    pub tool: ToolType,
    #[serde(default)]
    pub flags: EventFlags,
}

impl PointerEvent {
    /// A finger event from the touchscreen.
    pub fn touch(pointer_id: u32, action: PointerAction, position: Point, timestamp: Timestamp) -> Self {
        Self {
            pointer_id,
            action,
            position,
            timestamp,
            source: SourceKind::Touchscreen,
            tool: ToolType::Finger,
            flags: EventFlags::default(),
        }
    }

    /// A mouse event.
    pub fn mouse(action: PointerAction, position: Point, timestamp: Timestamp) -> Self {
        Self {
            pointer_id: 0,
            action,
            position,
            timestamp,
            source: SourceKind::Mouse,
            tool: ToolType::Mouse,
            flags: EventFlags::default(),
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: PointerAction) -> Self {
        self.action = action;
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_pointer_id(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }

    /// Adds `bits` to the event's flags.
    #[must_use]
    pub fn flagged(mut self, bits: u8) -> Self {
        self.flags.0 |= bits;
        self
    }

    pub fn is_touchscreen(&self) -> bool {
        self.source == SourceKind::Touchscreen
    }
}

// ── Key events ────────────────────────────────────────────────────────────────

/// A key code expressed as a USB HID usage ID (keyboard page 0x07).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const KEYPAD_DIVIDE: KeyCode = KeyCode(0x54);
    pub const KEYPAD_MULTIPLY: KeyCode = KeyCode(0x55);
    pub const KEYPAD_SUBTRACT: KeyCode = KeyCode(0x56);
    pub const KEYPAD_ADD: KeyCode = KeyCode(0x57);
    pub const KEYPAD_1: KeyCode = KeyCode(0x59);
    pub const KEYPAD_2: KeyCode = KeyCode(0x5A);
    pub const KEYPAD_3: KeyCode = KeyCode(0x5B);
    pub const KEYPAD_4: KeyCode = KeyCode(0x5C);
    pub const KEYPAD_5: KeyCode = KeyCode(0x5D);
    pub const KEYPAD_6: KeyCode = KeyCode(0x5E);
    pub const KEYPAD_7: KeyCode = KeyCode(0x5F);
    pub const KEYPAD_8: KeyCode = KeyCode(0x60);
    pub const KEYPAD_9: KeyCode = KeyCode(0x61);
    pub const KEYPAD_0: KeyCode = KeyCode(0x62);
    pub const A: KeyCode = KeyCode(0x04);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub action: KeyAction,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub flags: EventFlags,
}

impl KeyEvent {
    pub fn new(code: KeyCode, action: KeyAction, timestamp: Timestamp) -> Self {
        Self {
            code,
            action,
            timestamp,
            flags: EventFlags::default(),
        }
    }
}

// ── RawEvent ──────────────────────────────────────────────────────────────────

/// Anything the platform input source can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
}

impl RawEvent {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            RawEvent::Pointer(p) => p.timestamp,
            RawEvent::Key(k) => k.timestamp,
        }
    }

    pub fn as_pointer(&self) -> Option<&PointerEvent> {
        match self {
            RawEvent::Pointer(p) => Some(p),
            RawEvent::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            RawEvent::Key(k) => Some(k),
            RawEvent::Pointer(_) => None,
        }
    }
}

impl From<PointerEvent> for RawEvent {
    fn from(e: PointerEvent) -> Self {
        RawEvent::Pointer(e)
    }
}

impl From<KeyEvent> for RawEvent {
    fn from(e: KeyEvent) -> Self {
        RawEvent::Key(e)
    }
}
