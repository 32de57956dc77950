//! # a11y-core
//!
//! Domain types and pure gesture logic for the accessibility input pipeline.
//!
//! This crate has no dependency on the platform input stack, the async
//! runtime, or any IPC layer. Everything here can be unit-tested with plain
//! values.
//!
//! # Architecture overview (for beginners)
//!
//! An accessibility service sits between the touchscreen/keyboard and the
//! applications. It sees every raw event first and may swallow it, rewrite it,
//! or synthesize new events (for example, "hover" events that move a virtual
//! cursor without clicking anything).
//!
//! This crate provides the shared vocabulary:
//!
//! - **`domain`** – the event model ([`RawEvent`], [`PointerEvent`],
//!   [`KeyEvent`]), geometry helpers, the feature bitset that selects which
//!   pipeline stages run, and validated gesture paths used for injection.
//!
//! - **`gesture`** – the [`GestureRecognizer`], which classifies a finished
//!   single-finger stroke into a tap, double-tap, long-press, drag, or a
//!   (possibly compound) swipe.
//!
//! - **`config`** – every timing and distance threshold, with defaults, in
//!   serde-friendly structs so the service can load them from TOML.
//!
//! The stateful pipeline stages themselves live in the `a11y-interceptor`
//! crate.

pub mod config;
pub mod domain;
pub mod gesture;

pub use config::{
    DwellClickConfig, ExplorationConfig, GestureConfig, InjectionConfig, KeyRelayConfig,
    MagnificationConfig, MouseKeysConfig, PipelineConfig,
};
pub use domain::event::{
    EventFlags, KeyAction, KeyCode, KeyEvent, MouseButton, PointerAction, PointerEvent, RawEvent,
    SourceKind, Timestamp, ToolType,
};
pub use domain::features::{Feature, FeatureFlags};
pub use domain::geometry::{Point, Rect};
pub use domain::gesture_path::{
    GesturePathPlan, GesturePathSegment, InjectionLimits, InjectionRejection, PlanError,
};
pub use domain::sequence::SequenceCounter;
pub use gesture::{Gesture, GestureRecognizer, PointerSample, Stroke, SwipeDirection};
