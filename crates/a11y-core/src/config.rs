//! Timing and distance thresholds for every chain link.
//!
//! All values are plain serde structs with per-field defaults, so a TOML file
//! only needs to mention the thresholds it wants to change. Durations are
//! stored as integer milliseconds (`*_ms`) and exposed as
//! [`std::time::Duration`] through accessor methods.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::geometry::Rect;
use crate::domain::gesture_path::InjectionLimits;

/// Thresholds for every link, grouped by link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub touch_exploration: ExplorationConfig,
    #[serde(default)]
    pub magnification: MagnificationConfig,
    #[serde(default)]
    pub dwell_click: DwellClickConfig,
    #[serde(default)]
    pub injection: InjectionConfig,
    #[serde(default)]
    pub key_relay: KeyRelayConfig,
    #[serde(default)]
    pub mouse_keys: MouseKeysConfig,
}

// ── Gesture recognizer ────────────────────────────────────────────────────────

/// Thresholds used by [`crate::GestureRecognizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Net displacement (px) below which a stroke counts as stationary.
    #[serde(default = "default_tap_slop")]
    pub tap_slop: f64,
    /// Maximum distance (px) between the two downs of a double tap.
    #[serde(default = "default_double_tap_slop")]
    pub double_tap_slop: f64,
    #[serde(default = "default_double_tap_timeout_ms")]
    pub double_tap_timeout_ms: u64,
    /// Taps closer together than this are treated as bounce, not a double tap.
    #[serde(default = "default_min_double_tap_time_ms")]
    pub min_double_tap_time_ms: u64,
    #[serde(default = "default_long_press_timeout_ms")]
    pub long_press_timeout_ms: u64,
    /// Strokes longer than this are cancelled.
    #[serde(default = "default_max_gesture_duration_ms")]
    pub max_gesture_duration_ms: u64,
    /// Minimum `|net| / path length` for a stroke to be a single swipe.
    #[serde(default = "default_min_directionality")]
    pub min_directionality: f64,
    /// Average speed (px/s) below which a moving stroke is a drag.
    #[serde(default = "default_min_swipe_velocity")]
    pub min_swipe_velocity: f64,
    /// Samples closer than this (px) to the previous kept sample are dropped.
    #[serde(default = "default_min_sample_spacing")]
    pub min_sample_spacing: f64,
    #[serde(default = "default_max_swipe_segments")]
    pub max_swipe_segments: usize,
    /// Per-stroke history cap.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

impl GestureConfig {
    pub fn double_tap_timeout(&self) -> Duration {
        Duration::from_millis(self.double_tap_timeout_ms)
    }

    pub fn min_double_tap_time(&self) -> Duration {
        Duration::from_millis(self.min_double_tap_time_ms)
    }

    pub fn long_press_timeout(&self) -> Duration {
        Duration::from_millis(self.long_press_timeout_ms)
    }

    pub fn max_gesture_duration(&self) -> Duration {
        Duration::from_millis(self.max_gesture_duration_ms)
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_slop: default_tap_slop(),
            double_tap_slop: default_double_tap_slop(),
            double_tap_timeout_ms: default_double_tap_timeout_ms(),
            min_double_tap_time_ms: default_min_double_tap_time_ms(),
            long_press_timeout_ms: default_long_press_timeout_ms(),
            max_gesture_duration_ms: default_max_gesture_duration_ms(),
            min_directionality: default_min_directionality(),
            min_swipe_velocity: default_min_swipe_velocity(),
            min_sample_spacing: default_min_sample_spacing(),
            max_swipe_segments: default_max_swipe_segments(),
            max_samples: default_max_samples(),
        }
    }
}

// ── Touch exploration ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationConfig {
    /// How long a resting finger waits before hover starts at the down point.
    #[serde(default = "default_recognition_exit_timeout_ms")]
    pub recognition_exit_timeout_ms: u64,
    /// Window after the down in which fast motion starts gesture recognition.
    #[serde(default = "default_gesture_start_timeout_ms")]
    pub gesture_start_timeout_ms: u64,
    /// Distance (px) that must be covered inside the start window.
    #[serde(default = "default_recognition_slop")]
    pub recognition_slop: f64,
    /// Second finger closer than this (px) starts a drag; at or beyond, the
    /// explorer steps aside.
    #[serde(default = "default_drag_accept_distance")]
    pub drag_accept_distance: f64,
    #[serde(default = "default_max_pointers")]
    pub max_pointers: usize,
}

impl ExplorationConfig {
    pub fn recognition_exit_timeout(&self) -> Duration {
        Duration::from_millis(self.recognition_exit_timeout_ms)
    }

    pub fn gesture_start_timeout(&self) -> Duration {
        Duration::from_millis(self.gesture_start_timeout_ms)
    }
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            recognition_exit_timeout_ms: default_recognition_exit_timeout_ms(),
            gesture_start_timeout_ms: default_gesture_start_timeout_ms(),
            recognition_slop: default_recognition_slop(),
            drag_accept_distance: default_drag_accept_distance(),
            max_pointers: default_max_pointers(),
        }
    }
}

// ── Magnification ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnificationConfig {
    /// Maximum gap between one tap's up and the next tap's down.
    #[serde(default = "default_multi_tap_timeout_ms")]
    pub multi_tap_timeout_ms: u64,
    /// Maximum distance (px) between consecutive taps of a group.
    #[serde(default = "default_multi_tap_distance")]
    pub multi_tap_distance: f64,
    /// Movement (px) that disqualifies a touch as a tap.
    #[serde(default = "default_magnifier_tap_slop")]
    pub tap_slop: f64,
    /// Presses held longer than this are not taps.
    #[serde(default = "default_tap_timeout_ms")]
    pub tap_timeout_ms: u64,
    #[serde(default = "default_scale")]
    pub default_scale: f64,
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,
    #[serde(default = "default_max_scale")]
    pub max_scale: f64,
    /// Minimum cosine between the two fingers' motion for a pan.
    #[serde(default = "default_parallel_cosine")]
    pub parallel_cosine: f64,
    /// Touches starting inside these regions are never interpreted.
    #[serde(default)]
    pub excluded_regions: Vec<Rect>,
}

impl MagnificationConfig {
    pub fn multi_tap_timeout(&self) -> Duration {
        Duration::from_millis(self.multi_tap_timeout_ms)
    }

    pub fn tap_timeout(&self) -> Duration {
        Duration::from_millis(self.tap_timeout_ms)
    }
}

impl Default for MagnificationConfig {
    fn default() -> Self {
        Self {
            multi_tap_timeout_ms: default_multi_tap_timeout_ms(),
            multi_tap_distance: default_multi_tap_distance(),
            tap_slop: default_magnifier_tap_slop(),
            tap_timeout_ms: default_tap_timeout_ms(),
            default_scale: default_scale(),
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
            parallel_cosine: default_parallel_cosine(),
            excluded_regions: Vec::new(),
        }
    }
}

// ── Dwell click ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwellClickConfig {
    #[serde(default = "default_dwell_delay_ms")]
    pub delay_ms: u64,
    /// Movement (px) that re-arms the dwell timer.
    #[serde(default = "default_movement_threshold")]
    pub movement_threshold: f64,
}

impl DwellClickConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for DwellClickConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_dwell_delay_ms(),
            movement_threshold: default_movement_threshold(),
        }
    }
}

// ── Injection ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Budget for a single segment and for the plan as a whole.
    #[serde(default = "default_max_stroke_duration_ms")]
    pub max_stroke_duration_ms: u64,
    #[serde(default = "default_max_strokes")]
    pub max_strokes: usize,
    /// Pointer id carried by every injected touch event.
    #[serde(default = "default_injected_pointer_id")]
    pub pointer_id: u32,
}

impl InjectionConfig {
    pub fn limits(&self) -> InjectionLimits {
        InjectionLimits {
            max_stroke_duration: Duration::from_millis(self.max_stroke_duration_ms),
            max_strokes: self.max_strokes,
        }
    }
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            max_stroke_duration_ms: default_max_stroke_duration_ms(),
            max_strokes: default_max_strokes(),
            pointer_id: default_injected_pointer_id(),
        }
    }
}

// ── Key relay / mouse keys ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRelayConfig {
    /// How long listeners may hold a key event before it is forwarded anyway.
    #[serde(default = "default_key_timeout_ms")]
    pub timeout_ms: u64,
}

impl KeyRelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for KeyRelayConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_key_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseKeysConfig {
    /// Pointer travel (px) per key press.
    #[serde(default = "default_mouse_step")]
    pub step: f64,
}

impl Default for MouseKeysConfig {
    fn default() -> Self {
        Self {
            step: default_mouse_step(),
        }
    }
}

// ── Default value functions (required by serde) ──────────────────────────────

fn default_tap_slop() -> f64 {
    20.0
}
fn default_double_tap_slop() -> f64 {
    100.0
}
fn default_double_tap_timeout_ms() -> u64 {
    300
}
fn default_min_double_tap_time_ms() -> u64 {
    40
}
fn default_long_press_timeout_ms() -> u64 {
    400
}
fn default_max_gesture_duration_ms() -> u64 {
    2_000
}
fn default_min_directionality() -> f64 {
    0.9
}
fn default_min_swipe_velocity() -> f64 {
    150.0
}
fn default_min_sample_spacing() -> f64 {
    10.0
}
fn default_max_swipe_segments() -> usize {
    2
}
fn default_max_samples() -> usize {
    256
}
fn default_recognition_exit_timeout_ms() -> u64 {
    300
}
fn default_gesture_start_timeout_ms() -> u64 {
    150
}
fn default_recognition_slop() -> f64 {
    40.0
}
fn default_drag_accept_distance() -> f64 {
    200.0
}
fn default_max_pointers() -> usize {
    32
}
fn default_multi_tap_timeout_ms() -> u64 {
    300
}
fn default_multi_tap_distance() -> f64 {
    100.0
}
fn default_magnifier_tap_slop() -> f64 {
    8.0
}
fn default_tap_timeout_ms() -> u64 {
    250
}
fn default_scale() -> f64 {
    2.0
}
fn default_min_scale() -> f64 {
    1.0
}
fn default_max_scale() -> f64 {
    8.0
}
fn default_parallel_cosine() -> f64 {
    0.7
}
fn default_dwell_delay_ms() -> u64 {
    1_000
}
fn default_movement_threshold() -> f64 {
    5.0
}
fn default_max_stroke_duration_ms() -> u64 {
    60_000
}
fn default_max_strokes() -> usize {
    10
}
fn default_injected_pointer_id() -> u32 {
    1
}
fn default_key_timeout_ms() -> u64 {
    500
}
fn default_mouse_step() -> f64 {
    5.0
}
