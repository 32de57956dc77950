//! The gesture recognizer.
//!
//! # Decision order
//!
//! 1. Stroke longer than `max_gesture_duration` → `Cancelled`.
//! 2. Net displacement under `tap_slop` → `Tap` (or `DoubleTap` when it pairs
//!    with the previous tap) if released before `long_press_timeout`,
//!    otherwise `LongPress`.
//! 3. Average speed under `min_swipe_velocity` → `Drag`.
//! 4. Otherwise a swipe. A straight enough path gets one compass direction;
//!    a bent one is split at its corners into at most `max_swipe_segments`
//!    legs. Anything needing more legs is `Cancelled`.

use tracing::debug;

use super::direction::{path_length, split_into_legs};
use super::{Gesture, PointerSample};
use crate::config::GestureConfig;
use crate::domain::event::Timestamp;
use crate::domain::geometry::Point;

#[derive(Debug, Clone, Copy)]
struct TapRecord {
    down_position: Point,
    up_time: Timestamp,
}

#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    last_tap: Option<TapRecord>,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            last_tap: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Classifies a finished stroke without consulting or updating tap memory.
    ///
    /// `samples` must start with the down sample and end with the up sample.
    /// An empty slice is `Cancelled`.
    pub fn classify(&self, samples: &[PointerSample]) -> Gesture {
        let (Some(down), Some(up)) = (samples.first(), samples.last()) else {
            return Gesture::Cancelled;
        };
        let duration = up.timestamp.saturating_since(down.timestamp);
        if duration > self.config.max_gesture_duration() {
            return Gesture::Cancelled;
        }

        let net = up.position - down.position;
        if net.length() < self.config.tap_slop {
            return if duration < self.config.long_press_timeout() {
                Gesture::Tap
            } else {
                Gesture::LongPress
            };
        }

        let points: Vec<Point> = samples.iter().map(|s| s.position).collect();
        let secs = duration.as_secs_f64();
        if secs > 0.0 && path_length(&points) / secs < self.config.min_swipe_velocity {
            return Gesture::Drag;
        }

        let mut legs = Vec::new();
        let fits = split_into_legs(
            &points,
            self.config.min_directionality,
            self.config.max_swipe_segments,
            &mut legs,
        );
        if fits && !legs.is_empty() {
            Gesture::Swipe(legs)
        } else {
            Gesture::Cancelled
        }
    }

    /// Classifies a stroke and pairs taps into double taps.
    ///
    /// A tap becomes a `DoubleTap` when its down lands within
    /// `double_tap_slop` of the previous tap's down, and between
    /// `min_double_tap_time` and `double_tap_timeout` after that tap's up.
    /// Any non-tap result forgets the previous tap.
    pub fn recognize(&mut self, samples: &[PointerSample]) -> Gesture {
        let gesture = self.classify(samples);
        let result = match (&gesture, samples.first(), samples.last()) {
            (Gesture::Tap, Some(down), Some(up)) => {
                if self.pairs_with_last_tap(down.position, down.timestamp) {
                    self.last_tap = None;
                    Gesture::DoubleTap
                } else {
                    self.last_tap = Some(TapRecord {
                        down_position: down.position,
                        up_time: up.timestamp,
                    });
                    Gesture::Tap
                }
            }
            _ => {
                self.last_tap = None;
                gesture
            }
        };
        debug!(gesture = %result, samples = samples.len(), "stroke classified");
        result
    }

    /// Whether a down at `position`/`at` would complete a double tap.
    pub fn pairs_with_last_tap(&self, position: Point, at: Timestamp) -> bool {
        let Some(prev) = self.last_tap else {
            return false;
        };
        let gap = at.saturating_since(prev.up_time);
        at >= prev.up_time
            && gap >= self.config.min_double_tap_time()
            && gap <= self.config.double_tap_timeout()
            && prev.down_position.distance_to(position) < self.config.double_tap_slop
    }

    /// Forgets the remembered tap.
    pub fn reset(&mut self) {
        self.last_tap = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::SwipeDirection;

    fn s(x: f64, y: f64, ms: u64) -> PointerSample {
        PointerSample::new(0, Point::new(x, y), Timestamp::from_millis(ms))
    }

    fn recognizer() -> GestureRecognizer {
        GestureRecognizer::new(GestureConfig::default())
    }

    #[test]
    fn test_short_stationary_press_is_tap() {
        let r = recognizer();
        assert_eq!(r.classify(&[s(100.0, 100.0, 0), s(103.0, 101.0, 120)]), Gesture::Tap);
    }

    #[test]
    fn test_stationary_press_at_long_press_timeout_is_long_press() {
        let r = recognizer();
        assert_eq!(r.classify(&[s(50.0, 50.0, 0), s(50.0, 50.0, 400)]), Gesture::LongPress);
    }

    #[test]
    fn test_empty_samples_are_cancelled() {
        assert_eq!(recognizer().classify(&[]), Gesture::Cancelled);
    }

    #[test]
    fn test_stroke_over_max_duration_is_cancelled() {
        let r = recognizer();
        assert_eq!(
            r.classify(&[s(0.0, 0.0, 0), s(300.0, 0.0, 2_001)]),
            Gesture::Cancelled
        );
    }

    #[test]
    fn test_fast_straight_stroke_is_single_swipe() {
        // Arrange
        let r = recognizer();
        let samples = [s(100.0, 500.0, 0), s(100.0, 400.0, 40), s(102.0, 300.0, 80), s(101.0, 200.0, 120)];

        // Act
        let g = r.classify(&samples);

        // Assert
        assert_eq!(g, Gesture::Swipe(vec![SwipeDirection::Up]));
    }

    #[test]
    fn test_slow_stroke_is_drag() {
        // 100 px over 1.5 s is well under the swipe velocity floor
        let r = recognizer();
        assert_eq!(
            r.classify(&[s(0.0, 0.0, 0), s(50.0, 0.0, 750), s(100.0, 0.0, 1_500)]),
            Gesture::Drag
        );
    }

    #[test]
    fn test_l_shaped_stroke_is_compound_swipe() {
        let r = recognizer();
        let samples = [
            s(0.0, 0.0, 0),
            s(100.0, 0.0, 50),
            s(200.0, 0.0, 100),
            s(200.0, 100.0, 150),
            s(200.0, 200.0, 200),
        ];
        let g = r.classify(&samples);
        assert_eq!(g, Gesture::Swipe(vec![SwipeDirection::Right, SwipeDirection::Down]));
        assert_eq!(g.to_string(), "swipe-right-then-down");
    }

    #[test]
    fn test_second_tap_inside_envelope_is_double_tap() {
        // Arrange
        let mut r = recognizer();

        // Act
        let first = r.recognize(&[s(200.0, 200.0, 0), s(200.0, 200.0, 80)]);
        let second = r.recognize(&[s(210.0, 205.0, 200), s(210.0, 205.0, 260)]);
        let third = r.recognize(&[s(210.0, 205.0, 400), s(210.0, 205.0, 450)]);

        // Assert
        assert_eq!(first, Gesture::Tap);
        assert_eq!(second, Gesture::DoubleTap);
        assert_eq!(third, Gesture::Tap, "a double tap consumes the remembered tap");
    }

    #[test]
    fn test_second_tap_too_far_or_too_late_stays_tap() {
        let mut r = recognizer();
        r.recognize(&[s(0.0, 0.0, 0), s(0.0, 0.0, 50)]);
        assert_eq!(r.recognize(&[s(300.0, 0.0, 150), s(300.0, 0.0, 200)]), Gesture::Tap);
        assert_eq!(r.recognize(&[s(300.0, 0.0, 900), s(300.0, 0.0, 950)]), Gesture::Tap);
    }

    #[test]
    fn test_second_tap_faster_than_bounce_floor_stays_tap() {
        let mut r = recognizer();
        r.recognize(&[s(0.0, 0.0, 0), s(0.0, 0.0, 50)]);
        assert_eq!(r.recognize(&[s(0.0, 0.0, 70), s(0.0, 0.0, 100)]), Gesture::Tap);
    }

    #[test]
    fn test_swipe_clears_tap_memory() {
        let mut r = recognizer();
        r.recognize(&[s(0.0, 0.0, 0), s(0.0, 0.0, 50)]);
        r.recognize(&[s(0.0, 0.0, 100), s(300.0, 0.0, 150)]);
        assert!(!r.pairs_with_last_tap(Point::new(0.0, 0.0), Timestamp::from_millis(200)));
    }
}
