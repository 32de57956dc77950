//! Single-finger gesture classification.
//!
//! The [`GestureRecognizer`] looks at a finished stroke (every sample from
//! finger-down to finger-up) and decides what the user meant. It keeps exactly
//! one piece of memory between calls: the last tap, so that a second tap can
//! be upgraded to a double tap.

mod direction;
mod recognizer;

pub use direction::SwipeDirection;
pub use recognizer::GestureRecognizer;

use std::fmt;

use crate::config::GestureConfig;
use crate::domain::event::Timestamp;
use crate::domain::geometry::Point;

/// One recorded position of a pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: u32,
    pub position: Point,
    pub timestamp: Timestamp,
}

impl PointerSample {
    pub fn new(pointer_id: u32, position: Point, timestamp: Timestamp) -> Self {
        Self {
            pointer_id,
            position,
            timestamp,
        }
    }
}

/// What a finished stroke was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    Tap,
    DoubleTap,
    LongPress,
    /// One or more straight legs, e.g. `[Right, Down]` for "right then down".
    Swipe(Vec<SwipeDirection>),
    Drag,
    Cancelled,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gesture::Tap => f.write_str("tap"),
            Gesture::DoubleTap => f.write_str("double-tap"),
            Gesture::LongPress => f.write_str("long-press"),
            Gesture::Drag => f.write_str("drag"),
            Gesture::Cancelled => f.write_str("cancelled"),
            Gesture::Swipe(legs) => {
                f.write_str("swipe")?;
                for (i, leg) in legs.iter().enumerate() {
                    if i == 0 {
                        write!(f, "-{leg}")?;
                    } else {
                        write!(f, "-then-{leg}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Bounded sample history for one finger's down→up lifetime.
///
/// Samples closer than `min_sample_spacing` to the last kept one are skipped.
/// Once `max_samples` is reached the newest sample replaces the last kept
/// one, so the end of the stroke is never lost.
#[derive(Debug, Clone)]
pub struct Stroke {
    samples: Vec<PointerSample>,
    min_spacing: f64,
    capacity: usize,
}

impl Stroke {
    pub fn begin(down: PointerSample, config: &GestureConfig) -> Self {
        let capacity = config.max_samples.max(2);
        let mut samples = Vec::with_capacity(capacity.min(64));
        samples.push(down);
        Self {
            samples,
            min_spacing: config.min_sample_spacing,
            capacity,
        }
    }

    pub fn pointer_id(&self) -> u32 {
        self.samples[0].pointer_id
    }

    pub fn push(&mut self, sample: PointerSample) {
        let last = self.samples[self.samples.len() - 1];
        if last.position.distance_to(sample.position) < self.min_spacing {
            return;
        }
        self.record(sample);
    }

    /// Records the up sample unconditionally.
    pub fn finish(&mut self, up: PointerSample) {
        self.record(up);
    }

    fn record(&mut self, sample: PointerSample) {
        if self.samples.len() >= self.capacity {
            let last = self.samples.len() - 1;
            self.samples[last] = sample;
        } else {
            self.samples.push(sample);
        }
    }

    pub fn samples(&self) -> &[PointerSample] {
        &self.samples
    }

    pub fn first(&self) -> PointerSample {
        self.samples[0]
    }

    pub fn last(&self) -> PointerSample {
        self.samples[self.samples.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, y: f64, ms: u64) -> PointerSample {
        PointerSample::new(0, Point::new(x, y), Timestamp::from_millis(ms))
    }

    #[test]
    fn test_gesture_display_concatenates_legs() {
        let g = Gesture::Swipe(vec![SwipeDirection::Right, SwipeDirection::Down]);
        assert_eq!(g.to_string(), "swipe-right-then-down");
        assert_eq!(Gesture::Swipe(vec![SwipeDirection::UpLeft]).to_string(), "swipe-up-left");
        assert_eq!(Gesture::DoubleTap.to_string(), "double-tap");
    }

    #[test]
    fn test_stroke_skips_samples_closer_than_spacing() {
        // Arrange
        let cfg = GestureConfig::default();
        let mut stroke = Stroke::begin(sample(0.0, 0.0, 0), &cfg);

        // Act
        stroke.push(sample(2.0, 0.0, 5));
        stroke.push(sample(20.0, 0.0, 10));

        // Assert
        assert_eq!(stroke.samples().len(), 2);
        assert_eq!(stroke.last().position, Point::new(20.0, 0.0));
    }

    #[test]
    fn test_stroke_at_capacity_keeps_newest_sample() {
        let cfg = GestureConfig {
            max_samples: 3,
            min_sample_spacing: 0.0,
            ..GestureConfig::default()
        };
        let mut stroke = Stroke::begin(sample(0.0, 0.0, 0), &cfg);
        for i in 1..10 {
            stroke.push(sample(i as f64 * 10.0, 0.0, i * 10));
        }
        stroke.finish(sample(500.0, 0.0, 200));

        assert_eq!(stroke.samples().len(), 3);
        assert_eq!(stroke.first().position, Point::new(0.0, 0.0));
        assert_eq!(stroke.last().position, Point::new(500.0, 0.0));
    }
}
