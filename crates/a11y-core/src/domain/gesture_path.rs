//! Gesture paths supplied by privileged callers for synthetic touch injection.
//!
//! A [`GesturePathPlan`] can only be obtained through [`GesturePathPlan::new`],
//! which rejects structurally broken input (no segments, negative or
//! non-finite coordinates). Playback limits that are configurable at runtime
//! are checked separately by [`InjectionLimits::check`], so the same plan can
//! be validated against different limits.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::event::{EventFlags, PointerAction, PointerEvent, Timestamp};
use super::geometry::Point;

/// Structural errors detected when building a plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("gesture path contains no segments")]
    Empty,

    #[error("segment {index} has a negative coordinate")]
    NegativeCoordinate { index: usize },

    #[error("segment {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

/// Reasons a structurally valid plan is refused for playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionRejection {
    #[error("plan has {count} segments, limit is {max}")]
    TooManyStrokes { count: usize, max: usize },

    #[error("segment {index} lasts {duration:?}, limit is {max:?}")]
    StrokeTooLong {
        index: usize,
        duration: Duration,
        max: Duration,
    },

    #[error("plan lasts {total:?} in total, limit is {max:?}")]
    TotalTooLong { total: Duration, max: Duration },
}

/// One straight leg of a gesture path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GesturePathSegment {
    pub start: Point,
    pub end: Point,
    pub duration: Duration,
}

impl GesturePathSegment {
    pub fn new(start: Point, end: Point, duration: Duration) -> Self {
        Self {
            start,
            end,
            duration,
        }
    }

    /// A segment whose start and end coincide is played back as a tap.
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// A validated, non-empty sequence of [`GesturePathSegment`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GesturePathPlan {
    segments: Vec<GesturePathSegment>,
}

impl GesturePathPlan {
    /// Builds a plan, rejecting empty input and unusable coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] describing the first offending segment.
    pub fn new(segments: Vec<GesturePathSegment>) -> Result<Self, PlanError> {
        if segments.is_empty() {
            return Err(PlanError::Empty);
        }
        for (index, seg) in segments.iter().enumerate() {
            if !seg.start.is_finite() || !seg.end.is_finite() {
                return Err(PlanError::NonFiniteCoordinate { index });
            }
            if seg.start.x < 0.0 || seg.start.y < 0.0 || seg.end.x < 0.0 || seg.end.y < 0.0 {
                return Err(PlanError::NegativeCoordinate { index });
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[GesturePathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Expands the plan into the touch events that play it back.
    ///
    /// Connected non-degenerate segments (each starting where the previous
    /// one ended) form one continuous stroke: a `Down` at the first start, a
    /// `Move` at every inner segment end and an `Up` at the last end. A gap
    /// between segments lifts the pointer and puts it down again at the next
    /// start. A degenerate segment becomes a `Down`/`Up` pair at its start
    /// and end times. Timestamps are `start` plus the cumulative
    /// durations, so they never decrease.
    pub fn expand(&self, start: Timestamp, pointer_id: u32) -> Vec<PointerEvent> {
        let mut events = Vec::with_capacity(self.segments.len() + 1);
        let mut elapsed = Duration::ZERO;
        let mut stroke_open = false;

        let make = |action, position, at: Duration| {
            PointerEvent::touch(pointer_id, action, position, start + at)
                .flagged(EventFlags::SYNTHETIC | EventFlags::INJECTED)
        };

        for (i, seg) in self.segments.iter().enumerate() {
            let seg_start = elapsed;
            elapsed += seg.duration;

            if seg.is_degenerate() {
                events.push(make(PointerAction::Down, seg.start, seg_start));
                events.push(make(PointerAction::Up, seg.end, elapsed));
                continue;
            }

            if !stroke_open {
                events.push(make(PointerAction::Down, seg.start, seg_start));
                stroke_open = true;
            }
            let stroke_continues = self
                .segments
                .get(i + 1)
                .is_some_and(|next| !next.is_degenerate() && next.start == seg.end);
            if stroke_continues {
                events.push(make(PointerAction::Move, seg.end, elapsed));
            } else {
                events.push(make(PointerAction::Up, seg.end, elapsed));
                stroke_open = false;
            }
        }
        events
    }
}

/// Playback limits applied before an injection is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionLimits {
    pub max_stroke_duration: Duration,
    pub max_strokes: usize,
}

impl InjectionLimits {
    /// # Errors
    ///
    /// Returns the first limit the plan violates.
    pub fn check(&self, plan: &GesturePathPlan) -> Result<(), InjectionRejection> {
        if plan.len() > self.max_strokes {
            return Err(InjectionRejection::TooManyStrokes {
                count: plan.len(),
                max: self.max_strokes,
            });
        }
        for (index, seg) in plan.segments().iter().enumerate() {
            if seg.duration > self.max_stroke_duration {
                return Err(InjectionRejection::StrokeTooLong {
                    index,
                    duration: seg.duration,
                    max: self.max_stroke_duration,
                });
            }
        }
        let total = plan.total_duration();
        if total > self.max_stroke_duration {
            return Err(InjectionRejection::TotalTooLong {
                total,
                max: self.max_stroke_duration,
            });
        }
        Ok(())
    }
}
