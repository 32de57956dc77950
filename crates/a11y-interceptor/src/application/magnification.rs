//! Magnification gestures: triple tap toggles zoom, two fingers pan and pinch
//! while zoomed in.
//!
//! Single-finger events that could still belong to a triple tap are held
//! back. If the candidate fails (timeout, finger moved or held, second finger)
//! the held events are replayed unmodified, in order, so downstream links see
//! exactly what the user did.

use a11y_core::{
    EventFlags, KeyEvent, MagnificationConfig, Point, PointerAction, PointerEvent, Rect,
    SourceKind, ToolType,
};
use tracing::{debug, info};

use super::chain::{DeferredTask, Disposition, EventSink, LinkContext};
use super::scheduler::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnificationState {
    Ready,
    ZoomedIn,
    Panning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnifierTimer {
    /// The next tap of the group did not arrive in time.
    TapWindow,
    /// The candidate finger stayed down too long to be a tap.
    HoldTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TouchMode {
    Idle,
    /// One finger down that may still be a tap.
    Candidate,
    /// Not ours: forward until every finger is up.
    PassThrough,
    /// Two-finger pan/pinch while zoomed; consumed.
    Gesture,
}

#[derive(Debug, Clone, Copy)]
struct TapMark {
    down_at: Point,
}

#[derive(Debug, Clone, Copy)]
struct PinchFinger {
    id: u32,
    current: Point,
    last: Point,
}

#[derive(Debug, Clone)]
struct PinchSession {
    fingers: Vec<PinchFinger>,
    start_distance: f64,
    start_scale: f64,
}

impl PinchSession {
    fn centroid(&self, pick: impl Fn(&PinchFinger) -> Point) -> Point {
        match self.fingers.as_slice() {
            [a, b, ..] => pick(a).midpoint(pick(b)),
            [a] => pick(a),
            [] => Point::ZERO,
        }
    }

    fn spread(&self) -> f64 {
        match self.fingers.as_slice() {
            [a, b, ..] => a.current.distance_to(b.current),
            _ => 0.0,
        }
    }
}

pub struct MagnificationGestureDetector {
    config: MagnificationConfig,
    state: MagnificationState,
    scale: f64,
    mode: TouchMode,
    down_ids: Vec<u32>,
    /// Buffered events of the current tap group, oldest first.
    held: Vec<PointerEvent>,
    /// Index into `held` where the touch in progress begins.
    touch_start: usize,
    candidate_down: Option<PointerEvent>,
    taps: Vec<TapMark>,
    pinch: Option<PinchSession>,
    /// Last event forwarded while passing through, for closing on teardown.
    passed: Option<PointerEvent>,
    tap_window: Option<CancelToken>,
    hold_timer: Option<CancelToken>,
}

impl MagnificationGestureDetector {
    pub fn new(config: MagnificationConfig) -> Self {
        let scale = config.default_scale;
        Self {
            config,
            state: MagnificationState::Ready,
            scale,
            mode: TouchMode::Idle,
            down_ids: Vec::new(),
            held: Vec::new(),
            touch_start: 0,
            candidate_down: None,
            taps: Vec::new(),
            pinch: None,
            passed: None,
            tap_window: None,
            hold_timer: None,
        }
    }

    pub fn state(&self) -> MagnificationState {
        self.state
    }

    /// Current zoom factor; only meaningful while zoomed in.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Replaces the screen regions where detection is skipped.
    pub fn set_excluded_regions(&mut self, regions: Vec<Rect>) {
        debug!(count = regions.len(), "magnification exclusions replaced");
        self.config.excluded_regions = regions;
    }

    fn bypasses(&self, event: &PointerEvent) -> bool {
        matches!(event.tool, ToolType::Knuckle | ToolType::Pen)
            || event.source == SourceKind::Stylus
            || self.config.excluded_regions.iter().any(|r| r.contains(event.position))
    }

    // ── Tap group bookkeeping ─────────────────────────────────────────────────

    /// Replays everything held and forgets the tap group.
    fn flush_held(&mut self, ctx: &mut LinkContext<'_>) {
        ctx.cancel(&mut self.tap_window);
        ctx.cancel(&mut self.hold_timer);
        if !self.held.is_empty() {
            debug!(events = self.held.len(), "tap candidate failed, replaying held events");
        }
        for event in self.held.drain(..) {
            ctx.emit(event);
        }
        self.touch_start = 0;
        self.candidate_down = None;
        self.taps.clear();
    }

    /// Candidate failed mid-touch: replay and let the rest of it through.
    fn fail_candidate(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        self.flush_held(ctx);
        self.mode = TouchMode::PassThrough;
        self.pass(event)
    }

    fn pass(&mut self, event: PointerEvent) -> Disposition {
        self.passed = Some(event);
        Disposition::Forward(event.into())
    }

    fn toggle(&mut self, center: Point, ctx: &mut LinkContext<'_>) {
        match self.state {
            MagnificationState::Ready => {
                self.scale = self.config.default_scale;
                ctx.magnifier().zoom_in(center, self.scale);
                self.state = MagnificationState::ZoomedIn;
                info!(x = center.x, y = center.y, scale = self.scale, "triple tap: zoomed in");
            }
            MagnificationState::ZoomedIn | MagnificationState::Panning => {
                ctx.magnifier().zoom_out();
                self.state = MagnificationState::Ready;
                info!("triple tap: zoomed out");
            }
        }
    }

    // ── Event handlers ────────────────────────────────────────────────────────

    fn on_down(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let reused = self.down_ids.contains(&event.pointer_id);
        if !reused {
            self.down_ids.push(event.pointer_id);
        }
        if reused && self.mode == TouchMode::Candidate {
            // Malformed: the candidate never lifted. Forget it and start over.
            debug!(pointer_id = event.pointer_id, "down for a pointer already down, candidate restarted");
            ctx.cancel(&mut self.hold_timer);
            self.held.truncate(self.touch_start);
            self.candidate_down = None;
            self.mode = TouchMode::Idle;
        }
        match self.mode {
            TouchMode::Idle => self.first_down(event, ctx),
            TouchMode::Candidate => self.second_down(event, ctx),
            TouchMode::PassThrough => self.pass(event),
            TouchMode::Gesture => {
                if let Some(pinch) = &mut self.pinch {
                    let known = pinch.fingers.iter().any(|f| f.id == event.pointer_id);
                    if pinch.fingers.len() < 2 && !known {
                        pinch.fingers.push(PinchFinger {
                            id: event.pointer_id,
                            current: event.position,
                            last: event.position,
                        });
                        pinch.start_distance = pinch.spread();
                        pinch.start_scale = self.scale;
                    }
                }
                Disposition::Handled
            }
        }
    }

    fn first_down(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        if self.bypasses(&event) {
            debug!(pointer_id = event.pointer_id, "touch bypasses magnification detection");
            self.flush_held(ctx);
            self.mode = TouchMode::PassThrough;
            return self.pass(event);
        }

        ctx.cancel(&mut self.tap_window);
        if let Some(last) = self.taps.last() {
            if last.down_at.distance_to(event.position) >= self.config.multi_tap_distance {
                self.flush_held(ctx);
            }
        }

        self.mode = TouchMode::Candidate;
        self.touch_start = self.held.len();
        self.held.push(event);
        self.candidate_down = Some(event);
        self.hold_timer = Some(ctx.schedule(
            self.config.tap_timeout(),
            DeferredTask::Magnifier(MagnifierTimer::HoldTimeout),
        ));
        Disposition::Handled
    }

    fn second_down(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        ctx.cancel(&mut self.hold_timer);
        if self.state == MagnificationState::Ready {
            return self.fail_candidate(event, ctx);
        }

        // Zoomed in: the touch becomes a pan/pinch. The candidate's own
        // events never reached downstream, so they are dropped; earlier
        // complete taps of the group are replayed.
        let first_id = self.candidate_down.map_or(event.pointer_id, |d| d.pointer_id);
        let first_pos = self.held[self.touch_start..]
            .iter()
            .rev()
            .find(|e| e.pointer_id == first_id)
            .map_or(event.position, |e| e.position);
        self.held.truncate(self.touch_start);
        self.flush_held(ctx);

        let fingers = vec![
            PinchFinger {
                id: first_id,
                current: first_pos,
                last: first_pos,
            },
            PinchFinger {
                id: event.pointer_id,
                current: event.position,
                last: event.position,
            },
        ];
        let start_distance = first_pos.distance_to(event.position);
        self.pinch = Some(PinchSession {
            fingers,
            start_distance,
            start_scale: self.scale,
        });
        self.mode = TouchMode::Gesture;
        self.state = MagnificationState::Panning;
        debug!(start_distance, "two-finger magnification gesture started");
        Disposition::Handled
    }

    fn on_move(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        match self.mode {
            TouchMode::Idle => Disposition::Forward(event.into()),
            TouchMode::PassThrough => self.pass(event),
            TouchMode::Candidate => {
                let moved = self
                    .candidate_down
                    .map_or(0.0, |d| d.position.distance_to(event.position));
                if moved > self.config.tap_slop {
                    self.fail_candidate(event, ctx)
                } else {
                    self.held.push(event);
                    Disposition::Handled
                }
            }
            TouchMode::Gesture => {
                self.pinch_move(event, ctx);
                Disposition::Handled
            }
        }
    }

    fn pinch_move(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) {
        let Some(pinch) = &mut self.pinch else {
            return;
        };
        let Some(finger) = pinch.fingers.iter_mut().find(|f| f.id == event.pointer_id) else {
            return;
        };
        finger.current = event.position;

        let [a, b] = match pinch.fingers.as_slice() {
            [a, b, ..] => [*a, *b],
            _ => return,
        };
        let va = a.current - a.last;
        let vb = b.current - b.last;
        // Wait until both fingers have moved since the last frame.
        let (Some(da), Some(db)) = (va.normalized(), vb.normalized()) else {
            return;
        };

        if da.dot(db) >= self.config.parallel_cosine {
            let delta = pinch.centroid(|f| f.current) - pinch.centroid(|f| f.last);
            ctx.magnifier().pan_by(delta.x, delta.y);
            debug!(dx = delta.x, dy = delta.y, "magnifier pan");
        } else if pinch.start_distance > 0.0 {
            let ratio = pinch.spread() / pinch.start_distance;
            let scale = (pinch.start_scale * ratio).clamp(self.config.min_scale, self.config.max_scale);
            if (scale - self.scale).abs() > f64::EPSILON {
                self.scale = scale;
                ctx.magnifier().set_scale(scale, pinch.centroid(|f| f.current));
                debug!(scale, "magnifier scale");
            }
        }
        for f in &mut pinch.fingers {
            f.last = f.current;
        }
    }

    fn on_up(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        self.down_ids.retain(|id| *id != event.pointer_id);
        let all_up = self.down_ids.is_empty();
        match self.mode {
            TouchMode::Idle => Disposition::Forward(event.into()),
            TouchMode::PassThrough => {
                if all_up {
                    self.mode = TouchMode::Idle;
                    self.passed = None;
                    return Disposition::Forward(event.into());
                }
                self.pass(event)
            }
            TouchMode::Candidate => self.candidate_up(event, ctx),
            TouchMode::Gesture => {
                if let Some(pinch) = &mut self.pinch {
                    pinch.fingers.retain(|f| f.id != event.pointer_id);
                    pinch.start_distance = pinch.spread();
                    pinch.start_scale = self.scale;
                }
                if all_up {
                    self.pinch = None;
                    self.mode = TouchMode::Idle;
                    if self.state == MagnificationState::Panning {
                        self.state = MagnificationState::ZoomedIn;
                    }
                    debug!(scale = self.scale, "two-finger magnification gesture ended");
                }
                Disposition::Handled
            }
        }
    }

    fn candidate_up(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        ctx.cancel(&mut self.hold_timer);
        let Some(down) = self.candidate_down.take() else {
            return self.fail_candidate(event, ctx);
        };
        if event.timestamp.saturating_since(down.timestamp) > self.config.tap_timeout() {
            return self.fail_candidate(event, ctx);
        }

        self.held.push(event);
        self.taps.push(TapMark { down_at: down.position });
        self.mode = TouchMode::Idle;

        if self.taps.len() >= 3 {
            // The whole group was consumed by the toggle.
            self.held.clear();
            self.taps.clear();
            self.touch_start = 0;
            self.toggle(down.position, ctx);
        } else {
            self.tap_window = Some(ctx.schedule(
                self.config.multi_tap_timeout(),
                DeferredTask::Magnifier(MagnifierTimer::TapWindow),
            ));
        }
        Disposition::Handled
    }

    fn on_cancel(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let consumed = self.mode == TouchMode::Gesture;
        if self.mode == TouchMode::Candidate {
            // Drop the unfinished touch; downstream never saw its down.
            self.held.truncate(self.touch_start);
        }
        self.flush_held(ctx);
        self.reset_touch();
        if consumed {
            Disposition::Handled
        } else {
            Disposition::Forward(event.into())
        }
    }

    fn reset_touch(&mut self) {
        self.mode = TouchMode::Idle;
        self.down_ids.clear();
        self.pinch = None;
        self.passed = None;
        if self.state == MagnificationState::Panning {
            self.state = MagnificationState::ZoomedIn;
        }
    }
}

impl EventSink for MagnificationGestureDetector {
    fn on_pointer(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        if !event.is_touchscreen() {
            return Disposition::Forward(event.into());
        }
        match event.action {
            PointerAction::Down => self.on_down(event, ctx),
            PointerAction::Move => self.on_move(event, ctx),
            PointerAction::Up => self.on_up(event, ctx),
            PointerAction::Cancel => self.on_cancel(event, ctx),
            _ => Disposition::Forward(event.into()),
        }
    }

    fn on_key(&mut self, event: KeyEvent, _ctx: &mut LinkContext<'_>) -> Disposition {
        Disposition::Forward(event.into())
    }

    fn on_timer(&mut self, task: DeferredTask, ctx: &mut LinkContext<'_>) {
        let DeferredTask::Magnifier(timer) = task else {
            return;
        };
        match timer {
            MagnifierTimer::TapWindow => {
                self.tap_window = None;
                if self.mode == TouchMode::Idle {
                    self.flush_held(ctx);
                }
            }
            MagnifierTimer::HoldTimeout => {
                self.hold_timer = None;
                if self.mode == TouchMode::Candidate {
                    debug!("finger held too long for a tap");
                    self.flush_held(ctx);
                    self.mode = TouchMode::PassThrough;
                    self.passed = self.candidate_down;
                }
            }
        }
    }

    fn teardown(&mut self, ctx: &mut LinkContext<'_>) {
        let open = match self.mode {
            TouchMode::Candidate => self.held.last().copied(),
            TouchMode::PassThrough => self.passed,
            TouchMode::Idle | TouchMode::Gesture => None,
        };
        self.flush_held(ctx);
        if let Some(last) = open {
            let now = ctx.now();
            ctx.emit(
                last.with_action(PointerAction::Cancel)
                    .with_timestamp(now)
                    .flagged(EventFlags::SYNTHETIC),
            );
        }
        self.reset_touch();
        if self.state != MagnificationState::Ready {
            ctx.magnifier().zoom_out();
            self.state = MagnificationState::Ready;
            info!("magnification disabled: zoomed out");
        }
    }
}

#[cfg(test)]
mod tests {
    use a11y_core::{RawEvent, Timestamp};

    use super::*;
    use crate::application::chain::harness::Harness;
    use crate::infrastructure::mock::MagnifierCall;

    fn detector() -> MagnificationGestureDetector {
        MagnificationGestureDetector::new(MagnificationConfig::default())
    }

    fn touch(id: u32, action: PointerAction, x: f64, y: f64, ms: u64) -> RawEvent {
        PointerEvent::touch(id, action, Point::new(x, y), Timestamp::from_millis(ms)).into()
    }

    /// Sends one tap (down, up 50 ms later) and returns the downstream output.
    fn tap(h: &mut Harness, link: &mut MagnificationGestureDetector, x: f64, y: f64, ms: u64) -> Vec<RawEvent> {
        let mut out = h.send(link, touch(0, PointerAction::Down, x, y, ms));
        out.extend(h.send(link, touch(0, PointerAction::Up, x, y, ms + 50)));
        out
    }

    fn zoomed_in(h: &mut Harness) -> MagnificationGestureDetector {
        let mut link = detector();
        tap(h, &mut link, 200.0, 200.0, 0);
        tap(h, &mut link, 200.0, 200.0, 150);
        tap(h, &mut link, 200.0, 200.0, 300);
        link
    }

    #[test]
    fn test_reused_pointer_id_restarts_candidate_instead_of_pinching() {
        // Arrange
        let mut h = Harness::new();
        let mut link = zoomed_in(&mut h);

        // Act
        let mut out = h.send(&mut link, touch(0, PointerAction::Down, 400.0, 400.0, 1_000));
        out.extend(h.send(&mut link, touch(0, PointerAction::Down, 402.0, 400.0, 1_010)));
        out.extend(h.send(&mut link, touch(0, PointerAction::Up, 402.0, 400.0, 1_020)));
        out.extend(h.advance(&mut link, Timestamp::from_millis(3_000)));

        // Assert
        assert_eq!(link.state(), MagnificationState::ZoomedIn);
        assert_eq!(h.magnifier.calls().len(), 1);
        let replayed: Vec<_> = out
            .iter()
            .filter_map(|e| e.as_pointer().map(|p| (p.action, p.timestamp)))
            .collect();
        assert_eq!(
            replayed,
            vec![
                (PointerAction::Down, Timestamp::from_millis(1_010)),
                (PointerAction::Up, Timestamp::from_millis(1_020)),
            ]
        );
    }

    #[test]
    fn test_triple_tap_zooms_in_and_consumes_taps() {
        // Arrange
        let mut h = Harness::new();
        let mut link = detector();

        // Act
        let mut out = tap(&mut h, &mut link, 200.0, 200.0, 0);
        out.extend(tap(&mut h, &mut link, 205.0, 200.0, 150));
        out.extend(tap(&mut h, &mut link, 200.0, 205.0, 300));
        out.extend(h.advance(&mut link, Timestamp::from_millis(2_000)));

        // Assert
        assert!(out.is_empty());
        assert_eq!(link.state(), MagnificationState::ZoomedIn);
        assert_eq!(
            h.magnifier.calls(),
            vec![MagnifierCall::ZoomIn {
                center: Point::new(200.0, 205.0),
                scale: 2.0
            }]
        );
    }

    #[test]
    fn test_fourth_tap_does_not_toggle_again() {
        // Arrange
        let mut h = Harness::new();
        let mut link = zoomed_in(&mut h);

        // Act
        let mut out = tap(&mut h, &mut link, 200.0, 200.0, 450);
        out.extend(h.advance(&mut link, Timestamp::from_millis(2_000)));

        // Assert
        assert_eq!(link.state(), MagnificationState::ZoomedIn);
        assert_eq!(h.magnifier.calls().len(), 1);
        let actions: Vec<_> = out.iter().filter_map(|e| e.as_pointer().map(|p| p.action)).collect();
        assert_eq!(actions, vec![PointerAction::Down, PointerAction::Up]);
    }

    #[test]
    fn test_second_triple_tap_zooms_out() {
        // Arrange
        let mut h = Harness::new();
        let mut link = zoomed_in(&mut h);

        // Act
        tap(&mut h, &mut link, 200.0, 200.0, 1_000);
        tap(&mut h, &mut link, 200.0, 200.0, 1_150);
        tap(&mut h, &mut link, 200.0, 200.0, 1_300);

        // Assert
        assert_eq!(link.state(), MagnificationState::Ready);
        assert_eq!(h.magnifier.calls().last(), Some(&MagnifierCall::ZoomOut));
    }

    #[test]
    fn test_lone_tap_is_replayed_unmodified_after_window() {
        // Arrange
        let mut h = Harness::new();
        let mut link = detector();
        let down = touch(0, PointerAction::Down, 50.0, 50.0, 0);
        let up = touch(0, PointerAction::Up, 50.0, 50.0, 40);
        h.send(&mut link, down);
        h.send(&mut link, up);

        // Act
        let out = h.advance(&mut link, Timestamp::from_millis(400));

        // Assert
        assert_eq!(out, vec![down, up]);
    }

    #[test]
    fn test_moving_finger_fails_candidate_and_passes_through() {
        // Arrange
        let mut h = Harness::new();
        let mut link = detector();
        let down = touch(0, PointerAction::Down, 50.0, 50.0, 0);
        h.send(&mut link, down);
        let moved = touch(0, PointerAction::Move, 80.0, 50.0, 20);

        // Act
        let out = h.send(&mut link, moved);
        let next = touch(0, PointerAction::Move, 90.0, 50.0, 30);
        let later = h.send(&mut link, next);

        // Assert
        assert_eq!(out, vec![down, moved]);
        assert_eq!(later, vec![next]);
    }

    #[test]
    fn test_excluded_region_bypasses_detection() {
        // Arrange
        let mut h = Harness::new();
        let mut link = detector();
        link.set_excluded_regions(vec![Rect::new(0.0, 800.0, 1080.0, 1200.0)]);
        let down = touch(0, PointerAction::Down, 300.0, 900.0, 0);

        // Act
        let out = h.send(&mut link, down);

        // Assert
        assert_eq!(out, vec![down]);
    }

    #[test]
    fn test_knuckle_bypasses_detection() {
        // Arrange
        let mut h = Harness::new();
        let mut link = detector();
        let mut knuckle =
            PointerEvent::touch(0, PointerAction::Down, Point::new(10.0, 10.0), Timestamp::ZERO);
        knuckle.tool = ToolType::Knuckle;

        // Act
        let out = h.send(&mut link, knuckle.into());

        // Assert
        assert_eq!(out, vec![RawEvent::from(knuckle)]);
    }

    #[test]
    fn test_parallel_two_finger_motion_pans() {
        // Arrange
        let mut h = Harness::new();
        let mut link = zoomed_in(&mut h);
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 1_000));
        h.send(&mut link, touch(1, PointerAction::Down, 200.0, 100.0, 1_010));
        assert_eq!(link.state(), MagnificationState::Panning);

        // Act
        let mut out = h.send(&mut link, touch(0, PointerAction::Move, 110.0, 100.0, 1_030));
        out.extend(h.send(&mut link, touch(1, PointerAction::Move, 210.0, 100.0, 1_030)));

        // Assert
        assert!(out.is_empty());
        assert_eq!(h.magnifier.calls().last(), Some(&MagnifierCall::PanBy { dx: 10.0, dy: 0.0 }));
    }

    #[test]
    fn test_spreading_fingers_scale_with_clamp() {
        // Arrange
        let mut h = Harness::new();
        let mut link = zoomed_in(&mut h);
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 1_000));
        h.send(&mut link, touch(1, PointerAction::Down, 200.0, 100.0, 1_010));

        // Act
        h.send(&mut link, touch(0, PointerAction::Move, 50.0, 100.0, 1_030));
        h.send(&mut link, touch(1, PointerAction::Move, 250.0, 100.0, 1_030));
        let doubled = link.scale();
        h.send(&mut link, touch(0, PointerAction::Move, -400.0, 100.0, 1_050));
        h.send(&mut link, touch(1, PointerAction::Move, 700.0, 100.0, 1_050));

        // Assert
        assert_eq!(doubled, 4.0);
        assert_eq!(link.scale(), 8.0);
        assert_eq!(
            h.magnifier.calls()[1],
            MagnifierCall::SetScale {
                scale: 4.0,
                center: Point::new(150.0, 100.0)
            }
        );
    }

    #[test]
    fn test_two_fingers_while_ready_pass_through() {
        // Arrange
        let mut h = Harness::new();
        let mut link = detector();
        let first = touch(0, PointerAction::Down, 100.0, 100.0, 0);
        h.send(&mut link, first);
        let second = touch(1, PointerAction::Down, 200.0, 100.0, 10);

        // Act
        let out = h.send(&mut link, second);

        // Assert
        assert_eq!(out, vec![first, second]);
    }

    #[test]
    fn test_teardown_zooms_out_and_closes_candidate() {
        // Arrange
        let mut h = Harness::new();
        let mut link = zoomed_in(&mut h);
        h.send(&mut link, touch(0, PointerAction::Down, 10.0, 10.0, 1_000));

        // Act
        let out = h.run(&mut link, |l, ctx| {
            l.teardown(ctx);
            Disposition::Handled
        });

        // Assert
        let actions: Vec<_> = out.iter().filter_map(|e| e.as_pointer().map(|p| p.action)).collect();
        assert_eq!(actions, vec![PointerAction::Down, PointerAction::Cancel]);
        assert_eq!(link.state(), MagnificationState::Ready);
        assert_eq!(h.magnifier.calls().last(), Some(&MagnifierCall::ZoomOut));
        assert!(h.scheduler.is_empty());
    }
}
