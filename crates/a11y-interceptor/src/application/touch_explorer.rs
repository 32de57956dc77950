//! Touch exploration: the finger drives a virtual cursor instead of tapping.
//!
//! # States (for beginners)
//!
//! ```text
//!            first down
//!   (none) ─────────────► Exploring ──fast motion──► Recognizing
//!     ▲                     │   │                        │
//!     │      2nd finger near│   │2nd finger far          │ up: classify
//!     │                     ▼   ▼                        │
//!     │               Dragging ─3rd finger─► Transmitting │
//!     └───────────── all fingers up / cancel ◄───────────┘
//! ```
//!
//! - **Exploring** – one finger resting or sliding. Once the finger has rested
//!   for the recognition-exit timeout, or slid slowly beyond the tap slop,
//!   synthetic hover events follow it and the element under it is announced.
//!   A quick tap is held back for one double-tap timeout and then replayed as
//!   a hover enter/exit pair, so a second tap can still become a double tap.
//! - **Recognizing** – the finger moved fast right after landing. Samples are
//!   collected and classified by the [`GestureRecognizer`] at finger-up.
//! - **Dragging** – two fingers close together act as one finger. A single
//!   ordinary (non-hover) pointer stream follows the primary finger.
//!   Double-tap-and-hold on the focused element also lands here, with the
//!   stream offset so it starts at the element's centre.
//! - **Transmitting** – the explorer replays the downs it had held back and
//!   then forwards everything untouched until the last finger lifts.

use a11y_core::{
    EventFlags, ExplorationConfig, Gesture, GestureConfig, GestureRecognizer, KeyEvent, Point,
    PointerAction, PointerEvent, PointerSample, Stroke, Timestamp,
};
use tracing::{debug, warn};

use super::chain::{DeferredTask, Disposition, EventSink, LinkContext};
use super::ports::{ElementRef, Notification, NotificationKind};
use super::scheduler::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchGuideState {
    Exploring,
    Dragging,
    Transmitting,
    Recognizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerTimer {
    /// The resting finger should start hovering.
    HoverDelay,
    /// No second tap arrived; replay the first one as hover.
    TapConfirm,
    /// The second tap of a double tap is being held.
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    PlatformCancel,
    Teardown,
    Malformed,
}

#[derive(Debug, Clone, Copy)]
struct Finger {
    id: u32,
    down_at: Point,
    down_time: Timestamp,
    current: Point,
    /// Latest real event for this finger; synthetic events copy its source
    /// and tool.
    template: PointerEvent,
}

impl Finger {
    fn from_down(event: PointerEvent) -> Self {
        Self {
            id: event.pointer_id,
            down_at: event.position,
            down_time: event.timestamp,
            current: event.position,
            template: event,
        }
    }
}

/// The single synthetic pointer stream used while dragging.
#[derive(Debug, Clone, Copy)]
struct DragStream {
    open: bool,
    offset: Point,
    last_sent: Point,
    template: PointerEvent,
}

fn synth(template: &PointerEvent, action: PointerAction, position: Point, at: Timestamp) -> PointerEvent {
    template
        .with_action(action)
        .with_position(position)
        .with_timestamp(at)
        .flagged(EventFlags::SYNTHETIC)
}

pub struct TouchExplorer {
    config: ExplorationConfig,
    recognizer: GestureRecognizer,
    state: Option<TouchGuideState>,
    /// Fingers in down order; the first one is the primary finger.
    fingers: Vec<Finger>,
    /// Fingers beyond `max_pointers`, forwarded untouched.
    overflow: Vec<u32>,
    stroke: Option<Stroke>,
    hover_open: bool,
    hovered: Option<ElementRef>,
    drag: Option<DragStream>,
    double_tap_armed: bool,
    pending_tap: Option<PointerEvent>,
    hover_timer: Option<CancelToken>,
    tap_timer: Option<CancelToken>,
    long_press_timer: Option<CancelToken>,
}

impl TouchExplorer {
    pub fn new(config: ExplorationConfig, gesture: GestureConfig) -> Self {
        Self {
            config,
            recognizer: GestureRecognizer::new(gesture),
            state: None,
            fingers: Vec::new(),
            overflow: Vec::new(),
            stroke: None,
            hover_open: false,
            hovered: None,
            drag: None,
            double_tap_armed: false,
            pending_tap: None,
            hover_timer: None,
            tap_timer: None,
            long_press_timer: None,
        }
    }

    /// The active state, or `None` between touch sessions.
    pub fn state(&self) -> Option<TouchGuideState> {
        self.state
    }

    fn finger_index(&self, id: u32) -> Option<usize> {
        self.fingers.iter().position(|f| f.id == id)
    }

    // ── Down ──────────────────────────────────────────────────────────────────

    fn on_down(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let id = event.pointer_id;
        self.overflow.retain(|p| *p != id);

        if self.finger_index(id).is_some() {
            warn!(pointer_id = id, "down for a pointer that is already down; restarting touch session");
            self.close_session(ctx, event.timestamp, CloseReason::Malformed);
        }

        if self.fingers.len() >= self.config.max_pointers {
            debug!(pointer_id = id, cap = self.config.max_pointers, "pointer over cap, passing through");
            self.overflow.push(id);
            return Disposition::Forward(event.into());
        }

        match self.state {
            None => self.begin_session(event, ctx),
            Some(state) => {
                self.fingers.push(Finger::from_down(event));
                self.on_extra_finger(state, event, ctx)
            }
        }
    }

    fn begin_session(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let mut armed = false;
        if self.pending_tap.is_some() {
            if self.recognizer.pairs_with_last_tap(event.position, event.timestamp) {
                ctx.cancel(&mut self.tap_timer);
                self.pending_tap = None;
                armed = true;
            } else {
                self.flush_pending_tap(ctx, event.timestamp);
            }
        }

        self.fingers.push(Finger::from_down(event));
        self.stroke = Some(Stroke::begin(
            PointerSample::new(event.pointer_id, event.position, event.timestamp),
            self.recognizer.config(),
        ));
        self.state = Some(TouchGuideState::Exploring);
        self.double_tap_armed = armed;
        ctx.notify(Notification::at(NotificationKind::TouchBegin, event.position));

        if armed {
            let delay = self.recognizer.config().long_press_timeout();
            self.long_press_timer = Some(ctx.schedule(delay, DeferredTask::Explorer(ExplorerTimer::LongPress)));
        } else {
            self.hover_timer = Some(ctx.schedule(
                self.config.recognition_exit_timeout(),
                DeferredTask::Explorer(ExplorerTimer::HoverDelay),
            ));
        }
        debug!(pointer_id = event.pointer_id, double_tap_armed = armed, "touch session started");
        Disposition::Handled
    }

    fn on_extra_finger(
        &mut self,
        state: TouchGuideState,
        event: PointerEvent,
        ctx: &mut LinkContext<'_>,
    ) -> Disposition {
        match state {
            TouchGuideState::Exploring | TouchGuideState::Recognizing => {
                self.leave_single_finger(ctx, event.timestamp, state);
                let primary = self.fingers[0];
                let distance = primary.current.distance_to(event.position);
                if distance < self.config.drag_accept_distance {
                    ctx.emit(synth(&primary.template, PointerAction::Down, primary.current, event.timestamp));
                    self.drag = Some(DragStream {
                        open: true,
                        offset: Point::ZERO,
                        last_sent: primary.current,
                        template: primary.template,
                    });
                    self.state = Some(TouchGuideState::Dragging);
                    debug!(distance, "second finger close: dragging");
                    Disposition::Handled
                } else {
                    debug!(distance, "second finger far: transmitting");
                    self.enter_transmitting(event, ctx)
                }
            }
            TouchGuideState::Dragging => {
                self.close_drag(ctx, event.timestamp, PointerAction::Up);
                debug!(fingers = self.fingers.len(), "extra finger while dragging: transmitting");
                self.enter_transmitting(event, ctx)
            }
            TouchGuideState::Transmitting => Disposition::Forward(event.into()),
        }
    }

    fn enter_transmitting(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        self.state = Some(TouchGuideState::Transmitting);
        for finger in self.fingers.iter().filter(|f| f.id != event.pointer_id) {
            ctx.emit(synth(&finger.template, PointerAction::Down, finger.current, event.timestamp));
        }
        Disposition::Forward(event.into())
    }

    // ── Move ──────────────────────────────────────────────────────────────────

    fn on_move(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let id = event.pointer_id;
        if self.overflow.contains(&id) {
            return Disposition::Forward(event.into());
        }
        let Some(idx) = self.finger_index(id) else {
            debug!(pointer_id = id, "move for a pointer that is not down, dropped");
            return Disposition::Handled;
        };
        self.fingers[idx].current = event.position;
        self.fingers[idx].template = event;

        match self.state {
            Some(TouchGuideState::Exploring) => self.explore_move(event, ctx),
            Some(TouchGuideState::Recognizing) => {
                if let Some(stroke) = &mut self.stroke {
                    stroke.push(PointerSample::new(id, event.position, event.timestamp));
                }
                Disposition::Handled
            }
            Some(TouchGuideState::Dragging) => {
                self.drag_move(idx, event, ctx);
                Disposition::Handled
            }
            Some(TouchGuideState::Transmitting) => Disposition::Forward(event.into()),
            None => Disposition::Handled,
        }
    }

    fn explore_move(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let pos = event.position;
        if let Some(stroke) = &mut self.stroke {
            stroke.push(PointerSample::new(event.pointer_id, pos, event.timestamp));
        }
        if self.hover_open {
            ctx.emit(synth(&event, PointerAction::HoverMove, pos, event.timestamp));
            self.update_hovered(ctx, pos);
            return Disposition::Handled;
        }

        let finger = self.fingers[0];
        let moved = finger.down_at.distance_to(pos);
        let elapsed = event.timestamp.saturating_since(finger.down_time);
        let tap_slop = self.recognizer.config().tap_slop;

        if self.double_tap_armed {
            if moved < tap_slop {
                return Disposition::Handled;
            }
            ctx.cancel(&mut self.long_press_timer);
            self.double_tap_armed = false;
            self.recognizer.reset();
            self.hover_timer = Some(ctx.schedule(
                self.config.recognition_exit_timeout(),
                DeferredTask::Explorer(ExplorerTimer::HoverDelay),
            ));
        }

        if elapsed < self.config.gesture_start_timeout() {
            if moved >= self.config.recognition_slop {
                ctx.cancel(&mut self.hover_timer);
                self.state = Some(TouchGuideState::Recognizing);
                ctx.notify(Notification::at(NotificationKind::TouchGuideGestureBegin, finger.down_at));
                debug!(moved, "fast motion: recognizing gesture");
            }
        } else if moved >= tap_slop {
            self.start_hover(ctx, event.timestamp);
        }
        Disposition::Handled
    }

    fn drag_move(&mut self, idx: usize, event: PointerEvent, ctx: &mut LinkContext<'_>) {
        let Some(drag) = &mut self.drag else {
            return;
        };
        if !drag.open || idx != 0 {
            return;
        }
        let target = event.position + drag.offset;
        drag.template = event;
        if target != drag.last_sent {
            drag.last_sent = target;
            ctx.emit(synth(&event, PointerAction::Move, target, event.timestamp));
        }
    }

    // ── Up ────────────────────────────────────────────────────────────────────

    fn on_up(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let id = event.pointer_id;
        if let Some(i) = self.overflow.iter().position(|p| *p == id) {
            self.overflow.remove(i);
            return Disposition::Forward(event.into());
        }
        let Some(idx) = self.finger_index(id) else {
            debug!(pointer_id = id, "up without matching down absorbed");
            return Disposition::Handled;
        };
        self.fingers.remove(idx);

        match self.state {
            Some(TouchGuideState::Exploring) => self.finish_exploring(event, ctx),
            Some(TouchGuideState::Recognizing) => self.finish_recognizing(event, ctx),
            Some(TouchGuideState::Dragging) => {
                if idx == 0 {
                    if let Some(drag) = &mut self.drag {
                        drag.last_sent = event.position + drag.offset;
                    }
                }
                self.close_drag(ctx, event.timestamp, PointerAction::Up);
                if self.fingers.is_empty() {
                    self.end_session(ctx);
                }
                Disposition::Handled
            }
            Some(TouchGuideState::Transmitting) => {
                if self.fingers.is_empty() {
                    self.end_session(ctx);
                }
                Disposition::Forward(event.into())
            }
            None => Disposition::Handled,
        }
    }

    fn finished_samples(&mut self, event: &PointerEvent) -> Vec<PointerSample> {
        let up = PointerSample::new(event.pointer_id, event.position, event.timestamp);
        match self.stroke.take() {
            Some(mut stroke) => {
                stroke.finish(up);
                stroke.samples().to_vec()
            }
            None => vec![up],
        }
    }

    fn finish_exploring(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let samples = self.finished_samples(&event);
        ctx.cancel(&mut self.hover_timer);
        ctx.cancel(&mut self.long_press_timer);

        if self.hover_open {
            self.close_hover(ctx, event.timestamp);
            self.recognizer.reset();
        } else {
            let down_at = samples.first().map_or(event.position, |s| s.position);
            match self.recognizer.recognize(&samples) {
                Gesture::DoubleTap => {
                    ctx.notify(Notification::at(
                        NotificationKind::GestureCompleted(Gesture::DoubleTap),
                        event.position,
                    ));
                }
                Gesture::Tap => {
                    self.pending_tap = Some(event.with_position(down_at));
                    self.tap_timer = Some(ctx.schedule(
                        self.recognizer.config().double_tap_timeout(),
                        DeferredTask::Explorer(ExplorerTimer::TapConfirm),
                    ));
                }
                other => {
                    debug!(gesture = %other, "touch released before hover started");
                    self.pending_tap = Some(event.with_position(down_at));
                    self.flush_pending_tap(ctx, event.timestamp);
                }
            }
        }
        self.end_session(ctx);
        Disposition::Handled
    }

    fn finish_recognizing(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let samples = self.finished_samples(&event);
        let gesture = self.recognizer.recognize(&samples);
        ctx.notify(Notification::at(NotificationKind::TouchGuideGestureEnd, event.position));
        match gesture {
            Gesture::Swipe(_) => {
                ctx.notify(Notification::at(NotificationKind::GestureCompleted(gesture), event.position));
            }
            other => {
                debug!(gesture = %other, "gesture not recognized");
                ctx.notify(Notification::at(NotificationKind::GestureCancelled, event.position));
            }
        }
        self.end_session(ctx);
        Disposition::Handled
    }

    // ── Cancel / teardown ─────────────────────────────────────────────────────

    fn on_cancel(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let overflowed = !self.overflow.is_empty();
        self.overflow.clear();
        if self.state.is_none() {
            if self.pending_tap.take().is_some() {
                ctx.cancel(&mut self.tap_timer);
            }
            return if overflowed {
                Disposition::Forward(event.into())
            } else {
                Disposition::Handled
            };
        }
        let transmitting = self.state == Some(TouchGuideState::Transmitting);
        self.close_session(ctx, event.timestamp, CloseReason::PlatformCancel);
        if transmitting || overflowed {
            Disposition::Forward(event.into())
        } else {
            Disposition::Handled
        }
    }

    /// Closes whatever synthetic stream is open and ends the session.
    fn close_session(&mut self, ctx: &mut LinkContext<'_>, at: Timestamp, reason: CloseReason) {
        match self.state {
            Some(TouchGuideState::Exploring) => self.close_hover(ctx, at),
            Some(TouchGuideState::Recognizing) => {
                ctx.notify(Notification::new(NotificationKind::GestureCancelled));
                ctx.notify(Notification::new(NotificationKind::TouchGuideGestureEnd));
            }
            Some(TouchGuideState::Dragging) => self.close_drag(ctx, at, PointerAction::Cancel),
            Some(TouchGuideState::Transmitting) => {
                if reason != CloseReason::PlatformCancel {
                    if let Some(finger) = self.fingers.first() {
                        ctx.emit(synth(&finger.template, PointerAction::Cancel, finger.current, at));
                    }
                }
            }
            None => return,
        }
        self.recognizer.reset();
        self.end_session(ctx);
    }

    fn end_session(&mut self, ctx: &mut LinkContext<'_>) {
        ctx.cancel(&mut self.hover_timer);
        ctx.cancel(&mut self.long_press_timer);
        self.state = None;
        self.fingers.clear();
        self.stroke = None;
        self.hover_open = false;
        self.hovered = None;
        self.drag = None;
        self.double_tap_armed = false;
        ctx.notify(Notification::new(NotificationKind::TouchEnd));
    }

    // ── Hover helpers ─────────────────────────────────────────────────────────

    fn leave_single_finger(&mut self, ctx: &mut LinkContext<'_>, at: Timestamp, state: TouchGuideState) {
        ctx.cancel(&mut self.hover_timer);
        ctx.cancel(&mut self.long_press_timer);
        self.double_tap_armed = false;
        self.stroke = None;
        if state == TouchGuideState::Recognizing {
            ctx.notify(Notification::new(NotificationKind::GestureCancelled));
            ctx.notify(Notification::new(NotificationKind::TouchGuideGestureEnd));
        }
        self.close_hover(ctx, at);
    }

    fn start_hover(&mut self, ctx: &mut LinkContext<'_>, at: Timestamp) {
        ctx.cancel(&mut self.hover_timer);
        if self.hover_open {
            return;
        }
        let Some(finger) = self.fingers.first().copied() else {
            return;
        };
        self.hover_open = true;
        ctx.emit(synth(&finger.template, PointerAction::HoverEnter, finger.down_at, at));
        ctx.notify(Notification::at(NotificationKind::TouchGuideBegin, finger.down_at));
        if finger.current != finger.down_at {
            ctx.emit(synth(&finger.template, PointerAction::HoverMove, finger.current, at));
        }
        self.update_hovered(ctx, finger.current);
    }

    fn close_hover(&mut self, ctx: &mut LinkContext<'_>, at: Timestamp) {
        if !self.hover_open {
            return;
        }
        self.hover_open = false;
        self.hovered = None;
        if let Some(finger) = self.fingers.first() {
            ctx.emit(synth(&finger.template, PointerAction::HoverExit, finger.current, at));
        }
        ctx.notify(Notification::new(NotificationKind::TouchGuideEnd));
    }

    fn update_hovered(&mut self, ctx: &mut LinkContext<'_>, pos: Point) {
        let element = ctx.focus().element_at(pos);
        if element != self.hovered {
            self.hovered = element;
            if element.is_some() {
                ctx.notify(Notification {
                    kind: NotificationKind::HoverEnter,
                    location: Some(pos),
                    element,
                });
            }
        }
    }

    fn close_drag(&mut self, ctx: &mut LinkContext<'_>, at: Timestamp, action: PointerAction) {
        if let Some(drag) = &mut self.drag {
            if drag.open {
                drag.open = false;
                ctx.emit(synth(&drag.template, action, drag.last_sent, at));
            }
        }
    }

    /// Replays a confirmed single tap as a hover enter/exit pair.
    fn flush_pending_tap(&mut self, ctx: &mut LinkContext<'_>, at: Timestamp) {
        ctx.cancel(&mut self.tap_timer);
        let Some(tap) = self.pending_tap.take() else {
            return;
        };
        ctx.emit(synth(&tap, PointerAction::HoverEnter, tap.position, at));
        ctx.emit(synth(&tap, PointerAction::HoverExit, tap.position, at));
        if let Some(element) = ctx.focus().element_at(tap.position) {
            ctx.notify(Notification {
                kind: NotificationKind::HoverEnter,
                location: Some(tap.position),
                element: Some(element),
            });
        }
    }

    fn hold_focused(&mut self, ctx: &mut LinkContext<'_>) {
        self.double_tap_armed = false;
        self.recognizer.reset();
        let now = ctx.now();
        let Some(finger) = self.fingers.first().copied() else {
            return;
        };
        match ctx.focus().focused_element() {
            Some(focused) => {
                let center = focused.bounds.center();
                self.state = Some(TouchGuideState::Dragging);
                self.stroke = None;
                ctx.emit(synth(&finger.template, PointerAction::Down, center, now));
                self.drag = Some(DragStream {
                    open: true,
                    offset: center - finger.current,
                    last_sent: center,
                    template: finger.template,
                });
                debug!(element = ?focused.element, "double-tap-and-hold on focused element");
            }
            None => self.start_hover(ctx, now),
        }
    }
}

impl EventSink for TouchExplorer {
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
        let DeferredTask::Explorer(timer) = task else {
            return;
        };
        match timer {
            ExplorerTimer::HoverDelay => {
                self.hover_timer = None;
                if self.state == Some(TouchGuideState::Exploring) && !self.double_tap_armed {
                    let now = ctx.now();
                    self.start_hover(ctx, now);
                }
            }
            ExplorerTimer::TapConfirm => {
                self.tap_timer = None;
                let now = ctx.now();
                self.flush_pending_tap(ctx, now);
            }
            ExplorerTimer::LongPress => {
                self.long_press_timer = None;
                if self.double_tap_armed && self.state == Some(TouchGuideState::Exploring) {
                    self.hold_focused(ctx);
                }
            }
        }
    }

    fn teardown(&mut self, ctx: &mut LinkContext<'_>) {
        let now = ctx.now();
        self.close_session(ctx, now, CloseReason::Teardown);
        self.pending_tap = None;
        ctx.cancel(&mut self.tap_timer);
        self.overflow.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use a11y_core::{PointerAction, RawEvent, Rect};

    use super::*;
    use crate::application::chain::harness::Harness;
    use crate::application::ports::{FocusedElement, MockFocusQuery};

    fn explorer() -> TouchExplorer {
        TouchExplorer::new(ExplorationConfig::default(), GestureConfig::default())
    }

    fn touch(id: u32, action: PointerAction, x: f64, y: f64, ms: u64) -> RawEvent {
        PointerEvent::touch(id, action, Point::new(x, y), Timestamp::from_millis(ms)).into()
    }

    fn actions(events: &[RawEvent]) -> Vec<PointerAction> {
        events.iter().filter_map(|e| e.as_pointer().map(|p| p.action)).collect()
    }

    #[test]
    fn test_quick_tap_reports_begin_and_end_only() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();

        // Act
        let mut out = h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        out.extend(h.send(&mut link, touch(0, PointerAction::Up, 100.0, 100.0, 50)));

        // Assert
        assert!(out.is_empty(), "a tap is held back while a double tap is possible");
        assert_eq!(
            h.notifier.kinds(),
            vec![NotificationKind::TouchBegin, NotificationKind::TouchEnd]
        );
        assert_eq!(link.state(), None);
    }

    #[test]
    fn test_confirmed_tap_is_replayed_as_hover_pair() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        h.send(&mut link, touch(0, PointerAction::Up, 100.0, 100.0, 50));

        // Act
        let out = h.advance(&mut link, Timestamp::from_millis(400));

        // Assert
        assert_eq!(actions(&out), vec![PointerAction::HoverEnter, PointerAction::HoverExit]);
        assert!(out.iter().all(|e| e.as_pointer().is_some_and(|p| p.flags.is_synthetic())));
    }

    #[test]
    fn test_resting_finger_starts_hover_after_exit_timeout() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();

        // Act
        let mut out = h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        out.extend(h.advance(&mut link, Timestamp::from_millis(300)));
        out.extend(h.send(&mut link, touch(0, PointerAction::Up, 100.0, 100.0, 400)));

        // Assert
        assert_eq!(actions(&out), vec![PointerAction::HoverEnter, PointerAction::HoverExit]);
        let kinds = h.notifier.kinds();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::TouchBegin,
                NotificationKind::TouchGuideBegin,
                NotificationKind::TouchGuideEnd,
                NotificationKind::TouchEnd,
            ]
        );
    }

    #[test]
    fn test_hover_moves_follow_the_finger() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        h.advance(&mut link, Timestamp::from_millis(300));

        // Act
        let out = h.send(&mut link, touch(0, PointerAction::Move, 130.0, 100.0, 320));

        // Assert
        assert_eq!(actions(&out), vec![PointerAction::HoverMove]);
        assert_eq!(out[0].as_pointer().map(|p| p.position), Some(Point::new(130.0, 100.0)));
    }

    #[test]
    fn test_fast_swipe_is_reported_as_gesture() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        let mut out = h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));

        // Act
        out.extend(h.send(&mut link, touch(0, PointerAction::Move, 150.0, 100.0, 20)));
        assert_eq!(link.state(), Some(TouchGuideState::Recognizing));
        out.extend(h.send(&mut link, touch(0, PointerAction::Move, 200.0, 100.0, 40)));
        out.extend(h.send(&mut link, touch(0, PointerAction::Move, 250.0, 100.0, 60)));
        out.extend(h.send(&mut link, touch(0, PointerAction::Up, 300.0, 100.0, 80)));

        // Assert
        assert!(out.is_empty());
        assert_eq!(
            h.notifier.kinds(),
            vec![
                NotificationKind::TouchBegin,
                NotificationKind::TouchGuideGestureBegin,
                NotificationKind::TouchGuideGestureEnd,
                NotificationKind::GestureCompleted(Gesture::Swipe(vec![
                    a11y_core::SwipeDirection::Right
                ])),
                NotificationKind::TouchEnd,
            ]
        );
    }

    #[test]
    fn test_second_finger_just_inside_accept_distance_drags() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));

        // Act
        let out = h.send(&mut link, touch(1, PointerAction::Down, 299.99, 100.0, 10));

        // Assert
        assert_eq!(link.state(), Some(TouchGuideState::Dragging));
        assert_eq!(actions(&out), vec![PointerAction::Down]);
        let down = out[0].as_pointer().copied().unwrap();
        assert_eq!(down.pointer_id, 0);
        assert_eq!(down.position, Point::new(100.0, 100.0));
        assert!(down.flags.is_synthetic());
    }

    #[test]
    fn test_second_finger_at_accept_distance_transmits() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        let second = touch(1, PointerAction::Down, 300.0, 100.0, 10);

        // Act
        let out = h.send(&mut link, second);

        // Assert
        assert_eq!(link.state(), Some(TouchGuideState::Transmitting));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_pointer().map(|p| (p.pointer_id, p.action)), Some((0, PointerAction::Down)));
        assert_eq!(out[1], second, "the new finger's down passes through untouched");
    }

    #[test]
    fn test_transmitting_forwards_events_unmodified() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        h.send(&mut link, touch(1, PointerAction::Down, 500.0, 100.0, 10));
        let moved = touch(1, PointerAction::Move, 510.0, 120.0, 20);

        // Act
        let out = h.send(&mut link, moved);

        // Assert
        assert_eq!(out, vec![moved]);
    }

    #[test]
    fn test_drag_follows_primary_finger_and_closes_on_lift() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        h.send(&mut link, touch(1, PointerAction::Down, 150.0, 100.0, 10));

        // Act
        let mut out = h.send(&mut link, touch(0, PointerAction::Move, 120.0, 110.0, 30));
        out.extend(h.send(&mut link, touch(1, PointerAction::Move, 170.0, 110.0, 30)));
        out.extend(h.send(&mut link, touch(0, PointerAction::Up, 130.0, 110.0, 50)));
        out.extend(h.send(&mut link, touch(1, PointerAction::Up, 170.0, 110.0, 60)));

        // Assert
        assert_eq!(actions(&out), vec![PointerAction::Move, PointerAction::Up]);
        assert_eq!(out[1].as_pointer().map(|p| p.position), Some(Point::new(130.0, 110.0)));
        assert_eq!(link.state(), None);
    }

    #[test]
    fn test_platform_cancel_aborts_drag_with_cancel() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        h.send(&mut link, touch(1, PointerAction::Down, 150.0, 100.0, 10));
        h.send(&mut link, touch(0, PointerAction::Move, 120.0, 110.0, 30));

        // Act
        let out = h.send(&mut link, touch(0, PointerAction::Cancel, 120.0, 110.0, 40));

        // Assert
        assert_eq!(actions(&out), vec![PointerAction::Cancel]);
        assert!(out[0].as_pointer().is_some_and(|p| p.flags.is_synthetic()));
        assert_eq!(link.state(), None);
    }

    #[test]
    fn test_cancel_without_session_is_absorbed() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();

        // Act
        let first = h.send(&mut link, touch(0, PointerAction::Cancel, 0.0, 0.0, 0));
        let second = h.send(&mut link, touch(0, PointerAction::Cancel, 0.0, 0.0, 5));

        // Assert
        assert!(first.is_empty());
        assert!(second.is_empty());
        assert!(h.notifier.kinds().is_empty());
    }

    #[test]
    fn test_cancel_during_hover_closes_hover_stream() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        h.advance(&mut link, Timestamp::from_millis(300));

        // Act
        let out = h.send(&mut link, touch(0, PointerAction::Cancel, 100.0, 100.0, 350));

        // Assert
        assert_eq!(actions(&out), vec![PointerAction::HoverExit]);
        assert_eq!(link.state(), None);
        assert!(h.send(&mut link, touch(0, PointerAction::Cancel, 0.0, 0.0, 360)).is_empty());
    }

    #[test]
    fn test_two_quick_taps_make_a_double_tap() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();

        // Act
        let mut out = h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        out.extend(h.send(&mut link, touch(0, PointerAction::Up, 100.0, 100.0, 50)));
        out.extend(h.send(&mut link, touch(0, PointerAction::Down, 105.0, 100.0, 150)));
        out.extend(h.send(&mut link, touch(0, PointerAction::Up, 105.0, 100.0, 200)));
        out.extend(h.advance(&mut link, Timestamp::from_millis(1_000)));

        // Assert
        assert!(out.is_empty(), "the first tap is never replayed");
        assert!(h
            .notifier
            .kinds()
            .contains(&NotificationKind::GestureCompleted(Gesture::DoubleTap)));
    }

    #[test]
    fn test_double_tap_and_hold_drags_focused_element() {
        // Arrange
        let mut focus = MockFocusQuery::new();
        focus.expect_element_at().returning(|_| None);
        focus.expect_focused_element().returning(|| {
            Some(FocusedElement {
                element: ElementRef(7),
                bounds: Rect::new(400.0, 400.0, 600.0, 500.0),
            })
        });
        let mut h = Harness::with_focus(Arc::new(focus));
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        h.send(&mut link, touch(0, PointerAction::Up, 100.0, 100.0, 50));
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 150));

        // Act
        let mut out = h.advance(&mut link, Timestamp::from_millis(560));
        out.extend(h.send(&mut link, touch(0, PointerAction::Move, 110.0, 100.0, 600)));
        out.extend(h.send(&mut link, touch(0, PointerAction::Up, 110.0, 100.0, 650)));

        // Assert
        let got: Vec<(PointerAction, Point)> = out
            .iter()
            .filter_map(|e| e.as_pointer().map(|p| (p.action, p.position)))
            .collect();
        assert_eq!(
            got,
            vec![
                (PointerAction::Down, Point::new(500.0, 450.0)),
                (PointerAction::Move, Point::new(510.0, 450.0)),
                (PointerAction::Up, Point::new(510.0, 450.0)),
            ]
        );
    }

    #[test]
    fn test_pointers_over_cap_pass_through() {
        // Arrange
        let mut h = Harness::new();
        let mut link = TouchExplorer::new(
            ExplorationConfig {
                max_pointers: 1,
                ..ExplorationConfig::default()
            },
            GestureConfig::default(),
        );
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        let extra = touch(1, PointerAction::Down, 120.0, 100.0, 10);

        // Act
        let out = h.send(&mut link, extra);

        // Assert
        assert_eq!(out, vec![extra]);
        assert_eq!(link.state(), Some(TouchGuideState::Exploring));
    }

    #[test]
    fn test_up_without_down_is_absorbed() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();

        // Act
        let out = h.send(&mut link, touch(3, PointerAction::Up, 10.0, 10.0, 0));

        // Assert
        assert!(out.is_empty());
        assert_eq!(link.state(), None);
    }

    #[test]
    fn test_mouse_events_pass_through() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        let event: RawEvent =
            PointerEvent::mouse(PointerAction::Move, Point::new(5.0, 5.0), Timestamp::ZERO).into();

        // Act
        let out = h.send(&mut link, event);

        // Assert
        assert_eq!(out, vec![event]);
    }

    #[test]
    fn test_teardown_while_transmitting_cancels_stream() {
        // Arrange
        let mut h = Harness::new();
        let mut link = explorer();
        h.send(&mut link, touch(0, PointerAction::Down, 100.0, 100.0, 0));
        h.send(&mut link, touch(1, PointerAction::Down, 500.0, 100.0, 10));

        // Act
        let out = h.run(&mut link, |l, ctx| {
            l.teardown(ctx);
            Disposition::Handled
        });

        // Assert
        assert_eq!(actions(&out), vec![PointerAction::Cancel]);
        assert_eq!(link.state(), None);
        assert!(h.scheduler.is_empty());
    }
}
