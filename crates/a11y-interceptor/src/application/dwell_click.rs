//! Dwell click: a mouse pointer that rests long enough clicks by itself.

use a11y_core::{DwellClickConfig, EventFlags, MouseButton, PointerAction, PointerEvent};
use tracing::debug;

use super::chain::{DeferredTask, Disposition, EventSink, LinkContext};
use super::scheduler::CancelToken;

pub struct DwellClicker {
    config: DwellClickConfig,
    /// Where the pointer came to rest; the timer restarts only when the
    /// pointer leaves this spot by more than the movement threshold.
    anchor: Option<PointerEvent>,
    last: Option<PointerEvent>,
    timer: Option<CancelToken>,
}

impl DwellClicker {
    pub fn new(config: DwellClickConfig) -> Self {
        Self {
            config,
            anchor: None,
            last: None,
            timer: None,
        }
    }

    /// Whether a click is pending.
    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    fn on_motion(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) {
        self.last = Some(event);
        let qualifies = self
            .anchor
            .map_or(true, |a| a.position.distance_to(event.position) > self.config.movement_threshold);
        if qualifies {
            self.anchor = Some(event);
            ctx.cancel(&mut self.timer);
            self.timer = Some(ctx.schedule(self.config.delay(), DeferredTask::Dwell));
        }
    }
}

impl EventSink for DwellClicker {
    fn on_pointer(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        if event.is_touchscreen() {
            return Disposition::Forward(event.into());
        }
        match event.action {
            PointerAction::Move | PointerAction::HoverMove => self.on_motion(event, ctx),
            PointerAction::Down
            | PointerAction::Up
            | PointerAction::ButtonDown(_)
            | PointerAction::ButtonUp(_) => {
                if self.timer.is_some() {
                    debug!(pointer_id = event.pointer_id, "real button activity, dwell cancelled");
                }
                ctx.cancel(&mut self.timer);
            }
            _ => {}
        }
        Disposition::Forward(event.into())
    }

    fn on_timer(&mut self, task: DeferredTask, ctx: &mut LinkContext<'_>) {
        if task != DeferredTask::Dwell {
            return;
        }
        self.timer = None;
        let Some(last) = self.last else {
            return;
        };
        let now = ctx.now();
        let click = |button| {
            last.with_timestamp(now)
                .with_action(button)
                .flagged(EventFlags::SYNTHETIC)
        };
        ctx.emit(click(PointerAction::ButtonDown(MouseButton::Left)));
        ctx.emit(click(PointerAction::ButtonUp(MouseButton::Left)));
        debug!(x = last.position.x, y = last.position.y, "dwell click");
    }

    fn teardown(&mut self, ctx: &mut LinkContext<'_>) {
        ctx.cancel(&mut self.timer);
        self.anchor = None;
        self.last = None;
    }
}
