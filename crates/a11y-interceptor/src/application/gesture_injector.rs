//! Plays a caller-supplied gesture path back as touch events.
//!
//! # Session lifecycle (for beginners)
//!
//! 1. [`GestureInjector::inject`] validates the plan against the configured
//!    [`InjectionLimits`](a11y_core::InjectionLimits). A rejected plan changes
//!    nothing and produces no callback.
//! 2. An accepted plan replaces any running session (the old caller is told
//!    it failed) and is expanded into timestamped pointer events up front.
//! 3. A `Start` task checks the platform sink is available, then each `Step`
//!    task emits every event that has come due and re-schedules itself for
//!    the next one.
//! 4. When the queue is empty the caller hears `success = true`. A cancel or
//!    teardown closes the still-down pointer with a synthetic cancel and
//!    reports `success = false`.
//!
//! While a session runs, live touchscreen input is swallowed so the two
//! streams never interleave. A live finger that is already down when a
//! session is accepted gets a synthetic cancel first, and the rest of its
//! stroke is swallowed until it lifts.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use a11y_core::{
    EventFlags, GesturePathPlan, InjectionConfig, KeyEvent, PointerAction, PointerEvent,
};
use tracing::{debug, info, warn};

use super::chain::{DeferredTask, Disposition, EventSink, LinkContext};
use super::ports::InjectionCaller;
use super::scheduler::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectorTimer {
    Start,
    Step,
}

struct InjectionSession {
    sequence: u32,
    caller: Arc<dyn InjectionCaller>,
    remaining: VecDeque<PointerEvent>,
    /// Last injected event of the pointer that is currently down.
    down: Option<PointerEvent>,
    timer: Option<CancelToken>,
}

pub struct GestureInjector {
    config: InjectionConfig,
    session: Option<InjectionSession>,
    /// Live touches forwarded downstream that have not lifted yet.
    live: Vec<PointerEvent>,
    /// Live pointer ids swallowed until their up or cancel.
    muted: Vec<u32>,
}

impl GestureInjector {
    pub fn new(config: InjectionConfig) -> Self {
        Self {
            config,
            session: None,
            live: Vec::new(),
            muted: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Sequence id of the running session.
    pub fn active_sequence(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.sequence)
    }

    /// Validates and starts playback of `plan`.
    ///
    /// Returns `false` without touching any state when the plan breaks the
    /// configured limits. Completion is reported to `caller` later.
    pub fn inject(
        &mut self,
        plan: GesturePathPlan,
        caller: Arc<dyn InjectionCaller>,
        sequence: u32,
        ctx: &mut LinkContext<'_>,
    ) -> bool {
        if let Err(rejection) = self.config.limits().check(&plan) {
            warn!(sequence, %rejection, "injection rejected");
            return false;
        }

        if self.session.is_some() {
            debug!(sequence, "new injection replaces the running one");
            self.cancel(ctx);
        }

        self.cancel_live(ctx);
        let remaining: VecDeque<PointerEvent> =
            plan.expand(ctx.now(), self.config.pointer_id).into();
        info!(
            sequence,
            segments = plan.len(),
            events = remaining.len(),
            duration_ms = plan.total_duration().as_millis() as u64,
            "injection accepted"
        );
        let timer = ctx.schedule(Duration::ZERO, DeferredTask::Injector(InjectorTimer::Start));
        self.session = Some(InjectionSession {
            sequence,
            caller,
            remaining,
            down: None,
            timer: Some(timer),
        });
        true
    }

    /// Aborts the running session, reporting failure to its caller.
    ///
    /// Returns `false` when nothing was running.
    pub fn cancel(&mut self, ctx: &mut LinkContext<'_>) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };
        ctx.cancel(&mut session.timer);
        if let Some(down) = session.down {
            let now = ctx.now();
            ctx.emit(
                down.with_action(PointerAction::Cancel)
                    .with_timestamp(now)
                    .flagged(EventFlags::SYNTHETIC | EventFlags::INJECTED),
            );
        }
        info!(
            sequence = session.sequence,
            dropped = session.remaining.len(),
            "injection cancelled"
        );
        session.caller.notify_result(session.sequence, false);
        true
    }

    /// Closes every live touch downstream and mutes the rest of its stroke.
    fn cancel_live(&mut self, ctx: &mut LinkContext<'_>) {
        let now = ctx.now();
        for event in self.live.drain(..) {
            debug!(pointer_id = event.pointer_id, "live touch cancelled for injection");
            ctx.emit(
                event
                    .with_action(PointerAction::Cancel)
                    .with_timestamp(now)
                    .flagged(EventFlags::SYNTHETIC),
            );
            self.muted.push(event.pointer_id);
        }
    }

    /// Swallows the live event when its stroke belongs to nobody downstream.
    fn swallow_live(&mut self, event: &PointerEvent) -> bool {
        let id = event.pointer_id;
        let muted = self.muted.contains(&id);
        match event.action {
            PointerAction::Down if self.session.is_some() => {
                if !muted {
                    self.muted.push(id);
                }
                true
            }
            // A fresh down after the session ended starts a normal stroke.
            PointerAction::Down => {
                self.muted.retain(|&m| m != id);
                false
            }
            PointerAction::Up | PointerAction::Cancel if muted => {
                self.muted.retain(|&m| m != id);
                true
            }
            _ => muted || self.session.is_some(),
        }
    }

    fn track_live(&mut self, event: PointerEvent) {
        let id = event.pointer_id;
        match event.action {
            PointerAction::Down | PointerAction::Move => {
                match self.live.iter_mut().find(|e| e.pointer_id == id) {
                    Some(slot) => *slot = event,
                    None if event.action == PointerAction::Down => self.live.push(event),
                    None => {}
                }
            }
            PointerAction::Up | PointerAction::Cancel => self.live.retain(|e| e.pointer_id != id),
            _ => {}
        }
    }

    fn play_due(&mut self, ctx: &mut LinkContext<'_>) {
        let now = ctx.now();
        let Some(session) = &mut self.session else {
            return;
        };
        while let Some(event) = session.remaining.front().copied() {
            if event.timestamp > now {
                break;
            }
            session.remaining.pop_front();
            session.down = match event.action {
                PointerAction::Down | PointerAction::Move => Some(event),
                _ => None,
            };
            ctx.emit(event);
        }

        match session.remaining.front() {
            Some(next) => {
                let delay = next.timestamp.saturating_since(now);
                session.timer = Some(ctx.schedule(delay, DeferredTask::Injector(InjectorTimer::Step)));
            }
            None => {
                info!(sequence = session.sequence, "injection completed");
                session.caller.notify_result(session.sequence, true);
                self.session = None;
            }
        }
    }
}

impl EventSink for GestureInjector {
    fn on_pointer(&mut self, event: PointerEvent, _ctx: &mut LinkContext<'_>) -> Disposition {
        if !event.is_touchscreen() || event.flags.is_injected() {
            return Disposition::Forward(event.into());
        }
        if self.swallow_live(&event) {
            debug!(pointer_id = event.pointer_id, action = ?event.action, "live touch swallowed");
            return Disposition::Handled;
        }
        self.track_live(event);
        Disposition::Forward(event.into())
    }

    fn on_key(&mut self, event: KeyEvent, _ctx: &mut LinkContext<'_>) -> Disposition {
        Disposition::Forward(event.into())
    }

    fn on_timer(&mut self, task: DeferredTask, ctx: &mut LinkContext<'_>) {
        let DeferredTask::Injector(timer) = task else {
            return;
        };
        let Some(session) = &mut self.session else {
            return;
        };
        session.timer = None;
        if timer == InjectorTimer::Start && !ctx.sink_available() {
            warn!(sequence = session.sequence, "injection target unavailable, session failed");
            session.caller.notify_result(session.sequence, false);
            self.session = None;
            return;
        }
        self.play_due(ctx);
    }

    fn teardown(&mut self, ctx: &mut LinkContext<'_>) {
        self.cancel(ctx);
        self.live.clear();
        self.muted.clear();
    }
}
