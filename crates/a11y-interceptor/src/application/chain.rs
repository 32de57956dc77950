//! The event transmission chain.
//!
//! # How the chain works (for beginners)
//!
//! Every active pipeline stage is one [`Link`]. The interceptor keeps the
//! links in a `Vec` in fixed chain order and hands each incoming event to the
//! first one. A link answers with a [`Disposition`]:
//!
//! - `Handled` – the event stops here.
//! - `Forward(event)` – the (possibly new) event continues to the next link.
//!
//! While handling an event, or when one of its deferred tasks fires, a link
//! may also *emit* extra synthetic events through its [`LinkContext`]. Those
//! go to the next link too, ahead of the forwarded event. After the last link
//! every surviving event is re-emitted to the platform.
//!
//! [`Link`] is a closed enum rather than a `Box<dyn EventSink>` so that the
//! interceptor can find a specific stage (for example the gesture injector)
//! with a simple `match`, and rebuilding the chain is just rebuilding a `Vec`.

use std::time::Duration;

use a11y_core::{Feature, KeyEvent, PipelineConfig, PointerEvent, RawEvent, Timestamp};

use super::dwell_click::DwellClicker;
use super::gesture_injector::{GestureInjector, InjectorTimer};
use super::key_relay::{KeyRelay, ListenerTable};
use super::magnification::{MagnificationGestureDetector, MagnifierTimer};
use super::mouse_keys::MouseKeys;
use super::ports::{Collaborators, FocusQuery, MagnificationController, Notification};
use super::scheduler::{CancelToken, Scheduler};
use super::touch_explorer::{ExplorerTimer, TouchExplorer};

/// What a link decided about one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Handled,
    Forward(RawEvent),
}

/// The capability every chain link implements.
///
/// The defaults forward everything and ignore timers, so a link only
/// overrides what it cares about.
pub trait EventSink {
    fn on_pointer(&mut self, event: PointerEvent, _ctx: &mut LinkContext<'_>) -> Disposition {
        Disposition::Forward(event.into())
    }

    fn on_key(&mut self, event: KeyEvent, _ctx: &mut LinkContext<'_>) -> Disposition {
        Disposition::Forward(event.into())
    }

    /// Called when one of this link's deferred tasks comes due.
    fn on_timer(&mut self, _task: DeferredTask, _ctx: &mut LinkContext<'_>) {}

    /// Called once before the link is removed from the chain. The link must
    /// close any synthetic stream it opened.
    fn teardown(&mut self, _ctx: &mut LinkContext<'_>) {}
}

// ── Link identity ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    GestureInjector,
    Magnifier,
    TouchExplorer,
    DwellClicker,
    KeyRelay,
    MouseKeys,
}

impl LinkKind {
    /// Position of each link in the chain, head first.
    pub const CHAIN_ORDER: [LinkKind; 6] = [
        LinkKind::GestureInjector,
        LinkKind::Magnifier,
        LinkKind::TouchExplorer,
        LinkKind::DwellClicker,
        LinkKind::KeyRelay,
        LinkKind::MouseKeys,
    ];

    pub fn feature(self) -> Feature {
        match self {
            LinkKind::GestureInjector => Feature::GestureInjection,
            LinkKind::Magnifier => Feature::Magnification,
            LinkKind::TouchExplorer => Feature::TouchExploration,
            LinkKind::DwellClicker => Feature::DwellClick,
            LinkKind::KeyRelay => Feature::KeyFiltering,
            LinkKind::MouseKeys => Feature::MouseKeys,
        }
    }

    /// Whether this link needs pointer events from the platform.
    pub fn wants_pointer(self) -> bool {
        !matches!(self, LinkKind::KeyRelay)
    }

    /// Whether this link needs key events from the platform.
    pub fn wants_key(self) -> bool {
        matches!(self, LinkKind::KeyRelay | LinkKind::MouseKeys)
    }
}

/// A deferred task, tagged with the link that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    Explorer(ExplorerTimer),
    Magnifier(MagnifierTimer),
    Dwell,
    Injector(InjectorTimer),
    KeyRelay { sequence: u32 },
}

impl DeferredTask {
    pub fn owner(&self) -> LinkKind {
        match self {
            DeferredTask::Explorer(_) => LinkKind::TouchExplorer,
            DeferredTask::Magnifier(_) => LinkKind::Magnifier,
            DeferredTask::Dwell => LinkKind::DwellClicker,
            DeferredTask::Injector(_) => LinkKind::GestureInjector,
            DeferredTask::KeyRelay { .. } => LinkKind::KeyRelay,
        }
    }
}

// ── Link ──────────────────────────────────────────────────────────────────────

pub enum Link {
    GestureInjector(GestureInjector),
    Magnifier(MagnificationGestureDetector),
    TouchExplorer(TouchExplorer),
    DwellClicker(DwellClicker),
    KeyRelay(KeyRelay),
    MouseKeys(MouseKeys),
}

macro_rules! each_link {
    ($link:expr, $inner:ident => $body:expr) => {
        match $link {
            Link::GestureInjector($inner) => $body,
            Link::Magnifier($inner) => $body,
            Link::TouchExplorer($inner) => $body,
            Link::DwellClicker($inner) => $body,
            Link::KeyRelay($inner) => $body,
            Link::MouseKeys($inner) => $body,
        }
    };
}

impl Link {
    /// Creates a fresh link of `kind` from the configured thresholds.
    pub fn build(kind: LinkKind, config: &PipelineConfig) -> Self {
        match kind {
            LinkKind::GestureInjector => Link::GestureInjector(GestureInjector::new(config.injection.clone())),
            LinkKind::Magnifier => Link::Magnifier(MagnificationGestureDetector::new(config.magnification.clone())),
            LinkKind::TouchExplorer => Link::TouchExplorer(TouchExplorer::new(
                config.touch_exploration.clone(),
                config.gesture.clone(),
            )),
            LinkKind::DwellClicker => Link::DwellClicker(DwellClicker::new(config.dwell_click.clone())),
            LinkKind::KeyRelay => Link::KeyRelay(KeyRelay::new(config.key_relay.clone())),
            LinkKind::MouseKeys => Link::MouseKeys(MouseKeys::new(config.mouse_keys.clone())),
        }
    }

    pub fn kind(&self) -> LinkKind {
        match self {
            Link::GestureInjector(_) => LinkKind::GestureInjector,
            Link::Magnifier(_) => LinkKind::Magnifier,
            Link::TouchExplorer(_) => LinkKind::TouchExplorer,
            Link::DwellClicker(_) => LinkKind::DwellClicker,
            Link::KeyRelay(_) => LinkKind::KeyRelay,
            Link::MouseKeys(_) => LinkKind::MouseKeys,
        }
    }

    /// Routes a raw event to the pointer or key handler.
    pub fn on_event(&mut self, event: RawEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        match event {
            RawEvent::Pointer(p) => self.on_pointer(p, ctx),
            RawEvent::Key(k) => self.on_key(k, ctx),
        }
    }
}

impl EventSink for Link {
    fn on_pointer(&mut self, event: PointerEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        // Injected gestures are already final; detectors downstream of the
        // injector must not reinterpret them.
        if event.flags.is_injected() && !matches!(self, Link::GestureInjector(_)) {
            return Disposition::Forward(event.into());
        }
        each_link!(self, link => link.on_pointer(event, ctx))
    }

    fn on_key(&mut self, event: KeyEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        each_link!(self, link => link.on_key(event, ctx))
    }

    fn on_timer(&mut self, task: DeferredTask, ctx: &mut LinkContext<'_>) {
        each_link!(self, link => link.on_timer(task, ctx))
    }

    fn teardown(&mut self, ctx: &mut LinkContext<'_>) {
        each_link!(self, link => link.teardown(ctx))
    }
}

// ── LinkContext ───────────────────────────────────────────────────────────────

/// Everything a link may touch while handling one event or task.
pub struct LinkContext<'a> {
    scheduler: &'a mut Scheduler<DeferredTask>,
    services: &'a Collaborators,
    listeners: &'a ListenerTable,
    emitted: Vec<RawEvent>,
}

impl<'a> LinkContext<'a> {
    pub(crate) fn new(
        scheduler: &'a mut Scheduler<DeferredTask>,
        services: &'a Collaborators,
        listeners: &'a ListenerTable,
    ) -> Self {
        Self {
            scheduler,
            services,
            listeners,
            emitted: Vec::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Timestamp {
        self.scheduler.now()
    }

    pub fn schedule(&mut self, delay: Duration, task: DeferredTask) -> CancelToken {
        self.scheduler.schedule_after(delay, task)
    }

    /// Cancels the task in `slot`, if any, and clears the slot.
    pub fn cancel(&mut self, slot: &mut Option<CancelToken>) {
        if let Some(token) = slot.take() {
            self.scheduler.cancel(token);
        }
    }

    /// Queues a synthetic event for the next link.
    pub fn emit(&mut self, event: impl Into<RawEvent>) {
        self.emitted.push(event.into());
    }

    pub fn notify(&self, notification: Notification) {
        self.services.notifier.notify(notification);
    }

    pub fn focus(&self) -> &dyn FocusQuery {
        self.services.focus.as_ref()
    }

    pub fn magnifier(&self) -> &dyn MagnificationController {
        self.services.magnifier.as_ref()
    }

    /// Whether the platform injection facility currently accepts events.
    pub fn sink_available(&self) -> bool {
        self.services.target.is_available()
    }

    pub fn listeners(&self) -> &ListenerTable {
        self.listeners
    }

    pub(crate) fn into_emitted(self) -> Vec<RawEvent> {
        self.emitted
    }
}

// ── Test harness ──────────────────────────────────────────────────────────────
