//! The pipeline builder: owns the chain, its scheduler and its collaborators.
//!
//! # What the interceptor does (for beginners)
//!
//! The platform hands every raw event to [`InputInterceptor::on_event`]. The
//! interceptor walks the event through the active links in chain order and
//! re-emits whatever survives to the platform's injection target.
//!
//! Time is virtual. The interceptor never sleeps; whoever drives it (the
//! tokio runtime in production, the test itself in tests) calls
//! [`InputInterceptor::advance_to`] and due deferred tasks fire in deadline
//! order. Everything happens on the caller's thread, one event or task at a
//! time, so no link ever needs a lock.
//!
//! Changing the feature set rebuilds the chain: links that stay enabled are
//! kept (with their state and timers), removed links are torn down through
//! the old chain and their timers cancelled, and only then does the new
//! topology take over.

use std::sync::Arc;
use std::time::Duration;

use a11y_core::{
    FeatureFlags, GesturePathPlan, PipelineConfig, RawEvent, Rect, SequenceCounter, Timestamp,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::chain::{DeferredTask, Disposition, EventSink, Link, LinkContext, LinkKind};
use super::key_relay::{ListenerEntry, ListenerTable};
use super::magnification::MagnificationState;
use super::ports::{Collaborators, InjectionCaller, InputInterest, KeyListener};
use super::scheduler::Scheduler;
use super::touch_explorer::TouchGuideState;

pub struct InputInterceptor {
    config: PipelineConfig,
    services: Collaborators,
    features: FeatureFlags,
    links: Vec<Link>,
    scheduler: Scheduler<DeferredTask>,
    listeners: ListenerTable,
    interest: InputInterest,
    injections: SequenceCounter,
}

impl InputInterceptor {
    /// Creates an interceptor with no active links.
    pub fn new(config: PipelineConfig, services: Collaborators) -> Self {
        Self {
            config,
            services,
            features: FeatureFlags::NONE,
            links: Vec::new(),
            scheduler: Scheduler::new(Timestamp::ZERO),
            listeners: ListenerTable::default(),
            interest: InputInterest::default(),
            injections: SequenceCounter::new(),
        }
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    /// Kinds of the active links, head first.
    pub fn active_links(&self) -> Vec<LinkKind> {
        self.links.iter().map(Link::kind).collect()
    }

    pub fn now(&self) -> Timestamp {
        self.scheduler.now()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.scheduler.next_deadline()
    }

    fn position(&self, kind: LinkKind) -> Option<usize> {
        self.links.iter().position(|l| l.kind() == kind)
    }

    // ── Topology ──────────────────────────────────────────────────────────────

    /// Rebuilds the chain for `features`.
    pub fn set_features(&mut self, features: FeatureFlags) {
        let wanted: Vec<LinkKind> = LinkKind::CHAIN_ORDER
            .into_iter()
            .filter(|k| features.contains(k.feature()))
            .collect();
        self.features = features;
        if wanted == self.active_links() {
            return;
        }

        // Removed links close their streams through the old chain first.
        let removed: Vec<LinkKind> = self
            .active_links()
            .into_iter()
            .filter(|k| !wanted.contains(k))
            .collect();
        for kind in &removed {
            if let Some(idx) = self.position(*kind) {
                self.run_at(idx, |link, ctx| link.teardown(ctx));
            }
            let cancelled = self.scheduler.cancel_where(|t| t.owner() == *kind);
            debug!(link = ?kind, cancelled, "link torn down");
        }

        let mut old: Vec<Option<Link>> = std::mem::take(&mut self.links)
            .into_iter()
            .map(Some)
            .collect();
        self.links = wanted
            .iter()
            .map(|kind| {
                old.iter_mut()
                    .find(|slot| slot.as_ref().is_some_and(|l| l.kind() == *kind))
                    .and_then(Option::take)
                    .unwrap_or_else(|| Link::build(*kind, &self.config))
            })
            .collect();

        info!(%features, links = ?wanted, "event chain rebuilt");
        self.update_registration();
    }

    fn update_registration(&mut self) {
        let interest = InputInterest {
            pointer: self.links.iter().any(|l| l.kind().wants_pointer()),
            key: self.links.iter().any(|l| l.kind().wants_key()),
        };
        if interest == self.interest {
            return;
        }
        if interest.is_none() {
            self.services.registration.unregister();
            info!("input source unregistered");
        } else if let Err(e) = self.services.registration.register(interest) {
            warn!(error = %e, "input registration failed");
        } else {
            info!(pointer = interest.pointer, key = interest.key, "input source registered");
        }
        self.interest = interest;
    }

    /// Tears every link down and unregisters from the input source.
    pub fn shutdown(&mut self) {
        self.set_features(FeatureFlags::NONE);
    }

    // ── Event flow ────────────────────────────────────────────────────────────

    /// Feeds one platform event into the chain.
    pub fn on_event(&mut self, event: RawEvent) {
        self.advance_to(event.timestamp());
        self.deliver(0, vec![event]);
    }

    /// Fires every deferred task due by `until` and moves the clock there.
    pub fn advance_to(&mut self, until: Timestamp) {
        while let Some(task) = self.scheduler.pop_due(until) {
            match self.position(task.owner()) {
                Some(idx) => self.run_at(idx, |link, ctx| link.on_timer(task, ctx)),
                None => debug!(?task, "task for inactive link dropped"),
            }
        }
        self.scheduler.set_now(until);
    }

    pub fn advance_by(&mut self, delta: Duration) {
        let until = self.now() + delta;
        self.advance_to(until);
    }

    /// Runs `f` against the link at `idx` and delivers what it emitted to
    /// the rest of the chain.
    fn run_at<R>(&mut self, idx: usize, f: impl FnOnce(&mut Link, &mut LinkContext<'_>) -> R) -> R {
        let mut ctx = LinkContext::new(&mut self.scheduler, &self.services, &self.listeners);
        let result = f(&mut self.links[idx], &mut ctx);
        let emitted = ctx.into_emitted();
        self.deliver(idx + 1, emitted);
        result
    }

    fn with_link<R>(
        &mut self,
        kind: LinkKind,
        f: impl FnOnce(&mut Link, &mut LinkContext<'_>) -> R,
    ) -> Option<R> {
        let idx = self.position(kind)?;
        Some(self.run_at(idx, f))
    }

    /// Passes `events` through the links from `start` on, hop by hop, then
    /// re-emits the survivors to the platform.
    fn deliver(&mut self, start: usize, events: Vec<RawEvent>) {
        let mut batch = events;
        for idx in start..self.links.len() {
            if batch.is_empty() {
                return;
            }
            let mut next = Vec::with_capacity(batch.len());
            for event in batch {
                let mut ctx = LinkContext::new(&mut self.scheduler, &self.services, &self.listeners);
                let disposition = self.links[idx].on_event(event, &mut ctx);
                next.extend(ctx.into_emitted());
                if let Disposition::Forward(e) = disposition {
                    next.push(e);
                }
            }
            batch = next;
        }
        for event in &batch {
            if let Err(e) = self.services.target.emit(event) {
                warn!(error = %e, "injection target rejected event");
            }
        }
    }

    // ── Gesture injection ─────────────────────────────────────────────────────

    /// Starts playing `plan` back; returns its sequence id when accepted.
    ///
    /// Returns `None` when gesture injection is disabled or the plan breaks
    /// the configured limits. Only accepted plans consume a sequence id.
    pub fn inject(&mut self, plan: GesturePathPlan, caller: Arc<dyn InjectionCaller>) -> Option<u32> {
        let mut counter = self.injections.clone();
        let sequence = counter.next();
        let accepted = self.with_link(LinkKind::GestureInjector, |link, ctx| match link {
            Link::GestureInjector(injector) => injector.inject(plan, caller, sequence, ctx),
            _ => false,
        })?;
        if !accepted {
            return None;
        }
        self.injections = counter;
        // Playback starts right away.
        let now = self.now();
        self.advance_to(now);
        Some(sequence)
    }

    /// Aborts the running injection; `false` when none was running.
    pub fn cancel_injection(&mut self) -> bool {
        self.with_link(LinkKind::GestureInjector, |link, ctx| match link {
            Link::GestureInjector(injector) => injector.cancel(ctx),
            _ => false,
        })
        .unwrap_or(false)
    }

    // ── Key listeners ─────────────────────────────────────────────────────────

    pub fn add_key_listener(&mut self, handle: Arc<dyn KeyListener>, wants_keys: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.listeners.insert(ListenerEntry {
            id,
            wants_keys,
            handle,
        });
        info!(%id, wants_keys, "key listener added");
        id
    }

    /// Removes a listener, releasing any key it was holding back.
    pub fn remove_key_listener(&mut self, id: Uuid) -> bool {
        if self.listeners.remove(id).is_none() {
            return false;
        }
        self.with_link(LinkKind::KeyRelay, |link, ctx| {
            if let Link::KeyRelay(relay) = link {
                relay.on_listener_removed(id, ctx);
            }
        });
        info!(%id, "key listener removed");
        true
    }

    pub fn key_listener_result(&mut self, id: Uuid, sequence: u32, handled: bool) {
        let routed = self.with_link(LinkKind::KeyRelay, |link, ctx| {
            if let Link::KeyRelay(relay) = link {
                relay.on_listener_result(id, sequence, handled, ctx);
            }
        });
        if routed.is_none() {
            debug!(%id, sequence, "key response with key filtering disabled");
        }
    }

    // ── Magnification ─────────────────────────────────────────────────────────

    /// Replaces the magnifier's excluded regions, now and for future rebuilds.
    pub fn set_magnification_exclusions(&mut self, regions: Vec<Rect>) {
        self.config.magnification.excluded_regions = regions.clone();
        if let Some(Link::Magnifier(m)) = self
            .links
            .iter_mut()
            .find(|l| l.kind() == LinkKind::Magnifier)
        {
            m.set_excluded_regions(regions);
        }
    }

    // ── Introspection ─────────────────────────────────────────────────────────

    /// Touch exploration state; `None` when disabled or between sessions.
    pub fn touch_guide_state(&self) -> Option<TouchGuideState> {
        self.links.iter().find_map(|l| match l {
            Link::TouchExplorer(e) => e.state(),
            _ => None,
        })
    }

    /// Magnification state; `None` when magnification is disabled.
    pub fn magnification_state(&self) -> Option<MagnificationState> {
        self.links.iter().find_map(|l| match l {
            Link::Magnifier(m) => Some(m.state()),
            _ => None,
        })
    }

    pub fn is_injecting(&self) -> bool {
        self.links.iter().any(|l| matches!(l, Link::GestureInjector(i) if i.is_active()))
    }
}
