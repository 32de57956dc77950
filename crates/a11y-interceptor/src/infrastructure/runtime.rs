//! The tokio task that drives the interceptor.
//!
//! # Why one task? (for beginners)
//!
//! Every link in the chain is a plain state machine that assumes nobody else
//! touches it while it runs. Instead of wrapping the chain in a mutex, the
//! runtime owns the [`InputInterceptor`] outright and feeds it from a single
//! command channel. Input events, injection requests, listener verdicts and
//! feature changes all queue up on that channel and are applied one at a
//! time, and so are deadline expiries, because the same loop also sleeps
//! until the interceptor's next deadline.
//!
//! ```text
//!  input pump ─┐
//!  services   ─┼─► mpsc ─► PipelineRuntime::run ─► InputInterceptor
//!  listeners  ─┘             ▲
//!                            └── sleep_until(next deadline)
//! ```
//!
//! Other tasks hold a cheap, cloneable [`RuntimeHandle`].

use std::sync::Arc;

use a11y_core::{FeatureFlags, GesturePathPlan, RawEvent, Rect, Timestamp};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::interceptor::InputInterceptor;
use crate::application::magnification::MagnificationState;
use crate::application::ports::{InjectionCaller, KeyListener};
use crate::application::touch_explorer::TouchGuideState;
use crate::infrastructure::input_source::{CaptureError, InputSource};

/// Commands queued for the runtime.
const COMMAND_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("pipeline runtime has stopped")]
    Closed,
}

/// A point-in-time view of the pipeline, for status reporting and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSnapshot {
    pub features: FeatureFlags,
    pub touch_guide_state: Option<TouchGuideState>,
    pub magnification_state: Option<MagnificationState>,
    pub injecting: bool,
    pub now: Timestamp,
}

enum Command {
    Event(RawEvent),
    Inject {
        plan: GesturePathPlan,
        caller: Arc<dyn InjectionCaller>,
        reply: oneshot::Sender<Option<u32>>,
    },
    CancelInjection {
        reply: oneshot::Sender<bool>,
    },
    AddKeyListener {
        handle: Arc<dyn KeyListener>,
        wants_keys: bool,
        reply: oneshot::Sender<Uuid>,
    },
    RemoveKeyListener {
        id: Uuid,
        reply: oneshot::Sender<bool>,
    },
    KeyListenerResult {
        id: Uuid,
        sequence: u32,
        handled: bool,
    },
    SetFeatures(FeatureFlags),
    SetMagnificationExclusions(Vec<Rect>),
    Snapshot {
        reply: oneshot::Sender<RuntimeSnapshot>,
    },
    Shutdown,
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Maps the interceptor's virtual timestamps onto tokio instants.
///
/// Event timestamps come from the input source and may run ahead of the
/// wall clock; when they do the mapping is re-anchored so "now" never moves
/// backwards.
#[derive(Debug, Clone, Copy)]
struct Clock {
    base: Timestamp,
    anchor: Instant,
}

impl Clock {
    fn new(base: Timestamp) -> Self {
        Self {
            base,
            anchor: Instant::now(),
        }
    }

    fn now(&self) -> Timestamp {
        self.base + self.anchor.elapsed()
    }

    fn instant_for(&self, at: Timestamp) -> Instant {
        self.anchor + at.saturating_since(self.base)
    }

    fn catch_up(&mut self, virtual_now: Timestamp) {
        if virtual_now > self.now() {
            self.base = virtual_now;
            self.anchor = Instant::now();
        }
    }
}

// ── Runtime ───────────────────────────────────────────────────────────────────

pub struct PipelineRuntime {
    interceptor: InputInterceptor,
    rx: mpsc::Receiver<Command>,
    clock: Clock,
}

impl PipelineRuntime {
    /// Wraps `interceptor`; spawn [`PipelineRuntime::run`] to start it.
    pub fn new(interceptor: InputInterceptor) -> (Self, RuntimeHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let clock = Clock::new(interceptor.now());
        (
            Self {
                interceptor,
                rx,
                clock,
            },
            RuntimeHandle { tx },
        )
    }

    /// Processes commands and deadlines until shutdown or until every handle
    /// is dropped. The interceptor is shut down and handed back.
    pub async fn run(mut self) -> InputInterceptor {
        info!(features = %self.interceptor.features(), "pipeline runtime started");
        loop {
            let deadline = self
                .interceptor
                .next_deadline()
                .map(|d| self.clock.instant_for(d));

            tokio::select! {
                command = self.rx.recv() => {
                    let Some(command) = command else {
                        debug!("all runtime handles dropped");
                        break;
                    };
                    self.interceptor.advance_to(self.clock.now());
                    if !self.apply(command) {
                        break;
                    }
                    self.clock.catch_up(self.interceptor.now());
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.interceptor.advance_to(self.clock.now());
                }
            }
        }
        self.interceptor.shutdown();
        info!("pipeline runtime stopped");
        self.interceptor
    }

    /// Applies one command; `false` means stop.
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Event(event) => self.interceptor.on_event(event),
            Command::Inject {
                plan,
                caller,
                reply,
            } => {
                let _ = reply.send(self.interceptor.inject(plan, caller));
            }
            Command::CancelInjection { reply } => {
                let _ = reply.send(self.interceptor.cancel_injection());
            }
            Command::AddKeyListener {
                handle,
                wants_keys,
                reply,
            } => {
                let _ = reply.send(self.interceptor.add_key_listener(handle, wants_keys));
            }
            Command::RemoveKeyListener { id, reply } => {
                let _ = reply.send(self.interceptor.remove_key_listener(id));
            }
            Command::KeyListenerResult {
                id,
                sequence,
                handled,
            } => self.interceptor.key_listener_result(id, sequence, handled),
            Command::SetFeatures(features) => self.interceptor.set_features(features),
            Command::SetMagnificationExclusions(regions) => {
                self.interceptor.set_magnification_exclusions(regions);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(RuntimeSnapshot {
                    features: self.interceptor.features(),
                    touch_guide_state: self.interceptor.touch_guide_state(),
                    magnification_state: self.interceptor.magnification_state(),
                    injecting: self.interceptor.is_injecting(),
                    now: self.interceptor.now(),
                });
            }
            Command::Shutdown => return false,
        }
        true
    }
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Cloneable front door to a running [`PipelineRuntime`].
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<Command>,
}

impl RuntimeHandle {
    async fn send(&self, command: Command) -> Result<(), RuntimeError> {
        self.tx.send(command).await.map_err(|_| RuntimeError::Closed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    pub async fn send_event(&self, event: RawEvent) -> Result<(), RuntimeError> {
        self.send(Command::Event(event)).await
    }

    /// Requests a gesture injection. `Ok(None)` means the plan was refused.
    pub async fn inject(
        &self,
        plan: GesturePathPlan,
        caller: Arc<dyn InjectionCaller>,
    ) -> Result<Option<u32>, RuntimeError> {
        self.request(|reply| Command::Inject {
            plan,
            caller,
            reply,
        })
        .await
    }

    pub async fn cancel_injection(&self) -> Result<bool, RuntimeError> {
        self.request(|reply| Command::CancelInjection { reply }).await
    }

    pub async fn add_key_listener(
        &self,
        handle: Arc<dyn KeyListener>,
        wants_keys: bool,
    ) -> Result<Uuid, RuntimeError> {
        self.request(|reply| Command::AddKeyListener {
            handle,
            wants_keys,
            reply,
        })
        .await
    }

    pub async fn remove_key_listener(&self, id: Uuid) -> Result<bool, RuntimeError> {
        self.request(|reply| Command::RemoveKeyListener { id, reply })
            .await
    }

    pub async fn key_listener_result(
        &self,
        id: Uuid,
        sequence: u32,
        handled: bool,
    ) -> Result<(), RuntimeError> {
        self.send(Command::KeyListenerResult {
            id,
            sequence,
            handled,
        })
        .await
    }

    pub async fn set_features(&self, features: FeatureFlags) -> Result<(), RuntimeError> {
        self.send(Command::SetFeatures(features)).await
    }

    pub async fn set_magnification_exclusions(&self, regions: Vec<Rect>) -> Result<(), RuntimeError> {
        self.send(Command::SetMagnificationExclusions(regions)).await
    }

    pub async fn snapshot(&self) -> Result<RuntimeSnapshot, RuntimeError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(Command::Shutdown).await
    }
}

/// Forwards every event from `source` into the runtime until the source is
/// exhausted or the runtime stops.
///
/// # Errors
///
/// Returns [`CaptureError`] if the source fails.
pub async fn pump_events<S: InputSource>(
    mut source: S,
    handle: RuntimeHandle,
) -> Result<u64, CaptureError> {
    let mut forwarded = 0u64;
    while let Some(event) = source.next_event().await? {
        if handle.send_event(event).await.is_err() {
            warn!("runtime stopped while input was still arriving");
            break;
        }
        forwarded += 1;
    }
    debug!(forwarded, "input source exhausted");
    Ok(forwarded)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use a11y_core::{Feature, MouseButton, PipelineConfig, Point, PointerAction, PointerEvent};

    use super::*;
    use crate::application::ports::Collaborators;
    use crate::infrastructure::mock::{
        MockRegistration, RecordingMagnifier, RecordingNotifier, RecordingTarget, StaticFocus,
    };

    type Spawned = (RuntimeHandle, Arc<RecordingTarget>, tokio::task::JoinHandle<InputInterceptor>);

    fn spawn_runtime(features: &[Feature]) -> Spawned {
        let target = Arc::new(RecordingTarget::default());
        let services = Collaborators {
            target: target.clone(),
            notifier: Arc::new(RecordingNotifier::default()),
            focus: Arc::new(StaticFocus::default()),
            magnifier: Arc::new(RecordingMagnifier::default()),
            registration: Arc::new(MockRegistration::default()),
        };
        let mut interceptor = InputInterceptor::new(PipelineConfig::default(), services);
        interceptor.set_features(features.iter().copied().collect());
        let (runtime, handle) = PipelineRuntime::new(interceptor);
        (handle, target, tokio::spawn(runtime.run()))
    }

    #[test]
    fn test_clock_re_anchors_when_events_run_ahead() {
        // Arrange
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .expect("runtime");
        rt.block_on(async {
            let mut clock = Clock::new(Timestamp::ZERO);

            // Act
            clock.catch_up(Timestamp::from_millis(5_000));

            // Assert
            assert_eq!(clock.now(), Timestamp::from_millis(5_000));
            assert_eq!(clock.instant_for(Timestamp::from_millis(4_000)), clock.anchor);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_dwell_timer_fires_without_further_input() {
        // Arrange
        let (handle, target, task) = spawn_runtime(&[Feature::DwellClick]);
        let mv = PointerEvent::mouse(PointerAction::Move, Point::new(40.0, 40.0), Timestamp::ZERO);

        // Act
        handle.send_event(mv.into()).await.expect("send");
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        handle.shutdown().await.expect("shutdown");
        task.await.expect("join");

        // Assert
        let actions: Vec<PointerAction> = target
            .events()
            .iter()
            .filter_map(|e| e.as_pointer().map(|p| p.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                PointerAction::Move,
                PointerAction::ButtonDown(MouseButton::Left),
                PointerAction::ButtonUp(MouseButton::Left),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reports_active_features() {
        // Arrange
        let (handle, _target, task) = spawn_runtime(&[Feature::TouchExploration]);

        // Act
        handle
            .set_features([Feature::Magnification].into_iter().collect())
            .await
            .expect("set");
        let snapshot = handle.snapshot().await.expect("snapshot");

        // Assert
        assert!(snapshot.features.contains(Feature::Magnification));
        assert!(!snapshot.features.contains(Feature::TouchExploration));
        assert_eq!(snapshot.magnification_state, Some(MagnificationState::Ready));
        assert!(!snapshot.injecting);
        drop(handle);
        let interceptor = task.await.expect("join");
        assert!(interceptor.active_links().is_empty(), "runtime shuts the chain down on exit");
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_reports_closed_after_shutdown() {
        // Arrange
        let (handle, _target, task) = spawn_runtime(&[]);

        // Act
        handle.shutdown().await.expect("shutdown");
        task.await.expect("join");
        let result = handle.snapshot().await;

        // Assert
        assert!(matches!(result, Err(RuntimeError::Closed)));
    }
}
