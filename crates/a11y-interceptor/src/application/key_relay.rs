//! Offers key events to registered listeners before they reach the platform.
//!
//! Each offered key gets a rising sequence number and waits, with a bounded
//! timeout, for every interested listener to answer. One decline, the
//! timeout, or a listener disconnecting forwards the key; unanimous consumption
//! drops it. Keys always leave the relay in the order they arrived, so a key
//! that resolves early waits behind older keys that are still held.

use std::collections::VecDeque;
use std::sync::Arc;

use a11y_core::{KeyEvent, KeyRelayConfig, SequenceCounter};
use tracing::debug;
use uuid::Uuid;

use super::chain::{DeferredTask, Disposition, EventSink, LinkContext};
use super::ports::KeyListener;
use super::scheduler::CancelToken;

// ── Listener table ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ListenerEntry {
    pub id: Uuid,
    /// Pre-declared interest in key events.
    pub wants_keys: bool,
    pub handle: Arc<dyn KeyListener>,
}

/// Registered key listeners, owned by the interceptor and lent to links.
#[derive(Clone, Default)]
pub struct ListenerTable {
    entries: Vec<ListenerEntry>,
}

impl ListenerTable {
    /// Adds `entry`, replacing an existing entry with the same id.
    pub fn insert(&mut self, entry: ListenerEntry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<ListenerEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn interested(&self) -> impl Iterator<Item = &ListenerEntry> {
        self.entries.iter().filter(|e| e.wants_keys)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Relay ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Forward,
    Consume,
}

struct PendingKey {
    sequence: u32,
    event: KeyEvent,
    /// Listeners that still hold the key back.
    waiting: Vec<Uuid>,
    verdict: Option<Verdict>,
    timer: Option<CancelToken>,
}

pub struct KeyRelay {
    config: KeyRelayConfig,
    sequence: SequenceCounter,
    queue: VecDeque<PendingKey>,
}

impl KeyRelay {
    pub fn new(config: KeyRelayConfig) -> Self {
        Self {
            config,
            sequence: SequenceCounter::new(),
            queue: VecDeque::new(),
        }
    }

    /// Number of keys waiting for a decision or behind one.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Records a listener's answer for the key with `sequence`.
    ///
    /// Answers for unknown or already-decided sequences are ignored.
    pub fn on_listener_result(
        &mut self,
        listener: Uuid,
        sequence: u32,
        handled: bool,
        ctx: &mut LinkContext<'_>,
    ) {
        let Some(entry) = self
            .queue
            .iter_mut()
            .find(|p| p.sequence == sequence && p.verdict.is_none())
        else {
            debug!(sequence, %listener, "late key response ignored");
            return;
        };
        let Some(index) = entry.waiting.iter().position(|id| *id == listener) else {
            debug!(sequence, %listener, "response from a listener without a hold ignored");
            return;
        };

        if handled {
            entry.waiting.remove(index);
            if entry.waiting.is_empty() {
                entry.verdict = Some(Verdict::Consume);
                ctx.cancel(&mut entry.timer);
                debug!(sequence, "key consumed by listeners");
            }
        } else {
            entry.verdict = Some(Verdict::Forward);
            ctx.cancel(&mut entry.timer);
            debug!(sequence, %listener, "key declined");
        }
        self.release_ready(ctx);
    }

    /// Releases every hold `listener` had, as if it declined.
    pub fn on_listener_removed(&mut self, listener: Uuid, ctx: &mut LinkContext<'_>) {
        for entry in self.queue.iter_mut().filter(|p| p.verdict.is_none()) {
            if entry.waiting.contains(&listener) {
                entry.verdict = Some(Verdict::Forward);
                ctx.cancel(&mut entry.timer);
                debug!(sequence = entry.sequence, %listener, "listener gone, hold released");
            }
        }
        self.release_ready(ctx);
    }

    /// Emits or drops decided keys from the front of the queue.
    fn release_ready(&mut self, ctx: &mut LinkContext<'_>) {
        while let Some(front) = self.queue.front() {
            let Some(verdict) = front.verdict else {
                break;
            };
            let event = front.event;
            self.queue.pop_front();
            if verdict == Verdict::Forward {
                ctx.emit(event);
            }
        }
    }
}

impl EventSink for KeyRelay {
    fn on_key(&mut self, event: KeyEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        let listeners: Vec<(Uuid, Arc<dyn KeyListener>)> = ctx
            .listeners()
            .interested()
            .map(|e| (e.id, Arc::clone(&e.handle)))
            .collect();

        if listeners.is_empty() {
            if self.queue.is_empty() {
                return Disposition::Forward(event.into());
            }
            // Keep order behind keys that are still held.
            self.queue.push_back(PendingKey {
                sequence: 0,
                event,
                waiting: Vec::new(),
                verdict: Some(Verdict::Forward),
                timer: None,
            });
            return Disposition::Handled;
        }

        let sequence = self.sequence.next();
        for (_, handle) in &listeners {
            handle.on_key_event(&event, sequence);
        }
        let timer = ctx.schedule(self.config.timeout(), DeferredTask::KeyRelay { sequence });
        debug!(sequence, listeners = listeners.len(), code = event.code.0, "key offered to listeners");
        self.queue.push_back(PendingKey {
            sequence,
            event,
            waiting: listeners.into_iter().map(|(id, _)| id).collect(),
            verdict: None,
            timer: Some(timer),
        });
        Disposition::Handled
    }

    fn on_timer(&mut self, task: DeferredTask, ctx: &mut LinkContext<'_>) {
        let DeferredTask::KeyRelay { sequence } = task else {
            return;
        };
        if let Some(entry) = self
            .queue
            .iter_mut()
            .find(|p| p.sequence == sequence && p.verdict.is_none())
        {
            entry.timer = None;
            entry.verdict = Some(Verdict::Forward);
            debug!(sequence, waiting = entry.waiting.len(), "key listener timeout");
        }
        self.release_ready(ctx);
    }

    fn teardown(&mut self, ctx: &mut LinkContext<'_>) {
        for mut entry in self.queue.drain(..) {
            ctx.cancel(&mut entry.timer);
            if entry.verdict != Some(Verdict::Consume) {
                ctx.emit(entry.event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use a11y_core::{KeyAction, KeyCode, RawEvent, Timestamp};

    use super::*;
    use crate::application::chain::harness::Harness;
    use crate::infrastructure::mock::RecordingKeyListener;

    fn relay() -> KeyRelay {
        KeyRelay::new(KeyRelayConfig::default())
    }

    fn key(code: KeyCode, ms: u64) -> RawEvent {
        KeyEvent::new(code, KeyAction::Down, Timestamp::from_millis(ms)).into()
    }

    fn listen(h: &mut Harness, wants_keys: bool) -> (Uuid, Arc<RecordingKeyListener>) {
        let listener = Arc::new(RecordingKeyListener::default());
        let id = Uuid::new_v4();
        h.listeners.insert(ListenerEntry {
            id,
            wants_keys,
            handle: listener.clone(),
        });
        (id, listener)
    }

    fn answer(h: &mut Harness, link: &mut KeyRelay, id: Uuid, seq: u32, handled: bool) -> Vec<RawEvent> {
        h.run(link, |l, ctx| {
            l.on_listener_result(id, seq, handled, ctx);
            Disposition::Handled
        })
    }

    #[test]
    fn test_key_without_interested_listeners_forwards_immediately() {
        // Arrange
        let mut h = Harness::new();
        let mut link = relay();
        let (_, listener) = listen(&mut h, false);
        let event = key(KeyCode::A, 0);

        // Act
        let out = h.send(&mut link, event);

        // Assert
        assert_eq!(out, vec![event]);
        assert!(listener.events().is_empty());
    }

    #[test]
    fn test_key_consumed_by_every_listener_is_dropped() {
        // Arrange
        let mut h = Harness::new();
        let mut link = relay();
        let (a, first) = listen(&mut h, true);
        let (b, _) = listen(&mut h, true);

        // Act
        let held = h.send(&mut link, key(KeyCode::A, 0));
        let seq = first.events()[0].1;
        let mut out = answer(&mut h, &mut link, a, seq, true);
        out.extend(answer(&mut h, &mut link, b, seq, true));
        out.extend(h.advance(&mut link, Timestamp::from_millis(1_000)));

        // Assert
        assert!(held.is_empty());
        assert!(out.is_empty());
        assert_eq!(link.pending(), 0);
    }

    #[test]
    fn test_one_decline_forwards_and_late_answers_are_ignored() {
        // Arrange
        let mut h = Harness::new();
        let mut link = relay();
        let (a, first) = listen(&mut h, true);
        let (b, _) = listen(&mut h, true);
        let event = key(KeyCode::A, 0);
        h.send(&mut link, event);
        let seq = first.events()[0].1;

        // Act
        let declined = answer(&mut h, &mut link, a, seq, false);
        let late = answer(&mut h, &mut link, b, seq, true);

        // Assert
        assert_eq!(declined, vec![event]);
        assert!(late.is_empty());
        assert!(h.scheduler.is_empty());
    }

    #[test]
    fn test_timeout_forwards_held_key() {
        // Arrange
        let mut h = Harness::new();
        let mut link = relay();
        listen(&mut h, true);
        let event = key(KeyCode::A, 0);
        h.send(&mut link, event);

        // Act
        let before = h.advance(&mut link, Timestamp::from_millis(499));
        let after = h.advance(&mut link, Timestamp::from_millis(500));

        // Assert
        assert!(before.is_empty());
        assert_eq!(after, vec![event]);
    }

    #[test]
    fn test_listener_removal_releases_hold() {
        // Arrange
        let mut h = Harness::new();
        let mut link = relay();
        let (id, _) = listen(&mut h, true);
        let event = key(KeyCode::A, 0);
        h.send(&mut link, event);

        // Act
        h.listeners.remove(id);
        let out = h.run(&mut link, |l, ctx| {
            l.on_listener_removed(id, ctx);
            Disposition::Handled
        });

        // Assert
        assert_eq!(out, vec![event]);
    }

    #[test]
    fn test_keys_leave_in_arrival_order() {
        // Arrange
        let mut h = Harness::new();
        let mut link = relay();
        let (id, listener) = listen(&mut h, true);
        let first = key(KeyCode::A, 0);
        let second = key(KeyCode::KEYPAD_1, 10);
        h.send(&mut link, first);
        h.send(&mut link, second);
        let seqs: Vec<u32> = listener.events().iter().map(|(_, s)| *s).collect();

        // Act
        let early = answer(&mut h, &mut link, id, seqs[1], false);
        let both = answer(&mut h, &mut link, id, seqs[0], false);

        // Assert
        assert!(early.is_empty());
        assert_eq!(both, vec![first, second]);
        assert!(seqs[1] > seqs[0]);
    }

    #[test]
    fn test_teardown_forwards_pending_keys() {
        // Arrange
        let mut h = Harness::new();
        let mut link = relay();
        listen(&mut h, true);
        let event = key(KeyCode::A, 0);
        h.send(&mut link, event);

        // Act
        let out = h.run(&mut link, |l, ctx| {
            l.teardown(ctx);
            Disposition::Handled
        });

        // Assert
        assert_eq!(out, vec![event]);
        assert!(h.scheduler.is_empty());
    }
}
