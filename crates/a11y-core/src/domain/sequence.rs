//! Rising sequence numbers.
//!
//! The key relay tags every event it offers to listeners with a sequence
//! number; listener responses quote it back so the relay can match them to
//! the right hold. The counter lives inside a single chain link and is only
//! touched from the pipeline's serial queue, so it needs no atomics.

/// A monotonically increasing `u32` counter.
///
/// The first value handed out is 1. On overflow it wraps to 1 again; zero is
/// never produced, so callers may use 0 as "no sequence".
///
/// ```rust
/// use a11y_core::SequenceCounter;
///
/// let mut seq = SequenceCounter::new();
/// assert_eq!(seq.next(), 1);
/// assert_eq!(seq.next(), 2);
/// assert_eq!(seq.current(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SequenceCounter {
    last: u32,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next number.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u32 {
        self.last = match self.last.wrapping_add(1) {
            0 => 1,
            n => n,
        };
        self.last
    }

    /// The most recently issued number, or 0 before the first call.
    pub fn current(&self) -> u32 {
        self.last
    }
}
