//! Domain entities for the accessibility input pipeline.
//!
//! Pure data types with no infrastructure dependencies. The stateful chain
//! links in `a11y-interceptor` are built on top of these.

/// Screen coordinates and rectangles.
pub mod geometry;

/// Raw pointer and key events flowing through the chain.
pub mod event;

/// Feature bitset selecting which chain links are active.
pub mod features;

/// Caller-supplied gesture paths for synthetic touch injection.
pub mod gesture_path;

/// Rising sequence numbers for key-relay holds.
pub mod sequence;
