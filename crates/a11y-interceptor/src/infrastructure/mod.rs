//! Infrastructure layer: adapters between the pipeline and the outside world.
//!
//! - `input_source` – reads raw events from the platform (or a test channel).
//! - `output` – production adapters for the collaborator ports.
//! - `mock` – recording doubles used by unit and integration tests.
//! - `storage` – TOML configuration persistence.
//! - `runtime` – the tokio task that serialises events, timers and commands.

pub mod input_source;
pub mod mock;
pub mod output;
pub mod runtime;
pub mod storage;
