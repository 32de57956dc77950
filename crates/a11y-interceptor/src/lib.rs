//! a11y-interceptor library entry point.
//!
//! The event chain and its links live in [`application`]; adapters for the
//! platform, configuration and the tokio runtime live in [`infrastructure`].
//! Integration tests in `tests/` and the binary share this module tree.

pub mod application;
pub mod infrastructure;
