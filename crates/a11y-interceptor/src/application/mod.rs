//! Application layer: the event chain and the links that make it up.
//!
//! Nothing in here touches the platform directly. Every side effect goes
//! through a port in [`ports`], so the whole pipeline runs in unit tests with
//! recording doubles and a virtual clock.

pub mod chain;
pub mod dwell_click;
pub mod gesture_injector;
pub mod interceptor;
pub mod key_relay;
pub mod magnification;
pub mod mouse_keys;
pub mod ports;
pub mod scheduler;
pub mod touch_explorer;
