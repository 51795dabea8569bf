//! # Script Core
//!
//! The deterministic, tick-driven event core that scripted game logic runs
//! on. The host advances a virtual clock once per step and hands over the
//! messages it produced since the previous step; the core delivers those
//! messages to subscribers and fires the timers that came due.
//!
//! ## Core Components
//!
//! - **time**: the virtual clock value
//! - **timer**: the timer queue (one-shot and repeating timers, cancellation)
//! - **dispatcher**: the subscription registry and message routing
//! - **context**: the per-script context tying both to a host
//!
//! ## Design Philosophy
//!
//! - **Single-threaded**: nothing runs unless the host calls in, and nothing blocks
//! - **Deterministic**: the same inputs always produce the same callback order
//! - **Contained**: a failing callback is reported and never stops its siblings

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod time;
pub mod timer;

pub use config::*;
pub use context::*;
pub use dispatcher::*;
pub use error::*;
pub use message::*;
pub use time::*;
pub use timer::*;

pub use host_api;
