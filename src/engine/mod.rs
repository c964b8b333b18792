// src/engine/mod.rs

//! Change-coalescing and dispatch engine for watchrun.
//!
//! This module ties together:
//! - the coalescer (debounce/throttle windows over the raw change stream)
//! - the run state (what happens when a fire arrives while a run is active)
//! - the main runtime event loop that reacts to:
//!   - filesystem changes
//!   - window deadlines
//!   - command completion events
//!   - shutdown signals

pub mod coalesce;
pub mod runtime;

pub use coalesce::Coalescer;
pub use runtime::{RunState, Runtime, RuntimeEvent, RuntimeOptions};
