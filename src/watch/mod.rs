// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the CLI glob patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Mapping raw notify events onto the engine's change taxonomy.
//!
//! It does **not** know about debounce/throttle timing or command dispatch;
//! it only turns filesystem changes into `RawEvent`s for the engine.

pub mod event;
pub mod patterns;
pub mod watcher;

pub use event::{map_event_kind, PathKind, RawEvent};
pub use patterns::WatchProfile;
pub use watcher::{spawn_watcher, WatcherHandle};
