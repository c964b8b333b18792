// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for turning a fire decision into an actual
//! child process, using `tokio::process::Command`, and reporting back to the
//! engine runtime via `RuntimeEvent`s.
//!
//! - [`template`] renders the configured command string for a triggering
//!   event (`{path}` / `{event}` substitution).
//! - [`command`] owns the process lifecycle: shell spawn, busy tracking,
//!   forced termination, exit reporting.

pub mod command;
pub mod template;

pub use command::{ProcessRunner, RunExit};
pub use template::CommandTemplate;
