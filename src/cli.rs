// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! NOTE: this expects `clap` to be built with the `derive` feature, e.g.:
//! `clap = { version = "4.5.53", features = ["derive"] }` in `Cargo.toml`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Run a shell command when watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Glob patterns selecting the paths to watch, relative to the current
    /// working directory (e.g. `src/**/*.rs`).
    #[arg(value_name = "PATTERN", required = true)]
    pub patterns: Vec<String>,

    /// Shell command to run when a change fires.
    ///
    /// `{path}` and `{event}` in the template are replaced with the
    /// triggering path and event kind (add, change, unlink, addDir,
    /// unlinkDir).
    #[arg(short, long, value_name = "TEMPLATE")]
    pub command: String,

    /// Milliseconds of quiet required after a change before the command runs.
    ///
    /// A burst of changes closer together than this runs the command once,
    /// for the last change of the burst. `0` runs on every change.
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub debounce: u64,

    /// Minimum milliseconds between consecutive runs.
    ///
    /// Changes arriving inside the window are coalesced into one run at the
    /// end of it. `0` disables throttling.
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub throttle: u64,

    /// Run the command once at startup, before any change is observed.
    ///
    /// The startup run has no triggering event; placeholders are left as-is.
    #[arg(long)]
    pub initial: bool,

    /// Grace period in milliseconds granted to an in-flight command on
    /// shutdown before it is force-killed.
    #[arg(long, value_name = "MS", default_value_t = 5_000)]
    pub kill_timeout: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
