// src/lib.rs

pub mod cli;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod watch;

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::engine::{Coalescer, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::{CommandTemplate, ProcessRunner};
use crate::watch::{spawn_watcher, WatchProfile};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - glob pattern compilation
/// - file watcher
/// - coalescer / runner / runtime
/// - Ctrl-C handling
///
/// Errors returned here are fatal setup failures (bad glob, watcher init);
/// once the runtime is looping, nothing short of a shutdown request ends the
/// session.
pub async fn run(args: CliArgs) -> Result<()> {
    let profile = WatchProfile::build(&args.patterns)?;
    let template = CommandTemplate::new(&args.command);
    let root = std::env::current_dir().context("resolving current working directory")?;

    // Runtime event channel: watcher, executor and the signal handler all
    // feed this one stream.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let _watcher_handle = spawn_watcher(root, profile, rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(
        patterns = ?args.patterns,
        debounce_ms = args.debounce,
        throttle_ms = args.throttle,
        "watch session starting"
    );

    let coalescer = Coalescer::new(
        Duration::from_millis(args.debounce),
        Duration::from_millis(args.throttle),
    );
    let runner = ProcessRunner::new(rt_tx.clone());
    let options = RuntimeOptions {
        initial_run: args.initial,
        kill_timeout: Duration::from_millis(args.kill_timeout),
    };

    let runtime = Runtime::new(coalescer, template, runner, options, rt_rx);
    runtime.run().await
}
