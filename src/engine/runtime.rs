// src/engine/runtime.rs

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::coalesce::Coalescer;
use crate::exec::command::{ProcessRunner, RunExit};
use crate::exec::template::CommandTemplate;
use crate::watch::event::RawEvent;

/// Events sent into the runtime from watchers, the executor, or external
/// signals.
///
/// The idea is that:
/// - the watcher sends `PathChanged`
/// - the executor sends `RunCompleted`
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    PathChanged(RawEvent),
    RunCompleted(RunExit),
    ShutdownRequested,
}

/// Options that influence how the runtime behaves.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Run the command once at startup, before any change is observed.
    pub initial_run: bool,
    /// How long shutdown waits for an in-flight command before killing it.
    pub kill_timeout: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            initial_run: false,
            kill_timeout: Duration::from_millis(5_000),
        }
    }
}

/// Dispatch state for the watched command.
///
/// A fire arriving while a run is in flight is remembered here and replayed
/// once, after completion. Only the newest such fire survives; intermediates
/// are superseded, not replayed.
#[derive(Debug, Default)]
pub struct RunState {
    queued: Option<RawEvent>,
}

impl RunState {
    /// Remember a fire that arrived while the runner was busy
    /// (last-write-wins).
    pub fn record_while_busy(&mut self, event: RawEvent) {
        if let Some(old) = self.queued.replace(event) {
            debug!(superseded = %old.path.display(), "queued event superseded by newer fire");
        }
    }

    /// Take the queued fire, if any, leaving the state empty.
    pub fn take_queued(&mut self) -> Option<RawEvent> {
        self.queued.take()
    }

    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }
}

/// The watch-session runtime.
///
/// Serializes the three asynchronous inputs (raw changes, coalescer
/// deadlines, run completions) onto one decision path, so no locking is
/// needed: all mutation of the coalescer and `RunState` happens inside
/// [`run`](Self::run).
pub struct Runtime {
    coalescer: Coalescer,
    template: CommandTemplate,
    runner: ProcessRunner,
    state: RunState,
    options: RuntimeOptions,

    /// Unified event stream from all producers (watcher, executor, signal
    /// handler).
    events_rx: mpsc::Receiver<RuntimeEvent>,
}

impl Runtime {
    pub fn new(
        coalescer: Coalescer,
        template: CommandTemplate,
        runner: ProcessRunner,
        options: RuntimeOptions,
        events_rx: mpsc::Receiver<RuntimeEvent>,
    ) -> Self {
        Self {
            coalescer,
            template,
            runner,
            state: RunState::default(),
            options,
            events_rx,
        }
    }

    /// Main event loop.
    ///
    /// Runs until a shutdown is requested or every event sender is gone.
    /// Fires dispatch in the order their windows close; the `biased` select
    /// polls the pending deadline before new events, which is what makes the
    /// coalescer's expiry tie-break rule hold end to end.
    pub async fn run(mut self) -> Result<()> {
        info!("watchrun runtime started");

        if self.options.initial_run {
            info!("running command once at startup");
            self.dispatch(None);
        }

        loop {
            let deadline = self.coalescer.next_deadline();

            tokio::select! {
                biased;

                _ = wake_at(deadline), if deadline.is_some() => {
                    if let Some(fire) = self.coalescer.on_deadline(Instant::now()) {
                        self.handle_fire(fire);
                    }
                }

                maybe_event = self.events_rx.recv() => {
                    let Some(event) = maybe_event else {
                        debug!("runtime channel closed");
                        break;
                    };

                    match event {
                        RuntimeEvent::PathChanged(raw) => {
                            debug!(path = %raw.path.display(), kind = %raw.kind, "change observed");
                            self.coalescer.observe(raw);
                        }
                        RuntimeEvent::RunCompleted(exit) => self.handle_completion(exit),
                        RuntimeEvent::ShutdownRequested => {
                            info!("shutdown requested, stopping runtime");
                            self.shutdown().await;
                            break;
                        }
                    }
                }
            }
        }

        info!("watchrun runtime exiting");
        Ok(())
    }

    /// Act on a fire decision from the coalescer.
    fn handle_fire(&mut self, event: RawEvent) {
        if self.runner.is_busy() {
            debug!(path = %event.path.display(), "run in flight; queueing latest fire");
            self.state.record_while_busy(event);
            return;
        }
        self.dispatch(Some(event));
    }

    /// Render the template and start the run. Callers have already
    /// established that the runner is idle.
    fn dispatch(&mut self, event: Option<RawEvent>) {
        let command_line = self.template.render(event.as_ref());
        match &event {
            Some(ev) => info!(
                command = %command_line,
                path = %ev.path.display(),
                kind = %ev.kind,
                "dispatching command"
            ),
            None => info!(command = %command_line, "dispatching startup run"),
        }
        self.runner.start(command_line);
    }

    /// Handle completion of a command run.
    ///
    /// The watched command's result never ends the session; a failure is
    /// reported and watching continues.
    fn handle_completion(&mut self, exit: RunExit) {
        self.runner.acknowledge_exit();

        if exit.success() {
            info!("command completed successfully");
        } else {
            warn!(code = ?exit.code, signal = ?exit.signal, "command failed");
        }

        if let Some(next) = self.state.take_queued() {
            debug!(path = %next.path.display(), "dispatching queued fire after completion");
            self.handle_fire(next);
        }
    }

    /// Wind down the session.
    ///
    /// Pending windows die with the runtime. An in-flight command is given
    /// `kill_timeout` to finish on its own, then force-killed; either way we
    /// keep draining the channel until its completion is observed.
    async fn shutdown(&mut self) {
        if !self.runner.is_busy() {
            return;
        }

        info!(
            grace_ms = self.options.kill_timeout.as_millis() as u64,
            "waiting for in-flight command before exit"
        );

        let mut deadline = Instant::now() + self.options.kill_timeout;
        let mut killed = false;

        while self.runner.is_busy() {
            match tokio::time::timeout_at(deadline, self.events_rx.recv()).await {
                Ok(Some(RuntimeEvent::RunCompleted(exit))) => {
                    self.runner.acknowledge_exit();
                    info!(code = ?exit.code, signal = ?exit.signal, "in-flight command finished");
                }
                // Late changes are irrelevant once shutdown has begun.
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(_) => {
                    if killed {
                        warn!("killed command did not report completion; giving up");
                        break;
                    }
                    warn!("grace period elapsed; killing in-flight command");
                    self.runner.kill();
                    killed = true;
                    deadline = Instant::now() + Duration::from_secs(1);
                }
            }
        }
    }
}

/// Sleep until `deadline`; pending forever when there is none.
///
/// Split out so the select arm stays readable; the `if deadline.is_some()`
/// guard on the arm means the pending branch is never actually awaited.
async fn wake_at(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
