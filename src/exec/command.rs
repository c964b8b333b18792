// src/exec/command.rs

use std::process::ExitStatus;

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::engine::RuntimeEvent;

/// Resolved result of a command run.
///
/// Exactly one of these is delivered per `start`, whether the child exited
/// normally, died on a signal, was force-killed, or never spawned at all
/// (synthetic exit code -1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunExit {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl RunExit {
    /// Synthetic status for a command that could not be spawned.
    pub const SPAWN_FAILURE: RunExit = RunExit {
        code: Some(-1),
        signal: None,
    };

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        RunExit {
            code: status.code(),
            signal,
        }
    }
}

/// Spawns the configured command through the host shell and reports
/// completion back to the runtime.
///
/// At most one child is in flight at a time: the runtime checks `is_busy()`
/// before calling `start` and queues the fire otherwise. `busy` stays true
/// until the runtime acknowledges the `RunCompleted` event, so the busy
/// window exactly brackets the child's lifetime as the runtime observes it.
#[derive(Debug)]
pub struct ProcessRunner {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    kill_tx: Option<oneshot::Sender<()>>,
    busy: bool,
}

impl ProcessRunner {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            kill_tx: None,
            busy: false,
        }
    }

    /// True between `start` and the runtime acknowledging completion.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Spawn `command_line` through the host shell.
    ///
    /// Must not be called while busy; a fire arriving then is the runtime's
    /// to queue, not ours to run.
    pub fn start(&mut self, command_line: String) {
        debug_assert!(!self.busy, "start called while a run is in flight");

        let (kill_tx, kill_rx) = oneshot::channel();
        self.kill_tx = Some(kill_tx);
        self.busy = true;

        let runtime_tx = self.runtime_tx.clone();
        tokio::spawn(async move {
            run_child(command_line, kill_rx, runtime_tx).await;
        });
    }

    /// Force-terminate the in-flight child, if any.
    ///
    /// Completion is still reported through the normal channel; `busy` stays
    /// true until the runtime acknowledges it.
    pub fn kill(&mut self) {
        if let Some(kill_tx) = self.kill_tx.take() {
            let _ = kill_tx.send(());
        }
    }

    /// Called by the runtime when it has consumed the `RunCompleted` event.
    pub fn acknowledge_exit(&mut self) {
        self.busy = false;
        self.kill_tx = None;
    }
}

/// Run one child process to completion and deliver its `RunExit`.
///
/// Spawn failure is reported as a completed run with a synthetic non-zero
/// status; the watch session must survive a missing shell or unrunnable
/// command.
async fn run_child(
    command_line: String,
    kill_rx: oneshot::Receiver<()>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(command = %command_line, "starting command process");

    let exit = match spawn_shell(&command_line) {
        Ok(child) => wait_child(child, kill_rx).await,
        Err(err) => {
            error!(command = %command_line, error = %err, "failed to spawn command shell");
            RunExit::SPAWN_FAILURE
        }
    };

    debug!(code = ?exit.code, signal = ?exit.signal, "command process finished");

    if runtime_tx
        .send(RuntimeEvent::RunCompleted(exit))
        .await
        .is_err()
    {
        warn!("runtime channel closed before run completion could be reported");
    }
}

/// Build and spawn a shell command appropriate for the platform, so the
/// configured template may itself contain shell syntax (pipes, redirects).
fn spawn_shell(command_line: &str) -> std::io::Result<Child> {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    };

    // Backstop: if the runner task is ever dropped mid-run, don't leak the child.
    cmd.kill_on_drop(true);
    cmd.spawn()
}

/// Wait for the child to exit, honoring a kill request.
async fn wait_child(mut child: Child, mut kill_rx: oneshot::Receiver<()>) -> RunExit {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => RunExit::from_status(status),
            Err(err) => {
                error!(error = %err, "waiting for command process failed");
                RunExit::SPAWN_FAILURE
            }
        },
        _ = &mut kill_rx => {
            warn!("force-killing command process");
            if let Err(err) = child.start_kill() {
                warn!(error = %err, "kill failed (process may have already exited)");
            }
            match child.wait().await {
                Ok(status) => RunExit::from_status(status),
                Err(err) => {
                    error!(error = %err, "waiting for killed command process failed");
                    RunExit::SPAWN_FAILURE
                }
            }
        }
    }
}
