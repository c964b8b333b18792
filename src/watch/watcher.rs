// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::watch::event::{map_event_kind, RawEvent};
use crate::watch::patterns::WatchProfile;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and forwards
/// a `RuntimeEvent::PathChanged` for every change matching `profile`.
///
/// - `root` is the directory against which all glob patterns are evaluated.
/// - `runtime_tx` is the channel into the engine runtime.
///
/// Failing to start watching the root at all is fatal; errors reported by
/// notify after startup are logged and the session keeps watching.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profile: WatchProfile,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("watchrun: runtime gone, dropping change notification");
                }
            }
            Err(err) => {
                eprintln!("watchrun: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("starting file watch on {root:?}"))?;

    info!(
        patterns = profile.pattern_count(),
        "file watcher started on {:?}", root
    );

    // Async task that filters notify events and forwards changes to the runtime.
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("received notify event: {:?}", event);

            let Some(kind) = map_event_kind(&event.kind) else {
                continue;
            };

            for path in &event.paths {
                let Some(rel_str) = relative_str(&root, path) else {
                    warn!(
                        "could not relativize path {:?} against root {:?}",
                        path, root
                    );
                    continue;
                };

                if !profile.matches(&rel_str) {
                    continue;
                }

                debug!(path = %rel_str, %kind, "watch match -> forwarding change");

                let raw = RawEvent {
                    kind,
                    path: PathBuf::from(rel_str),
                    at: Instant::now(),
                };

                if runtime_tx
                    .send(RuntimeEvent::PathChanged(raw))
                    .await
                    .is_err()
                {
                    // If the runtime channel is closed, there's no point
                    // keeping the watcher loop alive.
                    warn!("runtime channel closed; stopping watch forwarding");
                    return;
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root` and cannot be relativized.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}
