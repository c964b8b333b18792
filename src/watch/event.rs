// src/watch/event.rs

use std::fmt;
use std::path::PathBuf;

use notify::event::{CreateKind, EventKind, RemoveKind};
use tokio::time::Instant;
use tracing::debug;

/// Kind of filesystem change, as exposed to command templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Add,
    Change,
    Unlink,
    AddDir,
    UnlinkDir,
}

impl PathKind {
    /// Canonical name substituted for `{event}` in command templates.
    pub fn as_str(self) -> &'static str {
        match self {
            PathKind::Add => "add",
            PathKind::Change => "change",
            PathKind::Unlink => "unlink",
            PathKind::AddDir => "addDir",
            PathKind::UnlinkDir => "unlinkDir",
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single filesystem change as seen by the engine.
///
/// `path` is relative to the watch root. `at` is the instant the change was
/// observed; the coalescer uses it as the event's position in time, so fake
/// instants can be fed in under a paused clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: PathKind,
    pub path: PathBuf,
    pub at: Instant,
}

impl RawEvent {
    pub fn new(kind: PathKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            at: Instant::now(),
        }
    }
}

/// Map a notify event kind onto our change taxonomy.
///
/// Returns `None` for kinds the engine has no use for (access notifications
/// and the catch-all variants); those are dropped here with a diagnostic and
/// never reach the coalescer. Renames arrive as `Modify(Name(..))` and map to
/// `Change` for both halves, since the two sides cannot be paired reliably.
pub fn map_event_kind(kind: &EventKind) -> Option<PathKind> {
    match kind {
        EventKind::Create(CreateKind::Folder) => Some(PathKind::AddDir),
        EventKind::Create(_) => Some(PathKind::Add),
        EventKind::Modify(_) => Some(PathKind::Change),
        EventKind::Remove(RemoveKind::Folder) => Some(PathKind::UnlinkDir),
        EventKind::Remove(_) => Some(PathKind::Unlink),
        other => {
            debug!(kind = ?other, "dropping change notification with unrecognized kind");
            None
        }
    }
}
