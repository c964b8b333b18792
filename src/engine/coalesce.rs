// src/engine/coalesce.rs

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::watch::event::RawEvent;

/// An active debounce window.
///
/// Created on the first event after quiescence, updated on every further
/// event (deadline re-armed, representative replaced), destroyed when the
/// window elapses and a fire is produced.
#[derive(Debug)]
struct PendingBatch {
    first_seen: Instant,
    last_seen: Instant,
    representative: RawEvent,
    deadline: Instant,
}

/// Turns the raw change stream into fire decisions.
///
/// Two independent, composable policies:
///
/// - **Debounce(d)**: after an event, wait `d` of silence before firing; any
///   new event re-arms the wait and becomes the representative. `d == 0`
///   fires on the next loop turn for every event.
/// - **Throttle(t)**: after a fire, suppress further fires for `t`. Events
///   arriving inside the window are held (last-write-wins) and fired once at
///   the end of it, which opens the next window; an empty window just lapses.
///
/// Composed, debounce sets the delay before the first fire of a burst and
/// throttle sets the minimum spacing between subsequent fires; held events
/// are not debounced again.
///
/// The coalescer holds no timers itself. The runtime asks for
/// [`next_deadline`](Self::next_deadline), sleeps until it, and calls
/// [`on_deadline`](Self::on_deadline), so the whole state machine is
/// drivable with fake instants under a paused clock.
///
/// Expiry tie-break, applied everywhere: `on_deadline` treats
/// `now >= deadline` as expired, and the runtime polls deadlines before new
/// events. An event arriving at the exact expiry instant therefore lands in
/// a fresh window.
#[derive(Debug)]
pub struct Coalescer {
    debounce: Duration,
    throttle: Duration,
    batch: Option<PendingBatch>,
    /// End of the currently open throttle window, if any.
    throttle_until: Option<Instant>,
    /// Latest event observed while the throttle window was open.
    held: Option<RawEvent>,
}

impl Coalescer {
    pub fn new(debounce: Duration, throttle: Duration) -> Self {
        Self {
            debounce,
            throttle,
            batch: None,
            throttle_until: None,
            held: None,
        }
    }

    /// True when nothing is pending a fire.
    pub fn is_idle(&self) -> bool {
        self.batch.is_none() && self.held.is_none()
    }

    /// Ingest one raw event, using the event's own `at` as the current
    /// instant.
    pub fn observe(&mut self, event: RawEvent) {
        let now = event.at;

        if let Some(until) = self.throttle_until {
            if now < until {
                debug!(path = %event.path.display(), "throttle window open; holding latest event");
                self.held = Some(event);
                return;
            }
            // The window lapsed without the runtime draining it yet. The new
            // event supersedes anything held (last-write-wins) and starts a
            // fresh burst.
            self.throttle_until = None;
            self.held = None;
        }

        match &mut self.batch {
            Some(batch) => {
                batch.last_seen = now;
                batch.deadline = now + self.debounce;
                batch.representative = event;
                debug!("debounce window re-armed");
            }
            None => {
                debug!(path = %event.path.display(), "opening debounce window");
                self.batch = Some(PendingBatch {
                    first_seen: now,
                    last_seen: now,
                    deadline: now + self.debounce,
                    representative: event,
                });
            }
        }
    }

    /// The instant the runtime must wake at to make the next fire decision,
    /// if anything is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.held.is_some() {
            return self.throttle_until;
        }
        self.batch.as_ref().map(|b| b.deadline)
    }

    /// Evaluate expired windows at `now`, returning the representative event
    /// to fire, if any.
    pub fn on_deadline(&mut self, now: Instant) -> Option<RawEvent> {
        if let Some(until) = self.throttle_until {
            if now < until {
                return None;
            }
            self.throttle_until = None;
            if let Some(event) = self.held.take() {
                self.arm_throttle(now);
                debug!(path = %event.path.display(), "throttle window closed; firing held event");
                return Some(event);
            }
            return None;
        }

        if let Some(batch) = self.batch.take_if(|b| now >= b.deadline) {
            self.arm_throttle(now);
            debug!(
                path = %batch.representative.path.display(),
                burst_ms = (batch.last_seen - batch.first_seen).as_millis() as u64,
                "debounce window closed; firing"
            );
            return Some(batch.representative);
        }

        None
    }

    fn arm_throttle(&mut self, now: Instant) {
        if !self.throttle.is_zero() {
            self.throttle_until = Some(now + self.throttle);
        }
    }
}
