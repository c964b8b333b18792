use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

use watchrun::engine::Coalescer;
use watchrun::watch::{PathKind, RawEvent};

type TestResult = Result<(), Box<dyn Error>>;

fn change(path: &str, at: Instant) -> RawEvent {
    RawEvent {
        kind: PathKind::Change,
        path: PathBuf::from(path),
        at,
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[tokio::test(start_paused = true)]
async fn burst_within_debounce_fires_once_with_last_event() -> TestResult {
    let mut c = Coalescer::new(ms(200), Duration::ZERO);
    let t0 = Instant::now();

    c.observe(change("a.js", t0));
    c.observe(change("b.js", t0 + ms(50)));
    c.observe(change("c.js", t0 + ms(120)));

    // Each event re-arms the window: the deadline tracks the last event.
    assert_eq!(c.next_deadline(), Some(t0 + ms(320)));
    assert!(c.on_deadline(t0 + ms(300)).is_none());

    let fired = c.on_deadline(t0 + ms(320)).expect("burst must fire");
    assert_eq!(fired.path, PathBuf::from("c.js"));
    assert!(c.is_idle());
    assert_eq!(c.next_deadline(), None);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn single_write_fires_at_debounce_not_before() -> TestResult {
    let mut c = Coalescer::new(ms(200), Duration::ZERO);
    let t0 = Instant::now();

    c.observe(change("src/lib.rs", t0));

    assert!(c.on_deadline(t0 + ms(199)).is_none());
    let fired = c.on_deadline(t0 + ms(200)).expect("fire at the deadline");
    assert_eq!(fired.path, PathBuf::from("src/lib.rs"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn zero_debounce_fires_immediately_per_event() -> TestResult {
    let mut c = Coalescer::new(Duration::ZERO, Duration::ZERO);
    let t0 = Instant::now();

    c.observe(change("a.js", t0));
    assert_eq!(c.next_deadline(), Some(t0));
    let fired = c.on_deadline(t0).expect("zero debounce fires at once");
    assert_eq!(fired.path, PathBuf::from("a.js"));

    c.observe(change("b.js", t0 + ms(10)));
    let fired = c.on_deadline(t0 + ms(10)).expect("each event fires");
    assert_eq!(fired.path, PathBuf::from("b.js"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn event_at_exact_expiry_starts_a_new_window() -> TestResult {
    let mut c = Coalescer::new(ms(100), Duration::ZERO);
    let t0 = Instant::now();

    c.observe(change("a.js", t0));

    // Deadlines are polled before events: the window closes first.
    let fired = c.on_deadline(t0 + ms(100)).expect("window closes");
    assert_eq!(fired.path, PathBuf::from("a.js"));

    // The event landing at the exact expiry instant opens a fresh window.
    c.observe(change("b.js", t0 + ms(100)));
    assert_eq!(c.next_deadline(), Some(t0 + ms(200)));
    assert!(c.on_deadline(t0 + ms(150)).is_none());

    let fired = c.on_deadline(t0 + ms(200)).expect("new window fires");
    assert_eq!(fired.path, PathBuf::from("b.js"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn every_burst_eventually_fires() -> TestResult {
    let mut c = Coalescer::new(ms(50), Duration::ZERO);
    let mut now = Instant::now();
    let mut fires = 0;

    // Three separated bursts of rapid events.
    for burst in 0..3 {
        for i in 0..10 {
            c.observe(change(&format!("f{burst}-{i}.rs"), now));
            now += ms(5);
        }
        // Quiet period longer than the debounce window.
        now += ms(100);
        if c.on_deadline(now).is_some() {
            fires += 1;
        }
    }

    assert_eq!(fires, 3);
    assert!(c.is_idle());

    Ok(())
}
