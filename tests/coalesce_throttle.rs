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
async fn throttle_coalesces_second_write_to_window_end() -> TestResult {
    // debounce=0, throttle=300: write at t=0 fires at once, a write at t=50
    // is held and fires at t=300, nothing in between.
    let mut c = Coalescer::new(Duration::ZERO, ms(300));
    let t0 = Instant::now();

    c.observe(change("a.js", t0));
    let fired = c.on_deadline(t0).expect("first write fires immediately");
    assert_eq!(fired.path, PathBuf::from("a.js"));

    c.observe(change("b.js", t0 + ms(50)));
    assert_eq!(c.next_deadline(), Some(t0 + ms(300)));
    assert!(c.on_deadline(t0 + ms(200)).is_none());

    let fired = c.on_deadline(t0 + ms(300)).expect("held write fires at window end");
    assert_eq!(fired.path, PathBuf::from("b.js"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn fires_are_spaced_at_least_one_throttle_window_apart() -> TestResult {
    let mut c = Coalescer::new(Duration::ZERO, ms(300));
    let t0 = Instant::now();

    // Events every 100ms for a full second.
    let mut fires: Vec<(Instant, PathBuf)> = Vec::new();
    for i in 0..10 {
        let at = t0 + ms(i * 100);
        if let Some(ev) = c.on_deadline(at) {
            fires.push((at, ev.path));
        }
        c.observe(change(&format!("f{i}.rs"), at));
        if let Some(ev) = c.on_deadline(at) {
            fires.push((at, ev.path));
        }
    }
    if let Some(ev) = c.on_deadline(t0 + ms(1200)) {
        fires.push((t0 + ms(1200), ev.path));
    }

    for pair in fires.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= ms(300), "fires closer than the throttle window");
    }
    // 0ms, 300ms, 600ms, 900ms, then the tail event held at 900ms.
    assert_eq!(fires.len(), 5);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn held_event_is_last_write_wins() -> TestResult {
    let mut c = Coalescer::new(Duration::ZERO, ms(300));
    let t0 = Instant::now();

    c.observe(change("first.rs", t0));
    c.on_deadline(t0).expect("opens the throttle window");

    c.observe(change("mid.rs", t0 + ms(100)));
    c.observe(change("late.rs", t0 + ms(250)));

    let fired = c.on_deadline(t0 + ms(300)).expect("window end fires");
    assert_eq!(fired.path, PathBuf::from("late.rs"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn empty_throttle_window_lapses_to_idle() -> TestResult {
    let mut c = Coalescer::new(Duration::ZERO, ms(300));
    let t0 = Instant::now();

    c.observe(change("only.rs", t0));
    c.on_deadline(t0).expect("fires");

    // Nothing arrived during the window: no fire, and the next event after
    // expiry starts a fresh burst instead of being held.
    assert!(c.on_deadline(t0 + ms(300)).is_none());
    c.observe(change("next.rs", t0 + ms(500)));
    let fired = c.on_deadline(t0 + ms(500)).expect("fresh burst fires");
    assert_eq!(fired.path, PathBuf::from("next.rs"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn debounce_delays_first_fire_throttle_spaces_the_rest() -> TestResult {
    let mut c = Coalescer::new(ms(100), ms(300));
    let t0 = Instant::now();

    // Burst: the debounce window governs the first fire.
    c.observe(change("a.rs", t0));
    c.observe(change("b.rs", t0 + ms(50)));
    assert!(c.on_deadline(t0 + ms(100)).is_none());
    let fired = c.on_deadline(t0 + ms(150)).expect("debounce closes");
    assert_eq!(fired.path, PathBuf::from("b.rs"));

    // Events during the throttle window are held, not debounced again.
    c.observe(change("c.rs", t0 + ms(200)));
    c.observe(change("d.rs", t0 + ms(250)));
    assert_eq!(c.next_deadline(), Some(t0 + ms(450)));

    let fired = c.on_deadline(t0 + ms(450)).expect("throttle closes");
    assert_eq!(fired.path, PathBuf::from("d.rs"));

    Ok(())
}
