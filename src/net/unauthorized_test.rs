use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&hits);
    (hits, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn notify_without_listener_is_noop() {
    let signal = UnauthorizedSignal::new();
    assert!(!signal.has_listener());
    assert!(!signal.notify());
}

#[test]
fn notify_invokes_listener_each_time() {
    let signal = UnauthorizedSignal::new();
    let (hits, listener) = counter();
    signal.set_listener(listener);

    for _ in 0..5 {
        assert!(signal.notify());
    }
    assert_eq!(hits.load(Ordering::SeqCst), 5);
}

#[test]
fn last_registration_wins() {
    let signal = UnauthorizedSignal::new();
    let (first, first_listener) = counter();
    let (second, second_listener) = counter();

    assert!(!signal.set_listener(first_listener));
    assert!(signal.set_listener(second_listener));
    signal.notify();

    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn clear_listener_stops_delivery() {
    let signal = UnauthorizedSignal::new();
    let (hits, listener) = counter();
    signal.set_listener(listener);
    signal.clear_listener();

    assert!(!signal.notify());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn clones_share_the_slot() {
    let signal = UnauthorizedSignal::new();
    let handle = signal.clone();
    let (hits, listener) = counter();
    handle.set_listener(listener);

    signal.notify();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn listener_may_clear_slot_while_running() {
    let signal = UnauthorizedSignal::new();
    let inner = signal.clone();
    signal.set_listener(move || inner.clear_listener());

    assert!(signal.notify());
    assert!(!signal.has_listener());
}
