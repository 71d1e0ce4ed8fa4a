use super::*;

const MS: Duration = Duration::from_millis(1);

#[test]
fn unarmed_timer_never_fires() {
    let mut timer = OneShot::default();
    assert!(!timer.is_armed());
    assert!(!timer.poll(Instant::now()));
}

#[test]
fn fires_at_deadline_and_not_before() {
    let t0 = Instant::now();
    let mut timer = OneShot::default();
    timer.arm(t0, 2000 * MS);
    assert!(!timer.poll(t0 + 1999 * MS));
    assert!(timer.poll(t0 + 2000 * MS));
}

#[test]
fn fires_only_once() {
    let t0 = Instant::now();
    let mut timer = OneShot::default();
    timer.arm(t0, 10 * MS);
    assert!(timer.poll(t0 + 50 * MS));
    assert!(!timer.poll(t0 + 60 * MS));
    assert!(!timer.is_armed());
}

#[test]
fn rearm_replaces_deadline() {
    let t0 = Instant::now();
    let mut timer = OneShot::default();
    timer.arm(t0, 100 * MS);
    timer.arm(t0 + 80 * MS, 100 * MS);
    assert_eq!(timer.deadline(), Some(t0 + 180 * MS));
    assert!(!timer.poll(t0 + 120 * MS));
    assert!(timer.poll(t0 + 180 * MS));
}

#[test]
fn cancel_disarms() {
    let t0 = Instant::now();
    let mut timer = OneShot::default();
    timer.arm(t0, 10 * MS);
    timer.cancel();
    assert!(timer.deadline().is_none());
    assert!(!timer.poll(t0 + 20 * MS));
}
