//! End-to-end walk through the coordinator lifecycle
//!
//! Uses a 10 minute start interval with a 2 minute ceiling, so every grown
//! window is pinned to the ceiling from the first increment on.

use rstest::*;
use shared_backoff::prelude::*;
use std::time::Duration;

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

#[fixture]
fn clock() -> ManualClock {
    ManualClock::new()
}

fn coordinator(clock: &ManualClock) -> BackoffCoordinator<ManualClock> {
    let intervals = BackoffIntervals::new(minutes(10), 2.0, minutes(2)).unwrap();
    BackoffCoordinator::with_clock(intervals, clock.clone())
}

fn elapse(coordinator: &BackoffCoordinator<ManualClock>, clock: &ManualClock) {
    let remaining = coordinator.remaining().expect("coordinator should be backing off");
    clock.advance(remaining + Duration::from_millis(10));
}

#[rstest]
fn test_full_scenario(clock: ManualClock) {
    let coordinator = coordinator(&clock);

    // 1. failure from idle opens the start window
    let (proceed, token) = coordinator.can_proceed();
    assert!(proceed);
    assert!(!token.is_authorized());
    coordinator.backoff(token);
    assert_eq!(coordinator.remaining(), Some(minutes(10)));
    assert_eq!(coordinator.increments(), 0);

    // 2. callers before the deadline are refused
    let (proceed, token) = coordinator.can_proceed();
    assert!(!proceed);
    assert!(!token.is_authorized());

    // 3. the first caller after the deadline is authorized
    elapse(&coordinator, &clock);
    let (proceed, token) = coordinator.can_proceed();
    assert!(proceed);
    assert!(token.is_authorized());

    // 4. its failure grows the window, capped at the ceiling
    coordinator.backoff(token);
    assert_eq!(coordinator.increments(), 1);
    assert_eq!(coordinator.remaining(), Some(minutes(2)));

    // 5. repeated epochs keep counting while the window stays pinned
    for expected in 2..=50u64 {
        elapse(&coordinator, &clock);
        let (proceed, token) = coordinator.can_proceed();
        assert!(proceed);
        assert!(token.is_authorized());

        coordinator.backoff(token);
        assert_eq!(coordinator.increments(), expected);
        assert_eq!(coordinator.remaining(), Some(minutes(2)));
    }
    assert_eq!(coordinator.increments(), 50);
}

#[rstest]
#[case(1)]
#[case(5)]
#[case(100)]
fn test_refused_callers_share_the_epoch(clock: ManualClock, #[case] callers: usize) {
    let coordinator = coordinator(&clock);

    let (_, token) = coordinator.can_proceed();
    let epoch = token.epoch();
    coordinator.backoff(token);

    for _ in 0..callers {
        let (proceed, token) = coordinator.can_proceed();
        assert!(!proceed);
        assert!(!token.is_authorized());
        assert_eq!(token.epoch(), epoch);
        coordinator.backoff(token);
    }

    assert_eq!(coordinator.increments(), 0);
    assert_eq!(coordinator.remaining(), Some(minutes(10)));
}

#[rstest]
#[case(Duration::from_secs(1), 2.0, Duration::from_secs(60), &[2, 2, 4, 6, 8, 10])]
#[case(Duration::from_secs(1), 3.0, Duration::from_secs(10), &[3, 3, 6, 9, 10, 10])]
#[case(Duration::from_secs(2), 1.0, Duration::from_secs(5), &[2, 2, 4, 5, 5, 5])]
fn test_grown_windows(
    clock: ManualClock,
    #[case] start: Duration,
    #[case] multiplier: f64,
    #[case] max: Duration,
    #[case] expected_secs: &[u64],
) {
    let intervals = BackoffIntervals::new(start, multiplier, max).unwrap();
    let coordinator = BackoffCoordinator::with_clock(intervals, clock.clone());

    let (_, token) = coordinator.can_proceed();
    coordinator.backoff(token);
    assert_eq!(coordinator.remaining(), Some(start));

    for &secs in expected_secs {
        elapse(&coordinator, &clock);
        let (_, token) = coordinator.can_proceed();
        assert!(token.is_authorized());
        coordinator.backoff(token);

        assert_eq!(coordinator.remaining(), Some(Duration::from_secs(secs)));
    }
}

#[rstest]
fn test_unreported_authorized_token_returns_to_idle(clock: ManualClock) {
    let coordinator = coordinator(&clock);

    let (_, token) = coordinator.can_proceed();
    coordinator.backoff(token);
    elapse(&coordinator, &clock);

    // the attempt succeeded; the authorized token is simply dropped
    let (proceed, token) = coordinator.can_proceed();
    assert!(proceed);
    assert!(token.is_authorized());
    drop(token);

    assert!(!coordinator.is_backing_off());
    assert!(coordinator.can_proceed().0);
}

#[test]
fn test_system_clock_window_elapses() {
    let intervals =
        BackoffIntervals::new(Duration::from_millis(20), 2.0, Duration::from_secs(1)).unwrap();
    let coordinator = BackoffCoordinator::new(intervals);

    let (_, token) = coordinator.can_proceed();
    coordinator.backoff(token);
    assert!(!coordinator.can_proceed().0);

    std::thread::sleep(Duration::from_millis(40));

    let (proceed, token) = coordinator.can_proceed();
    assert!(proceed);
    assert!(token.is_authorized());
}
