// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scan gate state machine

use barcode_scanner::scanner::{AcceptOutcome, DetectionEvent, RegionOfInterest, ScanGate};
use std::time::{Duration, Instant};

fn at(base: Instant, millis: u64) -> Instant {
    base + Duration::from_millis(millis)
}

fn accepted(payload: &str) -> AcceptOutcome {
    AcceptOutcome::Accepted(payload.to_string())
}

#[test]
fn test_result_displayed_for_full_cool_down() {
    let t0 = Instant::now();
    let mut gate = ScanGate::default();

    assert_eq!(gate.accept(DetectionEvent::new("ABC123", t0)), accepted("ABC123"));
    assert!(!gate.is_scanning());

    // Non-null for every instant in [T, T + cool-down)
    for millis in [0, 1, 2_500, 4_900, 4_999] {
        gate.tick_cool_down(at(t0, millis));
        assert_eq!(gate.current_result(), Some("ABC123"), "at {}ms", millis);
    }

    gate.tick_cool_down(at(t0, 5_000));
    assert_eq!(gate.current_result(), None);
    assert!(gate.is_scanning());
}

#[test]
fn test_same_instant_burst_accepts_first_only() {
    let t0 = Instant::now();
    let mut gate = ScanGate::default();

    assert_eq!(gate.accept(DetectionEvent::new("A", t0)), accepted("A"));
    assert_eq!(gate.accept(DetectionEvent::new("B", t0)), AcceptOutcome::Ignored);
    assert_eq!(gate.current_result(), Some("A"));
}

#[test]
fn test_burst_of_many_detections() {
    let t0 = Instant::now();
    let mut gate = ScanGate::default();
    let burst: Vec<_> = (0..50)
        .map(|i| DetectionEvent::new(format!("code-{}", i), t0))
        .collect();

    let outcomes = gate.accept_batch(burst);
    let accepted_count = outcomes.iter().filter(|o| o.is_accepted()).count();
    assert_eq!(accepted_count, 1);
    assert_eq!(outcomes[0], accepted("code-0"));
}

#[test]
fn test_late_stale_tick_after_reset() {
    let t0 = Instant::now();
    let mut gate = ScanGate::default();
    gate.accept(DetectionEvent::new("A", t0));
    let timer = gate.pending_timer().expect("cool-down scheduled");

    gate.reset();
    assert!(gate.is_scanning());
    assert_eq!(gate.current_result(), None);

    // Stale timer delivered at t=5
    assert!(!gate.expire(timer, at(t0, 5_000)));
    assert!(!gate.tick_cool_down(at(t0, 5_000)));
    assert!(gate.is_scanning());
    assert_eq!(gate.current_result(), None);
}

#[test]
fn test_accept_shortly_after_expiry() {
    let t0 = Instant::now();
    let mut gate = ScanGate::default();
    gate.accept(DetectionEvent::new("X", t0));
    assert!(gate.tick_cool_down(at(t0, 5_000)));

    assert_eq!(gate.accept(DetectionEvent::new("Y", at(t0, 5_010))), accepted("Y"));
}

#[test]
fn test_result_and_deadline_move_together() {
    let t0 = Instant::now();
    let mut gate = ScanGate::default();
    let check = |gate: &ScanGate| {
        assert_eq!(gate.current_result().is_some(), !gate.is_scanning());
        assert_eq!(gate.cool_down_deadline().is_some(), !gate.is_scanning());
    };

    check(&gate);
    gate.accept(DetectionEvent::new("A", t0));
    check(&gate);
    gate.accept(DetectionEvent::new("B", at(t0, 10)));
    check(&gate);
    gate.tick_cool_down(at(t0, 6_000));
    check(&gate);
    gate.accept(DetectionEvent::new("C", at(t0, 7_000)));
    gate.reset();
    check(&gate);
}

#[test]
fn test_region_of_interest_reference_values() {
    let region = RegionOfInterest::default();
    assert_eq!((region.x, region.y), (0.35, 0.35));
    assert_eq!((region.width, region.height), (0.3, 0.3));
}
