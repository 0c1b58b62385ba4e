// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for session lifecycle
//!
//! All tests run on tokio's paused clock so cool-downs and region delays are
//! exact.

use barcode_scanner::config::{Config, RegionApply};
use barcode_scanner::errors::SessionError;
use barcode_scanner::scanner::{Detection, RegionOfInterest};
use barcode_scanner::session::sources::{CallbackSource, DetectionFeed};
use barcode_scanner::session::{
    AuthorizationStatus, CaptureSource, SessionController, SessionStatus,
};
use std::time::Duration;
use tokio::time::advance;

/// Let spawned tasks (pump, timers, region task) run without moving time
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

fn session(source: CallbackSource) -> SessionController<CallbackSource> {
    SessionController::new(source, Config::default())
}

async fn running_session() -> (SessionController<CallbackSource>, DetectionFeed) {
    let (source, feed) = CallbackSource::new("test-camera");
    let mut session = session(source);
    session.start().await.expect("session starts");
    feed.signal_ready();
    settle().await;
    (session, feed)
}

#[tokio::test(start_paused = true)]
async fn test_start_runs_and_applies_region_on_ready() {
    let (source, feed) = CallbackSource::new("test-camera");
    let mut session = session(source);

    session.start().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Running);
    assert!(session.gate().is_scanning());

    settle().await;
    assert_eq!(feed.region(), None, "region waits for readiness");

    assert!(feed.signal_ready());
    settle().await;
    assert_eq!(feed.region(), Some(RegionOfInterest::default()));
    assert_eq!(session.applied_region(), Some(RegionOfInterest::default()));
}

#[tokio::test(start_paused = true)]
async fn test_fixed_delay_region_application() {
    let (source, feed) = CallbackSource::new("test-camera");
    let config = Config {
        region_of_interest_apply: RegionApply::FixedDelay,
        ..Config::default()
    };
    let mut session = SessionController::new(source, config);
    session.start().await.unwrap();

    advance(Duration::from_millis(999)).await;
    settle().await;
    assert_eq!(feed.region(), None);

    advance(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(feed.region(), Some(RegionOfInterest::default()));
}

#[tokio::test(start_paused = true)]
async fn test_accept_display_and_resume() {
    let (session, feed) = running_session().await;
    let gate = session.gate().clone();

    assert!(feed.deliver_payloads(["ABC123"]));
    settle().await;
    assert!(!gate.is_scanning());
    assert_eq!(gate.current_result().as_deref(), Some("ABC123"));

    advance(Duration::from_millis(4_900)).await;
    settle().await;
    assert_eq!(gate.current_result().as_deref(), Some("ABC123"));

    advance(Duration::from_millis(100)).await;
    settle().await;
    assert!(gate.is_scanning());
    assert_eq!(gate.current_result(), None);

    advance(Duration::from_millis(10)).await;
    assert!(feed.deliver_payloads(["NEXT"]));
    settle().await;
    assert_eq!(gate.current_result().as_deref(), Some("NEXT"));
}

#[tokio::test(start_paused = true)]
async fn test_burst_frames_keep_first_result() {
    let (session, feed) = running_session().await;
    let gate = session.gate().clone();

    feed.deliver(vec![Detection::new("A"), Detection::new("B")]);
    feed.deliver_payloads(["C"]);
    feed.deliver_payloads(Vec::<String>::new());
    settle().await;

    assert_eq!(gate.current_result().as_deref(), Some("A"));
}

#[tokio::test(start_paused = true)]
async fn test_restart_resets_gate_and_ignores_stale_timer() {
    let (mut session, feed) = running_session().await;
    let gate = session.gate().clone();

    feed.deliver_payloads(["A"]);
    settle().await;
    assert_eq!(gate.current_result().as_deref(), Some("A"));

    advance(Duration::from_secs(2)).await;
    session.stop();
    assert_eq!(session.status(), SessionStatus::Stopped);
    session.start().await.unwrap();
    feed.signal_ready();
    settle().await;
    assert!(gate.is_scanning());
    assert_eq!(gate.current_result(), None);

    advance(Duration::from_secs(1)).await;
    feed.deliver_payloads(["B"]);
    settle().await;
    assert_eq!(gate.current_result().as_deref(), Some("B"));

    // The first session's timer fires at t=5 and must leave B alone.
    advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(gate.current_result().as_deref(), Some("B"));

    // B's own cool-down ends at t=8.
    advance(Duration::from_secs(3)).await;
    settle().await;
    assert!(gate.is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_denied_authorization_is_reported() {
    let (source, feed) = CallbackSource::new("test-camera");
    let mut session = session(source.with_authorization(AuthorizationStatus::Denied));
    let status = session.subscribe_status();

    assert_eq!(session.start().await, Err(SessionError::AuthorizationDenied));
    assert_eq!(
        *status.borrow(),
        SessionStatus::Failed(SessionError::AuthorizationDenied)
    );
    assert_eq!(
        session.status().alert(),
        Some(&SessionError::AuthorizationDenied)
    );
    assert!(!feed.deliver_payloads(["A"]));
}

#[tokio::test(start_paused = true)]
async fn test_restricted_authorization_is_denied() {
    let (source, _feed) = CallbackSource::new("test-camera");
    let mut session = session(source.with_authorization(AuthorizationStatus::Restricted));
    assert_eq!(session.start().await, Err(SessionError::AuthorizationDenied));
}

#[tokio::test(start_paused = true)]
async fn test_access_request_granted_and_refused() {
    let (source, _feed) = CallbackSource::new("granted");
    let mut granted = session(source.with_authorization(AuthorizationStatus::NotDetermined));
    granted.start().await.unwrap();
    assert_eq!(
        granted.source().authorization_status(),
        AuthorizationStatus::Authorized
    );

    let (source, _feed) = CallbackSource::new("refused");
    let mut refused = session(
        source
            .with_authorization(AuthorizationStatus::NotDetermined)
            .grant_on_request(false),
    );
    assert_eq!(refused.start().await, Err(SessionError::AuthorizationDenied));
}

#[tokio::test(start_paused = true)]
async fn test_configuration_failure_is_fatal() {
    let (source, _feed) = CallbackSource::new("test-camera");
    let mut session = session(source.unavailable("Unable to access back camera"));

    let err = session.start().await.unwrap_err();
    assert_eq!(
        err,
        SessionError::PipelineConfigurationFailed("Unable to access back camera".to_string())
    );
    assert!(matches!(session.status(), SessionStatus::Failed(_)));
    assert!(!session.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_double_start_is_rejected() {
    let (mut session, _feed) = running_session().await;
    assert_eq!(session.start().await, Err(SessionError::AlreadyRunning));
    assert_eq!(session.status(), SessionStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn test_stop_drops_further_detections() {
    let (mut session, feed) = running_session().await;
    session.stop();

    assert!(!feed.deliver_payloads(["late"]));
    settle().await;
    assert!(session.gate().is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_finished_when_feed_closes() {
    let (mut session, feed) = running_session().await;
    feed.deliver_payloads(["last"]);
    feed.close();

    session.finished().await;
    assert_eq!(session.gate().current_result().as_deref(), Some("last"));
}

#[tokio::test(start_paused = true)]
async fn test_stream_end_stops_session() {
    let (mut session, feed) = running_session().await;
    let mut status = session.subscribe_status();
    feed.deliver_payloads(["A"]);
    feed.close();

    session.finished().await;
    status
        .wait_for(|status| *status == SessionStatus::Stopped)
        .await
        .unwrap();
    assert!(!session.is_running());

    session.start().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Running);
    assert!(session.gate().is_scanning());
    assert!(feed.deliver_payloads(["B"]));
    settle().await;
    assert_eq!(session.gate().current_result().as_deref(), Some("B"));
}

#[tokio::test(start_paused = true)]
async fn test_stop_clears_applied_region() {
    let (mut session, _feed) = running_session().await;
    assert_eq!(session.applied_region(), Some(RegionOfInterest::default()));

    session.stop();
    assert_eq!(session.applied_region(), None);

    session.start().await.unwrap();
    settle().await;
    assert_eq!(session.applied_region(), None, "new session waits for readiness");
}
