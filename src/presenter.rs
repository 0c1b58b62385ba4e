// SPDX-License-Identifier: GPL-3.0-only

//! Terminal presentation of scan state
//!
//! Turns published [`ScanState`] snapshots into the lines a user sees. The
//! presenter only observes; it never sends commands back to the gate.

use crate::constants::messages::CAMERA_ACCESS_DENIED;
use crate::errors::SessionError;
use crate::scanner::ScanState;
use chrono::{DateTime, Local};
use serde::Serialize;

/// Output style for presented events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Something worth telling the user about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    /// A code was accepted and is now displayed
    Scanned { payload: String },
    /// The displayed code was cleared; scanning resumed
    Ready,
    /// The session could not start
    Alert { message: String },
}

impl ScanEvent {
    /// Event implied by moving from `previous` to `next`, if any
    ///
    /// Observers may miss intermediate snapshots, so a new scan is detected
    /// by its scan count rather than by a changed payload.
    pub fn from_transition(previous: &ScanState, next: &ScanState) -> Option<Self> {
        match (&previous.current_result, &next.current_result) {
            (_, Some(payload)) if next.scan_count != previous.scan_count => {
                Some(ScanEvent::Scanned {
                    payload: payload.clone(),
                })
            }
            (Some(_), None) if next.is_scanning => Some(ScanEvent::Ready),
            _ => None,
        }
    }

    /// Alert shown for a session that failed to start
    pub fn alert(err: &SessionError) -> Self {
        let message = match err {
            SessionError::AuthorizationDenied => CAMERA_ACCESS_DENIED.to_string(),
            other => other.to_string(),
        };
        ScanEvent::Alert { message }
    }
}

#[derive(Serialize)]
struct TimedEvent<'a> {
    time: String,
    #[serde(flatten)]
    event: &'a ScanEvent,
}

/// Tracks the last observed state and renders transitions
#[derive(Debug, Default)]
pub struct Presenter {
    format: OutputFormat,
    previous: ScanState,
}

impl Presenter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            previous: ScanState::default(),
        }
    }

    /// Record a new snapshot; returns the line to print, if any
    pub fn observe(&mut self, next: &ScanState) -> Option<String> {
        let event = ScanEvent::from_transition(&self.previous, next);
        self.previous = next.clone();
        event.map(|event| self.render(&event, Local::now()))
    }

    pub fn render(&self, event: &ScanEvent, at: DateTime<Local>) -> String {
        let time = at.format("%H:%M:%S%.3f").to_string();
        match self.format {
            OutputFormat::Json => {
                let timed = TimedEvent { time, event };
                serde_json::to_string(&timed).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
            }
            OutputFormat::Text => match event {
                ScanEvent::Scanned { payload } => format!("[{}] Scanned Code: {}", time, payload),
                ScanEvent::Ready => format!("[{}] Ready to scan", time),
                ScanEvent::Alert { message } => format!("[{}] {}", time, message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn displaying(payload: &str, scan_count: u64) -> ScanState {
        ScanState {
            is_scanning: false,
            current_result: Some(payload.to_string()),
            scan_count,
        }
    }

    #[test]
    fn test_transitions() {
        let scanning = ScanState::default();
        assert_eq!(
            ScanEvent::from_transition(&scanning, &displaying("A", 1)),
            Some(ScanEvent::Scanned {
                payload: "A".to_string()
            })
        );
        assert_eq!(
            ScanEvent::from_transition(&displaying("A", 1), &scanning),
            Some(ScanEvent::Ready)
        );
        assert_eq!(ScanEvent::from_transition(&scanning, &scanning), None);
        assert_eq!(
            ScanEvent::from_transition(&displaying("A", 1), &displaying("A", 1)),
            None
        );
    }

    #[test]
    fn test_coalesced_rescan_is_reported() {
        let event = ScanEvent::from_transition(&displaying("A", 1), &displaying("B", 2));
        assert_eq!(
            event,
            Some(ScanEvent::Scanned {
                payload: "B".to_string()
            })
        );
    }

    #[test]
    fn test_same_payload_rescanned_after_missed_ready() {
        let mut presenter = Presenter::new(OutputFormat::Text);
        assert!(presenter.observe(&displaying("A", 1)).is_some());

        // The Ready snapshot in between was overwritten before it was seen.
        let line = presenter.observe(&displaying("A", 2));
        assert!(line.unwrap().ends_with("Scanned Code: A"));
    }

    #[test]
    fn test_render_text_and_json() {
        let at = Local.with_ymd_and_hms(2024, 1, 19, 10, 30, 0).unwrap();
        let event = ScanEvent::Scanned {
            payload: "ABC123".to_string(),
        };

        let text = Presenter::new(OutputFormat::Text).render(&event, at);
        assert_eq!(text, "[10:30:00.000] Scanned Code: ABC123");

        let json = Presenter::new(OutputFormat::Json).render(&event, at);
        assert_eq!(
            json,
            r#"{"time":"10:30:00.000","event":"scanned","payload":"ABC123"}"#
        );
    }

    #[test]
    fn test_denied_alert_message() {
        let event = ScanEvent::alert(&SessionError::AuthorizationDenied);
        assert_eq!(
            event,
            ScanEvent::Alert {
                message: CAMERA_ACCESS_DENIED.to_string()
            }
        );
    }

    #[test]
    fn test_presenter_tracks_previous_state() {
        let mut presenter = Presenter::new(OutputFormat::Text);
        assert!(presenter.observe(&displaying("A", 1)).unwrap().ends_with("Scanned Code: A"));
        assert!(presenter.observe(&displaying("A", 1)).is_none());
        assert!(presenter.observe(&ScanState::default()).unwrap().ends_with("Ready to scan"));
    }
}
