// SPDX-License-Identifier: GPL-3.0-only

//! Scan debounce state machine
//!
//! The gate turns a noisy, duplicate-prone stream of detections into a single
//! "accepted scan" signal. It has two phases:
//!
//! ```text
//!              accept(event)
//!   Scanning ─────────────────▶ Displaying { payload, deadline }
//!      ▲                                 │
//!      └──── cool-down expiry / reset ───┘
//! ```
//!
//! While displaying, every further detection is ignored. The gate owns no
//! clock and no timer thread: callers pass instants in, and whoever schedules
//! the cool-down timer calls [`ScanGate::expire`] with the [`CoolDownTimer`]
//! returned by [`ScanGate::pending_timer`].

use super::types::{AcceptOutcome, DetectionEvent, ScanState};
use crate::constants::COOL_DOWN;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Scanning,
    Displaying { payload: String, deadline: Instant },
}

/// Identifies one scheduled cool-down window
///
/// A timer that fires after its window was reset or superseded carries a
/// stale generation and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoolDownTimer {
    pub generation: u64,
    pub deadline: Instant,
}

/// Debounce state machine for scan results
#[derive(Debug, Clone)]
pub struct ScanGate {
    phase: Phase,
    cool_down: Duration,
    /// Bumped on every reset and every acceptance
    generation: u64,
    /// Accepted scans over the gate's lifetime
    scan_count: u64,
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new(COOL_DOWN)
    }
}

impl ScanGate {
    /// Create a gate in the scanning phase
    pub fn new(cool_down: Duration) -> Self {
        Self {
            phase: Phase::Scanning,
            cool_down,
            generation: 0,
            scan_count: 0,
        }
    }

    pub fn cool_down(&self) -> Duration {
        self.cool_down
    }

    /// True when new detections may be accepted
    pub fn is_scanning(&self) -> bool {
        matches!(self.phase, Phase::Scanning)
    }

    /// The payload currently displayed, if any
    pub fn current_result(&self) -> Option<&str> {
        match &self.phase {
            Phase::Scanning => None,
            Phase::Displaying { payload, .. } => Some(payload),
        }
    }

    /// Instant at which the displayed result is cleared
    pub fn cool_down_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::Scanning => None,
            Phase::Displaying { deadline, .. } => Some(*deadline),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    /// The cool-down window a timer should be scheduled for, if any
    pub fn pending_timer(&self) -> Option<CoolDownTimer> {
        self.cool_down_deadline().map(|deadline| CoolDownTimer {
            generation: self.generation,
            deadline,
        })
    }

    pub fn snapshot(&self) -> ScanState {
        ScanState {
            is_scanning: self.is_scanning(),
            current_result: self.current_result().map(str::to_string),
            scan_count: self.scan_count,
        }
    }

    /// Offer one detection to the gate
    ///
    /// While scanning, the event becomes the current result and a cool-down
    /// starts at its arrival time. During a cool-down the event is ignored and
    /// nothing changes. Payloads are passed through unvalidated.
    pub fn accept(&mut self, event: DetectionEvent) -> AcceptOutcome {
        if !self.is_scanning() {
            trace!(payload = %event.payload, "Cool-down active, ignoring detection");
            return AcceptOutcome::Ignored;
        }

        let deadline = event.received_at + self.cool_down;
        self.generation = self.generation.wrapping_add(1);
        self.scan_count = self.scan_count.wrapping_add(1);
        debug!(
            payload = %event.payload,
            symbology = ?event.symbology,
            generation = self.generation,
            "Accepted scan"
        );

        self.phase = Phase::Displaying {
            payload: event.payload.clone(),
            deadline,
        };
        AcceptOutcome::Accepted(event.payload)
    }

    /// Offer a batch of detections from one frame
    ///
    /// Each event is a separate [`accept`](Self::accept) call, so at most the
    /// first one can be accepted. Outcomes are returned in input order.
    pub fn accept_batch<I>(&mut self, events: I) -> Vec<AcceptOutcome>
    where
        I: IntoIterator<Item = DetectionEvent>,
    {
        events.into_iter().map(|event| self.accept(event)).collect()
    }

    /// Resume scanning if the cool-down deadline has passed
    ///
    /// Returns true when this call performed the transition.
    pub fn tick_cool_down(&mut self, now: Instant) -> bool {
        match self.cool_down_deadline() {
            Some(deadline) if now >= deadline => {
                debug!(generation = self.generation, "Cool-down expired, scanning resumed");
                self.phase = Phase::Scanning;
                true
            }
            _ => false,
        }
    }

    /// Timer callback for a scheduled cool-down window
    ///
    /// Does nothing unless `timer` still describes the pending window.
    pub fn expire(&mut self, timer: CoolDownTimer, now: Instant) -> bool {
        if self.pending_timer() != Some(timer) {
            trace!(
                timer_generation = timer.generation,
                generation = self.generation,
                "Ignoring stale cool-down timer"
            );
            return false;
        }
        self.tick_cool_down(now)
    }

    /// Force the gate back to scanning and invalidate any pending timer
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.phase = Phase::Scanning;
        debug!(generation = self.generation, "Scan gate reset");
    }
}
