// SPDX-License-Identifier: GPL-3.0-only

//! Shared, serialized access to a [`ScanGate`]
//!
//! The detection pump and the cool-down timer both mutate the gate, so every
//! mutation goes through one mutex. Each mutation publishes a [`ScanState`]
//! snapshot on a `watch` channel while the lock is still held, which keeps
//! the order observers see identical to the order transitions happened in.
//!
//! Arrival times come from tokio's clock so a paused test runtime controls
//! both timestamps and timer expiry.

use super::gate::{CoolDownTimer, ScanGate};
use super::types::{AcceptOutcome, DetectionEvent, DetectionFrame, ScanState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Cloneable handle to a gate shared by the pump, timers and observers
#[derive(Clone)]
pub struct ScanGateHandle {
    gate: Arc<Mutex<ScanGate>>,
    state_tx: Arc<watch::Sender<ScanState>>,
}

impl Default for ScanGateHandle {
    fn default() -> Self {
        Self::from_gate(ScanGate::default())
    }
}

impl ScanGateHandle {
    pub fn new(cool_down: Duration) -> Self {
        Self::from_gate(ScanGate::new(cool_down))
    }

    pub fn from_gate(gate: ScanGate) -> Self {
        let (state_tx, _) = watch::channel(gate.snapshot());
        Self {
            gate: Arc::new(Mutex::new(gate)),
            state_tx: Arc::new(state_tx),
        }
    }

    /// Current time on the gate's clock
    pub fn now() -> Instant {
        tokio::time::Instant::now().into_std()
    }

    /// Receive every published state change
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state_tx.subscribe()
    }

    /// Latest published state, read without taking the gate lock
    pub fn snapshot(&self) -> ScanState {
        self.state_tx.borrow().clone()
    }

    pub fn is_scanning(&self) -> bool {
        self.state_tx.borrow().is_scanning
    }

    pub fn current_result(&self) -> Option<String> {
        self.state_tx.borrow().current_result.clone()
    }

    /// Accept a single payload arriving now
    ///
    /// An accepted scan schedules its cool-down timer on the current tokio
    /// runtime. Outside a runtime no timer is scheduled and the caller has to
    /// drive expiry with [`tick`](Self::tick).
    pub fn accept(&self, payload: impl Into<String>) -> AcceptOutcome {
        let event = DetectionEvent::new(payload, Self::now());
        let (outcome, timer) = {
            let mut gate = self.lock();
            let outcome = gate.accept(event);
            self.publish(&gate);
            (outcome, gate.pending_timer())
        };
        if outcome.is_accepted() {
            self.schedule_expiry(timer);
        }
        outcome
    }

    /// Accept all detections of one frame, first one wins
    pub fn accept_frame(&self, frame: DetectionFrame) -> Vec<AcceptOutcome> {
        if frame.is_empty() {
            return Vec::new();
        }

        let now = Self::now();
        let (outcomes, timer) = {
            let mut gate = self.lock();
            let outcomes = gate.accept_batch(
                frame
                    .into_iter()
                    .map(|detection| DetectionEvent::from_detection(detection, now)),
            );
            self.publish(&gate);
            (outcomes, gate.pending_timer())
        };

        if let Some(AcceptOutcome::Accepted(payload)) =
            outcomes.iter().find(|outcome| outcome.is_accepted())
        {
            info!(payload = %payload, "Scan accepted");
            self.schedule_expiry(timer);
        }
        outcomes
    }

    /// Resume scanning if the cool-down has passed
    pub fn tick(&self) -> bool {
        let mut gate = self.lock();
        let changed = gate.tick_cool_down(Self::now());
        if changed {
            self.publish(&gate);
        }
        changed
    }

    /// Force scanning state and invalidate any in-flight timer
    pub fn reset(&self) {
        let mut gate = self.lock();
        gate.reset();
        self.publish(&gate);
    }

    fn expire(&self, timer: CoolDownTimer) -> bool {
        let mut gate = self.lock();
        let changed = gate.expire(timer, Self::now());
        if changed {
            info!("Cool-down finished, ready to scan");
            self.publish(&gate);
        }
        changed
    }

    /// Spawn the fire-once timer for a cool-down window
    fn schedule_expiry(&self, timer: Option<CoolDownTimer>) {
        let Some(timer) = timer else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                generation = timer.generation,
                "No tokio runtime, cool-down only ends on tick()"
            );
            return;
        };
        debug!(generation = timer.generation, "Scheduling cool-down timer");

        let handle = self.clone();
        runtime.spawn(async move {
            tokio::time::sleep_until(tokio::time::Instant::from_std(timer.deadline)).await;
            handle.expire(timer);
        });
    }

    fn publish(&self, gate: &ScanGate) {
        let snapshot = gate.snapshot();
        self.state_tx.send_if_modified(|state| {
            if *state == snapshot {
                false
            } else {
                *state = snapshot;
                true
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, ScanGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ScanGateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let gate = self.lock();
        f.debug_struct("ScanGateHandle")
            .field("is_scanning", &gate.is_scanning())
            .field("generation", &gate.generation())
            .finish()
    }
}
