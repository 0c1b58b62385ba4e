// SPDX-License-Identifier: GPL-3.0-only

//! Session lifecycle controller
//!
//! Sequences authorization, pipeline configuration and start, the gate
//! reset, and deferred region-of-interest application. Failures are
//! published as [`SessionStatus::Failed`] and returned; nothing is retried.

use super::{AuthorizationStatus, CaptureChannels, CaptureSource, SessionStatus};
use crate::config::{Config, RegionApply};
use crate::errors::{SessionError, SessionResult};
use crate::scanner::{DetectionFrame, RegionOfInterest, ScanGateHandle};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Owns one capture source and the gate its detections feed
pub struct SessionController<S: CaptureSource> {
    source: S,
    gate: ScanGateHandle,
    config: Config,
    status_tx: Arc<watch::Sender<SessionStatus>>,
    region_rx: Option<watch::Receiver<Option<RegionOfInterest>>>,
    pump: Option<JoinHandle<()>>,
    region_task: Option<JoinHandle<()>>,
}

impl<S: CaptureSource> SessionController<S> {
    /// Create a controller with a fresh gate using the configured cool-down
    pub fn new(source: S, config: Config) -> Self {
        let gate = ScanGateHandle::new(config.cool_down());
        Self::with_gate(source, gate, config)
    }

    /// Create a controller around an existing gate
    pub fn with_gate(source: S, gate: ScanGateHandle, config: Config) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Idle);
        Self {
            source,
            gate,
            config,
            status_tx: Arc::new(status_tx),
            region_rx: None,
            pump: None,
            region_task: None,
        }
    }

    pub fn gate(&self) -> &ScanGateHandle {
        &self.gate
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn status(&self) -> SessionStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Region of interest this session hands to the source
    pub fn region_of_interest(&self) -> RegionOfInterest {
        self.config.region_of_interest()
    }

    /// Region of interest the source has been given so far
    pub fn applied_region(&self) -> Option<RegionOfInterest> {
        self.region_rx.as_ref().and_then(|rx| *rx.borrow())
    }

    pub fn is_running(&self) -> bool {
        self.status_tx.borrow().is_running()
    }

    /// Start the session
    ///
    /// Must be awaited inside a tokio runtime; the detection pump and the
    /// region-of-interest task are spawned on it.
    pub async fn start(&mut self) -> SessionResult<()> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        // A previous session may have ended with its stream, leaving tasks behind.
        self.release();

        info!(source = self.source.name(), "Starting scan session");
        self.status_tx.send_replace(SessionStatus::Starting);

        if let Err(err) = self.authorize().await {
            return self.fail(err);
        }

        if let Err(err) = self.source.configure(&self.config.symbologies) {
            return self.fail(err);
        }

        let (frames_tx, frames_rx) = mpsc::channel(self.config.frame_channel_capacity.max(1));
        let (ready_tx, ready_rx) = oneshot::channel();
        let (region_tx, region_rx) = watch::channel(None);
        let region_deadline =
            tokio::time::Instant::now() + self.config.region_of_interest_delay();

        let channels = CaptureChannels {
            frames: frames_tx,
            ready: ready_tx,
            region: region_rx.clone(),
        };
        if let Err(err) = self.source.start(channels) {
            return self.fail(err);
        }

        self.gate.reset();
        self.region_rx = Some(region_rx);
        self.pump = Some(tokio::spawn(pump_frames(
            frames_rx,
            self.gate.clone(),
            Arc::clone(&self.status_tx),
        )));
        self.region_task = Some(tokio::spawn(apply_region(
            self.config.region_of_interest_apply,
            region_deadline,
            self.config.region_of_interest(),
            ready_rx,
            region_tx,
        )));

        self.status_tx.send_replace(SessionStatus::Running);
        info!(source = self.source.name(), "Scan session running");
        Ok(())
    }

    /// Stop the source and the session's background tasks
    pub fn stop(&mut self) {
        let was_running = self.is_running();
        self.release();
        if was_running {
            info!(source = self.source.name(), "Scan session stopped");
            self.status_tx.send_replace(SessionStatus::Stopped);
        }
    }

    /// Wait until the source closes its frame stream and every frame has
    /// reached the gate
    pub async fn finished(&mut self) {
        if let Some(pump) = self.pump.take() {
            if let Err(e) = pump.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Detection pump task failed");
                }
            }
        }
    }

    /// Tear down the source, the background tasks and the applied region
    fn release(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(task) = self.region_task.take() {
            task.abort();
        }
        if self.source.is_running() {
            self.source.stop();
        }
        self.region_rx = None;
    }

    async fn authorize(&mut self) -> SessionResult<()> {
        match self.source.authorization_status() {
            AuthorizationStatus::Authorized => Ok(()),
            AuthorizationStatus::NotDetermined => {
                info!("Requesting camera access");
                if self.source.request_access().await {
                    Ok(())
                } else {
                    Err(SessionError::AuthorizationDenied)
                }
            }
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                Err(SessionError::AuthorizationDenied)
            }
        }
    }

    fn fail(&mut self, err: SessionError) -> SessionResult<()> {
        self.region_rx = None;
        match &err {
            SessionError::AuthorizationDenied => warn!("Camera access denied"),
            other => error!(error = %other, "Scan session failed to start"),
        }
        self.status_tx
            .send_replace(SessionStatus::Failed(err.clone()));
        Err(err)
    }
}

impl<S: CaptureSource> Drop for SessionController<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Forward frames to the gate in arrival order until the source hangs up
///
/// A stream that ends on its own ends the session.
async fn pump_frames(
    mut frames: mpsc::Receiver<DetectionFrame>,
    gate: ScanGateHandle,
    status_tx: Arc<watch::Sender<SessionStatus>>,
) {
    let mut count: u64 = 0;
    while let Some(frame) = frames.recv().await {
        count += 1;
        gate.accept_frame(frame);
    }
    debug!(frames = count, "Detection stream closed");

    let stopped = status_tx.send_if_modified(|status| {
        if status.is_running() {
            *status = SessionStatus::Stopped;
            true
        } else {
            false
        }
    });
    if stopped {
        info!("Capture source ended its stream, scan session stopped");
    }
}

/// Hand the region of interest to the source once it is running
async fn apply_region(
    strategy: RegionApply,
    deadline: tokio::time::Instant,
    region: RegionOfInterest,
    ready: oneshot::Receiver<()>,
    region_tx: watch::Sender<Option<RegionOfInterest>>,
) {
    match strategy {
        RegionApply::OnReady => {
            if ready.await.is_err() {
                warn!("Capture source closed before reporting ready, region of interest not applied");
                return;
            }
        }
        RegionApply::FixedDelay => {
            drop(ready);
            tokio::time::sleep_until(deadline).await;
        }
    }

    info!(region = %region, "Applying region of interest");
    region_tx.send_replace(Some(region));
}
