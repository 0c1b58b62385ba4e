// SPDX-License-Identifier: GPL-3.0-only

//! Capture source fed from outside
//!
//! Bridges a platform capture pipeline into a session: the platform's
//! detection callback pushes frames through a [`DetectionFeed`] and reports
//! readiness once the pipeline is running.

use crate::constants::Symbology;
use crate::errors::{SessionError, SessionResult};
use crate::scanner::{Detection, DetectionFrame, RegionOfInterest};
use crate::session::{AuthorizationStatus, CaptureChannels, CaptureSource};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

struct FeedState {
    frames: mpsc::Sender<DetectionFrame>,
    ready: Option<oneshot::Sender<()>>,
    region: watch::Receiver<Option<RegionOfInterest>>,
}

type SharedFeed = Arc<Mutex<Option<FeedState>>>;

fn lock_feed(feed: &SharedFeed) -> MutexGuard<'_, Option<FeedState>> {
    feed.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle the platform side uses to deliver detections
///
/// Cheap to clone. Deliveries made while the source is stopped are dropped.
#[derive(Clone)]
pub struct DetectionFeed {
    feed: SharedFeed,
}

impl DetectionFeed {
    /// Report that the pipeline is running; only the first call matters
    pub fn signal_ready(&self) -> bool {
        let mut feed = lock_feed(&self.feed);
        match feed.as_mut().and_then(|state| state.ready.take()) {
            Some(ready) => ready.send(()).is_ok(),
            None => false,
        }
    }

    /// Deliver one frame without blocking the caller
    ///
    /// Returns false if the source is stopped or the frame queue is full; a
    /// full queue drops the frame rather than stalling the capture thread.
    pub fn deliver(&self, frame: DetectionFrame) -> bool {
        let feed = lock_feed(&self.feed);
        let Some(state) = feed.as_ref() else {
            debug!("Detection delivered while source stopped, dropping");
            return false;
        };
        match state.frames.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Detection queue full, dropping frame");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Deliver one frame made of bare payloads
    pub fn deliver_payloads<I, P>(&self, payloads: I) -> bool
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.deliver(payloads.into_iter().map(Detection::new).collect())
    }

    /// Region of interest applied by the session, if any yet
    pub fn region(&self) -> Option<RegionOfInterest> {
        lock_feed(&self.feed)
            .as_ref()
            .and_then(|state| *state.region.borrow())
    }

    /// End the detection stream, as if the pipeline shut down
    pub fn close(&self) {
        lock_feed(&self.feed).take();
    }
}

/// A [`CaptureSource`] driven through a [`DetectionFeed`]
pub struct CallbackSource {
    name: String,
    authorization: AuthorizationStatus,
    grant_on_request: bool,
    supported: Vec<Symbology>,
    unavailable: Option<String>,
    feed: SharedFeed,
    running: bool,
}

impl CallbackSource {
    /// Authorized source supporting every symbology
    pub fn new(name: &str) -> (Self, DetectionFeed) {
        let feed: SharedFeed = Arc::new(Mutex::new(None));
        let source = Self {
            name: name.to_string(),
            authorization: AuthorizationStatus::Authorized,
            grant_on_request: true,
            supported: Symbology::ALL.to_vec(),
            unavailable: None,
            feed: Arc::clone(&feed),
            running: false,
        };
        (source, DetectionFeed { feed })
    }

    pub fn with_authorization(mut self, status: AuthorizationStatus) -> Self {
        self.authorization = status;
        self
    }

    /// Answer given when the user is asked for access
    pub fn grant_on_request(mut self, grant: bool) -> Self {
        self.grant_on_request = grant;
        self
    }

    pub fn with_supported_symbologies(mut self, supported: Vec<Symbology>) -> Self {
        self.supported = supported;
        self
    }

    /// Simulate a missing device; configuration will fail with `reason`
    pub fn unavailable(mut self, reason: &str) -> Self {
        self.unavailable = Some(reason.to_string());
        self
    }
}

impl CaptureSource for CallbackSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        self.authorization
    }

    fn request_access(&mut self) -> impl Future<Output = bool> + Send {
        let granted = self.grant_on_request;
        self.authorization = if granted {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        async move { granted }
    }

    fn configure(&mut self, symbologies: &[Symbology]) -> SessionResult<()> {
        if let Some(reason) = &self.unavailable {
            return Err(SessionError::PipelineConfigurationFailed(reason.clone()));
        }
        if !symbologies.iter().any(|s| self.supported.contains(s)) {
            return Err(SessionError::PipelineConfigurationFailed(
                "could not add metadata output for the requested symbologies".to_string(),
            ));
        }
        Ok(())
    }

    fn start(&mut self, channels: CaptureChannels) -> SessionResult<()> {
        *lock_feed(&self.feed) = Some(FeedState {
            frames: channels.frames,
            ready: Some(channels.ready),
            region: channels.region,
        });
        self.running = true;
        info!(name = %self.name, "Callback source started");
        Ok(())
    }

    fn stop(&mut self) {
        lock_feed(&self.feed).take();
        self.running = false;
        info!(name = %self.name, "Callback source stopped");
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
