// SPDX-License-Identifier: GPL-3.0-only

//! Scanning session orchestration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ Presentation (CLI)  │  ← observes ScanState / SessionStatus
//! └──────────▲──────────┘
//!            │ watch
//! ┌──────────┴──────────┐
//! │  SessionController  │  ← authorization, start/stop, region of interest
//! └──────────┬──────────┘
//!            │ mpsc<DetectionFrame>
//! ┌──────────┴──────────┐
//! │ CaptureSource Trait │  ← external capture/decoding collaborator
//! └──────────┬──────────┘
//!            │
//!   ┌────────┼─────────┐
//!   ▼        ▼         ▼
//! Callback  Lines    Images
//! ```

pub mod controller;
pub mod frame_loop;
pub mod sources;

pub use controller::SessionController;

use crate::constants::Symbology;
use crate::errors::{SessionError, SessionResult};
use crate::scanner::{DetectionFrame, RegionOfInterest};
use serde::Serialize;
use std::future::Future;
use tokio::sync::{mpsc, oneshot, watch};

/// Camera permission as reported by the capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    Authorized,
    /// The user has not been asked yet
    NotDetermined,
    Denied,
    /// Blocked by policy; treated like a denial
    Restricted,
}

/// Session lifecycle as published to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Starting,
    Running,
    Stopped,
    /// Terminal for this start attempt; shown to the user
    Failed(SessionError),
}

impl SessionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, SessionStatus::Running)
    }

    /// The user-visible alert, if this status carries one
    pub fn alert(&self) -> Option<&SessionError> {
        match self {
            SessionStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Channels a capture source is wired to when it starts
pub struct CaptureChannels {
    /// FIFO of per-frame detections; dropping it ends the session's stream
    pub frames: mpsc::Sender<DetectionFrame>,
    /// Fired once the source is actually producing frames
    pub ready: oneshot::Sender<()>,
    /// Region of interest, `None` until the controller applies it
    pub region: watch::Receiver<Option<RegionOfInterest>>,
}

/// External capture and decoding collaborator
///
/// Implementations deliver frames on a single sequence and never
/// concurrently with themselves.
pub trait CaptureSource: Send {
    /// Short name for logging
    fn name(&self) -> &str;

    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask the user for camera access; resolves to whether it was granted
    fn request_access(&mut self) -> impl Future<Output = bool> + Send;

    /// Attach the detection output for the requested code families
    ///
    /// # Returns
    /// * `Err(SessionError::PipelineConfigurationFailed)` - no device, or the
    ///   output cannot be attached
    fn configure(&mut self, symbologies: &[Symbology]) -> SessionResult<()>;

    /// Start delivering frames
    fn start(&mut self, channels: CaptureChannels) -> SessionResult<()>;

    /// Stop delivering frames and release the device
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}
