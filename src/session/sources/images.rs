// SPDX-License-Identifier: GPL-3.0-only

//! Still-image capture source
//!
//! Plays a list of image files as frames, decoding QR codes in each with
//! [`QrDetector`]. Once the session applies a region of interest, only codes
//! whose center falls inside it are reported.

use crate::constants::{Symbology, file_formats, timing::FRAME_LOG_INTERVAL};
use crate::errors::{SessionError, SessionResult};
use crate::scanner::{DetectionFrame, QrDetector, RegionOfInterest};
use crate::session::frame_loop::{CaptureLoopController, LoopAction, sleep_unless_stopped};
use crate::session::{AuthorizationStatus, CaptureChannels, CaptureSource};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace, warn};

/// Drop detections located outside the region of interest
///
/// Detections without a location are kept.
pub fn restrict_to_region(frame: DetectionFrame, region: Option<RegionOfInterest>) -> DetectionFrame {
    let Some(region) = region else {
        return frame;
    };
    frame
        .into_iter()
        .filter(|detection| {
            let inside = detection.location.is_none_or(|loc| region.contains(&loc));
            if !inside {
                trace!(payload = %detection.payload, "Detection outside region of interest");
            }
            inside
        })
        .collect()
}

struct ImageLoop {
    paths: std::vec::IntoIter<PathBuf>,
    detector: QrDetector,
    frames: mpsc::Sender<DetectionFrame>,
    ready: Option<oneshot::Sender<()>>,
    region: watch::Receiver<Option<RegionOfInterest>>,
    interval: Duration,
    frame_count: u64,
}

impl ImageLoop {
    fn step(&mut self, stop: &AtomicBool) -> LoopAction {
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(());
        }

        if !self.interval.is_zero() && !sleep_unless_stopped(self.interval, stop) {
            return LoopAction::Stop;
        }

        let Some(path) = self.paths.next() else {
            info!(frames = self.frame_count, "All images processed");
            return LoopAction::Stop;
        };

        let detections = self.detector.detect_file(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to load image");
            Vec::new()
        });
        let region = *self.region.borrow();
        let frame = restrict_to_region(detections, region);
        debug!(path = %path.display(), count = frame.len(), "Processed image frame");

        self.frame_count += 1;
        if self.frame_count % FRAME_LOG_INTERVAL == 0 {
            debug!(frames = self.frame_count, "Image source progress");
        }

        if self.frames.blocking_send(frame).is_err() {
            debug!("Detection channel closed, stopping image source");
            return LoopAction::Stop;
        }
        LoopAction::Continue
    }
}

/// Capture source decoding QR codes from image files
pub struct ImageSource {
    paths: Vec<PathBuf>,
    interval: Duration,
    controller: Option<CaptureLoopController>,
}

impl ImageSource {
    pub fn new(paths: Vec<PathBuf>, interval: Duration) -> Self {
        Self {
            paths,
            interval,
            controller: None,
        }
    }
}

fn check_image_path(path: &Path) -> SessionResult<()> {
    if !path.is_file() {
        return Err(SessionError::PipelineConfigurationFailed(format!(
            "no such image: {}",
            path.display()
        )));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !file_formats::is_image_extension(extension) {
        return Err(SessionError::PipelineConfigurationFailed(format!(
            "unsupported image format: {}",
            path.display()
        )));
    }
    Ok(())
}

impl CaptureSource for ImageSource {
    fn name(&self) -> &str {
        "images"
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    fn request_access(&mut self) -> impl Future<Output = bool> + Send {
        async { true }
    }

    fn configure(&mut self, symbologies: &[Symbology]) -> SessionResult<()> {
        if !symbologies.contains(&Symbology::Qr) {
            return Err(SessionError::PipelineConfigurationFailed(
                "image source only decodes QR codes".to_string(),
            ));
        }
        if self.paths.is_empty() {
            return Err(SessionError::PipelineConfigurationFailed(
                "no input images".to_string(),
            ));
        }
        self.paths.iter().try_for_each(|path| check_image_path(path))
    }

    fn start(&mut self, channels: CaptureChannels) -> SessionResult<()> {
        info!(count = self.paths.len(), "Starting image source");
        let state = ImageLoop {
            paths: self.paths.clone().into_iter(),
            detector: QrDetector::new(),
            frames: channels.frames,
            ready: Some(channels.ready),
            region: channels.region,
            interval: self.interval,
            frame_count: 0,
        };
        self.controller = Some(CaptureLoopController::start(
            "image-source",
            state,
            |state, stop| state.step(stop),
        ));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut controller) = self.controller.take() {
            controller.stop();
        }
    }

    fn is_running(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(CaptureLoopController::is_running)
    }
}
