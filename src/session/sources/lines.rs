// SPDX-License-Identifier: GPL-3.0-only

//! Line-oriented text capture source
//!
//! Each input line is one processed frame. A line holds zero or more decoded
//! payloads separated by tabs; an empty line is a frame with no detections.
//! Useful for replaying recorded detections or piping from another decoder.

use crate::constants::{Symbology, timing::FRAME_LOG_INTERVAL};
use crate::errors::SessionResult;
use crate::scanner::{Detection, DetectionFrame};
use crate::session::frame_loop::{CaptureLoopController, LoopAction, sleep_unless_stopped};
use crate::session::{AuthorizationStatus, CaptureChannels, CaptureSource};
use std::fs::File;
use std::future::Future;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Where lines are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInput {
    Stdin,
    File(PathBuf),
}

impl std::fmt::Display for LineInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineInput::Stdin => write!(f, "stdin"),
            LineInput::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Split one input line into the detections of a frame
pub fn parse_frame(line: &str) -> DetectionFrame {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Vec::new();
    }
    line.split('\t').map(Detection::new).collect()
}

struct LineLoop {
    reader: Box<dyn BufRead + Send>,
    frames: mpsc::Sender<DetectionFrame>,
    ready: Option<oneshot::Sender<()>>,
    interval: Duration,
    line: String,
    frame_count: u64,
}

impl LineLoop {
    fn step(&mut self, stop: &std::sync::atomic::AtomicBool) -> LoopAction {
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(());
        }

        self.line.clear();
        match self.reader.read_line(&mut self.line) {
            Ok(0) => {
                info!(frames = self.frame_count, "Line input finished");
                return LoopAction::Stop;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read detection line");
                return LoopAction::Stop;
            }
        }

        let frame = parse_frame(&self.line);
        self.frame_count += 1;
        if self.frame_count % FRAME_LOG_INTERVAL == 0 {
            debug!(frames = self.frame_count, "Line source progress");
        }

        if self.frames.blocking_send(frame).is_err() {
            debug!("Detection channel closed, stopping line source");
            return LoopAction::Stop;
        }

        if !self.interval.is_zero() && !sleep_unless_stopped(self.interval, stop) {
            return LoopAction::Stop;
        }
        LoopAction::Continue
    }
}

/// Capture source reading detections from text
pub struct LineSource {
    input: LineInput,
    interval: Duration,
    controller: Option<CaptureLoopController>,
}

impl LineSource {
    /// `interval` paces frames the way a camera's frame rate would
    pub fn new(input: LineInput, interval: Duration) -> Self {
        Self {
            input,
            interval,
            controller: None,
        }
    }

    fn open(&self) -> SessionResult<Box<dyn BufRead + Send>> {
        Ok(match &self.input {
            LineInput::Stdin => Box::new(BufReader::new(std::io::stdin())),
            LineInput::File(path) => Box::new(BufReader::new(File::open(path)?)),
        })
    }
}

impl CaptureSource for LineSource {
    fn name(&self) -> &str {
        "lines"
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    fn request_access(&mut self) -> impl Future<Output = bool> + Send {
        async { true }
    }

    fn configure(&mut self, symbologies: &[Symbology]) -> SessionResult<()> {
        // Text carries already-decoded payloads of any family.
        debug!(?symbologies, input = %self.input, "Line source configured");
        Ok(())
    }

    fn start(&mut self, channels: CaptureChannels) -> SessionResult<()> {
        let reader = self.open()?;
        info!(input = %self.input, "Reading detections");

        let state = LineLoop {
            reader,
            frames: channels.frames,
            ready: Some(channels.ready),
            interval: self.interval,
            line: String::new(),
            frame_count: 0,
        };
        self.controller = Some(CaptureLoopController::start(
            "line-source",
            state,
            |state, stop| state.step(stop),
        ));
        Ok(())
    }

    fn stop(&mut self) {
        // The thread may be parked in a read on stdin; don't wait for it.
        if let Some(controller) = self.controller.take() {
            controller.detach();
        }
    }

    fn is_running(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(CaptureLoopController::is_running)
    }
}
