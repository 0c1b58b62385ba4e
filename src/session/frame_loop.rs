// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for capture loops
//!
//! Sources that block (reading stdin, decoding image files) run their frame
//! loop on a dedicated thread and hand frames to the async side with
//! `blocking_send`. This module owns that thread's start/stop handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::constants::timing::STOP_POLL_INTERVAL;

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a capture loop running in a separate thread
///
/// # Example
///
/// ```ignore
/// let controller = CaptureLoopController::start("lines", reader, move |reader, stop| {
///     match next_frame(reader) {
///         Some(frame) if frames.blocking_send(frame).is_ok() => LoopAction::Continue,
///         _ => LoopAction::Stop,
///     }
/// });
/// ```
pub struct CaptureLoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoopController {
    /// Start a loop on a new thread that owns `state`
    ///
    /// `loop_fn` is called repeatedly until it returns [`LoopAction::Stop`] or
    /// a stop is requested. It also receives the stop signal so it can bail
    /// out of long waits (see [`sleep_unless_stopped`]).
    pub fn start<S, F>(name: &str, mut state: S, mut loop_fn: F) -> Self
    where
        S: Send + 'static,
        F: FnMut(&mut S, &AtomicBool) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %thread_name, "Capture loop thread started");

            loop {
                if thread_stop.load(Ordering::SeqCst) {
                    debug!(name = %thread_name, "Stop signal received");
                    break;
                }

                if loop_fn(&mut state, &thread_stop) == LoopAction::Stop {
                    debug!(name = %thread_name, "Loop requested stop");
                    break;
                }
            }

            info!(name = %thread_name, "Capture loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Request a stop and let the thread wind down on its own
    ///
    /// For loops that may be parked in a blocking read that only returns on
    /// the next input.
    pub fn detach(mut self) {
        self.request_stop();
        self.thread_handle.take();
    }

    /// Wait for the thread to finish without sending stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for capture loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, requesting stop");
            self.request_stop();
        }
    }
}

/// Sleep for `duration`, waking early if `stop` is set
///
/// Returns false when the sleep was cut short by a stop request.
pub fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(STOP_POLL_INTERVAL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = CaptureLoopController::start("test-loop", 0u32, move |n, _| {
            *n += 1;
            counter_clone.store(*n, Ordering::SeqCst);
            if *n >= 10 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        });

        controller.join();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_stop_interrupts_sleep() {
        let mut controller = CaptureLoopController::start("test-sleep", (), |_, stop| {
            if sleep_unless_stopped(Duration::from_secs(60), stop) {
                LoopAction::Continue
            } else {
                LoopAction::Stop
            }
        });

        thread::sleep(Duration::from_millis(30));
        let started = Instant::now();
        controller.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_sleep_completes_without_stop() {
        let stop = AtomicBool::new(false);
        assert!(sleep_unless_stopped(Duration::from_millis(5), &stop));
        stop.store(true, Ordering::SeqCst);
        assert!(!sleep_unless_stopped(Duration::from_secs(60), &stop));
    }
}
