// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Scanning detections from text input
//! - Scanning QR codes in image files
//! - Showing the region of interest and effective configuration

use barcode_scanner::config::Config;
use barcode_scanner::errors::{AppError, AppResult};
use barcode_scanner::presenter::{OutputFormat, Presenter, ScanEvent};
use barcode_scanner::session::sources::{ImageSource, LineInput, LineSource};
use barcode_scanner::session::{CaptureSource, SessionController};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Load the config from an explicit path or the default location
pub fn load_config(path: Option<&Path>) -> AppResult<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn runtime() -> AppResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Scan tab-separated detections, one frame per line
pub fn scan_lines(
    config: Config,
    input: Option<PathBuf>,
    interval: Duration,
    format: OutputFormat,
) -> AppResult<()> {
    let input = input.map(LineInput::File).unwrap_or(LineInput::Stdin);
    let source = LineSource::new(input, interval);
    runtime()?.block_on(run_session(source, config, format))
}

/// Scan QR codes in image files, one frame per image
pub fn scan_images(
    config: Config,
    paths: Vec<PathBuf>,
    interval: Duration,
    format: OutputFormat,
) -> AppResult<()> {
    let source = ImageSource::new(paths, interval);
    runtime()?.block_on(run_session(source, config, format))
}

/// Print the region of interest handed to capture sources
pub fn print_region(config: &Config) {
    let region = config.region_of_interest();
    println!("Region of interest: {}", region);
}

/// Print the config file location and the effective configuration
pub fn print_config(config: &Config, path: Option<&Path>) -> AppResult<()> {
    let path = path.map(Path::to_path_buf).or_else(Config::default_path);
    match path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: <none>"),
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Run one session to completion and present every scan
///
/// Returns once the source is exhausted and the last displayed result has
/// finished its cool-down, or on Ctrl-C.
async fn run_session<S: CaptureSource>(
    source: S,
    config: Config,
    format: OutputFormat,
) -> AppResult<()> {
    let mut presenter = Presenter::new(format);
    let mut session = SessionController::new(source, config);
    let mut scans = session.gate().subscribe();

    if let Err(err) = session.start().await {
        eprintln!(
            "{}",
            presenter.render(&ScanEvent::alert(&err), chrono::Local::now())
        );
        return Err(AppError::Session(err));
    }

    {
        let finished = session.finished();
        tokio::pin!(finished);
        let mut input_done = false;

        loop {
            tokio::select! {
                changed = scans.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = scans.borrow_and_update().clone();
                    if let Some(line) = presenter.observe(&next) {
                        println!("{}", line);
                    }
                    if input_done && next.is_scanning {
                        break;
                    }
                }
                _ = &mut finished, if !input_done => {
                    input_done = true;
                    let pending = scans.has_changed().unwrap_or(false);
                    let scanning = scans.borrow().is_scanning;
                    if scanning && !pending {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }
    }

    session.stop();
    Ok(())
}
