// SPDX-License-Identifier: GPL-3.0-only

use barcode_scanner::presenter::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

mod cli;

#[derive(Parser)]
#[command(name = "barcode-scanner")]
#[command(about = "Debounced barcode and QR code scanning")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan decoded payloads from text (one frame per line, tab-separated)
    Scan {
        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Delay between frames in milliseconds
        #[arg(long, default_value = "0")]
        interval_ms: u64,

        /// Print one JSON object per event
        #[arg(long)]
        json: bool,
    },

    /// Scan QR codes in image files (one frame per image)
    Images {
        /// Image files to scan, in order
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Delay between frames in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,

        /// Print one JSON object per event
        #[arg(long)]
        json: bool,
    },

    /// Show the region of interest
    Region,

    /// Show the config file location and effective settings
    Config,
}

fn output_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=barcode_scanner=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            input,
            interval_ms,
            json,
        } => cli::scan_lines(
            config,
            input,
            Duration::from_millis(interval_ms),
            output_format(json),
        )?,
        Commands::Images {
            paths,
            interval_ms,
            json,
        } => cli::scan_images(
            config,
            paths,
            Duration::from_millis(interval_ms),
            output_format(json),
        )?,
        Commands::Region => cli::print_region(&config),
        Commands::Config => cli::print_config(&config, cli.config.as_deref())?,
    }

    Ok(())
}
