//! framelink client — entry point.
//!
//! ```text
//! framelink-client                     Stream with settings from framelink.toml
//! framelink-client --endpoint <url>    Override the configured endpoint
//! framelink-client --config <path>     Load a custom config TOML
//! framelink-client --gen-config        Write the default config to stdout
//! ```
//!
//! Streams a synthetic test pattern until ctrl-c. Swap the source for
//! a real capture binding to stream a device.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use framelink_core::{FrameSource, StreamController, TestPatternSource};

mod config;
use config::ClientConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "framelink-client", about = "framelink streaming client")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "framelink.toml")]
    config: PathBuf,

    /// WebSocket endpoint, overriding the configured one.
    #[arg(long)]
    endpoint: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ClientConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = ClientConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let endpoint = cli
        .endpoint
        .unwrap_or_else(|| config.stream.endpoint.clone());

    info!("framelink-client v{}", env!("CARGO_PKG_VERSION"));
    info!("endpoint: {endpoint}");
    info!(
        "capture: {}x{} @ {} fps",
        config.capture.width, config.capture.height, config.capture.fps
    );

    let mut controller = StreamController::new(config.to_stream_config());

    // Log every session transition for the operator.
    let mut status_rx = controller.status_receiver();
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            match &status.detail {
                Some(detail) => info!("session {}: {detail}", status.state),
                None => info!("session {}", status.state),
            }
        }
    });

    let mut source = TestPatternSource::new(
        config.capture.width,
        config.capture.height,
        config.capture.fps,
    );
    let capture_running = source.stop_handle();
    let frames = source.start_capture()?;

    // Ctrl-C ends capture; the pump then drains out naturally.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("ctrl-c received — shutting down");
        capture_running.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    controller.start(&endpoint).await;

    // Frame pump: the capture side runs at its own cadence and must
    // never block on the network, so it lives on a blocking thread.
    let pump = tokio::task::spawn_blocking(move || {
        for frame in frames {
            controller.on_frame(frame);
        }
        controller
    });

    let mut controller = pump.await?;
    controller.stop().await;

    let stats = controller.stats();
    info!(
        "stream stopped: {} sent, {} dropped, {} bytes",
        stats.frames_sent, stats.frames_dropped, stats.bytes_sent
    );

    Ok(())
}
