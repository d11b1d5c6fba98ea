//! # scan-sim
//!
//! Runs the scanner controller against the simulated platform and the seeded
//! catalog, then prints the resulting cart.
//!
//! ```text
//! RUST_LOG=debug cargo run -p tally-scanner --bin scan-sim [config.toml]
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tally_core::{BarcodeFormat, Catalog, DecodeResult};
use tally_scanner::sim::{SimEngineFactory, SimMediaDevices};
use tally_scanner::{
    CartHandoff, LogFeedback, ScanError, ScannerConfig, ScannerController, ScannerDeps,
    ScannerHandle, ScannerPhase, ScannerStatus,
};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

const PHASE_TIMEOUT: Duration = Duration::from_secs(15);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

async fn wait_until<F>(handle: &ScannerHandle, what: &str, done: F) -> Result<(), ScanError>
where
    F: FnMut(&ScannerStatus) -> bool,
{
    let mut status = handle.subscribe();
    let reached = matches!(
        tokio::time::timeout(PHASE_TIMEOUT, status.wait_for(done)).await,
        Ok(Ok(_))
    );
    if reached {
        return Ok(());
    }
    Err(ScanError::ChannelError(format!(
        "scanner never reached {} (phase {})",
        what,
        handle.status().phase
    )))
}

async fn wait_for_phase(handle: &ScannerHandle, phase: ScannerPhase) -> Result<(), ScanError> {
    wait_until(handle, &phase.to_string(), |s| s.phase == phase).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ScannerConfig::load(std::env::args().nth(1).map(PathBuf::from))?;
    let sink = Arc::new(LogFeedback);
    let media = Arc::new(SimMediaDevices::with_cameras(&[
        ("front-0", "Front Camera"),
        ("back-0", "Back Camera"),
    ]));
    let engines = Arc::new(SimEngineFactory::new());
    let handoff = CartHandoff::new(Arc::new(Catalog::seeded()), sink.clone());

    let handle = ScannerController::spawn(
        config.clone(),
        ScannerDeps {
            media: media.clone(),
            engines: engines.clone(),
            feedback: sink,
            handler: Arc::new(handoff.clone()),
        },
    );

    handle.open().await?;
    wait_for_phase(&handle, ScannerPhase::SessionActive).await?;
    info!(device = ?handle.status().active_device, "Scanning");

    let pause = config.pause_window() + Duration::from_millis(100);
    let script = [
        ("8801234567891", 0.92),
        ("8801234567891", 0.95),
        ("8801234567899", 0.40),
        ("8801234567893", 0.88),
        ("4006381333931", 0.90),
    ];

    for (code, confidence) in script {
        engines.emit(DecodeResult::new(code, BarcodeFormat::Ean13, confidence));
        tokio::time::sleep(Duration::from_millis(50)).await;
        if handle.status().phase == ScannerPhase::Detecting {
            wait_for_phase(&handle, ScannerPhase::SessionActive).await?;
        }
    }

    if let Err(e) = handle.submit_manual(" ").await {
        info!(error = %e, "Blank manual code rejected");
    }
    handle.submit_manual("8801234567817").await?;
    info!(recent = handle.status().recent_scans.len(), "Manual code entered");

    handle.switch_camera().await?;
    wait_for_phase(&handle, ScannerPhase::SessionActive).await?;
    info!(device = ?handle.status().active_device, "Switched camera");

    media.lose_stream();
    wait_until(&handle, "stream recovery", |s| s.stream_retry_attempt > 0).await?;
    wait_for_phase(&handle, ScannerPhase::SessionActive).await?;
    info!("Recovered from stream loss");

    tokio::time::sleep(pause).await;
    handle.shutdown().await?;

    let totals = handoff.totals();
    println!("{}", serde_json::to_string_pretty(&totals)?);
    info!(
        streams_opened = media.streams_opened(),
        engines_created = engines.created(),
        max_live_engines = engines.max_live(),
        "Simulation finished"
    );

    Ok(())
}
