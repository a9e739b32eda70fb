//! Driver Risk Estimator - Main Entry Point

use api::runtime::{self, FrameReplay};
use api::settings::{Settings, DEFAULT_SETTINGS_PATH};
use api::{init_logging, run_server, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());
    let settings = Settings::load(&settings_path)?;
    init_logging(&settings.logging);

    info!("=== Driver Risk Estimator v{} ===", env!("CARGO_PKG_VERSION"));

    let engine = Arc::new(runtime::build_risk_engine(&settings)?);
    let state = Arc::new(RwLock::new(AppState::new(engine, &settings)));

    // Classification runs only with a frame source
    let mut worker = None;
    match &settings.source.landmarks_path {
        Some(path) => {
            let frames = runtime::load_landmarks(path)?;
            let (started, rest) = runtime::start_classifier(&settings, frames)?;
            state.write().await.worker = Some(started.handle());

            tokio::spawn(runtime::frame_sampler(
                started.handle(),
                FrameReplay::new(rest, settings.source.repeat),
                settings.dms.window_frames,
                Duration::from_millis(settings.source.frame_interval_ms),
            ));
            worker = Some(started);
        }
        None => warn!("No frame source configured, drowsiness classification disabled"),
    }

    tokio::spawn(runtime::risk_sampler(
        state.clone(),
        Duration::from_secs(settings.risk.interval_secs.max(1)),
    ));

    tokio::select! {
        result = run_server(&settings.server.bind, state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
    }

    if let Some(worker) = worker {
        let monitor = worker.shutdown().await?;
        info!("Classified {} windows", monitor.windows_classified());
    }

    Ok(())
}
