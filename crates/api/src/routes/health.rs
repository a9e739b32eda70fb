//! Health Route

use axum::{extract::State, Json};
use dms::WorkerStats;
use serde::Serialize;

use crate::SharedState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub classifier: ClassifierHealth,
    pub risk_engine: RiskEngineHealth,
}

#[derive(Debug, Serialize)]
pub struct ClassifierHealth {
    /// "running" or "disabled"
    pub status: String,
    pub last_estimate_ms: Option<u64>,
    pub worker: Option<WorkerStats>,
}

#[derive(Debug, Serialize)]
pub struct RiskEngineHealth {
    pub rules: usize,
    pub last_assessment: Option<String>,
}

/// Health check handler
pub async fn get_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let classifier = match &state.worker {
        Some(worker) => ClassifierHealth {
            status: "running".to_string(),
            last_estimate_ms: worker.latest().map(|e| e.timestamp_ms),
            worker: Some(worker.stats()),
        },
        None => ClassifierHealth {
            status: "disabled".to_string(),
            last_estimate_ms: None,
            worker: None,
        },
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            classifier,
            risk_engine: RiskEngineHealth {
                rules: state.risk_engine.system().rules().len(),
                last_assessment: state.latest_risk.as_ref().map(|r| r.timestamp.to_rfc3339()),
            },
        },
    })
}
