//! Driver Risk Estimator API Server
//!
//! REST API over the drowsiness monitor and the fuzzy risk engine, plus the
//! background loops that feed them.

use axum::{
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use dms::{DrowsinessEstimate, WorkerHandle};
use risk_engine::{
    CalendarContext, InferenceResult, RiskEngine, RiskInputs, RiskLevel, WeatherCondition,
    WeatherTable, WeekdayConvention,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod error;
mod routes;
pub mod runtime;
pub mod settings;

pub use error::ApiError;
use settings::{LoggingSettings, Settings};

/// Shared handle used by handlers and background loops
pub type SharedState = Arc<RwLock<AppState>>;

/// Latest vehicle-side context, pushed by the vehicle integration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleContext {
    pub speed_kmh: f64,
    /// Provider weather condition id
    pub weather_id: Option<u32>,
}

/// One risk evaluation with the inputs that produced it
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub asset: &'static str,
    pub inputs: RiskInputs,
    pub inference: InferenceResult,
    pub timestamp: DateTime<Utc>,
}

/// Risk query; unset fields come from the live state
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskRequest {
    pub speed_kmh: Option<f64>,
    pub hour: Option<f64>,
    pub week_day: Option<f64>,
    /// Already classified weather, takes precedence over `weather_id`
    pub weather: Option<WeatherCondition>,
    pub weather_id: Option<u32>,
    /// Drowsiness score in [0, 1]
    pub sleep: Option<f64>,
}

/// Application state shared across handlers
pub struct AppState {
    pub risk_engine: Arc<RiskEngine>,
    /// Classification worker, absent when no frame source is configured
    pub worker: Option<WorkerHandle>,
    pub weather_table: WeatherTable,
    pub weekday_convention: WeekdayConvention,
    pub vehicle: VehicleContext,
    pub latest_risk: Option<RiskAssessment>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(risk_engine: Arc<RiskEngine>, settings: &Settings) -> Self {
        Self {
            risk_engine,
            worker: None,
            weather_table: settings.risk.weather.clone(),
            weekday_convention: settings.risk.weekday_convention,
            vehicle: VehicleContext::default(),
            latest_risk: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn latest_estimate(&self) -> Option<DrowsinessEstimate> {
        self.worker.as_ref().and_then(WorkerHandle::latest)
    }

    /// Fill a risk request from live state and the calendar
    pub fn resolve_inputs(
        &self,
        request: &RiskRequest,
        calendar: CalendarContext,
    ) -> Result<RiskInputs, ApiError> {
        let weather = match (request.weather, request.weather_id, self.vehicle.weather_id) {
            (Some(condition), _, _) => condition,
            (None, Some(id), _) | (None, None, Some(id)) => self.weather_table.classify(id),
            (None, None, None) => WeatherCondition::Unknown,
        };

        let sleep = match request.sleep {
            Some(score) => score,
            None => self.latest_estimate().ok_or(ApiError::NoEstimate)?.score,
        };

        Ok(RiskInputs {
            speed_kmh: request.speed_kmh.unwrap_or(self.vehicle.speed_kmh),
            week_day: request.week_day.unwrap_or(calendar.week_day as f64),
            hour: request.hour.unwrap_or(calendar.hour as f64),
            weather,
            sleep,
        })
    }

    /// Resolve and evaluate a risk request
    pub fn assess(&self, request: &RiskRequest) -> Result<RiskAssessment, ApiError> {
        let calendar = CalendarContext::now(self.weekday_convention);
        let inputs = self.resolve_inputs(request, calendar)?;
        let inference = self.risk_engine.evaluate_detailed(&inputs)?;
        let level = RiskLevel::ALL[inference.winner];

        Ok(RiskAssessment {
            level,
            asset: level.asset_key(),
            inputs,
            inference,
            timestamp: Utc::now(),
        })
    }
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::get_health))
        .route("/api/v1/status", get(routes::status::get_status))
        .route("/api/v1/context", put(routes::status::put_context))
        .route("/api/v1/risk", post(routes::risk::post_risk))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) {
    let level = settings.level.parse::<Level>().unwrap_or(Level::INFO);

    let result = if settings.json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the server until it fails
pub async fn run_server(addr: &str, state: SharedState) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
