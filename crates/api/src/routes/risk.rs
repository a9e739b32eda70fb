//! Risk Route

use axum::{extract::State, Json};
use tracing::debug;

use crate::{ApiError, RiskAssessment, RiskRequest, SharedState};

/// Evaluate the risk engine for a supplied (possibly partial) context
pub async fn post_risk(
    State(state): State<SharedState>,
    Json(request): Json<RiskRequest>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let state = state.read().await;
    let assessment = state.assess(&request)?;
    debug!("Risk query {:?} -> {}", request, assessment.level);
    Ok(Json(assessment))
}
