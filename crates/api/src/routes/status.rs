//! Status Routes

use axum::{extract::State, http::StatusCode, Json};
use dms::DrowsinessEstimate;
use serde::Serialize;
use tracing::debug;

use crate::{RiskAssessment, SharedState, VehicleContext};

/// Latest outputs of both engines
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub drowsiness: Option<DrowsinessEstimate>,
    pub risk: Option<RiskAssessment>,
    pub vehicle: VehicleContext,
}

/// Get the latest drowsiness estimate and risk assessment
pub async fn get_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    let state = state.read().await;
    Json(StatusResponse {
        drowsiness: state.latest_estimate(),
        risk: state.latest_risk.clone(),
        vehicle: state.vehicle,
    })
}

/// Update speed and weather from the vehicle side
pub async fn put_context(
    State(state): State<SharedState>,
    Json(context): Json<VehicleContext>,
) -> StatusCode {
    debug!("Vehicle context update: {:?}", context);
    state.write().await.vehicle = context;
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use crate::create_router;
    use crate::tests::state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_context_update_visible_in_status() {
        let state = state();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::put("/api/v1/context")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"speed_kmh": 72.5, "weather_id": 501}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(Request::get("/api/v1/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["vehicle"]["speed_kmh"], 72.5);
        assert!(body["drowsiness"].is_null());
        assert!(body["risk"].is_null());
    }

    #[tokio::test]
    async fn test_health_reports_disabled_classifier() {
        let app = create_router(state());
        let response = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["components"]["classifier"]["status"], "disabled");
        assert_eq!(body["components"]["risk_engine"]["rules"], 18);
    }
}
