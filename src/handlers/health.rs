//! Liveness endpoint

use axum::response::Json;

use crate::models::HealthCheckResponse;

/// GET /healthcheck. Static liveness answer, no backend fan-out.
pub async fn healthcheck() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}
