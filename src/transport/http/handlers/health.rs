use crate::transport::http::types::{AppState, HealthResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Portal banner", content_type = "text/html"))
)]
pub async fn index_handler() -> impl IntoResponse {
    Html("<h1>You have reached the Regulator Organization Portal!</h1>")
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up; reports whether the registrar is enrolled", body = HealthResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.service.health().await;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            org_msp_id: health.org_msp_id,
            registrar_enrolled: health.registrar_enrolled,
        }),
    )
}
