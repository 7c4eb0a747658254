use crate::app::GatewayService;
use crate::domain::dispatch::error_body;
use crate::error::GatewayError;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GatewayService>,
}

/// Normalized failure body: `{"result": false, "error": "..."}`.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub result: bool,
    pub error: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub registrar_user: String,
    pub registrar_password: String,
    pub username: String,
    pub password: String,
    /// Case-insensitive; one of REGISTRAR, REGULATOR, TRADER, EXPORTER, IMPORTER, CARRIER, BANKER.
    pub role: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct RegisterResponseBody {
    pub username: String,
    pub roles: Vec<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct LoginResponseBody {
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueElForm {
    pub trade_id: String,
    pub el_id: String,
    pub expiration_date: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TradeQuery {
    #[serde(rename = "tradeId")]
    pub trade_id: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TradeRangeQuery {
    #[serde(rename = "fromTradeId")]
    pub from_trade_id: String,
    #[serde(rename = "toTradeId")]
    pub to_trade_id: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub org_msp_id: String,
    pub registrar_enrolled: bool,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            result: false,
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::Internal(e) = &self {
            error!(error = ?e, "internal error");
        }
        error_response(self.status(), self.to_string())
    }
}

pub fn form_422(err: FormRejection, expected: &str) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Invalid form body: {} (expected: {})", err, expected),
    )
}

pub fn query_422(err: QueryRejection, expected: &str) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Invalid query: {} (expected: {})", err, expected),
    )
}

/// A normalized error body with a 200 status, as protected routes report failures.
pub fn ledger_error_body(message: &str) -> Response {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/json")],
        error_body(message),
    )
        .into_response()
}
