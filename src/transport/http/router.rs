use crate::transport::http::handlers::{auth, health, ledger};
use crate::transport::http::types::{
    ErrorResponse, HealthResponse, IssueElForm, LoginForm, LoginResponseBody, RegisterForm,
    RegisterResponseBody,
};
use axum::routing::{get, post};
use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::index_handler,
        health::healthcheck_handler,
        auth::register_handler,
        auth::login_handler,
        ledger::issue_el_handler,
        ledger::get_trade_handler,
        ledger::get_trade_status_handler,
        ledger::get_el_handler,
        ledger::get_el_status_handler,
        ledger::list_trades_handler,
        ledger::get_trades_by_range_handler,
        ledger::get_trade_history_handler
    ),
    components(schemas(
        ErrorResponse,
        HealthResponse,
        RegisterForm,
        RegisterResponseBody,
        LoginForm,
        LoginResponseBody,
        IssueElForm
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/", get(health::index_handler))
        .route("/health", get(health::healthcheck_handler))
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/issueEL", post(ledger::issue_el_handler))
        .route("/getTrade", get(ledger::get_trade_handler))
        .route("/getTradeStatus", get(ledger::get_trade_status_handler))
        .route("/getEL", get(ledger::get_el_handler))
        .route("/getELStatus", get(ledger::get_el_status_handler))
        .route("/listTrades", get(ledger::list_trades_handler))
        .route("/getTradesByRange", get(ledger::get_trades_by_range_handler))
        .route("/getTradeHistory", get(ledger::get_trade_history_handler))
        .with_state(app_state)
}
