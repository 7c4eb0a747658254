//! Protected routes. Each maps to exactly one contract action.

use crate::domain::dispatch::ProtectedAction;
use crate::transport::http::handlers::common::perform;
use crate::transport::http::types::{
    form_422, query_422, AppState, IssueElForm, TradeQuery, TradeRangeQuery,
};
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Form;

#[utoipa::path(
    post,
    path = "/issueEL",
    request_body(content = IssueElForm, content_type = "application/x-www-form-urlencoded"),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Issued export license as returned by the contract, or a normalized error", body = crate::transport::http::types::ErrorResponse)
    )
)]
pub async fn issue_el_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<IssueElForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(f) => f,
        Err(e) => return form_422(e, "tradeId, elId, expirationDate"),
    };
    perform(
        &state,
        &headers,
        ProtectedAction::IssueEl {
            trade_id: form.trade_id,
            el_id: form.el_id,
            expiration_date: form.expiration_date,
        },
    )
    .await
}

#[utoipa::path(
    get,
    path = "/getTrade",
    params(TradeQuery),
    security(("bearer" = [])),
    responses((status = 200, description = "Trade record or a normalized error", body = crate::transport::http::types::ErrorResponse))
)]
pub async fn get_trade_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<TradeQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return query_422(e, "tradeId"),
    };
    perform(&state, &headers, ProtectedAction::GetTrade { trade_id: q.trade_id }).await
}

#[utoipa::path(
    get,
    path = "/getTradeStatus",
    params(TradeQuery),
    security(("bearer" = [])),
    responses((status = 200, description = "Trade status or a normalized error", body = crate::transport::http::types::ErrorResponse))
)]
pub async fn get_trade_status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<TradeQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return query_422(e, "tradeId"),
    };
    perform(&state, &headers, ProtectedAction::GetTradeStatus { trade_id: q.trade_id }).await
}

#[utoipa::path(
    get,
    path = "/getEL",
    params(TradeQuery),
    security(("bearer" = [])),
    responses((status = 200, description = "Export license or a normalized error", body = crate::transport::http::types::ErrorResponse))
)]
pub async fn get_el_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<TradeQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return query_422(e, "tradeId"),
    };
    perform(&state, &headers, ProtectedAction::GetEl { trade_id: q.trade_id }).await
}

#[utoipa::path(
    get,
    path = "/getELStatus",
    params(TradeQuery),
    security(("bearer" = [])),
    responses((status = 200, description = "Export license status or a normalized error", body = crate::transport::http::types::ErrorResponse))
)]
pub async fn get_el_status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<TradeQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return query_422(e, "tradeId"),
    };
    perform(&state, &headers, ProtectedAction::GetElStatus { trade_id: q.trade_id }).await
}

#[utoipa::path(
    get,
    path = "/listTrades",
    security(("bearer" = [])),
    responses((status = 200, description = "All trades or a normalized error", body = crate::transport::http::types::ErrorResponse))
)]
pub async fn list_trades_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    perform(&state, &headers, ProtectedAction::ListTrades).await
}

#[utoipa::path(
    get,
    path = "/getTradesByRange",
    params(TradeRangeQuery),
    security(("bearer" = [])),
    responses((status = 200, description = "Trades with ids in [fromTradeId, toTradeId) or a normalized error", body = crate::transport::http::types::ErrorResponse))
)]
pub async fn get_trades_by_range_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<TradeRangeQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return query_422(e, "fromTradeId, toTradeId"),
    };
    perform(
        &state,
        &headers,
        ProtectedAction::GetTradesByRange {
            from_trade_id: q.from_trade_id,
            to_trade_id: q.to_trade_id,
        },
    )
    .await
}

#[utoipa::path(
    get,
    path = "/getTradeHistory",
    params(TradeQuery),
    security(("bearer" = [])),
    responses((status = 200, description = "Modification history of a trade or a normalized error", body = crate::transport::http::types::ErrorResponse))
)]
pub async fn get_trade_history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<TradeQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return query_422(e, "tradeId"),
    };
    perform(&state, &headers, ProtectedAction::GetTradeHistory { trade_id: q.trade_id }).await
}
