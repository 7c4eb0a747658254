use crate::domain::dispatch::{InvocationResult, ProtectedAction};
use crate::transport::http::types::{ledger_error_body, AppState};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

/// Picks a content type for a payload we do not interpret.
pub fn payload_content_type(payload: &[u8]) -> &'static str {
    if serde_json::from_slice::<serde::de::IgnoredAny>(payload).is_ok() {
        "application/json"
    } else if std::str::from_utf8(payload).is_ok() {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

pub fn invocation_response(result: InvocationResult) -> Response {
    match result {
        InvocationResult::Success(payload) => (
            StatusCode::OK,
            [(CONTENT_TYPE, payload_content_type(&payload))],
            payload,
        )
            .into_response(),
        InvocationResult::Failure(message) => ledger_error_body(&message),
    }
}

/// Token -> username -> dispatch -> response.
pub async fn perform(state: &AppState, headers: &HeaderMap, action: ProtectedAction) -> Response {
    invocation_response(state.service.perform(headers, action).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_sniffing() {
        assert_eq!(payload_content_type(br#"{"tradeId":"T1"}"#), "application/json");
        assert_eq!(payload_content_type(b"[]"), "application/json");
        assert_eq!(payload_content_type(b"ok"), "text/plain; charset=utf-8");
        assert_eq!(payload_content_type(&[0xff, 0xfe]), "application/octet-stream");
    }
}
