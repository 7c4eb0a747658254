//! Gateway-level failures and their HTTP status.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Bad credentials")]
    AuthenticationFailure,
    #[error("{0} is not a registrar")]
    NotRegistrar(String),
    #[error("{0} is not a recognized role")]
    UnrecognizedRole(String),
    #[error("'{0}' is not a valid username")]
    InvalidUsername(String),
    #[error("Identity for {0} not found in wallet")]
    MissingLedgerIdentity(String),
    #[error("Unable to enroll registrar")]
    RegistrarEnrollment,
    #[error("Unable to register user {0}")]
    UserRegistration(String),
    /// Protected routes report this inside a normalized 200 body, like every other dispatch
    /// failure.
    #[error("Unable to get username from headers")]
    Unauthenticated,
    /// Details are logged, never returned.
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailure
            | GatewayError::NotRegistrar(_)
            | GatewayError::MissingLedgerIdentity(_) => StatusCode::FORBIDDEN,
            GatewayError::UnrecognizedRole(_) | GatewayError::InvalidUsername(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Unauthenticated => StatusCode::OK,
            GatewayError::RegistrarEnrollment
            | GatewayError::UserRegistration(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for GatewayError {
    fn from(e: anyhow::Error) -> Self {
        GatewayError::Internal(e)
    }
}
