pub mod gateway_service;

pub use gateway_service::{
    GatewayComponents, GatewayService, HealthStatus, RegistrationRequest, RegistrationResponse,
    TokenResponse,
};
