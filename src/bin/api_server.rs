// src/bin/api_server.rs

use regulator_gateway::transport;
use regulator_gateway::{GatewayConfig, GatewayService};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- Configuration ---
    let config = GatewayConfig::from_env()?;
    info!(?config, "configuration loaded");

    // --- Service Initialization ---
    let service = Arc::new(GatewayService::from_config(&config)?);
    service
        .bootstrap_admin(&config.bootstrap_admin_user, &config.bootstrap_admin_password)
        .await?;

    // Enroll the registrar eagerly so the first registration does not pay for it. A failure
    // here is not fatal: /register retries and reports it.
    if service.identities().enroll_registrar(service.org()).await {
        info!(org = %service.org(), "registrar identity ready");
    } else {
        warn!(org = %service.org(), "registrar enrollment failed at startup; will retry on first registration");
    }

    let app_state = transport::http::AppState { service };

    // --- API Server Initialization ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "API server listening");
    info!("Swagger UI available at /swagger-ui");

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!(error = %e, "server terminated");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
