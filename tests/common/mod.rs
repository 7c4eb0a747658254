//! Shared harness: a gateway over an in-memory ledger, served on an ephemeral port.

#![allow(dead_code)]

use regulator_gateway::domain::InMemoryCredentialStore;
use regulator_gateway::ledger::{InMemoryLedger, LedgerClient};
use regulator_gateway::storage::wallet::{InMemoryWallet, Wallet};
use regulator_gateway::{transport, GatewayComponents, GatewayConfig, GatewayService};
use regulator_gateway::crypto::keys::generate_signing_key;
use std::sync::Arc;
use std::time::Duration;

pub struct TestGateway {
    pub config: GatewayConfig,
    pub service: Arc<GatewayService>,
    pub ledger: Arc<InMemoryLedger>,
    pub wallet: Arc<dyn Wallet>,
}

impl TestGateway {
    pub async fn new() -> Self {
        Self::with_config(GatewayConfig::default()).await
    }

    pub async fn with_config(config: GatewayConfig) -> Self {
        Self::with_wallet(config, Arc::new(InMemoryWallet::new())).await
    }

    pub async fn with_wallet(config: GatewayConfig, wallet: Arc<dyn Wallet>) -> Self {
        let ledger = Arc::new(InMemoryLedger::with_sample_contracts(
            &config.registrar,
            &config.routes,
        ));
        let components = GatewayComponents {
            ledger: ledger.clone() as Arc<dyn LedgerClient>,
            wallet: wallet.clone(),
            credentials: Arc::new(InMemoryCredentialStore::new()),
            signing_key: generate_signing_key(),
        };
        let service = Arc::new(GatewayService::new(&config, components));
        service
            .bootstrap_admin(&config.bootstrap_admin_user, &config.bootstrap_admin_password)
            .await
            .expect("bootstrap admin");
        Self {
            config,
            service,
            ledger,
            wallet,
        }
    }

    /// Serves the router on 127.0.0.1 with an OS-assigned port; returns the base URL.
    pub async fn serve(&self) -> String {
        let state = transport::http::AppState {
            service: self.service.clone(),
        };
        let router = transport::http::create_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Registers `username` through the registrar account and logs it in.
    pub async fn provision(&self, username: &str, password: &str, role: &str) -> String {
        self.service
            .register(regulator_gateway::app::RegistrationRequest {
                registrar_user: self.config.bootstrap_admin_user.clone(),
                registrar_password: self.config.bootstrap_admin_password.clone(),
                username: username.to_string(),
                password: password.to_string(),
                role: role.to_string(),
            })
            .await
            .expect("register");
        self.service
            .login(username, password)
            .await
            .expect("login")
            .token
    }

    /// Submits a transaction directly through the dispatcher, bypassing HTTP.
    pub async fn submit(&self, username: &str, channel: &str, contract: &str, action: &str, args: &[&str]) {
        let result = self
            .service
            .dispatcher()
            .invoke_contract(username, channel, contract, false, action, args)
            .await;
        assert!(result.is_success(), "{} failed: {:?}", action, result);
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("reqwest client")
}
