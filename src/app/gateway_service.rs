//! The Gateway Service.
//!
//! Ties the credential store, identity bridge, token service and dispatcher together into the
//! three externally visible flows:
//! 1.  Registration: a registrar provisions a new user (ledger identity + credentials).
//! 2.  Login: password check plus wallet check, then a bearer token.
//! 3.  Protected actions: bearer token -> username -> contract dispatch.

use crate::crypto::keys::{generate_signing_key, signing_key_from_hex};
use crate::domain::credentials::{Authenticator, CredentialStore, InMemoryCredentialStore};
use crate::domain::dispatch::{ContractDispatcher, InvocationResult, ProtectedAction};
use crate::domain::identity::IdentityBridge;
use crate::domain::role::{is_registrar, Role};
use crate::domain::token::{TokenService, UserDetails};
use crate::error::GatewayError;
use crate::infra::config::{GatewayConfig, LedgerMode, LedgerRoutes};
use crate::infra::ledger::{InMemoryLedger, LedgerClient, RestLedgerClient};
use crate::storage::wallet::{validate_label, FileSystemWallet, InMemoryWallet, Wallet};
use anyhow::anyhow;
use axum::http::HeaderMap;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub registrar_user: String,
    pub registrar_password: String,
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationResponse {
    pub username: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub org_msp_id: String,
    pub registrar_enrolled: bool,
}

/// Everything the service is built from. Lets tests swap in their own ledger and stores.
pub struct GatewayComponents {
    pub ledger: Arc<dyn LedgerClient>,
    pub wallet: Arc<dyn Wallet>,
    pub credentials: Arc<dyn CredentialStore>,
    pub signing_key: SigningKey,
}

impl GatewayComponents {
    /// Builds the ledger client and wallet selected by `config`.
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let ledger: Arc<dyn LedgerClient> = match config.ledger_mode {
            LedgerMode::Rest => {
                let ca_url = config
                    .ca_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("FABRIC_CA_URL is required in rest mode"))?;
                let gateway_url = config
                    .ledger_gateway_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("LEDGER_GATEWAY_URL is required in rest mode"))?;
                Arc::new(RestLedgerClient::new(ca_url, gateway_url, config.ledger_timeout)?)
            }
            LedgerMode::Memory => {
                info!("using in-memory ledger with sample contracts");
                Arc::new(InMemoryLedger::with_sample_contracts(
                    &config.registrar,
                    &config.routes,
                ))
            }
        };

        let wallet: Arc<dyn Wallet> = match &config.wallet_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "using filesystem wallet");
                Arc::new(FileSystemWallet::new(dir.clone()))
            }
            None => Arc::new(InMemoryWallet::new()),
        };

        let signing_key = match &config.token_signing_key {
            Some(hex_seed) => signing_key_from_hex(hex_seed)
                .map_err(|e| anyhow!("TOKEN_SIGNING_KEY is invalid: {}", e))?,
            None => {
                warn!("TOKEN_SIGNING_KEY not set; using an ephemeral key (tokens will not survive a restart)");
                generate_signing_key()
            }
        };

        Ok(Self {
            ledger,
            wallet,
            credentials: Arc::new(InMemoryCredentialStore::new()),
            signing_key,
        })
    }
}

pub struct GatewayService {
    org: String,
    routes: LedgerRoutes,
    authenticator: Authenticator,
    identities: Arc<IdentityBridge>,
    tokens: TokenService,
    dispatcher: ContractDispatcher,
}

impl GatewayService {
    pub fn new(config: &GatewayConfig, components: GatewayComponents) -> Self {
        let identities = Arc::new(IdentityBridge::new(
            components.ledger.clone(),
            components.wallet,
            config.registrar.clone(),
            config.ledger_timeout,
        ));
        let dispatcher = ContractDispatcher::new(
            config.org_msp_id.clone(),
            identities.clone(),
            components.ledger,
            config.ledger_timeout,
        );
        Self {
            org: config.org_msp_id.clone(),
            routes: config.routes.clone(),
            authenticator: Authenticator::new(components.credentials),
            identities,
            tokens: TokenService::new(components.signing_key, config.token_issuer.clone(), config.token_ttl),
            dispatcher,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config, GatewayComponents::from_config(config)?))
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn identities(&self) -> &IdentityBridge {
        &self.identities
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn dispatcher(&self) -> &ContractDispatcher {
        &self.dispatcher
    }

    /// Creates the application-level registrar account. Existing accounts are left alone.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> anyhow::Result<()> {
        if self
            .authenticator
            .create_user(username, password, Role::Registrar)
            .await?
        {
            info!(user = username, "bootstrap registrar account created");
        }
        Ok(())
    }

    pub async fn register(&self, req: RegistrationRequest) -> Result<RegistrationResponse, GatewayError> {
        let auth = self
            .authenticator
            .authenticate(&req.registrar_user, &req.registrar_password)
            .await?;
        if !is_registrar(&auth) {
            warn!(registrar = %req.registrar_user, target = %req.username, "registration by non-registrar rejected");
            return Err(GatewayError::NotRegistrar(req.registrar_user));
        }

        let role: Role = req
            .role
            .parse()
            .map_err(|e: crate::domain::role::UnknownRole| GatewayError::UnrecognizedRole(e.0))?;

        // Nothing may reach the CA for a name the wallet would refuse.
        if validate_label(&req.username).is_err() {
            return Err(GatewayError::InvalidUsername(req.username));
        }

        if !self.identities.enroll_registrar(&self.org).await {
            return Err(GatewayError::RegistrarEnrollment);
        }

        if !self.authenticator.store().exists(&req.username).await {
            if !self
                .identities
                .register_and_enroll_user(&self.org, &req.username, role)
                .await
            {
                return Err(GatewayError::UserRegistration(req.username));
            }
            self.authenticator
                .create_user(&req.username, &req.password, role)
                .await?;
        } else {
            info!(user = %req.username, "user already registered; nothing to do");
        }

        Ok(RegistrationResponse {
            username: req.username,
            roles: vec![role.as_str().to_string()],
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, GatewayError> {
        let auth = self.authenticator.authenticate(username, password).await?;

        if self.identities.load_identity(&self.org, username).await.is_none() {
            warn!(user = username, org = %self.org, "login refused: no ledger identity");
            return Err(GatewayError::MissingLedgerIdentity(username.to_string()));
        }

        let role = auth
            .roles
            .first()
            .copied()
            .ok_or_else(|| GatewayError::Internal(anyhow!("user {} has no role", username)))?;
        let token = self.tokens.issue_token(&UserDetails {
            username: auth.username,
            role,
        })?;
        info!(user = username, "token issued");
        Ok(TokenResponse { token })
    }

    /// Username behind the request's bearer token. The subject must still be a known user.
    pub async fn resolve_caller(&self, headers: &HeaderMap) -> Option<String> {
        let username = self.tokens.resolve_username(headers)?;
        if self.authenticator.store().exists(&username).await {
            Some(username)
        } else {
            warn!(user = %username, "token subject is not a registered user");
            None
        }
    }

    pub async fn perform(&self, headers: &HeaderMap, action: ProtectedAction) -> InvocationResult {
        let Some(username) = self.resolve_caller(headers).await else {
            return InvocationResult::failure(GatewayError::Unauthenticated.to_string());
        };
        let request = action.into_request(&username, &self.routes);
        self.dispatcher.invoke(&request).await
    }

    pub async fn health(&self) -> HealthStatus {
        HealthStatus {
            org_msp_id: self.org.clone(),
            registrar_enrolled: self.identities.registrar_enrolled(&self.org).await,
        }
    }
}
