//! Uniform contract invocation on behalf of an authenticated user.
//!
//! Every protected capability funnels through [`ContractDispatcher::invoke`] with a
//! (channel, contract, mode, action) tuple. Ledger failures never cross this boundary as
//! errors: they come back as [`InvocationResult::Failure`] with a client-safe message.

use crate::domain::identity::IdentityBridge;
use crate::infra::ledger::{Gateway, LedgerClient, LedgerError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub mod actions;

pub use actions::ProtectedAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// Evaluate against committed state; no ledger write.
    Query,
    /// Endorse, order and commit.
    Submit,
}

impl InvocationMode {
    pub fn read_only(read_only: bool) -> Self {
        if read_only {
            InvocationMode::Query
        } else {
            InvocationMode::Submit
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub channel: String,
    pub contract_id: String,
    pub mode: InvocationMode,
    pub action: String,
    pub args: Vec<String>,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    /// Contract response bytes, untouched.
    Success(Vec<u8>),
    Failure(String),
}

#[derive(Serialize, Debug)]
pub struct ErrorPayload<'a> {
    pub result: bool,
    pub error: &'a str,
}

impl InvocationResult {
    pub fn failure(message: impl Into<String>) -> Self {
        InvocationResult::Failure(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success(_))
    }

    /// Response body: the payload as-is, or `{"result":false,"error":...}`.
    pub fn into_body(self) -> Vec<u8> {
        match self {
            InvocationResult::Success(bytes) => bytes,
            InvocationResult::Failure(message) => error_body(&message),
        }
    }
}

pub fn error_body(message: &str) -> Vec<u8> {
    serde_json::to_vec(&ErrorPayload {
        result: false,
        error: message,
    })
    .unwrap_or_else(|_| br#"{"result":false,"error":"internal error"}"#.to_vec())
}

/// Client-facing message for a ledger failure. Contract rejections carry business meaning
/// ("Trade T1 not found") and pass through; transport and credential details stay in the logs.
pub fn normalize_ledger_error(err: &LedgerError) -> String {
    match err {
        LedgerError::Rejected(message) => message.clone(),
        LedgerError::Unauthorized(_) => "Ledger rejected the caller's identity".to_string(),
        LedgerError::Unavailable(_) => "Ledger network unavailable".to_string(),
        LedgerError::Timeout(_) => "Ledger request timed out".to_string(),
        LedgerError::Protocol(_) => "Unexpected response from ledger".to_string(),
    }
}

/// Default bound on cached gateway contexts.
pub const DEFAULT_GATEWAY_CACHE: usize = 1024;

pub struct ContractDispatcher {
    org: String,
    identities: Arc<IdentityBridge>,
    ledger: Arc<dyn LedgerClient>,
    timeout: Duration,
    /// Per-user contexts. An entry is replaced when the user's certificate changes, dropped
    /// when the wallet no longer has the user, and the whole map is flushed at capacity.
    gateways: RwLock<HashMap<String, Arc<Gateway>>>,
    cache_capacity: usize,
}

impl ContractDispatcher {
    pub fn new(
        org: impl Into<String>,
        identities: Arc<IdentityBridge>,
        ledger: Arc<dyn LedgerClient>,
        timeout: Duration,
    ) -> Self {
        Self {
            org: org.into(),
            identities,
            ledger,
            timeout,
            gateways: RwLock::new(HashMap::new()),
            cache_capacity: DEFAULT_GATEWAY_CACHE,
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    pub async fn cached_gateways(&self) -> usize {
        self.gateways.read().await.len()
    }

    /// Reuses the cached gateway for `username` while its identity is unchanged.
    async fn gateway_for(&self, username: &str) -> Option<Arc<Gateway>> {
        let Some(identity) = self.identities.load_identity(&self.org, username).await else {
            self.gateways.write().await.remove(username);
            return None;
        };

        if let Some(gw) = self.gateways.read().await.get(username) {
            if gw.identity().certificate == identity.certificate {
                return Some(gw.clone());
            }
        }

        let gw = Arc::new(Gateway::connect(self.ledger.clone(), identity, self.timeout));
        let mut gateways = self.gateways.write().await;
        if gateways.len() >= self.cache_capacity && !gateways.contains_key(username) {
            debug!(entries = gateways.len(), "gateway cache full; flushing");
            gateways.clear();
        }
        gateways.insert(username.to_string(), gw.clone());
        Some(gw)
    }

    pub async fn invoke(&self, request: &InvocationRequest) -> InvocationResult {
        let Some(gateway) = self.gateway_for(&request.username).await else {
            warn!(user = %request.username, org = %self.org, "no ledger identity for caller");
            return InvocationResult::failure(format!(
                "Identity for {} not found in wallet",
                request.username
            ));
        };

        let contract = gateway.contract(&request.channel, &request.contract_id);
        let outcome = match request.mode {
            InvocationMode::Query => contract.evaluate(&request.action, &request.args).await,
            InvocationMode::Submit => contract.submit(&request.action, &request.args).await,
        };

        match outcome {
            Ok(payload) => {
                info!(
                    user = %request.username,
                    target = %contract.target(),
                    action = %request.action,
                    mode = ?request.mode,
                    bytes = payload.len(),
                    "invocation succeeded"
                );
                InvocationResult::Success(payload)
            }
            Err(e) => {
                warn!(
                    user = %request.username,
                    target = %contract.target(),
                    action = %request.action,
                    mode = ?request.mode,
                    error = %e,
                    "invocation failed"
                );
                InvocationResult::Failure(normalize_ledger_error(&e))
            }
        }
    }

    /// Positional form of [`invoke`](Self::invoke).
    pub async fn invoke_contract(
        &self,
        username: &str,
        channel: &str,
        contract_id: &str,
        read_only: bool,
        action: &str,
        args: &[&str],
    ) -> InvocationResult {
        let request = InvocationRequest {
            channel: channel.to_string(),
            contract_id: contract_id.to_string(),
            mode: InvocationMode::read_only(read_only),
            action: action.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            username: username.to_string(),
        };
        self.invoke(&request).await
    }
}
