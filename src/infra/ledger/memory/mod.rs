//! Self-contained ledger used for local runs and tests.
//!
//! It plays both roles behind [`LedgerClient`]: a CA that registers enrollment ids and issues
//! signed certificates carrying a `role` attribute, and a peer network that executes
//! [`Chaincode`] against a per-contract [`WorldState`]. Evaluation simulates the transaction
//! and throws its write set away; submission commits it and records key history.

use crate::infra::config::{LedgerRoutes, RegistrarCredentials};
use crate::crypto::certificate::{self, CertificateBody};
use crate::crypto::keys::{generate_signing_key, signing_key_to_hex, verifying_key_to_hex};
use crate::domain::identity::LedgerIdentity;
use crate::domain::role::Role;
use crate::infra::ledger::{ContractTarget, LedgerClient, LedgerError};
use async_trait::async_trait;
use chrono::Utc;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

pub mod contracts;
pub mod state;

pub use contracts::{ExportLicenseContract, TradeContract};
pub use state::{HistoryEntry, WorldState};

/// Business logic deployed on a channel.
pub trait Chaincode: Send + Sync {
    fn invoke(
        &self,
        ctx: &mut TransactionContext<'_>,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, String>;
}

/// What a chaincode sees while executing: committed state, its own pending writes and the
/// verified creator certificate.
pub struct TransactionContext<'a> {
    state: &'a WorldState,
    writes: BTreeMap<String, Option<Vec<u8>>>,
    creator: &'a CertificateBody,
    tx_id: &'a str,
    timestamp: i64,
}

impl<'a> TransactionContext<'a> {
    fn new(state: &'a WorldState, creator: &'a CertificateBody, tx_id: &'a str, timestamp: i64) -> Self {
        Self {
            state,
            writes: BTreeMap::new(),
            creator,
            tx_id,
            timestamp,
        }
    }

    pub fn get_state(&self, key: &str) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(pending) => pending.clone(),
            None => self.state.get(key).cloned(),
        }
    }

    pub fn put_state(&mut self, key: &str, value: Vec<u8>) {
        self.writes.insert(key.to_string(), Some(value));
    }

    pub fn delete_state(&mut self, key: &str) {
        self.writes.insert(key.to_string(), None);
    }

    /// Range reads see committed state only.
    pub fn state_range(&self, from: &str, to: &str) -> Vec<(String, Vec<u8>)> {
        self.state.range(from, to)
    }

    pub fn history(&self, key: &str) -> &[HistoryEntry] {
        self.state.history(key)
    }

    pub fn creator(&self) -> &CertificateBody {
        self.creator
    }

    pub fn creator_role(&self) -> Option<&str> {
        self.creator.role.as_deref()
    }

    pub fn tx_id(&self) -> &str {
        self.tx_id
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn into_writes(self) -> BTreeMap<String, Option<Vec<u8>>> {
        self.writes
    }
}

struct Registration {
    secret: String,
    role: Option<Role>,
}

struct CaState {
    registrations: HashMap<String, Registration>,
    next_serial: u64,
}

#[derive(Default)]
struct Network {
    contracts: HashMap<ContractTarget, Arc<dyn Chaincode>>,
    states: HashMap<ContractTarget, WorldState>,
    next_tx: u64,
}

// Mirrors the body the REST client signs so both clients authorize the same bytes.
#[derive(Serialize)]
struct ProposalPayload<'a> {
    msp_id: &'a str,
    action: &'a str,
    args: &'a [String],
}

#[derive(Serialize)]
struct RegisterPayload<'a> {
    id: &'a str,
    role: &'a str,
}

pub struct InMemoryLedger {
    ca_name: String,
    ca_key: SigningKey,
    ca: Mutex<CaState>,
    network: Mutex<Network>,
    available: AtomicBool,
    latency_ms: AtomicU64,
    committed: AtomicU64,
    evaluated: AtomicU64,
}

impl InMemoryLedger {
    /// A ledger whose CA knows only the bootstrap registrar.
    pub fn new(registrar: &RegistrarCredentials) -> Self {
        let mut registrations = HashMap::new();
        registrations.insert(
            registrar.enrollment_id.clone(),
            Registration {
                secret: registrar.secret.clone(),
                role: Some(Role::Registrar),
            },
        );
        Self {
            ca_name: "ca.memory".to_string(),
            ca_key: generate_signing_key(),
            ca: Mutex::new(CaState {
                registrations,
                next_serial: 1,
            }),
            network: Mutex::new(Network::default()),
            available: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            evaluated: AtomicU64::new(0),
        }
    }

    /// Installs the trade and export-license contracts at the configured routes.
    pub fn with_sample_contracts(registrar: &RegistrarCredentials, routes: &LedgerRoutes) -> Self {
        Self::new(registrar)
            .with_contract(
                ContractTarget::new(&routes.trade_channel, &routes.trade_contract_id),
                TradeContract,
            )
            .with_contract(
                ContractTarget::new(&routes.shipping_channel, &routes.el_contract_id),
                ExportLicenseContract,
            )
    }

    pub fn with_contract<C: Chaincode + 'static>(mut self, target: ContractTarget, chaincode: C) -> Self {
        self.network.get_mut().contracts.insert(target, Arc::new(chaincode));
        self
    }

    /// Simulates a partitioned network: every call fails with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Adds artificial latency to every call.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of committed transactions since startup.
    pub fn committed_transactions(&self) -> u64 {
        self.committed.load(Ordering::SeqCst)
    }

    pub fn evaluated_transactions(&self) -> u64 {
        self.evaluated.load(Ordering::SeqCst)
    }

    pub fn ca_verifying_key(&self) -> VerifyingKey {
        self.ca_key.verifying_key()
    }

    /// Whether the CA has a registration for `enrollment_id`.
    pub async fn is_registered(&self, enrollment_id: &str) -> bool {
        self.ca.lock().await.registrations.contains_key(enrollment_id)
    }

    async fn network_round_trip(&self) -> Result<(), LedgerError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    /// Verifies the caller's certificate chain and proof of possession over `payload`.
    fn authenticate(&self, identity: &LedgerIdentity, payload: &[u8]) -> Result<CertificateBody, LedgerError> {
        let token = identity
            .authorize(payload)
            .map_err(|e| LedgerError::Unauthorized(e.to_string()))?;
        let body = certificate::verify_authorization(&token, payload, &self.ca_key.verifying_key())
            .ok_or_else(|| {
                LedgerError::Unauthorized(format!(
                    "certificate for {} was not issued by {}",
                    identity.username, self.ca_name
                ))
            })?;
        if body.msp_id != identity.msp_id || body.subject != identity.username {
            return Err(LedgerError::Unauthorized(
                "certificate does not match the presented identity".to_string(),
            ));
        }
        Ok(body)
    }

    async fn execute(
        &self,
        identity: &LedgerIdentity,
        target: &ContractTarget,
        action: &str,
        args: &[String],
        commit: bool,
    ) -> Result<Vec<u8>, LedgerError> {
        self.network_round_trip().await?;
        let payload = serde_json::to_vec(&ProposalPayload {
            msp_id: &identity.msp_id,
            action,
            args,
        })
        .map_err(|e| LedgerError::Protocol(e.to_string()))?;
        let creator = self.authenticate(identity, &payload)?;

        let mut net = self.network.lock().await;
        let chaincode = net
            .contracts
            .get(target)
            .cloned()
            .ok_or_else(|| LedgerError::Rejected(format!("contract {} is not deployed", target)))?;
        net.next_tx += 1;
        let tx_id = format!("{:016x}", net.next_tx);
        let timestamp = Utc::now().timestamp();

        let state = net.states.entry(target.clone()).or_default();
        let mut ctx = TransactionContext::new(state, &creator, &tx_id, timestamp);
        let result = chaincode.invoke(&mut ctx, action, args);
        let writes = ctx.into_writes();
        let response = result.map_err(LedgerError::Rejected)?;

        if commit {
            state.commit(&tx_id, timestamp, writes);
            self.committed.fetch_add(1, Ordering::SeqCst);
            debug!(%target, action, tx_id, "transaction committed");
        } else {
            self.evaluated.fetch_add(1, Ordering::SeqCst);
        }
        Ok(response)
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn enroll(
        &self,
        msp_id: &str,
        enrollment_id: &str,
        secret: &str,
    ) -> Result<LedgerIdentity, LedgerError> {
        self.network_round_trip().await?;
        let mut ca = self.ca.lock().await;
        let role = match ca.registrations.get(enrollment_id) {
            Some(reg) if reg.secret == secret => reg.role,
            _ => return Err(LedgerError::Unauthorized("Authentication failure".to_string())),
        };
        let serial = ca.next_serial;
        ca.next_serial += 1;
        drop(ca);

        let key = generate_signing_key();
        let body = CertificateBody {
            serial: format!("{:x}", serial),
            subject: enrollment_id.to_string(),
            msp_id: msp_id.to_string(),
            role: role.map(|r| r.as_str().to_string()),
            public_key: verifying_key_to_hex(&key.verifying_key()),
            issuer: self.ca_name.clone(),
            not_before: Utc::now().timestamp(),
        };
        let cert = certificate::issue(&body, &self.ca_key).map_err(|e| LedgerError::Protocol(e.to_string()))?;
        Ok(LedgerIdentity::new(msp_id, enrollment_id, cert, signing_key_to_hex(&key)))
    }

    async fn register_user(
        &self,
        registrar: &LedgerIdentity,
        username: &str,
        role: Role,
    ) -> Result<String, LedgerError> {
        self.network_round_trip().await?;
        let payload = serde_json::to_vec(&RegisterPayload {
            id: username,
            role: role.as_str(),
        })
        .map_err(|e| LedgerError::Protocol(e.to_string()))?;
        let caller = self.authenticate(registrar, &payload)?;
        if caller.role.as_deref() != Some(Role::Registrar.as_str()) {
            return Err(LedgerError::Unauthorized(format!(
                "{} is not authorized to register identities",
                caller.subject
            )));
        }

        let mut ca = self.ca.lock().await;
        if ca.registrations.contains_key(username) {
            return Err(LedgerError::Rejected(format!(
                "Identity '{}' is already registered",
                username
            )));
        }
        let mut secret = [0u8; 16];
        OsRng.fill_bytes(&mut secret);
        let secret = hex::encode(secret);
        ca.registrations.insert(
            username.to_string(),
            Registration {
                secret: secret.clone(),
                role: Some(role),
            },
        );
        Ok(secret)
    }

    async fn evaluate_transaction(
        &self,
        identity: &LedgerIdentity,
        target: &ContractTarget,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError> {
        self.execute(identity, target, action, args, false).await
    }

    async fn submit_transaction(
        &self,
        identity: &LedgerIdentity,
        target: &ContractTarget,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError> {
        self.execute(identity, target, action, args, true).await
    }
}
