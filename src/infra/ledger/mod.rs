//! The narrow capability set the gateway needs from a permissioned ledger network.
//!
//! Everything behind [`LedgerClient`] (CA enrollment, endorsement, ordering, commit) is an
//! external system. The gateway only ever sees identities going in and bytes coming out.

use crate::domain::identity::LedgerIdentity;
use crate::domain::role::Role;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub mod gateway;
pub mod memory;
pub mod rest;

pub use gateway::{Contract, Gateway};
pub use memory::InMemoryLedger;
pub use rest::RestLedgerClient;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The contract or CA refused the request (endorsement failure, duplicate registration,
    /// unknown trade, ...). The message comes from the ledger side.
    #[error("ledger rejected the request: {0}")]
    Rejected(String),
    #[error("ledger refused the caller's credentials: {0}")]
    Unauthorized(String),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("ledger request timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected ledger response: {0}")]
    Protocol(String),
}

/// A contract deployed on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractTarget {
    pub channel: String,
    pub contract_id: String,
}

impl ContractTarget {
    pub fn new(channel: impl Into<String>, contract_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            contract_id: contract_id.into(),
        }
    }
}

impl fmt::Display for ContractTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.contract_id)
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Enrolls `enrollment_id` with the organization's CA and returns the resulting identity.
    async fn enroll(
        &self,
        msp_id: &str,
        enrollment_id: &str,
        secret: &str,
    ) -> Result<LedgerIdentity, LedgerError>;

    /// Registers `username` with the CA using the registrar's identity. The role is attached
    /// as a certificate attribute. Returns the one-time enrollment secret.
    async fn register_user(
        &self,
        registrar: &LedgerIdentity,
        username: &str,
        role: Role,
    ) -> Result<String, LedgerError>;

    /// Runs `action` against committed state without writing to the ledger.
    async fn evaluate_transaction(
        &self,
        identity: &LedgerIdentity,
        target: &ContractTarget,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError>;

    /// Endorses, orders and commits `action`. Returns once the transaction is committed.
    async fn submit_transaction(
        &self,
        identity: &LedgerIdentity,
        target: &ContractTarget,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError>;
}

/// Bounds a ledger round-trip. The inner future is dropped when the deadline passes.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(LedgerError::Timeout(limit)),
    }
}
