//! Organization-scoped storage of enrolled ledger identities.
//!
//! A wallet is the single source of truth for "who can act on the ledger": an identity
//! exists for a username iff that user was successfully enrolled. Entries are written once
//! and never partially.

use crate::domain::identity::LedgerIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod filesystem;
pub mod memory;

pub use filesystem::FileSystemWallet;
pub use memory::InMemoryWallet;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt wallet entry {label}: {reason}")]
    Corrupt { label: String, reason: String },
    #[error("invalid wallet label {0:?}")]
    InvalidLabel(String),
}

#[async_trait]
pub trait Wallet: Send + Sync {
    async fn get(&self, org: &str, username: &str) -> Result<Option<LedgerIdentity>, WalletError>;

    /// Stores `identity` under `org`, replacing any previous entry for the same username.
    async fn put(&self, org: &str, identity: &LedgerIdentity) -> Result<(), WalletError>;

    async fn contains(&self, org: &str, username: &str) -> Result<bool, WalletError> {
        Ok(self.get(org, username).await?.is_some())
    }

    /// Usernames with an identity under `org`, sorted.
    async fn list(&self, org: &str) -> Result<Vec<String>, WalletError>;
}

/// Labels become file names, so keep them to a conservative character set.
pub fn validate_label(label: &str) -> Result<(), WalletError> {
    let ok = !label.is_empty()
        && label.len() <= 128
        && label != "."
        && label != ".."
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'));
    if ok {
        Ok(())
    } else {
        Err(WalletError::InvalidLabel(label.to_string()))
    }
}

/// On-disk identity format.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WalletEntry {
    pub version: u32,
    pub msp_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub credentials: WalletCredentials,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WalletCredentials {
    pub certificate: String,
    pub private_key: String,
}

impl WalletEntry {
    pub fn from_identity(identity: &LedgerIdentity) -> Self {
        Self {
            version: 1,
            msp_id: identity.msp_id.clone(),
            kind: "Ed25519".to_string(),
            credentials: WalletCredentials {
                certificate: identity.certificate.clone(),
                private_key: identity.private_key.clone(),
            },
        }
    }

    pub fn into_identity(self, username: &str) -> LedgerIdentity {
        LedgerIdentity::new(
            self.msp_id,
            username,
            self.credentials.certificate,
            self.credentials.private_key,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert!(validate_label("alice").is_ok());
        assert!(validate_label("alice.smith@example").is_ok());
        assert!(validate_label("").is_err());
        assert!(validate_label("..").is_err());
        assert!(validate_label("../etc/passwd").is_err());
        assert!(validate_label("a b").is_err());
    }
}
