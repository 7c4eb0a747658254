use crate::domain::identity::LedgerIdentity;
use crate::storage::wallet::{validate_label, Wallet, WalletError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryWallet {
    entries: RwLock<HashMap<(String, String), LedgerIdentity>>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Wallet for InMemoryWallet {
    async fn get(&self, org: &str, username: &str) -> Result<Option<LedgerIdentity>, WalletError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(org.to_string(), username.to_string())).cloned())
    }

    async fn put(&self, org: &str, identity: &LedgerIdentity) -> Result<(), WalletError> {
        validate_label(org)?;
        validate_label(&identity.username)?;
        let mut entries = self.entries.write().await;
        entries.insert((org.to_string(), identity.username.clone()), identity.clone());
        Ok(())
    }

    async fn list(&self, org: &str) -> Result<Vec<String>, WalletError> {
        let entries = self.entries.read().await;
        let mut names: Vec<String> = entries
            .keys()
            .filter(|(o, _)| o == org)
            .map(|(_, u)| u.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
