//! One JSON file per identity: `<root>/<org>/<username>.id`.
//!
//! Writes go to a temporary sibling and are renamed into place, so a reader sees either no
//! entry or a complete one.

use crate::domain::identity::LedgerIdentity;
use crate::storage::wallet::{validate_label, Wallet, WalletEntry, WalletError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENTRY_EXT: &str = "id";

pub struct FileSystemWallet {
    root: PathBuf,
}

impl FileSystemWallet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, org: &str, username: &str) -> Result<PathBuf, WalletError> {
        validate_label(org)?;
        validate_label(username)?;
        Ok(self.root.join(org).join(format!("{}.{}", username, ENTRY_EXT)))
    }
}

#[async_trait]
impl Wallet for FileSystemWallet {
    async fn get(&self, org: &str, username: &str) -> Result<Option<LedgerIdentity>, WalletError> {
        let path = self.entry_path(org, username)?;
        let content = match tokio::fs::read(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: WalletEntry = serde_json::from_slice(&content).map_err(|e| WalletError::Corrupt {
            label: username.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(entry.into_identity(username)))
    }

    async fn put(&self, org: &str, identity: &LedgerIdentity) -> Result<(), WalletError> {
        let path = self.entry_path(org, &identity.username)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let content = serde_json::to_vec_pretty(&WalletEntry::from_identity(identity)).map_err(|e| {
            WalletError::Corrupt {
                label: identity.username.clone(),
                reason: e.to_string(),
            }
        })?;

        let tmp = path.with_extension(format!("{}.tmp", ENTRY_EXT));
        tokio::fs::write(&tmp, &content).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(org, user = %identity.username, path = %path.display(), "wallet entry written");
        Ok(())
    }

    async fn list(&self, org: &str) -> Result<Vec<String>, WalletError> {
        validate_label(org)?;
        let dir = self.root.join(org);
        let mut rd = match tokio::fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
