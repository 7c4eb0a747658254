//! Enrollment of the registrar and, through it, of ordinary users.
//!
//! Only the registrar may mint identities, so user provisioning always goes through the
//! registrar's wallet entry. Failures are reported as `false` and logged; the caller decides
//! how to surface them.

use crate::domain::identity::LedgerIdentity;
use crate::domain::role::Role;
use crate::infra::config::RegistrarCredentials;
use crate::infra::ledger::{with_timeout, LedgerClient};
use crate::storage::wallet::{validate_label, Wallet};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub struct IdentityBridge {
    ledger: Arc<dyn LedgerClient>,
    wallet: Arc<dyn Wallet>,
    registrar: RegistrarCredentials,
    timeout: Duration,
    /// Serializes the registrar's check-then-enroll.
    registrar_lock: Mutex<()>,
    /// One lock per (org, username) being provisioned; unrelated users proceed in parallel.
    user_locks: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl IdentityBridge {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        wallet: Arc<dyn Wallet>,
        registrar: RegistrarCredentials,
        timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            wallet,
            registrar,
            timeout,
            registrar_lock: Mutex::new(()),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_key(org: &str, username: &str) -> (String, String) {
        (org.to_string(), username.to_string())
    }

    async fn user_lock(&self, org: &str, username: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .lock()
            .await
            .entry(Self::lock_key(org, username))
            .or_default()
            .clone()
    }

    /// Drops the map entry once nobody else holds or waits on it.
    async fn release_user_lock(&self, org: &str, username: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.user_locks.lock().await;
        // The map and `lock` are the only two owners left.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&Self::lock_key(org, username));
        }
    }

    /// Number of usernames currently holding a provisioning lock.
    pub async fn pending_provisioning(&self) -> usize {
        self.user_locks.lock().await.len()
    }

    pub fn registrar_id(&self) -> &str {
        &self.registrar.enrollment_id
    }

    /// Makes sure the organization's registrar identity is in the wallet. Idempotent.
    pub async fn enroll_registrar(&self, org: &str) -> bool {
        let _guard = self.registrar_lock.lock().await;
        let registrar_id = self.registrar.enrollment_id.as_str();

        match self.wallet.contains(org, registrar_id).await {
            Ok(true) => {
                debug!(org, registrar = registrar_id, "registrar already enrolled");
                return true;
            }
            Ok(false) => {}
            Err(e) => {
                error!(org, registrar = registrar_id, error = %e, "wallet lookup failed");
                return false;
            }
        }

        let identity = match with_timeout(
            self.timeout,
            self.ledger.enroll(org, registrar_id, &self.registrar.secret),
        )
        .await
        {
            Ok(identity) => identity,
            Err(e) => {
                error!(org, registrar = registrar_id, error = %e, "registrar enrollment failed");
                return false;
            }
        };

        if let Err(e) = self.wallet.put(org, &identity).await {
            error!(org, registrar = registrar_id, error = %e, "failed to store registrar identity");
            return false;
        }
        info!(org, registrar = registrar_id, cert = %identity.fingerprint(), "registrar enrolled");
        true
    }

    /// Registers `username` with the CA under `role` and enrolls it into the wallet.
    ///
    /// Nothing is written to the wallet unless both registration and enrollment succeed. A
    /// username that already has a wallet entry is left untouched.
    pub async fn register_and_enroll_user(&self, org: &str, username: &str, role: Role) -> bool {
        if let Err(e) = validate_label(username) {
            warn!(org, user = username, error = %e, "refusing to register an unstorable username");
            return false;
        }

        let lock = self.user_lock(org, username).await;
        let provisioned = {
            let _guard = lock.lock().await;
            self.provision_user(org, username, role).await
        };
        self.release_user_lock(org, username, lock).await;
        provisioned
    }

    async fn provision_user(&self, org: &str, username: &str, role: Role) -> bool {
        let registrar = match self.wallet.get(org, &self.registrar.enrollment_id).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                warn!(org, user = username, "cannot register user: registrar is not enrolled");
                return false;
            }
            Err(e) => {
                error!(org, user = username, error = %e, "wallet lookup failed");
                return false;
            }
        };

        match self.wallet.get(org, username).await {
            Ok(Some(existing)) => {
                if existing.role().as_deref() != Some(role.as_str()) {
                    warn!(
                        org,
                        user = username,
                        requested = %role,
                        enrolled = ?existing.role(),
                        "identity already enrolled with a different role; keeping existing"
                    );
                }
                return true;
            }
            Ok(None) => {}
            Err(e) => {
                error!(org, user = username, error = %e, "wallet lookup failed");
                return false;
            }
        }

        let secret = match with_timeout(self.timeout, self.ledger.register_user(&registrar, username, role)).await
        {
            Ok(secret) => secret,
            Err(e) => {
                error!(org, user = username, %role, error = %e, "CA registration failed");
                return false;
            }
        };

        let identity = match with_timeout(self.timeout, self.ledger.enroll(org, username, &secret)).await {
            Ok(identity) => identity,
            Err(e) => {
                error!(org, user = username, error = %e, "enrollment failed");
                return false;
            }
        };

        if let Err(e) = self.wallet.put(org, &identity).await {
            error!(org, user = username, error = %e, "failed to store user identity");
            return false;
        }
        info!(org, user = username, %role, cert = %identity.fingerprint(), "user enrolled");
        true
    }

    /// Wallet lookup only; never touches the network.
    pub async fn load_identity(&self, org: &str, username: &str) -> Option<LedgerIdentity> {
        match self.wallet.get(org, username).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(org, user = username, error = %e, "wallet lookup failed");
                None
            }
        }
    }

    pub async fn registrar_enrolled(&self, org: &str) -> bool {
        self.wallet
            .contains(org, &self.registrar.enrollment_id)
            .await
            .unwrap_or(false)
    }
}
