//! Application users and password authentication.

use crate::crypto::password::{hash_password, verify_password};
use crate::domain::role::{AuthResult, Role};
use crate::error::GatewayError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn exists(&self, username: &str) -> bool;

    /// Inserts `user` unless the username is taken. Returns whether it was inserted.
    async fn create(&self, user: User) -> bool;

    async fn load_by_username(&self, username: &str) -> Option<User>;
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn exists(&self, username: &str) -> bool {
        self.users.read().await.contains_key(username)
    }

    async fn create(&self, user: User) -> bool {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return false;
        }
        users.insert(user.username.clone(), user);
        true
    }

    async fn load_by_username(&self, username: &str) -> Option<User> {
        self.users.read().await.get(username).cloned()
    }
}

/// Password checks and user creation over a [`CredentialStore`].
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthResult, GatewayError> {
        let Some(user) = self.store.load_by_username(username).await else {
            debug!(user = username, "authentication failed: unknown user");
            return Err(GatewayError::AuthenticationFailure);
        };
        let hash = user.password_hash.clone();
        let candidate = password.to_string();
        let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &candidate))
            .await
            .unwrap_or(false);
        if !verified {
            debug!(user = username, "authentication failed: bad password");
            return Err(GatewayError::AuthenticationFailure);
        }
        Ok(AuthResult {
            username: user.username,
            roles: vec![user.role],
        })
    }

    /// Hashes `password` and stores the user. An existing username is left as is.
    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> anyhow::Result<bool> {
        let candidate = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&candidate)).await??;
        let created = self
            .store
            .create(User {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await;
        if created {
            info!(user = username, %role, "application user created");
        }
        Ok(created)
    }
}
