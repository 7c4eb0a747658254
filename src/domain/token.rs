//! Stateless bearer tokens.
//!
//! A token is a compact envelope (`base64url(claims).base64url(signature)`) signed with the
//! process-wide Ed25519 key. Any replica holding the same key validates tokens issued by any
//! other; there is no session store and no revocation list.

use crate::crypto::compact;
use crate::crypto::hashing::SigningDomain;
use crate::domain::role::Role;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const BEARER_PREFIX: &str = "bearer ";

/// What a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iss: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds), exclusive.
    pub exp: i64,
}

pub struct TokenService {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(signing_key: SigningKey, issuer: impl Into<String>, ttl: Duration) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue_token(&self, user: &UserDetails) -> anyhow::Result<String> {
        self.issue_token_at(user, Utc::now())
    }

    pub fn issue_token_at(&self, user: &UserDetails, now: DateTime<Utc>) -> anyhow::Result<String> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user.username.clone(),
            role: user.role,
            iss: self.issuer.clone(),
            iat,
            exp: iat.saturating_add(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX)),
        };
        let payload = serde_json::to_vec(&claims)?;
        Ok(compact::seal(SigningDomain::Token, &payload, &self.signing_key))
    }

    /// Verifies signature, issuer and expiry as of `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<Claims> {
        let payload = compact::open(SigningDomain::Token, token, &self.verifying_key)?;
        let claims: Claims = serde_json::from_slice(&payload).ok()?;
        if claims.iss != self.issuer || now.timestamp() >= claims.exp || claims.sub.is_empty() {
            return None;
        }
        Some(claims)
    }

    pub fn validate(&self, token: &str) -> Option<Claims> {
        self.validate_at(token, Utc::now())
    }

    /// Username carried by the request's bearer token, or `None` for any kind of failure.
    pub fn resolve_username(&self, headers: &HeaderMap) -> Option<String> {
        self.resolve_username_at(headers, Utc::now())
    }

    pub fn resolve_username_at(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<String> {
        let token = bearer_token(headers)?;
        match self.validate_at(token, now) {
            Some(claims) => Some(claims.sub),
            None => {
                debug!("bearer token rejected");
                None
            }
        }
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    if value.len() <= BEARER_PREFIX.len() || !value[..BEARER_PREFIX.len()].eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    let token = value[BEARER_PREFIX.len()..].trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
