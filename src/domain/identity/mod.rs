//! Ledger identities and the bridge that provisions them.

use crate::crypto::certificate;
use crate::crypto::hashing::fingerprint;
use crate::crypto::keys::signing_key_from_hex;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod bridge;

pub use bridge::IdentityBridge;

/// Enrolled credentials of one user in one organization.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerIdentity {
    pub msp_id: String,
    pub username: String,
    pub certificate: String,
    /// Hex Ed25519 seed.
    pub private_key: String,
}

impl LedgerIdentity {
    pub fn new(
        msp_id: impl Into<String>,
        username: impl Into<String>,
        certificate: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            msp_id: msp_id.into(),
            username: username.into(),
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }

    pub fn signing_key(&self) -> anyhow::Result<SigningKey> {
        signing_key_from_hex(&self.private_key)
    }

    /// Authorization header value proving possession of this identity's key over `payload`.
    pub fn authorize(&self, payload: &[u8]) -> anyhow::Result<String> {
        let key = self.signing_key()?;
        Ok(certificate::authorization_token(&self.certificate, &key, payload))
    }

    /// `role` attribute embedded in the certificate, if it can be read.
    pub fn role(&self) -> Option<String> {
        certificate::inspect(&self.certificate).and_then(|body| body.role)
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.certificate)
    }
}

impl fmt::Debug for LedgerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerIdentity")
            .field("msp_id", &self.msp_id)
            .field("username", &self.username)
            .field("certificate", &self.fingerprint())
            .field("private_key", &"<redacted>")
            .finish()
    }
}
