//! Enrollment certificates and signed proposal authorization.
//!
//! A certificate is a compact envelope (see [`crate::crypto::compact`]) whose payload is a
//! [`CertificateBody`] signed by the issuing CA. Requests against the ledger carry an
//! authorization header of the form `base64url(certificate).base64url(signature)`, where the
//! signature is made with the enrolled private key over the request body.

use crate::crypto::compact;
use crate::crypto::hashing::{signing_digest, SigningDomain};
use crate::crypto::keys::verifying_key_from_hex;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateBody {
    pub serial: String,
    /// Enrollment id the certificate was issued to.
    pub subject: String,
    pub msp_id: String,
    /// `role` attribute registered with the CA (absent for the bootstrap registrar).
    #[serde(default)]
    pub role: Option<String>,
    /// Hex Ed25519 public key of the enrolled identity.
    pub public_key: String,
    pub issuer: String,
    pub not_before: i64,
}

pub fn issue(body: &CertificateBody, ca_key: &SigningKey) -> anyhow::Result<String> {
    let payload = serde_json::to_vec(body)?;
    Ok(compact::seal(SigningDomain::Certificate, &payload, ca_key))
}

/// Verifies a certificate against the CA key and returns its body.
pub fn verify(certificate: &str, ca_key: &VerifyingKey) -> Option<CertificateBody> {
    let payload = compact::open(SigningDomain::Certificate, certificate, ca_key)?;
    serde_json::from_slice(&payload).ok()
}

/// Reads the certificate body without verifying the issuer.
pub fn inspect(certificate: &str) -> Option<CertificateBody> {
    let payload = compact::peek(certificate)?;
    serde_json::from_slice(&payload).ok()
}

/// Builds the authorization header value for `payload`, signed by the holder of `certificate`.
pub fn authorization_token(certificate: &str, private_key: &SigningKey, payload: &[u8]) -> String {
    let digest = signing_digest(SigningDomain::Proposal, payload);
    let signature = private_key.sign(&digest);
    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(certificate.as_bytes()),
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    )
}

/// Checks an authorization header: the certificate must be issued by `ca_key` and the
/// signature must verify under the certificate's public key.
pub fn verify_authorization(
    token: &str,
    payload: &[u8],
    ca_key: &VerifyingKey,
) -> Option<CertificateBody> {
    let (cert_b64, sig_b64) = token.trim().split_once('.')?;
    let cert_bytes = URL_SAFE_NO_PAD.decode(cert_b64).ok()?;
    let certificate = String::from_utf8(cert_bytes).ok()?;
    let body = verify(&certificate, ca_key)?;
    let holder = verifying_key_from_hex(&body.public_key)?;
    let sig_bytes = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;
    let signature = Signature::from_slice(&sig_bytes).ok()?;
    holder
        .verify(&signing_digest(SigningDomain::Proposal, payload), &signature)
        .ok()?;
    Some(body)
}
