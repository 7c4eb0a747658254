//! Compact signed envelope: `base64url(payload).base64url(signature)`.
//!
//! Used for both bearer tokens and the in-memory CA's certificates. The signature covers the
//! domain-separated digest of the raw payload bytes, never the base64 text.

use crate::crypto::hashing::{signing_digest, SigningDomain};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

pub fn seal(domain: SigningDomain, payload: &[u8], key: &SigningKey) -> String {
    let digest = signing_digest(domain, payload);
    let signature = key.sign(&digest);
    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload),
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    )
}

/// Verifies the envelope and returns its payload. Any malformation or bad signature is `None`.
pub fn open(domain: SigningDomain, sealed: &str, key: &VerifyingKey) -> Option<Vec<u8>> {
    let (payload_b64, sig_b64) = sealed.trim().split_once('.')?;
    let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let sig_bytes = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;
    let signature = Signature::from_slice(&sig_bytes).ok()?;
    let digest = signing_digest(domain, &payload);
    key.verify(&digest, &signature).ok()?;
    Some(payload)
}

/// Returns the payload without checking the signature.
pub fn peek(sealed: &str) -> Option<Vec<u8>> {
    let (payload_b64, _) = sealed.trim().split_once('.')?;
    URL_SAFE_NO_PAD.decode(payload_b64).ok()
}
