//! Ed25519 key helpers shared by the token service, the wallet and the in-memory CA.

use anyhow::anyhow;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;

/// Generates a fresh signing key from the OS RNG.
pub fn generate_signing_key() -> SigningKey {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    SigningKey::from_bytes(&seed)
}

/// Parses a hex-encoded 32-byte Ed25519 seed (optionally `0x`-prefixed).
pub fn signing_key_from_hex(s: &str) -> anyhow::Result<SigningKey> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|_| anyhow!("signing key is not valid hex"))?;
    let seed: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("expected a 32-byte signing key seed, got {} bytes", bytes.len()))?;
    Ok(SigningKey::from_bytes(&seed))
}

pub fn signing_key_to_hex(key: &SigningKey) -> String {
    hex::encode(key.to_bytes())
}

pub fn verifying_key_from_hex(s: &str) -> Option<VerifyingKey> {
    let bytes = hex::decode(s).ok()?;
    let arr: [u8; 32] = bytes.as_slice().try_into().ok()?;
    VerifyingKey::from_bytes(&arr).ok()
}

pub fn verifying_key_to_hex(key: &VerifyingKey) -> String {
    hex::encode(key.to_bytes())
}
