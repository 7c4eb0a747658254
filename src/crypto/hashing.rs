// Domain-separated digests for everything that gets signed or fingerprinted.

use sha2::{Digest, Sha256};

// Domain tags. A signature made under one tag never verifies under another.
const TOKEN_DOMAIN: &[u8] = b"GWTOKEN";
const CERT_DOMAIN: &[u8] = b"LEDGERCERT";
const PROPOSAL_DOMAIN: &[u8] = b"LEDGERPROP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningDomain {
    Token,
    Certificate,
    Proposal,
}

impl SigningDomain {
    fn tag(self) -> &'static [u8] {
        match self {
            SigningDomain::Token => TOKEN_DOMAIN,
            SigningDomain::Certificate => CERT_DOMAIN,
            SigningDomain::Proposal => PROPOSAL_DOMAIN,
        }
    }
}

/// Hashes `payload` under the given domain tag. This is the message that actually gets signed.
pub fn signing_digest(domain: SigningDomain, payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain.tag());
    hasher.update(payload);
    hasher.finalize().into()
}

/// Hex SHA-256 fingerprint of a certificate, used as a short stable handle in logs.
pub fn fingerprint(certificate: &str) -> String {
    let digest = Sha256::digest(certificate.as_bytes());
    hex::encode(&digest[..8])
}
