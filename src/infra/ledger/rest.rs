// HTTP client for an organization's CA and a ledger gateway.
//
// CA endpoints follow the CA REST conventions: JSON envelopes of the form
// `{ "success": bool, "result": ..., "errors": [{ "code", "message" }] }`, basic auth for
// enrollment and a signed `Authorization` token for registration. Contract calls go to
// `{gateway}/api/v1/channels/{channel}/contracts/{contract}/{evaluate|submit}` and return the
// contract's raw response bytes.

use crate::crypto::keys::{generate_signing_key, signing_key_to_hex, verifying_key_to_hex};
use crate::domain::identity::LedgerIdentity;
use crate::domain::role::Role;
use crate::infra::ledger::{ContractTarget, LedgerClient, LedgerError};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Deserialize, Debug)]
struct CaEnvelope<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<CaMessage>,
}

#[derive(Deserialize, Debug)]
struct CaMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Serialize)]
struct EnrollRequest<'a> {
    msp_id: &'a str,
    /// Hex Ed25519 public key; the private half never leaves this process.
    public_key: String,
}

#[derive(Deserialize)]
struct EnrollResult {
    #[serde(rename = "Cert")]
    cert: String,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    affiliation: &'a str,
    attrs: Vec<Attribute<'a>>,
}

#[derive(Serialize)]
struct Attribute<'a> {
    name: &'a str,
    value: &'a str,
    ecert: bool,
}

#[derive(Deserialize)]
struct RegisterResult {
    secret: String,
}

#[derive(Deserialize)]
pub struct CaInfo {
    #[serde(rename = "CAName")]
    pub ca_name: String,
    #[serde(rename = "Version", default)]
    pub version: String,
}

#[derive(Serialize)]
struct ProposalRequest<'a> {
    msp_id: &'a str,
    action: &'a str,
    args: &'a [String],
}

pub struct RestLedgerClient {
    http: reqwest::Client,
    ca_url: String,
    gateway_url: String,
}

impl RestLedgerClient {
    pub fn new(ca_url: &str, gateway_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            ca_url: ca_url.trim_end_matches('/').to_string(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /api/v1/cainfo`, used by preflight as a connectivity check.
    pub async fn ca_info(&self) -> Result<CaInfo, LedgerError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/cainfo", self.ca_url))
            .send()
            .await
            .map_err(transport_error)?;
        read_ca_envelope(resp).await
    }

    async fn proposal(
        &self,
        phase: &str,
        identity: &LedgerIdentity,
        target: &ContractTarget,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError> {
        let body = serde_json::to_vec(&ProposalRequest {
            msp_id: &identity.msp_id,
            action,
            args,
        })
        .map_err(|e| LedgerError::Protocol(e.to_string()))?;
        let auth = identity
            .authorize(&body)
            .map_err(|e| LedgerError::Unauthorized(e.to_string()))?;

        let url = format!(
            "{}/api/v1/channels/{}/contracts/{}/{}",
            self.gateway_url, target.channel, target.contract_id, phase
        );
        debug!(%url, action, user = %identity.username, "ledger proposal");
        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, auth)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(transport_error)?;
        if status.is_success() {
            return Ok(bytes.to_vec());
        }
        let message = String::from_utf8_lossy(&bytes).trim().to_string();
        Err(classify_status(status, message))
    }
}

fn transport_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Unavailable(format!("timed out: {}", e))
    } else if e.is_decode() {
        LedgerError::Protocol(e.to_string())
    } else {
        LedgerError::Unavailable(e.to_string())
    }
}

fn classify_status(status: StatusCode, message: String) -> LedgerError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LedgerError::Unauthorized(message),
        s if s.is_client_error() => LedgerError::Rejected(message),
        s => LedgerError::Unavailable(format!("{}: {}", s, message)),
    }
}

async fn read_ca_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, LedgerError> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(transport_error)?;
    let envelope: CaEnvelope<T> = match serde_json::from_slice(&bytes) {
        Ok(env) => env,
        Err(_) => {
            let message = String::from_utf8_lossy(&bytes).trim().to_string();
            return Err(classify_status(status, message));
        }
    };
    if envelope.success {
        if let Some(result) = envelope.result {
            return Ok(result);
        }
        return Err(LedgerError::Protocol("CA response had no result".to_string()));
    }
    let message = envelope
        .errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ");
    Err(classify_status(
        if status.is_success() { StatusCode::BAD_REQUEST } else { status },
        message,
    ))
}

#[async_trait]
impl LedgerClient for RestLedgerClient {
    async fn enroll(
        &self,
        msp_id: &str,
        enrollment_id: &str,
        secret: &str,
    ) -> Result<LedgerIdentity, LedgerError> {
        let key = generate_signing_key();
        let resp = self
            .http
            .post(format!("{}/api/v1/enroll", self.ca_url))
            .basic_auth(enrollment_id, Some(secret))
            .json(&EnrollRequest {
                msp_id,
                public_key: verifying_key_to_hex(&key.verifying_key()),
            })
            .send()
            .await
            .map_err(transport_error)?;
        let result: EnrollResult = read_ca_envelope(resp).await?;
        Ok(LedgerIdentity::new(
            msp_id,
            enrollment_id,
            result.cert,
            signing_key_to_hex(&key),
        ))
    }

    async fn register_user(
        &self,
        registrar: &LedgerIdentity,
        username: &str,
        role: Role,
    ) -> Result<String, LedgerError> {
        let body = serde_json::to_vec(&RegisterRequest {
            id: username,
            kind: "client",
            affiliation: "",
            attrs: vec![Attribute {
                name: "role",
                value: role.as_str(),
                ecert: true,
            }],
        })
        .map_err(|e| LedgerError::Protocol(e.to_string()))?;
        let auth = registrar
            .authorize(&body)
            .map_err(|e| LedgerError::Unauthorized(e.to_string()))?;

        let resp = self
            .http
            .post(format!("{}/api/v1/register", self.ca_url))
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, auth)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;
        let result: RegisterResult = read_ca_envelope(resp).await.map_err(|e| {
            warn!(user = username, error = %e, "CA registration failed");
            e
        })?;
        Ok(result.secret)
    }

    async fn evaluate_transaction(
        &self,
        identity: &LedgerIdentity,
        target: &ContractTarget,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError> {
        self.proposal("evaluate", identity, target, action, args).await
    }

    async fn submit_transaction(
        &self,
        identity: &LedgerIdentity,
        target: &ContractTarget,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError> {
        self.proposal("submit", identity, target, action, args).await
    }
}
