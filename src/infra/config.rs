//! Centralized configuration (environment variables + defaults).
//!
//! Everything is read once at startup into an immutable [`GatewayConfig`] that is handed to
//! component constructors. Nothing reads the environment after that.

use anyhow::{anyhow, Context};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Talk to a CA and ledger gateway over HTTP.
    Rest,
    /// Self-contained in-memory ledger with the sample contracts installed.
    Memory,
}

/// Channel/contract pairs the protected actions are routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRoutes {
    pub trade_channel: String,
    pub shipping_channel: String,
    pub trade_contract_id: String,
    pub el_contract_id: String,
}

impl Default for LedgerRoutes {
    fn default() -> Self {
        Self {
            trade_channel: "tradechannel".to_string(),
            shipping_channel: "shippingchannel".to_string(),
            trade_contract_id: "trade".to_string(),
            el_contract_id: "exportLicense".to_string(),
        }
    }
}

/// Bootstrap identity the CA was started with.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrarCredentials {
    pub enrollment_id: String,
    pub secret: String,
}

impl std::fmt::Debug for RegistrarCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrarCredentials")
            .field("enrollment_id", &self.enrollment_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub org_msp_id: String,
    /// `None` keeps the wallet in memory.
    pub wallet_dir: Option<PathBuf>,
    pub ledger_mode: LedgerMode,
    pub ca_url: Option<String>,
    pub ledger_gateway_url: Option<String>,
    pub registrar: RegistrarCredentials,
    pub bootstrap_admin_user: String,
    pub bootstrap_admin_password: String,
    /// Hex Ed25519 seed. Optional only in memory mode.
    pub token_signing_key: Option<String>,
    pub token_issuer: String,
    pub token_ttl: Duration,
    pub ledger_timeout: Duration,
    pub routes: LedgerRoutes,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("org_msp_id", &self.org_msp_id)
            .field("wallet_dir", &self.wallet_dir)
            .field("ledger_mode", &self.ledger_mode)
            .field("ca_url", &self.ca_url)
            .field("ledger_gateway_url", &self.ledger_gateway_url)
            .field("registrar", &self.registrar)
            .field("bootstrap_admin_user", &self.bootstrap_admin_user)
            .field("token_issuer", &self.token_issuer)
            .field("token_ttl", &self.token_ttl)
            .field("ledger_timeout", &self.ledger_timeout)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            org_msp_id: "RegulatorOrgMSP".to_string(),
            wallet_dir: None,
            ledger_mode: LedgerMode::Memory,
            ca_url: None,
            ledger_gateway_url: None,
            registrar: RegistrarCredentials {
                enrollment_id: "admin".to_string(),
                secret: "adminpw".to_string(),
            },
            bootstrap_admin_user: "admin".to_string(),
            bootstrap_admin_password: "adminpw".to_string(),
            token_signing_key: None,
            token_issuer: "regulator-gateway".to_string(),
            token_ttl: Duration::from_secs(5 * 60 * 60),
            ledger_timeout: Duration::from_secs(30),
            routes: LedgerRoutes::default(),
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

fn secs_var(name: &str, default: Duration) -> anyhow::Result<Duration> {
    match var(name) {
        Some(v) => {
            let secs = v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a whole number of seconds", name))?;
            Ok(Duration::from_secs(secs.clamp(1, i64::MAX as u64)))
        }
        None => Ok(default),
    }
}

impl GatewayConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let ledger_mode = match var_or("LEDGER_MODE", "rest").to_lowercase().as_str() {
            "rest" => LedgerMode::Rest,
            "memory" => LedgerMode::Memory,
            other => return Err(anyhow!("LEDGER_MODE must be `rest` or `memory`, got `{}`", other)),
        };

        let ca_url = var("FABRIC_CA_URL");
        let ledger_gateway_url = var("LEDGER_GATEWAY_URL");
        let token_signing_key = var("TOKEN_SIGNING_KEY");
        if ledger_mode == LedgerMode::Rest {
            if ca_url.is_none() {
                return Err(anyhow!("FABRIC_CA_URL must be set when LEDGER_MODE=rest"));
            }
            if ledger_gateway_url.is_none() {
                return Err(anyhow!("LEDGER_GATEWAY_URL must be set when LEDGER_MODE=rest"));
            }
            if token_signing_key.is_none() {
                return Err(anyhow!("TOKEN_SIGNING_KEY must be set when LEDGER_MODE=rest"));
            }
        }

        let wallet_dir = var("WALLET_DIR").map(|d| PathBuf::from(shellexpand::tilde(&d).to_string()));

        Ok(Self {
            bind_addr: var_or("GATEWAY_BIND_ADDR", &defaults.bind_addr),
            org_msp_id: var_or("ORG_MSP_ID", &defaults.org_msp_id),
            wallet_dir,
            ledger_mode,
            ca_url,
            ledger_gateway_url,
            registrar: RegistrarCredentials {
                enrollment_id: var_or("CA_REGISTRAR_ID", &defaults.registrar.enrollment_id),
                secret: var_or("CA_REGISTRAR_SECRET", &defaults.registrar.secret),
            },
            bootstrap_admin_user: var_or("BOOTSTRAP_ADMIN_USER", &defaults.bootstrap_admin_user),
            bootstrap_admin_password: var_or(
                "BOOTSTRAP_ADMIN_PASSWORD",
                &defaults.bootstrap_admin_password,
            ),
            token_signing_key,
            token_issuer: var_or("TOKEN_ISSUER", &defaults.token_issuer),
            token_ttl: secs_var("TOKEN_TTL_SECS", defaults.token_ttl)?,
            ledger_timeout: secs_var("LEDGER_TIMEOUT_SECS", defaults.ledger_timeout)?,
            routes: LedgerRoutes {
                trade_channel: var_or("TRADE_CHANNEL", &defaults.routes.trade_channel),
                shipping_channel: var_or("SHIPPING_CHANNEL", &defaults.routes.shipping_channel),
                trade_contract_id: var_or("TRADE_CONTRACT_ID", &defaults.routes.trade_contract_id),
                el_contract_id: var_or("EL_CONTRACT_ID", &defaults.routes.el_contract_id),
            },
        })
    }
}
