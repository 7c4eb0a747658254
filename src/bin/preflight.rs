use regulator_gateway::config::{GatewayConfig, LedgerMode};
use regulator_gateway::crypto::keys::{signing_key_from_hex, verifying_key_to_hex};
use regulator_gateway::ledger::RestLedgerClient;
use regulator_gateway::GatewayService;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--enroll-registrar]\n\
         \n\
         Requires env vars (LEDGER_MODE=rest):\n\
           FABRIC_CA_URL, LEDGER_GATEWAY_URL, TOKEN_SIGNING_KEY\n\
         Optional:\n\
           WALLET_DIR, ORG_MSP_ID, CA_REGISTRAR_ID, CA_REGISTRAR_SECRET, LEDGER_TIMEOUT_SECS\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let enroll_registrar = args.iter().any(|a| a == "--enroll-registrar");

    // Force-read config (nice error messages if missing)
    let config = GatewayConfig::from_env()?;
    info!(?config, "preflight");

    match &config.token_signing_key {
        Some(seed) => {
            let key = signing_key_from_hex(seed)?;
            info!(public_key = %verifying_key_to_hex(&key.verifying_key()), "token signing key ok");
        }
        None => warn!("TOKEN_SIGNING_KEY not set; tokens will use an ephemeral key"),
    }

    match &config.wallet_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| anyhow::anyhow!("wallet dir {} is not writable: {}", dir.display(), e))?;
            info!(dir = %dir.display(), "wallet directory ok");
        }
        None => warn!("WALLET_DIR not set; identities will not survive a restart"),
    }

    if config.ledger_mode == LedgerMode::Rest {
        let (Some(ca_url), Some(gateway_url)) = (config.ca_url.as_deref(), config.ledger_gateway_url.as_deref()) else {
            return Err(anyhow::anyhow!("FABRIC_CA_URL and LEDGER_GATEWAY_URL must be set"));
        };
        let client = RestLedgerClient::new(ca_url, gateway_url, config.ledger_timeout)?;
        let info = client
            .ca_info()
            .await
            .map_err(|e| anyhow::anyhow!("CA at {} is not reachable: {}", ca_url, e))?;
        info!(ca = %info.ca_name, version = %info.version, "CA reachable");
    }

    let service = GatewayService::from_config(&config)?;
    if service.identities().registrar_enrolled(service.org()).await {
        info!(org = %service.org(), "registrar identity present in wallet");
    } else if enroll_registrar {
        if !service.identities().enroll_registrar(service.org()).await {
            return Err(anyhow::anyhow!("registrar enrollment failed"));
        }
        info!(org = %service.org(), "registrar enrolled");
    } else {
        return Err(anyhow::anyhow!(
            "registrar identity missing from wallet. Re-run with --enroll-registrar"
        ));
    }

    info!("preflight OK");
    Ok(())
}
