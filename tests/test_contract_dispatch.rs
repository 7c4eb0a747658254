//! Dispatcher behaviour against the in-memory ledger: query vs submit, pass-through payloads,
//! normalized failures, timeouts and role checks enforced by the contracts.

mod common;

use common::{http_client, TestGateway};
use regulator_gateway::domain::{InvocationMode, InvocationRequest, InvocationResult};
use regulator_gateway::GatewayConfig;
use serde_json::{json, Value};
use std::time::Duration;

const TRADE: (&str, &str) = ("tradechannel", "trade");
const SHIPPING: (&str, &str) = ("shippingchannel", "exportLicense");

#[tokio::test]
async fn test_reads_are_idempotent_and_never_commit() {
    let gw = TestGateway::new().await;
    gw.provision("alice", "alicepw", "TRADER").await;
    gw.submit("alice", TRADE.0, TRADE.1, "requestTrade", &["T1", "exporter1", "cotton", "2500"])
        .await;
    let committed = gw.ledger.committed_transactions();
    assert_eq!(committed, 1);

    let dispatcher = gw.service.dispatcher();
    let first = dispatcher
        .invoke_contract("alice", TRADE.0, TRADE.1, true, "getTrade", &["T1"])
        .await;
    let second = dispatcher
        .invoke_contract("alice", TRADE.0, TRADE.1, true, "getTrade", &["T1"])
        .await;
    assert!(first.is_success());
    assert_eq!(first, second);
    assert_eq!(gw.ledger.committed_transactions(), committed);
    assert_eq!(gw.ledger.evaluated_transactions(), 2);

    let InvocationResult::Success(payload) = first else {
        panic!("expected success");
    };
    let trade: Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(trade["tradeId"], json!("T1"));
    assert_eq!(trade["importer"], json!("alice"));
    assert_eq!(trade["status"], json!("REQUESTED"));
}

#[tokio::test]
async fn test_query_discards_writes() {
    let gw = TestGateway::new().await;
    gw.provision("alice", "alicepw", "TRADER").await;

    // A state-changing action evaluated as a query leaves no trace.
    let request = InvocationRequest {
        channel: TRADE.0.to_string(),
        contract_id: TRADE.1.to_string(),
        mode: InvocationMode::Query,
        action: "requestTrade".to_string(),
        args: vec!["T7".into(), "exporter1".into(), "rice".into(), "10".into()],
        username: "alice".to_string(),
    };
    assert!(gw.service.dispatcher().invoke(&request).await.is_success());
    assert_eq!(gw.ledger.committed_transactions(), 0);

    let after = gw
        .service
        .dispatcher()
        .invoke_contract("alice", TRADE.0, TRADE.1, true, "getTrade", &["T7"])
        .await;
    assert_eq!(after, InvocationResult::failure("Trade T7 not found"));
}

#[tokio::test]
async fn test_failures_are_normalized() {
    let mut config = GatewayConfig::default();
    config.ledger_timeout = Duration::from_millis(200);
    let gw = TestGateway::with_config(config).await;
    gw.provision("alice", "alicepw", "TRADER").await;
    let dispatcher = gw.service.dispatcher();

    let missing = dispatcher
        .invoke_contract("mallory", TRADE.0, TRADE.1, true, "listTrade", &[])
        .await;
    assert_eq!(missing, InvocationResult::failure("Identity for mallory not found in wallet"));

    let unknown = dispatcher
        .invoke_contract("alice", TRADE.0, TRADE.1, true, "burnTrade", &[])
        .await;
    assert_eq!(
        unknown,
        InvocationResult::failure("Received unknown function invocation: burnTrade")
    );

    let undeployed = dispatcher
        .invoke_contract("alice", "tradechannel", "letterOfCredit", true, "getLC", &["T1"])
        .await;
    assert!(!undeployed.is_success());

    gw.ledger.set_latency(Duration::from_millis(1_000));
    let slow = dispatcher
        .invoke_contract("alice", TRADE.0, TRADE.1, true, "listTrade", &[])
        .await;
    assert_eq!(slow, InvocationResult::failure("Ledger request timed out"));
    gw.ledger.set_latency(Duration::ZERO);

    gw.ledger.set_available(false);
    let down = dispatcher
        .invoke_contract("alice", TRADE.0, TRADE.1, false, "requestTrade", &["T2", "x", "y", "1"])
        .await;
    assert_eq!(down, InvocationResult::failure("Ledger network unavailable"));
    assert_eq!(gw.ledger.committed_transactions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_issue_export_license_over_http() -> Result<(), Box<dyn std::error::Error>> {
    let gw = TestGateway::new().await;
    let base_url = gw.serve().await;
    let client = http_client();

    let regulator = gw.provision("rita", "ritapw", "REGULATOR").await;
    let trader = gw.provision("alice", "alicepw", "TRADER").await;
    gw.provision("eddie", "eddiepw", "EXPORTER").await;
    gw.submit("alice", TRADE.0, TRADE.1, "requestTrade", &["T1", "eddie", "cotton", "2500"])
        .await;
    gw.submit("eddie", SHIPPING.0, SHIPPING.1, "requestEL", &["T1", "cotton"])
        .await;

    let issue_form = [("tradeId", "T1"), ("elId", "EL-1"), ("expirationDate", "2027-12-31")];

    // The contract enforces the regulator role from the caller's certificate.
    let denied = client
        .post(format!("{}/issueEL", base_url))
        .bearer_auth(&trader)
        .form(&issue_form)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(
        denied,
        json!({"result": false, "error": "alice is not authorized to issue export licenses"})
    );

    let committed = gw.ledger.committed_transactions();
    let issued = client
        .post(format!("{}/issueEL", base_url))
        .bearer_auth(&regulator)
        .form(&issue_form)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(issued["status"], json!("ISSUED"));
    assert_eq!(issued["id"], json!("EL-1"));
    assert_eq!(issued["approver"], json!("rita"));
    assert_eq!(gw.ledger.committed_transactions(), committed + 1);

    let status = client
        .get(format!("{}/getELStatus", base_url))
        .query(&[("tradeId", "T1")])
        .bearer_auth(&regulator)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(status, json!({"status": "ISSUED"}));

    let el = client
        .get(format!("{}/getEL", base_url))
        .query(&[("tradeId", "T1")])
        .bearer_auth(&regulator)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(el["expirationDate"], json!("2027-12-31"));

    // Issuing twice is a business error, not a fault.
    let again = client
        .post(format!("{}/issueEL", base_url))
        .bearer_auth(&regulator)
        .form(&issue_form)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(again["result"], json!(false));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_trade_queries_over_http() -> Result<(), Box<dyn std::error::Error>> {
    let gw = TestGateway::new().await;
    let base_url = gw.serve().await;
    let client = http_client();

    let token = gw.provision("alice", "alicepw", "TRADER").await;
    for id in ["T1", "T2", "T3"] {
        gw.submit("alice", TRADE.0, TRADE.1, "requestTrade", &[id, "eddie", "goods", "5"])
            .await;
    }
    gw.submit("alice", TRADE.0, TRADE.1, "acceptTrade", &["T2"]).await;

    let get = |path: &str| client.get(format!("{}{}", base_url, path)).bearer_auth(&token);

    let all = get("/listTrades").send().await?.json::<Value>().await?;
    assert_eq!(all.as_array().map(|a| a.len()), Some(3));

    let range = get("/getTradesByRange")
        .query(&[("fromTradeId", "T1"), ("toTradeId", "T3")])
        .send()
        .await?
        .json::<Value>()
        .await?;
    let ids: Vec<&str> = range
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tradeId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["T1", "T2"]);

    let status = get("/getTradeStatus")
        .query(&[("tradeId", "T2")])
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(status, json!({"status": "ACCEPTED"}));

    let history = get("/getTradeHistory")
        .query(&[("tradeId", "T2")])
        .send()
        .await?
        .json::<Value>()
        .await?;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["value"]["status"], json!("REQUESTED"));
    assert_eq!(history[1]["value"]["status"], json!("ACCEPTED"));
    assert_eq!(history[1]["isDelete"], json!(false));

    let missing_param = get("/getTrade").send().await?;
    assert_eq!(missing_param.status(), 422);

    Ok(())
}

#[tokio::test]
async fn test_gateway_cache_is_bounded() {
    use regulator_gateway::domain::{ContractDispatcher, IdentityBridge};
    use regulator_gateway::ledger::LedgerClient;
    use std::sync::Arc;

    let gw = TestGateway::new().await;
    gw.provision("alice", "alicepw", "TRADER").await;
    gw.provision("bob", "bobpw", "TRADER").await;

    let bridge = Arc::new(IdentityBridge::new(
        gw.ledger.clone() as Arc<dyn LedgerClient>,
        gw.wallet.clone(),
        gw.config.registrar.clone(),
        Duration::from_secs(5),
    ));
    let dispatcher = ContractDispatcher::new(
        gw.config.org_msp_id.clone(),
        bridge,
        gw.ledger.clone() as Arc<dyn LedgerClient>,
        Duration::from_secs(5),
    )
    .with_cache_capacity(1);

    for user in ["alice", "bob", "alice"] {
        let result = dispatcher
            .invoke_contract(user, TRADE.0, TRADE.1, true, "listTrade", &[])
            .await;
        assert!(result.is_success());
        assert_eq!(dispatcher.cached_gateways().await, 1);
    }

    // Unknown callers leave nothing behind.
    let missing = dispatcher
        .invoke_contract("mallory", TRADE.0, TRADE.1, true, "listTrade", &[])
        .await;
    assert!(!missing.is_success());
    assert_eq!(dispatcher.cached_gateways().await, 1);
}
