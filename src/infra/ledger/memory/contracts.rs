//! Sample trade and export-license contracts for the in-memory ledger.

use crate::domain::role::Role;
use crate::infra::ledger::memory::{Chaincode, TransactionContext};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

const STATUS_REQUESTED: &str = "REQUESTED";
const STATUS_ACCEPTED: &str = "ACCEPTED";
const STATUS_ISSUED: &str = "ISSUED";

fn expect_args(args: &[String], n: usize) -> Result<(), String> {
    if args.len() != n {
        return Err(format!(
            "Incorrect number of arguments. Expecting {}, got {}",
            n,
            args.len()
        ));
    }
    Ok(())
}

fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, String> {
    serde_json::to_vec(value).map_err(|e| e.to_string())
}

fn load<T: for<'de> Deserialize<'de>>(
    ctx: &TransactionContext<'_>,
    key: &str,
    what: &str,
) -> Result<T, String> {
    let raw = ctx
        .get_state(key)
        .ok_or_else(|| format!("{} {} not found", what, key))?;
    serde_json::from_slice(&raw).map_err(|e| format!("corrupt {} {}: {}", what, key, e))
}

fn history_json(ctx: &TransactionContext<'_>, key: &str) -> Vec<JsonValue> {
    ctx.history(key)
        .iter()
        .map(|h| {
            let value = h
                .value
                .as_ref()
                .and_then(|v| serde_json::from_slice::<JsonValue>(v).ok())
                .unwrap_or(JsonValue::Null);
            json!({
                "txId": h.tx_id,
                "timestamp": h.timestamp,
                "isDelete": h.is_delete,
                "value": value,
            })
        })
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub trade_id: String,
    pub exporter: String,
    pub importer: String,
    pub description_of_goods: String,
    pub amount: f64,
    pub status: String,
}

/// Trade agreements between an importer (the submitting identity) and an exporter.
pub struct TradeContract;

impl Chaincode for TradeContract {
    fn invoke(
        &self,
        ctx: &mut TransactionContext<'_>,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, String> {
        match action {
            "requestTrade" => {
                expect_args(args, 4)?;
                let trade_id = &args[0];
                if ctx.get_state(trade_id).is_some() {
                    return Err(format!("Trade {} already exists", trade_id));
                }
                let amount = args[3]
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("Amount must be a number, got {}", args[3]))?;
                let trade = Trade {
                    trade_id: trade_id.clone(),
                    exporter: args[1].clone(),
                    importer: ctx.creator().subject.clone(),
                    description_of_goods: args[2].clone(),
                    amount,
                    status: STATUS_REQUESTED.to_string(),
                };
                let bytes = to_bytes(&trade)?;
                ctx.put_state(trade_id, bytes.clone());
                Ok(bytes)
            }
            "acceptTrade" => {
                expect_args(args, 1)?;
                let mut trade: Trade = load(ctx, &args[0], "Trade")?;
                if trade.status != STATUS_REQUESTED {
                    return Err(format!(
                        "Trade {} is in status {}, expected {}",
                        trade.trade_id, trade.status, STATUS_REQUESTED
                    ));
                }
                trade.status = STATUS_ACCEPTED.to_string();
                let bytes = to_bytes(&trade)?;
                ctx.put_state(&args[0], bytes.clone());
                Ok(bytes)
            }
            "getTrade" => {
                expect_args(args, 1)?;
                ctx.get_state(&args[0])
                    .ok_or_else(|| format!("Trade {} not found", args[0]))
            }
            "getTradeStatus" => {
                expect_args(args, 1)?;
                let trade: Trade = load(ctx, &args[0], "Trade")?;
                to_bytes(&json!({ "status": trade.status }))
            }
            "listTrade" => {
                expect_args(args, 0)?;
                let trades = ctx
                    .state_range("", "")
                    .into_iter()
                    .filter_map(|(_, v)| serde_json::from_slice::<JsonValue>(&v).ok())
                    .collect::<Vec<_>>();
                to_bytes(&trades)
            }
            "getTradesByRange" => {
                expect_args(args, 2)?;
                let trades = ctx
                    .state_range(&args[0], &args[1])
                    .into_iter()
                    .filter_map(|(_, v)| serde_json::from_slice::<JsonValue>(&v).ok())
                    .collect::<Vec<_>>();
                to_bytes(&trades)
            }
            "getTradeHistory" => {
                expect_args(args, 1)?;
                let history = history_json(ctx, &args[0]);
                if history.is_empty() {
                    return Err(format!("Trade {} not found", args[0]));
                }
                to_bytes(&history)
            }
            other => Err(format!("Received unknown function invocation: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExportLicense {
    pub trade_id: String,
    pub id: String,
    pub expiration_date: String,
    pub exporter: String,
    pub description_of_goods: String,
    pub approver: String,
    pub status: String,
}

/// Export licenses, keyed by trade id. Only a regulator may issue one.
pub struct ExportLicenseContract;

impl Chaincode for ExportLicenseContract {
    fn invoke(
        &self,
        ctx: &mut TransactionContext<'_>,
        action: &str,
        args: &[String],
    ) -> Result<Vec<u8>, String> {
        match action {
            "requestEL" => {
                expect_args(args, 2)?;
                let trade_id = &args[0];
                if ctx.get_state(trade_id).is_some() {
                    return Err(format!("Export license for trade {} already exists", trade_id));
                }
                let el = ExportLicense {
                    trade_id: trade_id.clone(),
                    id: String::new(),
                    expiration_date: String::new(),
                    exporter: ctx.creator().subject.clone(),
                    description_of_goods: args[1].clone(),
                    approver: String::new(),
                    status: STATUS_REQUESTED.to_string(),
                };
                let bytes = to_bytes(&el)?;
                ctx.put_state(trade_id, bytes.clone());
                Ok(bytes)
            }
            "issueEL" => {
                expect_args(args, 3)?;
                if ctx.creator_role() != Some(Role::Regulator.as_str()) {
                    return Err(format!(
                        "{} is not authorized to issue export licenses",
                        ctx.creator().subject
                    ));
                }
                let mut el: ExportLicense = load(ctx, &args[0], "Export license for trade")?;
                if el.status != STATUS_REQUESTED {
                    return Err(format!(
                        "Export license for trade {} is in status {}, expected {}",
                        el.trade_id, el.status, STATUS_REQUESTED
                    ));
                }
                el.id = args[1].clone();
                el.expiration_date = args[2].clone();
                el.approver = ctx.creator().subject.clone();
                el.status = STATUS_ISSUED.to_string();
                let bytes = to_bytes(&el)?;
                ctx.put_state(&args[0], bytes.clone());
                Ok(bytes)
            }
            "getEL" => {
                expect_args(args, 1)?;
                ctx.get_state(&args[0])
                    .ok_or_else(|| format!("Export license for trade {} not found", args[0]))
            }
            "getELStatus" => {
                expect_args(args, 1)?;
                let el: ExportLicense = load(ctx, &args[0], "Export license for trade")?;
                to_bytes(&json!({ "status": el.status }))
            }
            other => Err(format!("Received unknown function invocation: {}", other)),
        }
    }
}
