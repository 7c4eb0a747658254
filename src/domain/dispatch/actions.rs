//! The protected business actions and the dispatch tuple each one maps to.

use crate::domain::dispatch::{InvocationMode, InvocationRequest};
use crate::infra::config::LedgerRoutes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectedAction {
    IssueEl {
        trade_id: String,
        el_id: String,
        expiration_date: String,
    },
    GetTrade { trade_id: String },
    GetTradeStatus { trade_id: String },
    GetEl { trade_id: String },
    GetElStatus { trade_id: String },
    ListTrades,
    GetTradesByRange {
        from_trade_id: String,
        to_trade_id: String,
    },
    GetTradeHistory { trade_id: String },
}

impl ProtectedAction {
    /// Contract function name on the ledger side.
    pub fn action_name(&self) -> &'static str {
        match self {
            ProtectedAction::IssueEl { .. } => "issueEL",
            ProtectedAction::GetTrade { .. } => "getTrade",
            ProtectedAction::GetTradeStatus { .. } => "getTradeStatus",
            ProtectedAction::GetEl { .. } => "getEL",
            ProtectedAction::GetElStatus { .. } => "getELStatus",
            ProtectedAction::ListTrades => "listTrade",
            ProtectedAction::GetTradesByRange { .. } => "getTradesByRange",
            ProtectedAction::GetTradeHistory { .. } => "getTradeHistory",
        }
    }

    pub fn mode(&self) -> InvocationMode {
        match self {
            ProtectedAction::IssueEl { .. } => InvocationMode::Submit,
            _ => InvocationMode::Query,
        }
    }

    pub fn into_request(self, username: &str, routes: &LedgerRoutes) -> InvocationRequest {
        let action = self.action_name().to_string();
        let mode = self.mode();
        let trade = (&routes.trade_channel, &routes.trade_contract_id);
        let shipping = (&routes.shipping_channel, &routes.el_contract_id);

        let ((channel, contract_id), args) = match self {
            ProtectedAction::IssueEl {
                trade_id,
                el_id,
                expiration_date,
            } => (shipping, vec![trade_id, el_id, expiration_date]),
            ProtectedAction::GetEl { trade_id } | ProtectedAction::GetElStatus { trade_id } => {
                (shipping, vec![trade_id])
            }
            ProtectedAction::GetTrade { trade_id }
            | ProtectedAction::GetTradeStatus { trade_id }
            | ProtectedAction::GetTradeHistory { trade_id } => (trade, vec![trade_id]),
            ProtectedAction::ListTrades => (trade, vec![]),
            ProtectedAction::GetTradesByRange {
                from_trade_id,
                to_trade_id,
            } => (trade, vec![from_trade_id, to_trade_id]),
        };

        InvocationRequest {
            channel: channel.clone(),
            contract_id: contract_id.clone(),
            mode,
            action,
            args,
            username: username.to_string(),
        }
    }
}
