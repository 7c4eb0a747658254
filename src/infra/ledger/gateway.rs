//! Connection context bound to one ledger identity.

use crate::domain::identity::LedgerIdentity;
use crate::infra::ledger::{with_timeout, ContractTarget, LedgerClient, LedgerError};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct Gateway {
    client: Arc<dyn LedgerClient>,
    identity: LedgerIdentity,
    timeout: Duration,
}

impl Gateway {
    pub fn connect(client: Arc<dyn LedgerClient>, identity: LedgerIdentity, timeout: Duration) -> Self {
        debug!(
            user = %identity.username,
            msp = %identity.msp_id,
            cert = %identity.fingerprint(),
            "gateway connected"
        );
        Self {
            client,
            identity,
            timeout,
        }
    }

    pub fn identity(&self) -> &LedgerIdentity {
        &self.identity
    }

    pub fn contract(&self, channel: &str, contract_id: &str) -> Contract<'_> {
        Contract {
            gateway: self,
            target: ContractTarget::new(channel, contract_id),
        }
    }
}

pub struct Contract<'a> {
    gateway: &'a Gateway,
    target: ContractTarget,
}

impl Contract<'_> {
    pub fn target(&self) -> &ContractTarget {
        &self.target
    }

    pub async fn evaluate(&self, action: &str, args: &[String]) -> Result<Vec<u8>, LedgerError> {
        let gw = self.gateway;
        with_timeout(
            gw.timeout,
            gw.client
                .evaluate_transaction(&gw.identity, &self.target, action, args),
        )
        .await
    }

    pub async fn submit(&self, action: &str, args: &[String]) -> Result<Vec<u8>, LedgerError> {
        let gw = self.gateway;
        with_timeout(
            gw.timeout,
            gw.client
                .submit_transaction(&gw.identity, &self.target, action, args),
        )
        .await
    }
}
