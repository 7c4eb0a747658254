pub mod app;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{GatewayComponents, GatewayService};
pub use domain::{
    ContractDispatcher, IdentityBridge, InvocationMode, InvocationRequest, InvocationResult,
    LedgerIdentity, ProtectedAction, Role, TokenService,
};
pub use error::GatewayError;
pub use infra::config::{self, GatewayConfig};
pub use infra::ledger;
