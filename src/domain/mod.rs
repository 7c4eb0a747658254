//! Identity bridging, tokens, roles and contract dispatch.

pub mod credentials;
pub mod dispatch;
pub mod identity;
pub mod role;
pub mod token;

pub use credentials::{Authenticator, CredentialStore, InMemoryCredentialStore, User};
pub use dispatch::{ContractDispatcher, InvocationMode, InvocationRequest, InvocationResult, ProtectedAction};
pub use identity::{IdentityBridge, LedgerIdentity};
pub use role::{is_registrar, recognized_role, AuthResult, Role};
pub use token::{Claims, TokenService, UserDetails};
