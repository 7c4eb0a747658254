//! Recognized roles and the checks that gate registration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// May provision new application users and ledger identities.
    Registrar,
    Regulator,
    Trader,
    Exporter,
    Importer,
    Carrier,
    Banker,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0} is not a recognized role")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Registrar,
        Role::Regulator,
        Role::Trader,
        Role::Exporter,
        Role::Importer,
        Role::Carrier,
        Role::Banker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Registrar => "REGISTRAR",
            Role::Regulator => "REGULATOR",
            Role::Trader => "TRADER",
            Role::Exporter => "EXPORTER",
            Role::Importer => "IMPORTER",
            Role::Carrier => "CARRIER",
            Role::Banker => "BANKER",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or(UnknownRole(normalized))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful password check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    pub username: String,
    pub roles: Vec<Role>,
}

pub fn is_registrar(auth: &AuthResult) -> bool {
    auth.roles.contains(&Role::Registrar)
}

pub fn recognized_role(role: &str) -> bool {
    role.parse::<Role>().is_ok()
}
