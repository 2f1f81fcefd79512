//! Authentication Models

use serde::{Deserialize, Serialize};

/// Role derived from directory group memberships.
///
/// `SuperUser` and `Admin` both pass admin gates; `SuperUser` additionally
/// may manage admin accounts upstream in the directory (not mirrored here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    SuperUser,
    Admin,
    Tenant,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperUser | Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperUser => "superUser",
            Role::Admin => "admin",
            Role::Tenant => "tenant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superUser" => Ok(Role::SuperUser),
            "admin" => Ok(Role::Admin),
            "tenant" => Ok(Role::Tenant),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response - bearer token plus the resolved identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}
