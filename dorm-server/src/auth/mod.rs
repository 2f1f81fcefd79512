//! Authentication
//!
//! Identity lives in an external directory service; this module only
//! consumes it. Login flow: directory authenticate → role derived from
//! group memberships → short-lived JWT for the portal session. A single
//! [`middleware::require_role`] primitive gates admin surfaces - no
//! per-handler permission checks.

pub mod directory;
pub mod jwt;
pub mod middleware;

pub use directory::{Directory, DirectoryError, DirectoryLogin, HttpDirectory, role_from_groups};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{ADMIN_ROLES, require_auth, require_role};

use shared::models::Role;

/// Authenticated request identity, injected by [`middleware::require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    /// Set for tenant sessions; admins have no tenant row
    pub tenant_id: Option<i64>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role: Role = claims.role.parse()?;
        Ok(Self {
            username: claims.sub,
            display_name: claims.name,
            role,
            tenant_id: claims.tenant_id,
        })
    }
}
