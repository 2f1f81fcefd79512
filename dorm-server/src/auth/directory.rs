//! Directory Service Client
//!
//! The dormitory has no local credential store. Users authenticate against
//! an external directory over HTTP; the directory returns the account plus
//! its group memberships, and group membership decides the portal role.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::models::Role;

/// Directory errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Successful directory authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryLogin {
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    /// Group memberships, consumed by [`role_from_groups`]
    pub groups: Vec<String>,
}

/// Authentication against the external directory
#[async_trait]
pub trait Directory: Send + Sync {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<DirectoryLogin, DirectoryError>;
}

/// Group names that map memberships onto portal roles
#[derive(Debug, Clone)]
pub struct DirectoryGroups {
    pub super_user_group: String,
    pub admin_group: String,
    pub tenant_group: String,
}

impl Default for DirectoryGroups {
    fn default() -> Self {
        Self {
            super_user_group: "dorm-superusers".into(),
            admin_group: "dorm-admins".into(),
            tenant_group: "dorm-tenants".into(),
        }
    }
}

/// Derive the portal role from a membership set. Highest privilege wins;
/// `None` means the account has no dormitory access at all.
pub fn role_from_groups(groups: &[String], cfg: &DirectoryGroups) -> Option<Role> {
    if groups.iter().any(|g| g == &cfg.super_user_group) {
        Some(Role::SuperUser)
    } else if groups.iter().any(|g| g == &cfg.admin_group) {
        Some(Role::Admin)
    } else if groups.iter().any(|g| g == &cfg.tenant_group) {
        Some(Role::Tenant)
    } else {
        None
    }
}

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// HTTP directory client
#[derive(Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectory {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<DirectoryLogin, DirectoryError> {
        let url = format!("{}/api/directory/authenticate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&AuthenticateRequest { username, password })
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<DirectoryLogin>()
                .await
                .map_err(|e| DirectoryError::Unavailable(format!("Malformed response: {e}"))),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(DirectoryError::InvalidCredentials)
            }
            status => Err(DirectoryError::Unavailable(format!(
                "Directory returned {status}"
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) struct StaticDirectory {
    pub users: Vec<(String, String, DirectoryLogin)>,
}

#[cfg(test)]
#[async_trait]
impl Directory for StaticDirectory {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<DirectoryLogin, DirectoryError> {
        self.users
            .iter()
            .find(|(u, p, _)| u == username && p == password)
            .map(|(_, _, login)| login.clone())
            .ok_or(DirectoryError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn highest_privilege_group_wins() {
        let cfg = DirectoryGroups::default();
        assert_eq!(
            role_from_groups(&groups(&["dorm-tenants", "dorm-superusers"]), &cfg),
            Some(Role::SuperUser)
        );
        assert_eq!(
            role_from_groups(&groups(&["dorm-admins", "dorm-tenants"]), &cfg),
            Some(Role::Admin)
        );
        assert_eq!(
            role_from_groups(&groups(&["dorm-tenants"]), &cfg),
            Some(Role::Tenant)
        );
    }

    #[test]
    fn unrelated_memberships_grant_nothing() {
        let cfg = DirectoryGroups::default();
        assert_eq!(role_from_groups(&groups(&["staff", "printing"]), &cfg), None);
        assert_eq!(role_from_groups(&[], &cfg), None);
    }
}
