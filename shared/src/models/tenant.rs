//! Tenant Models

use serde::{Deserialize, Serialize};

/// Tenant entity. `username` is the directory account the tenant signs in
/// with; no credentials are stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Tenant {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create tenant payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantCreate {
    pub username: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Update tenant payload (partial)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantUpdate {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}
