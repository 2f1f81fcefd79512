//! Contract Models

use serde::{Deserialize, Serialize};

/// Contract status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum ContractStatus {
    Active,
    Pending,
    Ended,
    Inactive,
}

/// Occupancy record linking a tenant to a room.
///
/// A tenant has at most one active contract at a time; room occupancy is the
/// count of active contracts referencing the room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Contract {
    pub id: i64,
    pub tenant_id: i64,
    pub room_id: i64,
    pub start_date: String,
    pub end_date: Option<String>,
    pub status: ContractStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Contract joined with tenant and room display fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ContractWithNames {
    pub id: i64,
    pub tenant_id: i64,
    pub tenant_name: String,
    pub room_id: i64,
    pub room_number: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub status: ContractStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create contract payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCreate {
    pub tenant_id: i64,
    pub room_id: i64,
    pub start_date: String,
    /// Defaults to active
    pub status: Option<ContractStatus>,
}
