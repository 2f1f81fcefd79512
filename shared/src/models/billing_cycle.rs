//! Billing Cycle Model

use serde::{Deserialize, Serialize};

/// Cycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum CycleStatus {
    Open,
    Closed,
}

/// Billing cycle entity - one (year, month) accounting period.
///
/// `year` is the Buddhist calendar year; the Gregorian dates below are
/// derived from it. Unique per (year, month).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BillingCycle {
    pub id: i64,
    /// Buddhist calendar year (Gregorian + 543)
    pub year: i32,
    /// Month 1-12
    pub month: i32,
    /// First day covered (ISO date)
    pub start_date: String,
    /// Last day covered (ISO date)
    pub end_date: String,
    /// Payment due date (ISO date)
    pub due_date: String,
    pub status: CycleStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Resolve-or-create payload. Dates default from (year, month) when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingCycleResolve {
    pub year: i32,
    pub month: i32,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub due_date: Option<String>,
}
