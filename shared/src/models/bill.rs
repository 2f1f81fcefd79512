//! Bill Models

use serde::{Deserialize, Serialize};

use super::utility::UtilityKind;

/// Bill status lifecycle: draft → sent → paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum BillStatus {
    Draft,
    Sent,
    Paid,
}

impl BillStatus {
    /// Whether `next` is a legal transition from `self` (forward only)
    pub fn can_transition_to(&self, next: BillStatus) -> bool {
        matches!(
            (self, next),
            (BillStatus::Draft, BillStatus::Sent) | (BillStatus::Sent, BillStatus::Paid)
        )
    }
}

/// Bill row - one per (tenant, cycle), never regenerated.
///
/// Amount columns are a denormalized cache written by the billing batch;
/// the detail endpoint recomputes from readings × rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Bill {
    pub id: i64,
    pub tenant_id: i64,
    pub room_id: i64,
    pub contract_id: i64,
    pub cycle_id: i64,
    pub maintenance_fee: f64,
    pub electric_amount: f64,
    pub water_amount: f64,
    pub subtotal_amount: f64,
    pub total_amount: f64,
    pub status: BillStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per-utility breakdown line on a bill detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityLine {
    pub utility: UtilityKind,
    pub meter_start: Option<f64>,
    pub meter_end: Option<f64>,
    pub usage: f64,
    pub is_rollover: bool,
    pub rate_per_unit: f64,
    /// Whole-room amount before the co-tenant split
    pub room_amount: f64,
    /// This tenant's equal share
    pub tenant_amount: f64,
}

/// Full bill breakdown for display/printing, recomputed live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillDetail {
    pub bill: Bill,
    pub tenant_name: String,
    pub room_number: String,
    pub cycle_year: i32,
    pub cycle_month: i32,
    pub due_date: String,
    /// Active co-occupants sharing the room's utility amounts
    pub tenant_count: i64,
    pub utilities: Vec<UtilityLine>,
    pub maintenance_fee: f64,
    pub subtotal_amount: f64,
    pub total_amount: f64,
}

/// Outcome of a billing batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRunSummary {
    pub cycle_id: i64,
    pub bills_created: i64,
}

/// Status transition payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillStatusUpdate {
    pub status: BillStatus,
}
