//! Meter Readings and Photos

use serde::{Deserialize, Serialize};

/// Reconciled meter reading for one (room, cycle, utility).
///
/// `meter_start` is carried over from the most recent prior cycle's
/// `meter_end` for the same room+utility; for a first-ever reading it equals
/// `meter_end` (zero usage).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MeterReading {
    pub id: i64,
    pub room_id: i64,
    pub cycle_id: i64,
    pub utility_type_id: i64,
    pub meter_start: f64,
    pub meter_end: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Uploaded meter photo. Once `bill_id` is set the photo and its derived
/// reading are frozen: edits and deletes are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MeterPhoto {
    pub id: i64,
    pub room_id: i64,
    pub utility_type_id: i64,
    pub meter_value: f64,
    pub photo_path: String,
    /// ISO date the value was read
    pub reading_date: String,
    /// Buddhist calendar year of the billing period
    pub billing_year: i32,
    pub billing_month: i32,
    pub bill_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Result of reconciling a reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingOutcome {
    pub reading: MeterReading,
    pub usage: f64,
    pub amount: f64,
    pub is_rollover: bool,
}

/// PATCH payload for an existing meter photo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterPhotoUpdate {
    pub meter_value: f64,
}
