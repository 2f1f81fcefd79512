//! Room Models

use serde::{Deserialize, Serialize};

/// Room entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Room {
    pub id: i64,
    pub room_number: String,
    pub floor: i32,
    /// Maximum co-occupants
    pub capacity: i32,
    pub monthly_rent: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Room joined with its current occupancy (count of active contracts)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RoomWithOccupancy {
    pub id: i64,
    pub room_number: String,
    pub floor: i32,
    pub capacity: i32,
    pub monthly_rent: f64,
    pub is_active: bool,
    pub occupancy: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create room payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreate {
    pub room_number: String,
    pub floor: i32,
    pub capacity: Option<i32>,
    pub monthly_rent: f64,
}

/// Update room payload (partial)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomUpdate {
    pub room_number: Option<String>,
    pub floor: Option<i32>,
    pub capacity: Option<i32>,
    pub monthly_rent: Option<f64>,
    pub is_active: Option<bool>,
}
