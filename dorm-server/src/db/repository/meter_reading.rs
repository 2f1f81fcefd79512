//! Meter Reading Repository
//!
//! Row-level access for reconciled readings. The carry-forward and usage
//! logic lives in `billing::reconciler`; these functions only move rows.

use super::RepoResult;
use shared::models::MeterReading;
use sqlx::{SqliteConnection, SqlitePool};

const READING_SELECT: &str = "SELECT id, room_id, cycle_id, utility_type_id, meter_start, meter_end, created_at, updated_at FROM bill_utility_reading";

pub async fn find_by_key(
    conn: &mut SqliteConnection,
    room_id: i64,
    cycle_id: i64,
    utility_type_id: i64,
) -> RepoResult<Option<MeterReading>> {
    let sql = format!(
        "{} WHERE room_id = ? AND cycle_id = ? AND utility_type_id = ?",
        READING_SELECT
    );
    let row = sqlx::query_as::<_, MeterReading>(&sql)
        .bind(room_id)
        .bind(cycle_id)
        .bind(utility_type_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// `meter_end` of the most recent cycle strictly earlier than (year, month)
/// for the same room+utility. This becomes the next period's `meter_start`.
pub async fn prior_meter_end(
    conn: &mut SqliteConnection,
    room_id: i64,
    utility_type_id: i64,
    year: i32,
    month: i32,
) -> RepoResult<Option<f64>> {
    let value: Option<f64> = sqlx::query_scalar(
        "SELECT r.meter_end FROM bill_utility_reading r JOIN billing_cycle c ON c.id = r.cycle_id WHERE r.room_id = ?1 AND r.utility_type_id = ?2 AND (c.year < ?3 OR (c.year = ?3 AND c.month < ?4)) ORDER BY c.year DESC, c.month DESC LIMIT 1",
    )
    .bind(room_id)
    .bind(utility_type_id)
    .bind(year)
    .bind(month)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(value)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    room_id: i64,
    cycle_id: i64,
    utility_type_id: i64,
    meter_start: f64,
    meter_end: f64,
) -> RepoResult<MeterReading> {
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO bill_utility_reading (room_id, cycle_id, utility_type_id, meter_start, meter_end, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) RETURNING {}",
        "id, room_id, cycle_id, utility_type_id, meter_start, meter_end, created_at, updated_at"
    );
    let row = sqlx::query_as::<_, MeterReading>(&sql)
        .bind(room_id)
        .bind(cycle_id)
        .bind(utility_type_id)
        .bind(meter_start)
        .bind(meter_end)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}

/// Update `meter_end` only; `meter_start` stays as reconciled at creation.
pub async fn update_end(
    conn: &mut SqliteConnection,
    id: i64,
    meter_end: f64,
) -> RepoResult<MeterReading> {
    let now = shared::util::now_millis();
    let sql = format!(
        "UPDATE bill_utility_reading SET meter_end = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {}",
        "id, room_id, cycle_id, utility_type_id, meter_start, meter_end, created_at, updated_at"
    );
    let row = sqlx::query_as::<_, MeterReading>(&sql)
        .bind(meter_end)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_by_room_cycle(
    pool: &SqlitePool,
    room_id: i64,
    cycle_id: i64,
) -> RepoResult<Vec<MeterReading>> {
    let sql = format!(
        "{} WHERE room_id = ? AND cycle_id = ? ORDER BY utility_type_id",
        READING_SELECT
    );
    let rows = sqlx::query_as::<_, MeterReading>(&sql)
        .bind(room_id)
        .bind(cycle_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
