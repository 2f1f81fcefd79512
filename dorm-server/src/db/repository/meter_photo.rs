//! Meter Photo Repository
//!
//! Photos are the evidence trail behind readings. Once the billing batch
//! links a photo to a bill (`bill_id` set) it is frozen; the freeze check
//! here guards both the photo and the reading it produced.

use super::{RepoError, RepoResult};
use shared::models::MeterPhoto;
use sqlx::{SqliteConnection, SqlitePool};

const PHOTO_SELECT: &str = "SELECT id, room_id, utility_type_id, meter_value, photo_path, reading_date, billing_year, billing_month, bill_id, created_at, updated_at FROM meter_photo";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MeterPhoto>> {
    let sql = format!("{} WHERE id = ?", PHOTO_SELECT);
    let row = sqlx::query_as::<_, MeterPhoto>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// List photos, optionally narrowed to a room and/or billing period
pub async fn find_filtered(
    pool: &SqlitePool,
    room_id: Option<i64>,
    year: Option<i32>,
    month: Option<i32>,
) -> RepoResult<Vec<MeterPhoto>> {
    let sql = format!(
        "{} WHERE (?1 IS NULL OR room_id = ?1) AND (?2 IS NULL OR billing_year = ?2) AND (?3 IS NULL OR billing_month = ?3) ORDER BY billing_year DESC, billing_month DESC, room_id, utility_type_id",
        PHOTO_SELECT
    );
    let rows = sqlx::query_as::<_, MeterPhoto>(&sql)
        .bind(room_id)
        .bind(year)
        .bind(month)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Whether any photo for (room, period) is already linked to a bill -
/// the freeze condition for the whole period's readings.
pub async fn has_billed_photo(
    conn: &mut SqliteConnection,
    room_id: i64,
    year: i32,
    month: i32,
) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM meter_photo WHERE room_id = ? AND billing_year = ? AND billing_month = ? AND bill_id IS NOT NULL",
    )
    .bind(room_id)
    .bind(year)
    .bind(month)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    conn: &mut SqliteConnection,
    room_id: i64,
    utility_type_id: i64,
    meter_value: f64,
    photo_path: &str,
    reading_date: &str,
    billing_year: i32,
    billing_month: i32,
) -> RepoResult<MeterPhoto> {
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO meter_photo (room_id, utility_type_id, meter_value, photo_path, reading_date, billing_year, billing_month, bill_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?8) RETURNING {}",
        "id, room_id, utility_type_id, meter_value, photo_path, reading_date, billing_year, billing_month, bill_id, created_at, updated_at"
    );
    let row = sqlx::query_as::<_, MeterPhoto>(&sql)
        .bind(room_id)
        .bind(utility_type_id)
        .bind(meter_value)
        .bind(photo_path)
        .bind(reading_date)
        .bind(billing_year)
        .bind(billing_month)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}

/// Update the captured value. Callers must have checked the freeze; the
/// `bill_id IS NULL` guard makes the check race-safe.
pub async fn update_value(
    conn: &mut SqliteConnection,
    id: i64,
    meter_value: f64,
) -> RepoResult<MeterPhoto> {
    let now = shared::util::now_millis();
    let sql = format!(
        "UPDATE meter_photo SET meter_value = ?1, updated_at = ?2 WHERE id = ?3 AND bill_id IS NULL RETURNING {}",
        "id, room_id, utility_type_id, meter_value, photo_path, reading_date, billing_year, billing_month, bill_id, created_at, updated_at"
    );
    let row = sqlx::query_as::<_, MeterPhoto>(&sql)
        .bind(meter_value)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.ok_or_else(|| {
        RepoError::Conflict(format!(
            "Meter photo {id} is linked to an issued bill and cannot be modified"
        ))
    })
}

/// Delete an unlinked photo row. Returns the photo for file cleanup.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<MeterPhoto> {
    let existing = {
        let sql = format!("{} WHERE id = ?", PHOTO_SELECT);
        sqlx::query_as::<_, MeterPhoto>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Meter photo {id} not found")))?
    };
    if existing.bill_id.is_some() {
        return Err(RepoError::Conflict(format!(
            "Meter photo {id} is linked to an issued bill and cannot be deleted"
        )));
    }
    sqlx::query("DELETE FROM meter_photo WHERE id = ? AND bill_id IS NULL")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(existing)
}

/// Link all unlinked photos for (room, period) to a freshly created bill,
/// freezing them. Returns the number of photos linked.
pub async fn link_to_bill(
    conn: &mut SqliteConnection,
    bill_id: i64,
    room_id: i64,
    year: i32,
    month: i32,
) -> RepoResult<u64> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE meter_photo SET bill_id = ?1, updated_at = ?2 WHERE room_id = ?3 AND billing_year = ?4 AND billing_month = ?5 AND bill_id IS NULL",
    )
    .bind(bill_id)
    .bind(now)
    .bind(room_id)
    .bind(year)
    .bind(month)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}
