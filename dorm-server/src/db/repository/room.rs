//! Room Repository

use super::{RepoError, RepoResult};
use shared::models::{Room, RoomCreate, RoomUpdate, RoomWithOccupancy};
use sqlx::SqlitePool;

const ROOM_SELECT: &str =
    "SELECT id, room_number, floor, capacity, monthly_rent, is_active, created_at, updated_at FROM room";

const ROOM_WITH_OCCUPANCY_SELECT: &str = "SELECT r.id, r.room_number, r.floor, r.capacity, r.monthly_rent, r.is_active, (SELECT COUNT(*) FROM contract c WHERE c.room_id = r.id AND c.status = 'active') AS occupancy, r.created_at, r.updated_at FROM room r";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<RoomWithOccupancy>> {
    let sql = format!(
        "{} WHERE r.is_active = 1 ORDER BY r.room_number",
        ROOM_WITH_OCCUPANCY_SELECT
    );
    let rows = sqlx::query_as::<_, RoomWithOccupancy>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<RoomWithOccupancy>> {
    let sql = format!("{} WHERE r.id = ?", ROOM_WITH_OCCUPANCY_SELECT);
    let row = sqlx::query_as::<_, RoomWithOccupancy>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: RoomCreate) -> RepoResult<Room> {
    if data.room_number.trim().is_empty() {
        return Err(RepoError::Validation("Room number is required".into()));
    }
    let capacity = data.capacity.unwrap_or(2);
    if capacity < 1 {
        return Err(RepoError::Validation(format!(
            "Capacity must be at least 1, got {capacity}"
        )));
    }
    if data.monthly_rent < 0.0 {
        return Err(RepoError::Validation("Monthly rent cannot be negative".into()));
    }

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room WHERE room_number = ?")
        .bind(&data.room_number)
        .fetch_one(pool)
        .await?;
    if exists > 0 {
        return Err(RepoError::Duplicate(format!(
            "Room {} already exists",
            data.room_number
        )));
    }

    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO room (room_number, floor, capacity, monthly_rent, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5) RETURNING {}",
        "id, room_number, floor, capacity, monthly_rent, is_active, created_at, updated_at"
    );
    let room = sqlx::query_as::<_, Room>(&sql)
        .bind(&data.room_number)
        .bind(data.floor)
        .bind(capacity)
        .bind(data.monthly_rent)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(room)
}

pub async fn update(pool: &SqlitePool, id: i64, data: RoomUpdate) -> RepoResult<Room> {
    let now = shared::util::now_millis();
    let sql = format!(
        "UPDATE room SET room_number = COALESCE(?1, room_number), floor = COALESCE(?2, floor), capacity = COALESCE(?3, capacity), monthly_rent = COALESCE(?4, monthly_rent), is_active = COALESCE(?5, is_active), updated_at = ?6 WHERE id = ?7 RETURNING {}",
        "id, room_number, floor, capacity, monthly_rent, is_active, created_at, updated_at"
    );
    let row = sqlx::query_as::<_, Room>(&sql)
        .bind(&data.room_number)
        .bind(data.floor)
        .bind(data.capacity)
        .bind(data.monthly_rent)
        .bind(data.is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| RepoError::NotFound(format!("Room {id} not found")))
}

/// Soft delete. Rejected while the room still has active contracts.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let occupied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM contract WHERE room_id = ? AND status = 'active'")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if occupied > 0 {
        return Err(RepoError::Conflict(format!(
            "Room {id} still has {occupied} active contract(s)"
        )));
    }

    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE room SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
