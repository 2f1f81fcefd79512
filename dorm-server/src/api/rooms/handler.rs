//! Room API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::repository::room;
use crate::utils::{AppError, AppResult};
use shared::models::{Room, RoomCreate, RoomUpdate, RoomWithOccupancy};

/// GET /api/rooms - active rooms with current occupancy
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<RoomWithOccupancy>>> {
    let rooms = room::find_all(&state.pool).await?;
    Ok(Json(rooms))
}

/// GET /api/rooms/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RoomWithOccupancy>> {
    let room = room::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Room {id}")))?;
    Ok(Json(room))
}

/// POST /api/rooms
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<RoomCreate>,
) -> AppResult<Json<Room>> {
    let room = room::create(&state.pool, payload).await?;
    Ok(Json(room))
}

/// PUT /api/rooms/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<RoomUpdate>,
) -> AppResult<Json<Room>> {
    let room = room::update(&state.pool, id, payload).await?;
    Ok(Json(room))
}

/// DELETE /api/rooms/:id - soft delete, rejected while occupied
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = room::delete(&state.pool, id).await?;
    Ok(Json(result))
}
