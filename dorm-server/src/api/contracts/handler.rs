//! Contract API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::contract;
use crate::utils::{AppError, AppResult};
use shared::models::{Contract, ContractCreate, ContractStatus, ContractWithNames};

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<ContractStatus>,
}

/// GET /api/contracts?status=active
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<ContractWithNames>>> {
    let contracts = contract::find_all(&state.pool, query.status).await?;
    Ok(Json(contracts))
}

/// GET /api/contracts/mine - the calling tenant's contract history
pub async fn mine(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Contract>>> {
    let tenant_id = user
        .tenant_id
        .ok_or_else(|| AppError::forbidden("No tenant record for this session"))?;
    let contracts = contract::find_by_tenant(&state.pool, tenant_id).await?;
    Ok(Json(contracts))
}

/// GET /api/contracts/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ContractWithNames>> {
    let contract = contract::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Contract {id}")))?;
    Ok(Json(contract))
}

/// POST /api/contracts - move a tenant into a room.
///
/// State-conflicts: the tenant already has an active contract, or the room
/// is at capacity.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ContractCreate>,
) -> AppResult<Json<ContractWithNames>> {
    let contract = contract::create(&state.pool, payload).await?;
    Ok(Json(contract))
}

#[derive(Deserialize)]
pub struct EndRequest {
    pub end_date: String,
}

/// POST /api/contracts/:id/end - move the tenant out
pub async fn end(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<EndRequest>,
) -> AppResult<Json<ContractWithNames>> {
    let contract = contract::end(&state.pool, id, &payload.end_date).await?;
    Ok(Json(contract))
}
