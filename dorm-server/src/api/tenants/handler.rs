//! Tenant API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::repository::tenant;
use crate::utils::{AppError, AppResult};
use shared::models::{Tenant, TenantCreate, TenantUpdate};

/// GET /api/tenants
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Tenant>>> {
    let tenants = tenant::find_all(&state.pool).await?;
    Ok(Json(tenants))
}

/// GET /api/tenants/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Tenant>> {
    let tenant = tenant::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Tenant {id}")))?;
    Ok(Json(tenant))
}

/// POST /api/tenants - register a directory account as a tenant
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TenantCreate>,
) -> AppResult<Json<Tenant>> {
    let tenant = tenant::create(&state.pool, payload).await?;
    Ok(Json(tenant))
}

/// PUT /api/tenants/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TenantUpdate>,
) -> AppResult<Json<Tenant>> {
    let tenant = tenant::update(&state.pool, id, payload).await?;
    Ok(Json(tenant))
}

/// DELETE /api/tenants/:id - soft delete, rejected with an active contract
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = tenant::delete(&state.pool, id).await?;
    Ok(Json(result))
}
