//! Billing Cycle API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::{RepoResult, billing_cycle};
use crate::db::with_retry;
use crate::utils::{AppError, AppResult};
use shared::models::{BillingCycle, BillingCycleResolve};

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// GET /api/cycles - list cycles, newest period first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<BillingCycle>>> {
    let limit = query.limit.unwrap_or(24).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    let cycles = billing_cycle::find_all(&state.pool, limit, offset).await?;
    Ok(Json(cycles))
}

/// GET /api/cycles/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BillingCycle>> {
    let cycle = billing_cycle::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Cycle {id}")))?;
    Ok(Json(cycle))
}

async fn resolve_on_pool(
    pool: &sqlx::SqlitePool,
    data: BillingCycleResolve,
) -> RepoResult<BillingCycle> {
    let mut conn = pool.acquire().await?;
    billing_cycle::resolve_or_create(&mut conn, data).await
}

/// POST /api/cycles/resolve - return the cycle for (year, month), creating
/// it with default boundaries when absent
pub async fn resolve(
    State(state): State<ServerState>,
    Json(payload): Json<BillingCycleResolve>,
) -> AppResult<Json<BillingCycle>> {
    let pool = &state.pool;
    let cycle = with_retry(|| resolve_on_pool(pool, payload.clone())).await?;
    Ok(Json(cycle))
}
