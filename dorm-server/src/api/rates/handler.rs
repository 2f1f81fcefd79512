//! Utility Rate API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::utility;
use crate::utils::AppResult;
use shared::models::{UtilityKind, UtilityRate, UtilityRateCreate, UtilityType};

#[derive(Deserialize)]
pub struct ListQuery {
    pub utility: Option<UtilityKind>,
}

/// GET /api/rates?utility=electric - rate history, newest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<UtilityRate>>> {
    let rates = utility::find_rates(&state.pool, query.utility).await?;
    Ok(Json(rates))
}

/// GET /api/rates/types - the metered utility types
pub async fn list_types(State(state): State<ServerState>) -> AppResult<Json<Vec<UtilityType>>> {
    let types = utility::find_all_types(&state.pool).await?;
    Ok(Json(types))
}

/// POST /api/rates - append a rate row (history is never edited in place)
pub async fn append(
    State(state): State<ServerState>,
    Json(payload): Json<UtilityRateCreate>,
) -> AppResult<Json<UtilityRate>> {
    let rate = utility::append_rate(&state.pool, payload).await?;
    Ok(Json(rate))
}
