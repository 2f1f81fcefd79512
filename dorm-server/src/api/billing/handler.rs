//! Billing API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::billing::{breakdown, engine};
use crate::core::ServerState;
use crate::db::repository::bill;
use crate::db::with_retry;
use crate::utils::{AppError, AppResult};
use shared::models::{Bill, BillDetail, BillStatusUpdate, BillingRunSummary};

#[derive(Deserialize, Validate)]
pub struct BillingRunRequest {
    /// Buddhist calendar year
    #[validate(range(min = 2400, max = 2700))]
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub month: i32,
    /// Flat per-tenant fee override (defaults to 1000)
    #[validate(range(min = 0.0))]
    pub maintenance_fee: Option<f64>,
}

/// POST /api/billing/run - run the billing batch for a period.
///
/// Idempotent per (tenant, cycle); re-runs only bill tenants not yet
/// covered. Transient pool exhaustion is retried before surfacing.
pub async fn run(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<BillingRunRequest>,
) -> AppResult<Json<BillingRunSummary>> {
    payload.validate()?;

    let pool = &state.pool;
    let summary = with_retry(|| {
        engine::run_billing_for_cycle(pool, payload.year, payload.month, payload.maintenance_fee)
    })
    .await?;

    tracing::info!(
        operator = %user.username,
        cycle_id = summary.cycle_id,
        bills_created = summary.bills_created,
        "Billing batch requested"
    );
    Ok(Json(summary))
}

#[derive(Deserialize)]
pub struct BillQuery {
    pub cycle_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// GET /api/bills - list bills. Tenant sessions are pinned to their own.
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<BillQuery>,
) -> AppResult<Json<Vec<Bill>>> {
    let tenant_id = if user.is_admin() {
        query.tenant_id
    } else {
        Some(
            user.tenant_id
                .ok_or_else(|| AppError::forbidden("No tenant record for this session"))?,
        )
    };
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let bills = bill::find_filtered(&state.pool, query.cycle_id, tenant_id, limit, offset).await?;
    Ok(Json(bills))
}

/// GET /api/bills/:id - full breakdown, recomputed from readings × rates
pub async fn detail(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<BillDetail>> {
    let detail = breakdown::bill_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Bill {id}")))?;

    if !user.is_admin() && user.tenant_id != Some(detail.bill.tenant_id) {
        return Err(AppError::forbidden("Not your bill"));
    }
    Ok(Json(detail))
}

/// POST /api/bills/:id/status - draft → sent → paid, forward only
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<BillStatusUpdate>,
) -> AppResult<Json<Bill>> {
    let bill = bill::update_status(&state.pool, id, payload.status).await?;
    Ok(Json(bill))
}
