//! Meter Reading API Handlers
//!
//! Upload flow: multipart photo + value → file stored → one transaction
//! resolves the cycle, reconciles the reading, and records the photo row.
//! The stored file is removed again if the transaction fails.

use axum::{
    Json,
    extract::{Extension, Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::billing::reconciler;
use crate::core::ServerState;
use crate::db::repository::{
    RepoError, RepoResult, billing_cycle, contract, meter_photo, meter_reading, room, utility,
};
use crate::db::with_retry;
use crate::storage::validate_extension;
use crate::utils::time::today_iso;
use crate::utils::{AppError, AppResult};
use shared::models::{
    BillingCycleResolve, ContractStatus, MeterPhoto, MeterPhotoUpdate, MeterReading,
    ReadingOutcome, UtilityKind,
};

#[derive(Serialize)]
pub struct ReadingUploadResponse {
    pub photo: MeterPhoto,
    pub outcome: ReadingOutcome,
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid {name}: {value}")))
}

/// Admins see everything; tenants only rooms they actively occupy
async fn ensure_room_access(
    state: &ServerState,
    user: &CurrentUser,
    room_id: i64,
) -> AppResult<()> {
    if user.is_admin() {
        return Ok(());
    }
    let tenant_id = user
        .tenant_id
        .ok_or_else(|| AppError::forbidden("No tenant record for this session"))?;
    let contracts = contract::find_by_tenant(&state.pool, tenant_id).await?;
    let occupies = contracts
        .iter()
        .any(|c| c.room_id == room_id && c.status == ContractStatus::Active);
    if occupies {
        Ok(())
    } else {
        Err(AppError::forbidden("Not your room"))
    }
}

/// The transactional tail of an upload, retry-safe as one unit
#[allow(clippy::too_many_arguments)]
async fn persist_reading(
    pool: &sqlx::SqlitePool,
    room_id: i64,
    kind: UtilityKind,
    meter_value: f64,
    photo_path: &str,
    reading_date: &str,
    year: i32,
    month: i32,
) -> RepoResult<(ReadingOutcome, MeterPhoto)> {
    let mut tx = pool.begin().await?;

    let cycle = billing_cycle::resolve_or_create(
        &mut tx,
        BillingCycleResolve {
            year,
            month,
            start_date: None,
            end_date: None,
            due_date: None,
        },
    )
    .await?;
    let utility_type = utility::find_type_by_code(&mut tx, kind)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Utility reference data missing: {kind}")))?;

    let outcome =
        reconciler::record_reading(&mut tx, room_id, &cycle, &utility_type, meter_value).await?;
    let photo = meter_photo::insert(
        &mut tx,
        room_id,
        utility_type.id,
        meter_value,
        photo_path,
        reading_date,
        year,
        month,
    )
    .await?;

    tx.commit().await?;
    Ok((outcome, photo))
}

/// POST /api/readings - multipart upload of a meter photo + value
///
/// Fields: `room_id`, `utility` (electric|water), `meter_value`, `year`
/// (Buddhist), `month`, optional `reading_date`, and the `photo` file.
pub async fn upload_reading(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> AppResult<Json<ReadingUploadResponse>> {
    let mut room_id: Option<i64> = None;
    let mut kind: Option<UtilityKind> = None;
    let mut meter_value: Option<f64> = None;
    let mut year: Option<i32> = None;
    let mut month: Option<i32> = None;
    let mut reading_date: Option<String> = None;
    let mut photo: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "room_id" => room_id = Some(parse_field("room_id", &field.text().await?)?),
            "utility" => kind = Some(parse_field("utility", &field.text().await?)?),
            "meter_value" => meter_value = Some(parse_field("meter_value", &field.text().await?)?),
            "year" => year = Some(parse_field("year", &field.text().await?)?),
            "month" => month = Some(parse_field("month", &field.text().await?)?),
            "reading_date" => reading_date = Some(field.text().await?.trim().to_string()),
            "photo" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let ext = validate_extension(&filename)?;
                let data = field.bytes().await?;
                photo = Some((data.to_vec(), ext));
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let room_id = room_id.ok_or_else(|| AppError::validation("room_id is required"))?;
    let kind = kind.ok_or_else(|| AppError::validation("utility is required"))?;
    let meter_value = meter_value.ok_or_else(|| AppError::validation("meter_value is required"))?;
    let year = year.ok_or_else(|| AppError::validation("year is required"))?;
    let month = month.ok_or_else(|| AppError::validation("month is required"))?;
    let (bytes, ext) = photo.ok_or_else(|| AppError::validation("photo is required"))?;
    let reading_date = match reading_date {
        Some(d) => crate::utils::time::parse_date(&d)?.to_string(),
        None => today_iso(),
    };

    room::find_by_id(&state.pool, room_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Room {room_id}")))?;

    let photo_path = state.storage.store("photos", &ext, &bytes)?;

    let pool = &state.pool;
    let path = photo_path.as_str();
    let date = reading_date.as_str();
    let result = with_retry(|| {
        persist_reading(pool, room_id, kind, meter_value, path, date, year, month)
    })
    .await;

    match result {
        Ok((outcome, photo)) => Ok(Json(ReadingUploadResponse { photo, outcome })),
        Err(e) => {
            // The row never landed; don't keep the orphaned file
            if let Err(cleanup) = state.storage.delete(&photo_path) {
                tracing::warn!(path = %photo_path, error = %cleanup, "Failed to clean up stored photo");
            }
            Err(e.into())
        }
    }
}

#[derive(Deserialize)]
pub struct PhotoQuery {
    pub room_id: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<i32>,
}

/// GET /api/readings/photos - list photos by room/period
pub async fn list_photos(
    State(state): State<ServerState>,
    Query(query): Query<PhotoQuery>,
) -> AppResult<Json<Vec<MeterPhoto>>> {
    let photos =
        meter_photo::find_filtered(&state.pool, query.room_id, query.year, query.month).await?;
    Ok(Json(photos))
}

/// GET /api/readings/rooms/:room_id/cycles/:cycle_id - reconciled readings
pub async fn list_room_readings(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((room_id, cycle_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<MeterReading>>> {
    ensure_room_access(&state, &user, room_id).await?;
    let readings = meter_reading::find_by_room_cycle(&state.pool, room_id, cycle_id).await?;
    Ok(Json(readings))
}

/// GET /api/readings/photos/:id/file - serve the stored photo
pub async fn photo_file(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let photo = meter_photo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Meter photo {id}")))?;
    ensure_room_access(&state, &user, photo.room_id).await?;

    let bytes = state.storage.read(&photo.photo_path)?;
    let mime = mime_guess::from_path(&photo.photo_path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}

/// PATCH /api/readings/photos/:id - correct a captured value.
///
/// Re-runs reconciliation for the photo's period; rejected with a
/// state-conflict once the photo is linked to an issued bill.
pub async fn update_photo(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MeterPhotoUpdate>,
) -> AppResult<Json<ReadingUploadResponse>> {
    let photo = meter_photo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Meter photo {id}")))?;

    let mut tx = state.pool.begin().await.map_err(RepoError::from)?;

    let cycle = billing_cycle::find_by_period(&mut tx, photo.billing_year, photo.billing_month)
        .await?
        .ok_or_else(|| {
            AppError::database(format!(
                "Cycle {}/{} missing for photo {id}",
                photo.billing_year, photo.billing_month
            ))
        })?;
    let utility_type = utility::find_type_by_id(&mut tx, photo.utility_type_id)
        .await?
        .ok_or_else(|| {
            AppError::database(format!("Utility type {} missing", photo.utility_type_id))
        })?;

    // Freeze check happens inside the reconciler; the row update re-checks
    let outcome = reconciler::record_reading(
        &mut tx,
        photo.room_id,
        &cycle,
        &utility_type,
        payload.meter_value,
    )
    .await?;
    let photo = meter_photo::update_value(&mut tx, id, payload.meter_value).await?;

    tx.commit().await.map_err(RepoError::from)?;
    Ok(Json(ReadingUploadResponse { photo, outcome }))
}

/// DELETE /api/readings/photos/:id - remove an unlinked photo.
///
/// The reconciled reading row keeps its last value; corrections go through
/// PATCH, not delete-and-reupload.
pub async fn delete_photo(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let mut tx = state.pool.begin().await.map_err(RepoError::from)?;
    let photo = meter_photo::delete(&mut tx, id).await?;
    tx.commit().await.map_err(RepoError::from)?;

    if let Err(e) = state.storage.delete(&photo.photo_path) {
        tracing::warn!(path = %photo.photo_path, error = %e, "Failed to delete photo file");
    }
    Ok(Json(true))
}
