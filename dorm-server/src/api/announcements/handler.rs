//! Announcement API Handlers

use axum::{
    Json,
    extract::{Extension, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::announcement;
use crate::storage::validate_extension;
use crate::utils::{AppError, AppResult};
use shared::models::{Announcement, AnnouncementCreate, AnnouncementUpdate};

/// GET /api/announcements - tenants only see published ones
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Announcement>>> {
    let rows = announcement::find_all(&state.pool, !user.is_admin()).await?;
    Ok(Json(rows))
}

/// GET /api/announcements/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Announcement>> {
    let row = announcement::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Announcement {id}")))?;
    if row.published_at.is_none() && !user.is_admin() {
        return Err(AppError::not_found(format!("Announcement {id}")));
    }
    Ok(Json(row))
}

/// GET /api/announcements/:id/attachment
pub async fn attachment(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let row = announcement::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Announcement {id}")))?;
    if row.published_at.is_none() && !user.is_admin() {
        return Err(AppError::not_found(format!("Announcement {id}")));
    }
    let path = row
        .attachment_path
        .ok_or_else(|| AppError::not_found(format!("Announcement {id} has no attachment")))?;

    let bytes = state.storage.read(&path)?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}

/// POST /api/announcements
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AnnouncementCreate>,
) -> AppResult<Json<Announcement>> {
    let row = announcement::create(&state.pool, payload, &user.display_name).await?;
    Ok(Json(row))
}

/// PUT /api/announcements/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<AnnouncementUpdate>,
) -> AppResult<Json<Announcement>> {
    let row = announcement::update(&state.pool, id, payload).await?;
    Ok(Json(row))
}

/// POST /api/announcements/:id/attachment - multipart `file` field
pub async fn upload_attachment(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<Json<Announcement>> {
    let existing = announcement::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Announcement {id}")))?;

    let mut file: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("").to_string();
            let ext = validate_extension(&filename)?;
            let data = field.bytes().await?;
            file = Some((data.to_vec(), ext));
        }
    }
    let (bytes, ext) = file.ok_or_else(|| AppError::validation("file is required"))?;

    let path = state.storage.store("attachments", &ext, &bytes)?;
    let row = announcement::set_attachment(&state.pool, id, &path).await?;

    // Replace semantics: the previous attachment file is no longer referenced
    if let Some(old) = existing.attachment_path {
        if let Err(e) = state.storage.delete(&old) {
            tracing::warn!(path = %old, error = %e, "Failed to delete replaced attachment");
        }
    }
    Ok(Json(row))
}

/// DELETE /api/announcements/:id
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let removed = announcement::delete(&state.pool, id).await?;
    if let Some(path) = removed.attachment_path {
        if let Err(e) = state.storage.delete(&path) {
            tracing::warn!(path = %path, error = %e, "Failed to delete attachment file");
        }
    }
    Ok(Json(true))
}
