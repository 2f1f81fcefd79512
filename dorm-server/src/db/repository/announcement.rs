//! Announcement Repository

use super::{RepoError, RepoResult};
use shared::models::{Announcement, AnnouncementCreate, AnnouncementUpdate};
use sqlx::SqlitePool;

const ANNOUNCEMENT_SELECT: &str = "SELECT id, title, body, attachment_path, author_name, published_at, created_at, updated_at FROM announcement";

/// List announcements. Tenants only see published ones.
pub async fn find_all(pool: &SqlitePool, published_only: bool) -> RepoResult<Vec<Announcement>> {
    let sql = if published_only {
        format!(
            "{} WHERE published_at IS NOT NULL ORDER BY published_at DESC",
            ANNOUNCEMENT_SELECT
        )
    } else {
        format!("{} ORDER BY created_at DESC", ANNOUNCEMENT_SELECT)
    };
    let rows = sqlx::query_as::<_, Announcement>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Announcement>> {
    let sql = format!("{} WHERE id = ?", ANNOUNCEMENT_SELECT);
    let row = sqlx::query_as::<_, Announcement>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    data: AnnouncementCreate,
    author_name: &str,
) -> RepoResult<Announcement> {
    if data.title.trim().is_empty() {
        return Err(RepoError::Validation("Title is required".into()));
    }

    let now = shared::util::now_millis();
    let published_at = if data.publish.unwrap_or(true) {
        Some(now)
    } else {
        None
    };
    let sql = format!(
        "INSERT INTO announcement (title, body, attachment_path, author_name, published_at, created_at, updated_at) VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?5) RETURNING {}",
        "id, title, body, attachment_path, author_name, published_at, created_at, updated_at"
    );
    let row = sqlx::query_as::<_, Announcement>(&sql)
        .bind(&data.title)
        .bind(&data.body)
        .bind(author_name)
        .bind(published_at)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: AnnouncementUpdate,
) -> RepoResult<Announcement> {
    let now = shared::util::now_millis();
    // publish = true stamps published_at once; publish = false unpublishes
    let sql = format!(
        "UPDATE announcement SET title = COALESCE(?1, title), body = COALESCE(?2, body), published_at = CASE WHEN ?3 IS NULL THEN published_at WHEN ?3 = 1 THEN COALESCE(published_at, ?4) ELSE NULL END, updated_at = ?4 WHERE id = ?5 RETURNING {}",
        "id, title, body, attachment_path, author_name, published_at, created_at, updated_at"
    );
    let row = sqlx::query_as::<_, Announcement>(&sql)
        .bind(&data.title)
        .bind(&data.body)
        .bind(data.publish)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| RepoError::NotFound(format!("Announcement {id} not found")))
}

pub async fn set_attachment(pool: &SqlitePool, id: i64, path: &str) -> RepoResult<Announcement> {
    let now = shared::util::now_millis();
    let sql = format!(
        "UPDATE announcement SET attachment_path = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {}",
        "id, title, body, attachment_path, author_name, published_at, created_at, updated_at"
    );
    let row = sqlx::query_as::<_, Announcement>(&sql)
        .bind(path)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| RepoError::NotFound(format!("Announcement {id} not found")))
}

/// Hard delete. Returns the removed row so the caller can clean up any
/// stored attachment file.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<Announcement> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Announcement {id} not found")))?;
    sqlx::query("DELETE FROM announcement WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(existing)
}
