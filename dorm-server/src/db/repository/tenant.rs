//! Tenant Repository

use super::{RepoError, RepoResult};
use shared::models::{Tenant, TenantCreate, TenantUpdate};
use sqlx::SqlitePool;

const TENANT_SELECT: &str =
    "SELECT id, username, display_name, phone, email, is_active, created_at, updated_at FROM tenant";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Tenant>> {
    let sql = format!("{} WHERE is_active = 1 ORDER BY display_name", TENANT_SELECT);
    let rows = sqlx::query_as::<_, Tenant>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Tenant>> {
    let sql = format!("{} WHERE id = ?", TENANT_SELECT);
    let row = sqlx::query_as::<_, Tenant>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<Tenant>> {
    let sql = format!("{} WHERE username = ?", TENANT_SELECT);
    let row = sqlx::query_as::<_, Tenant>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: TenantCreate) -> RepoResult<Tenant> {
    if data.username.trim().is_empty() {
        return Err(RepoError::Validation("Username is required".into()));
    }
    if data.display_name.trim().is_empty() {
        return Err(RepoError::Validation("Display name is required".into()));
    }

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenant WHERE username = ?")
        .bind(&data.username)
        .fetch_one(pool)
        .await?;
    if exists > 0 {
        return Err(RepoError::Duplicate(format!(
            "Tenant {} already exists",
            data.username
        )));
    }

    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO tenant (username, display_name, phone, email, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5) RETURNING {}",
        "id, username, display_name, phone, email, is_active, created_at, updated_at"
    );
    let tenant = sqlx::query_as::<_, Tenant>(&sql)
        .bind(&data.username)
        .bind(&data.display_name)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(tenant)
}

pub async fn update(pool: &SqlitePool, id: i64, data: TenantUpdate) -> RepoResult<Tenant> {
    let now = shared::util::now_millis();
    let sql = format!(
        "UPDATE tenant SET display_name = COALESCE(?1, display_name), phone = COALESCE(?2, phone), email = COALESCE(?3, email), is_active = COALESCE(?4, is_active), updated_at = ?5 WHERE id = ?6 RETURNING {}",
        "id, username, display_name, phone, email, is_active, created_at, updated_at"
    );
    let row = sqlx::query_as::<_, Tenant>(&sql)
        .bind(&data.display_name)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(data.is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| RepoError::NotFound(format!("Tenant {id} not found")))
}

/// Soft delete. Rejected while the tenant still has an active contract.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let active: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM contract WHERE tenant_id = ? AND status = 'active'")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if active > 0 {
        return Err(RepoError::Conflict(format!(
            "Tenant {id} still has an active contract"
        )));
    }

    let now = shared::util::now_millis();
    let rows =
        sqlx::query("UPDATE tenant SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(rows.rows_affected() > 0)
}
