//! Contract Repository
//!
//! Occupancy rules are application-enforced here: at most one active
//! contract per tenant, and a room never holds more active contracts than
//! its capacity. Both violations are state-conflicts, not bad input.

use super::{RepoError, RepoResult};
use shared::models::{Contract, ContractCreate, ContractStatus, ContractWithNames};
use sqlx::{SqliteConnection, SqlitePool};

const CONTRACT_SELECT: &str =
    "SELECT id, tenant_id, room_id, start_date, end_date, status, created_at, updated_at FROM contract";

const CONTRACT_WITH_NAMES_SELECT: &str = "SELECT c.id, c.tenant_id, t.display_name AS tenant_name, c.room_id, r.room_number, c.start_date, c.end_date, c.status, c.created_at, c.updated_at FROM contract c JOIN tenant t ON t.id = c.tenant_id JOIN room r ON r.id = c.room_id";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<ContractWithNames>> {
    let sql = format!("{} WHERE c.id = ?", CONTRACT_WITH_NAMES_SELECT);
    let row = sqlx::query_as::<_, ContractWithNames>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_all(
    pool: &SqlitePool,
    status: Option<ContractStatus>,
) -> RepoResult<Vec<ContractWithNames>> {
    let sql = format!(
        "{} WHERE (?1 IS NULL OR c.status = ?1) ORDER BY c.created_at DESC",
        CONTRACT_WITH_NAMES_SELECT
    );
    let rows = sqlx::query_as::<_, ContractWithNames>(&sql)
        .bind(status)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_tenant(pool: &SqlitePool, tenant_id: i64) -> RepoResult<Vec<Contract>> {
    let sql = format!(
        "{} WHERE tenant_id = ? ORDER BY start_date DESC",
        CONTRACT_SELECT
    );
    let rows = sqlx::query_as::<_, Contract>(&sql)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// All contracts currently active (the billing batch's work list)
pub async fn find_active(conn: &mut SqliteConnection) -> RepoResult<Vec<Contract>> {
    let sql = format!(
        "{} WHERE status = 'active' ORDER BY room_id, tenant_id",
        CONTRACT_SELECT
    );
    let rows = sqlx::query_as::<_, Contract>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Count of active contracts in a room (the equal-split divisor)
pub async fn count_active_in_room(conn: &mut SqliteConnection, room_id: i64) -> RepoResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM contract WHERE room_id = ? AND status = 'active'")
            .bind(room_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count)
}

pub async fn create(pool: &SqlitePool, data: ContractCreate) -> RepoResult<ContractWithNames> {
    chrono::NaiveDate::parse_from_str(&data.start_date, "%Y-%m-%d")
        .map_err(|_| RepoError::Validation(format!("Invalid date format: {}", data.start_date)))?;
    let status = data.status.unwrap_or(ContractStatus::Active);

    let mut tx = pool.begin().await?;

    let tenant_active: Option<i64> =
        sqlx::query_scalar("SELECT is_active FROM tenant WHERE id = ?")
            .bind(data.tenant_id)
            .fetch_optional(&mut *tx)
            .await?;
    match tenant_active {
        None => {
            return Err(RepoError::NotFound(format!(
                "Tenant {} not found",
                data.tenant_id
            )));
        }
        Some(0) => {
            return Err(RepoError::Validation(format!(
                "Tenant {} is inactive",
                data.tenant_id
            )));
        }
        Some(_) => {}
    }

    let room: Option<(i64, i64)> =
        sqlx::query_as("SELECT capacity, is_active FROM room WHERE id = ?")
            .bind(data.room_id)
            .fetch_optional(&mut *tx)
            .await?;
    let (capacity, room_active) = room.ok_or_else(|| {
        RepoError::NotFound(format!("Room {} not found", data.room_id))
    })?;
    if room_active == 0 {
        return Err(RepoError::Validation(format!(
            "Room {} is inactive",
            data.room_id
        )));
    }

    if status == ContractStatus::Active {
        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contract WHERE tenant_id = ? AND status = 'active'",
        )
        .bind(data.tenant_id)
        .fetch_one(&mut *tx)
        .await?;
        if existing > 0 {
            return Err(RepoError::Conflict(format!(
                "Tenant {} already has an active contract",
                data.tenant_id
            )));
        }

        let occupancy: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contract WHERE room_id = ? AND status = 'active'",
        )
        .bind(data.room_id)
        .fetch_one(&mut *tx)
        .await?;
        if occupancy >= capacity {
            return Err(RepoError::Conflict(format!(
                "Room {} is at capacity ({capacity})",
                data.room_id
            )));
        }
    }

    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO contract (tenant_id, room_id, start_date, end_date, status, created_at, updated_at) VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?5) RETURNING id",
    )
    .bind(data.tenant_id)
    .bind(data.room_id)
    .bind(&data.start_date)
    .bind(status)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create contract".into()))
}

/// End an active contract: sets end_date and status = ended.
pub async fn end(pool: &SqlitePool, id: i64, end_date: &str) -> RepoResult<ContractWithNames> {
    chrono::NaiveDate::parse_from_str(end_date, "%Y-%m-%d")
        .map_err(|_| RepoError::Validation(format!("Invalid date format: {}", end_date)))?;

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE contract SET status = 'ended', end_date = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'active'",
    )
    .bind(end_date)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return match find_by_id(pool, id).await? {
            Some(_) => Err(RepoError::Conflict(format!("Contract {id} is not active"))),
            None => Err(RepoError::NotFound(format!("Contract {id} not found"))),
        };
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Contract {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use shared::models::{RoomCreate, TenantCreate};

    async fn seed_tenant(pool: &SqlitePool, username: &str) -> i64 {
        crate::db::repository::tenant::create(
            pool,
            TenantCreate {
                username: username.into(),
                display_name: username.to_uppercase(),
                phone: None,
                email: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_room(pool: &SqlitePool, number: &str, capacity: i32) -> i64 {
        crate::db::repository::room::create(
            pool,
            RoomCreate {
                room_number: number.into(),
                floor: 1,
                capacity: Some(capacity),
                monthly_rent: 3000.0,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn contract(tenant_id: i64, room_id: i64) -> ContractCreate {
        ContractCreate {
            tenant_id,
            room_id,
            start_date: "2024-01-01".into(),
            status: None,
        }
    }

    #[tokio::test]
    async fn second_active_contract_for_tenant_is_conflict() {
        let pool = test_pool().await;
        let tenant = seed_tenant(&pool, "alice").await;
        let room_a = seed_room(&pool, "101", 2).await;
        let room_b = seed_room(&pool, "102", 2).await;

        create(&pool, contract(tenant, room_a)).await.unwrap();
        let err = create(&pool, contract(tenant, room_b)).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }

    #[tokio::test]
    async fn room_at_capacity_is_conflict() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "201", 1).await;
        let first = seed_tenant(&pool, "bob").await;
        let second = seed_tenant(&pool, "carol").await;

        create(&pool, contract(first, room)).await.unwrap();
        let err = create(&pool, contract(second, room)).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }

    #[tokio::test]
    async fn ended_contract_frees_the_slot() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "301", 1).await;
        let first = seed_tenant(&pool, "dave").await;
        let second = seed_tenant(&pool, "erin").await;

        let c = create(&pool, contract(first, room)).await.unwrap();
        end(&pool, c.id, "2024-06-30").await.unwrap();
        // Room slot and tenant are both free again
        create(&pool, contract(second, room)).await.unwrap();
    }

    #[tokio::test]
    async fn ending_twice_is_conflict() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "401", 1).await;
        let tenant = seed_tenant(&pool, "frank").await;

        let c = create(&pool, contract(tenant, room)).await.unwrap();
        end(&pool, c.id, "2024-06-30").await.unwrap();
        let err = end(&pool, c.id, "2024-07-31").await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }
}
