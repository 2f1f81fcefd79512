//! Bill Repository
//!
//! One bill per (tenant, cycle) - the unique index owns the invariant; the
//! conflict-guarded insert makes concurrent batch runs safe. Bills are never
//! regenerated: re-running a batch only fills gaps.

use super::{RepoError, RepoResult};
use shared::models::{Bill, BillStatus};
use sqlx::{SqliteConnection, SqlitePool};

const BILL_SELECT: &str = "SELECT id, tenant_id, room_id, contract_id, cycle_id, maintenance_fee, electric_amount, water_amount, subtotal_amount, total_amount, status, created_at, updated_at FROM bill";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Bill>> {
    let sql = format!("{} WHERE id = ?", BILL_SELECT);
    let row = sqlx::query_as::<_, Bill>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// List bills, optionally narrowed to a cycle and/or tenant
pub async fn find_filtered(
    pool: &SqlitePool,
    cycle_id: Option<i64>,
    tenant_id: Option<i64>,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<Bill>> {
    let sql = format!(
        "{} WHERE (?1 IS NULL OR cycle_id = ?1) AND (?2 IS NULL OR tenant_id = ?2) ORDER BY created_at DESC LIMIT ?3 OFFSET ?4",
        BILL_SELECT
    );
    let rows = sqlx::query_as::<_, Bill>(&sql)
        .bind(cycle_id)
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn exists_for(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    cycle_id: i64,
) -> RepoResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM bill WHERE tenant_id = ? AND cycle_id = ?")
            .bind(tenant_id)
            .bind(cycle_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

/// Insert a draft bill with computed amounts. Returns `None` when a bill for
/// (tenant, cycle) already exists - the batch treats that as "skip", which
/// keeps concurrent runs from double-billing.
#[allow(clippy::too_many_arguments)]
pub async fn insert_draft(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    room_id: i64,
    contract_id: i64,
    cycle_id: i64,
    maintenance_fee: f64,
    electric_amount: f64,
    water_amount: f64,
    subtotal_amount: f64,
    total_amount: f64,
) -> RepoResult<Option<i64>> {
    let now = shared::util::now_millis();
    let id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO bill (tenant_id, room_id, contract_id, cycle_id, maintenance_fee, electric_amount, water_amount, subtotal_amount, total_amount, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'draft', ?10, ?10) ON CONFLICT(tenant_id, cycle_id) DO NOTHING RETURNING id",
    )
    .bind(tenant_id)
    .bind(room_id)
    .bind(contract_id)
    .bind(cycle_id)
    .bind(maintenance_fee)
    .bind(electric_amount)
    .bind(water_amount)
    .bind(subtotal_amount)
    .bind(total_amount)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id)
}

/// Apply a status transition (draft → sent → paid, forward only)
pub async fn update_status(pool: &SqlitePool, id: i64, next: BillStatus) -> RepoResult<Bill> {
    let current = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Bill {id} not found")))?;

    if !current.status.can_transition_to(next) {
        return Err(RepoError::Conflict(format!(
            "Bill {id} cannot move from {:?} to {:?}",
            current.status, next
        )));
    }

    let now = shared::util::now_millis();
    // Guard on the expected current status so a concurrent transition loses
    let rows = sqlx::query("UPDATE bill SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4")
        .bind(next)
        .bind(now)
        .bind(id)
        .bind(current.status)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::Conflict(format!(
            "Bill {id} was updated concurrently, re-read and retry"
        )));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Bill {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use shared::models::{ContractCreate, RoomCreate, TenantCreate};

    async fn seed_bill(pool: &SqlitePool) -> i64 {
        let tenant = crate::db::repository::tenant::create(
            pool,
            TenantCreate {
                username: "alice".into(),
                display_name: "Alice".into(),
                phone: None,
                email: None,
            },
        )
        .await
        .unwrap();
        let room = crate::db::repository::room::create(
            pool,
            RoomCreate {
                room_number: "101".into(),
                floor: 1,
                capacity: Some(2),
                monthly_rent: 3000.0,
            },
        )
        .await
        .unwrap();
        let contract = crate::db::repository::contract::create(
            pool,
            ContractCreate {
                tenant_id: tenant.id,
                room_id: room.id,
                start_date: "2024-01-01".into(),
                status: None,
            },
        )
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let cycle = crate::db::repository::billing_cycle::resolve_or_create(
            &mut conn,
            shared::models::BillingCycleResolve {
                year: 2567,
                month: 4,
                start_date: None,
                end_date: None,
                due_date: None,
            },
        )
        .await
        .unwrap();

        insert_draft(
            &mut conn, tenant.id, room.id, contract.id, cycle.id, 1000.0, 400.0, 90.0, 490.0,
            1490.0,
        )
        .await
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_insert_returns_none() {
        let pool = test_pool().await;
        let id = seed_bill(&pool).await;
        let bill = find_by_id(&pool, id).await.unwrap().unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let second = insert_draft(
            &mut conn,
            bill.tenant_id,
            bill.room_id,
            bill.contract_id,
            bill.cycle_id,
            1000.0,
            0.0,
            0.0,
            0.0,
            1000.0,
        )
        .await
        .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn status_moves_forward_only() {
        let pool = test_pool().await;
        let id = seed_bill(&pool).await;

        let bill = update_status(&pool, id, BillStatus::Sent).await.unwrap();
        assert_eq!(bill.status, BillStatus::Sent);
        let bill = update_status(&pool, id, BillStatus::Paid).await.unwrap();
        assert_eq!(bill.status, BillStatus::Paid);

        // paid is terminal, and skipping ahead is rejected too
        assert!(matches!(
            update_status(&pool, id, BillStatus::Sent).await,
            Err(RepoError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn draft_cannot_jump_to_paid() {
        let pool = test_pool().await;
        let id = seed_bill(&pool).await;
        assert!(matches!(
            update_status(&pool, id, BillStatus::Paid).await,
            Err(RepoError::Conflict(_))
        ));
    }
}
