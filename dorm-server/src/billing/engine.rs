//! Bill Computation Engine
//!
//! The monthly batch. One transaction covers cycle resolution, bill
//! insertion, and photo linking; any failure rolls the whole run back so a
//! partial batch never leaves orphaned bills or half-linked photos.
//!
//! Idempotence: the unique index on (tenant_id, cycle_id) plus the
//! conflict-guarded insert make re-runs no-ops for tenants already billed,
//! while newly-active tenants are picked up.

use sqlx::SqlitePool;

use crate::db::repository::{
    RepoError, RepoResult, bill, billing_cycle, contract, meter_photo, utility,
};
use shared::models::{BillingCycleResolve, BillingRunSummary, UtilityKind};

use super::{breakdown, money};

/// Flat per-tenant fee, charged in full (never split among co-occupants)
pub const DEFAULT_MAINTENANCE_FEE: f64 = 1000.0;

/// Run the billing batch for (year, month), creating the cycle if needed.
///
/// Returns the cycle id and the number of bills created this run. Missing
/// utility reference data aborts before any write; rooms without readings
/// bill zero for that utility.
pub async fn run_billing_for_cycle(
    pool: &SqlitePool,
    year: i32,
    month: i32,
    maintenance_fee: Option<f64>,
) -> RepoResult<BillingRunSummary> {
    let fee = maintenance_fee.unwrap_or(DEFAULT_MAINTENANCE_FEE);
    if !fee.is_finite() || fee < 0.0 {
        return Err(RepoError::Validation(format!(
            "Maintenance fee must be a non-negative number, got {fee}"
        )));
    }

    let mut tx = pool.begin().await?;

    // Preflight: reference data must exist before anything is written
    let electric = utility::find_type_by_code(&mut tx, UtilityKind::Electric)
        .await?
        .ok_or_else(|| RepoError::Database("Utility reference data missing: electric".into()))?;
    let water = utility::find_type_by_code(&mut tx, UtilityKind::Water)
        .await?
        .ok_or_else(|| RepoError::Database("Utility reference data missing: water".into()))?;

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

    let contracts = contract::find_active(&mut tx).await?;
    let mut bills_created: i64 = 0;

    for c in &contracts {
        if bill::exists_for(&mut tx, c.tenant_id, cycle.id).await? {
            continue;
        }

        let electric_breakdown =
            breakdown::room_utility_breakdown(&mut tx, c.room_id, &cycle, &electric).await?;
        let water_breakdown =
            breakdown::room_utility_breakdown(&mut tx, c.room_id, &cycle, &water).await?;

        let tenant_count = contract::count_active_in_room(&mut tx, c.room_id).await?.max(1);
        let electric_share = money::split_equal(electric_breakdown.room_amount, tenant_count);
        let water_share = money::split_equal(water_breakdown.room_amount, tenant_count);
        let subtotal = electric_share + water_share;
        let total = subtotal + money::to_decimal(fee);

        // Conflict-guarded: a concurrent batch that won the race makes this
        // a no-op and the run stays correct
        let Some(bill_id) = bill::insert_draft(
            &mut tx,
            c.tenant_id,
            c.room_id,
            c.id,
            cycle.id,
            fee,
            money::to_f64(electric_share),
            money::to_f64(water_share),
            money::to_f64(subtotal),
            money::to_f64(total),
        )
        .await?
        else {
            continue;
        };

        let linked =
            meter_photo::link_to_bill(&mut tx, bill_id, c.room_id, cycle.year, cycle.month).await?;
        tracing::debug!(
            bill_id,
            tenant_id = c.tenant_id,
            room_id = c.room_id,
            photos_linked = linked,
            "Issued draft bill"
        );
        bills_created += 1;
    }

    tx.commit().await?;

    tracing::info!(
        cycle_id = cycle.id,
        year,
        month,
        bills_created,
        "Billing batch finished"
    );
    Ok(BillingRunSummary {
        cycle_id: cycle.id,
        bills_created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::fixtures::*;
    use crate::db::test_pool;
    use shared::models::BillStatus;

    #[tokio::test]
    async fn rerun_creates_no_duplicate_bills() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;
        let tenant = seed_tenant(&pool, "alice").await;
        seed_contract(&pool, tenant.id, room.id).await;

        let first = run_billing_for_cycle(&pool, 2567, 4, None).await.unwrap();
        assert_eq!(first.bills_created, 1);

        let second = run_billing_for_cycle(&pool, 2567, 4, None).await.unwrap();
        assert_eq!(second.cycle_id, first.cycle_id);
        assert_eq!(second.bills_created, 0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bill")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn rerun_picks_up_newly_active_tenant() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;
        let alice = seed_tenant(&pool, "alice").await;
        seed_contract(&pool, alice.id, room.id).await;

        run_billing_for_cycle(&pool, 2567, 4, None).await.unwrap();

        let bob = seed_tenant(&pool, "bob").await;
        seed_contract(&pool, bob.id, room.id).await;

        let rerun = run_billing_for_cycle(&pool, 2567, 4, None).await.unwrap();
        assert_eq!(rerun.bills_created, 1);
    }

    #[tokio::test]
    async fn utility_amounts_split_equally_fee_charged_in_full() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;
        let alice = seed_tenant(&pool, "alice").await;
        let bob = seed_tenant(&pool, "bob").await;
        seed_contract(&pool, alice.id, room.id).await;
        seed_contract(&pool, bob.id, room.id).await;

        seed_rate(&pool, shared::models::UtilityKind::Electric, 8.0, "2024-01-01").await;
        // Room uses 100 electric units: 400 → 500
        seed_reading(&pool, room.id, 2567, 3, shared::models::UtilityKind::Electric, 400.0).await;
        seed_reading(&pool, room.id, 2567, 4, shared::models::UtilityKind::Electric, 500.0).await;

        let summary = run_billing_for_cycle(&pool, 2567, 4, None).await.unwrap();
        assert_eq!(summary.bills_created, 2);

        let bills = crate::db::repository::bill::find_filtered(
            &pool,
            Some(summary.cycle_id),
            None,
            50,
            0,
        )
        .await
        .unwrap();
        assert_eq!(bills.len(), 2);
        for bill in &bills {
            // 100 units × 8 = 800 for the room, 400 each
            assert_eq!(bill.electric_amount, 400.0);
            assert_eq!(bill.water_amount, 0.0);
            // The flat fee is not divided
            assert_eq!(bill.maintenance_fee, 1000.0);
            assert_eq!(bill.subtotal_amount, 400.0);
            assert_eq!(bill.total_amount, 1400.0);
            assert_eq!(bill.status, BillStatus::Draft);
        }
    }

    #[tokio::test]
    async fn room_without_readings_bills_fee_only() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;
        let tenant = seed_tenant(&pool, "alice").await;
        seed_contract(&pool, tenant.id, room.id).await;

        let summary = run_billing_for_cycle(&pool, 2567, 4, Some(1200.0)).await.unwrap();
        let bills = crate::db::repository::bill::find_filtered(
            &pool,
            Some(summary.cycle_id),
            None,
            50,
            0,
        )
        .await
        .unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].electric_amount, 0.0);
        assert_eq!(bills[0].water_amount, 0.0);
        assert_eq!(bills[0].total_amount, 1200.0);
    }

    #[tokio::test]
    async fn rollover_usage_flows_into_the_bill() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 1).await;
        let tenant = seed_tenant(&pool, "alice").await;
        seed_contract(&pool, tenant.id, room.id).await;

        seed_rate(&pool, shared::models::UtilityKind::Electric, 8.0, "2024-01-01").await;
        seed_reading(&pool, room.id, 2567, 3, shared::models::UtilityKind::Electric, 9823.0).await;
        seed_reading(&pool, room.id, 2567, 4, shared::models::UtilityKind::Electric, 173.0).await;

        let summary = run_billing_for_cycle(&pool, 2567, 4, None).await.unwrap();
        let bills = crate::db::repository::bill::find_filtered(
            &pool,
            Some(summary.cycle_id),
            None,
            50,
            0,
        )
        .await
        .unwrap();
        // (10000 - 9823) + 173 = 350 units × 8 = 2800
        assert_eq!(bills[0].electric_amount, 2800.0);
    }

    #[tokio::test]
    async fn batch_links_photos_and_freezes_readings() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 1).await;
        let tenant = seed_tenant(&pool, "alice").await;
        seed_contract(&pool, tenant.id, room.id).await;

        let cycle = seed_cycle(&pool, 2567, 4).await;
        let electric = utility_type(&pool, shared::models::UtilityKind::Electric).await;

        let mut conn = pool.acquire().await.unwrap();
        crate::billing::reconciler::record_reading(&mut conn, room.id, &cycle, &electric, 500.0)
            .await
            .unwrap();
        let photo = crate::db::repository::meter_photo::insert(
            &mut conn,
            room.id,
            electric.id,
            500.0,
            "photos/2567-04-101-electric.jpg",
            "2024-04-28",
            2567,
            4,
        )
        .await
        .unwrap();
        assert!(photo.bill_id.is_none());
        drop(conn);

        run_billing_for_cycle(&pool, 2567, 4, None).await.unwrap();

        let photo = crate::db::repository::meter_photo::find_by_id(&pool, photo.id)
            .await
            .unwrap()
            .unwrap();
        assert!(photo.bill_id.is_some());

        // The reading behind the linked photo is now frozen
        let mut conn = pool.acquire().await.unwrap();
        let err = crate::billing::reconciler::record_reading(
            &mut conn, room.id, &cycle, &electric, 600.0,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));

        // And the stored reading is unchanged
        let reading = crate::db::repository::meter_reading::find_by_key(
            &mut conn, room.id, cycle.id, electric.id,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(reading.meter_end, 500.0);
    }

    #[tokio::test]
    async fn negative_fee_is_rejected_before_any_write() {
        let pool = test_pool().await;
        let err = run_billing_for_cycle(&pool, 2567, 4, Some(-5.0)).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        let cycles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM billing_cycle")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(cycles, 0);
    }
}
