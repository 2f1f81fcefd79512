//! Live bill breakdown
//!
//! Usage and amounts recomputed from readings × rates. The billing batch
//! uses this to fill the cached bill columns; the detail endpoint uses it
//! as the source of truth for display/printing.

use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::repository::{
    RepoError, RepoResult, bill, billing_cycle, contract, meter_reading, room, tenant, utility,
};
use shared::models::{BillDetail, BillingCycle, UtilityKind, UtilityLine, UtilityType};

use super::money;

/// Whole-room usage/amount for one utility in one cycle
#[derive(Debug, Clone)]
pub struct UtilityBreakdown {
    pub utility: UtilityKind,
    pub meter_start: Option<f64>,
    pub meter_end: Option<f64>,
    pub usage: Decimal,
    pub is_rollover: bool,
    pub rate_per_unit: f64,
    pub room_amount: Decimal,
}

/// Compute the whole-room breakdown for (room, cycle, utility).
///
/// A room with no reconciled reading contributes zero usage and amount -
/// missing readings are not an error at billing time.
pub async fn room_utility_breakdown(
    conn: &mut SqliteConnection,
    room_id: i64,
    cycle: &BillingCycle,
    utility_type: &UtilityType,
) -> RepoResult<UtilityBreakdown> {
    let reading =
        meter_reading::find_by_key(&mut *conn, room_id, cycle.id, utility_type.id).await?;

    let rate = match utility::effective_rate(&mut *conn, utility_type.id, &cycle.end_date).await? {
        Some(r) => r.rate_per_unit,
        None => {
            if reading.is_some() {
                tracing::warn!(
                    utility = %utility_type.code,
                    as_of = %cycle.end_date,
                    "No utility rate effective for date, amount defaults to zero"
                );
            }
            0.0
        }
    };

    match reading {
        Some(row) => {
            let usage = money::meter_usage(utility_type.code, row.meter_start, row.meter_end)?;
            let amount = money::usage_amount(usage.usage, rate);
            Ok(UtilityBreakdown {
                utility: utility_type.code,
                meter_start: Some(row.meter_start),
                meter_end: Some(row.meter_end),
                usage: usage.usage,
                is_rollover: usage.is_rollover,
                rate_per_unit: rate,
                room_amount: amount,
            })
        }
        None => Ok(UtilityBreakdown {
            utility: utility_type.code,
            meter_start: None,
            meter_end: None,
            usage: Decimal::ZERO,
            is_rollover: false,
            rate_per_unit: rate,
            room_amount: Decimal::ZERO,
        }),
    }
}

fn utility_line(breakdown: &UtilityBreakdown, tenant_count: i64) -> UtilityLine {
    UtilityLine {
        utility: breakdown.utility,
        meter_start: breakdown.meter_start,
        meter_end: breakdown.meter_end,
        usage: money::to_f64(breakdown.usage),
        is_rollover: breakdown.is_rollover,
        rate_per_unit: breakdown.rate_per_unit,
        room_amount: money::to_f64(breakdown.room_amount),
        tenant_amount: money::to_f64(money::split_equal(breakdown.room_amount, tenant_count)),
    }
}

/// Full breakdown for one bill, recomputed live
pub async fn bill_detail(pool: &SqlitePool, bill_id: i64) -> RepoResult<Option<BillDetail>> {
    let Some(bill_row) = bill::find_by_id(pool, bill_id).await? else {
        return Ok(None);
    };

    let cycle = billing_cycle::find_by_id(pool, bill_row.cycle_id)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Cycle {} missing", bill_row.cycle_id)))?;
    let tenant_row = tenant::find_by_id(pool, bill_row.tenant_id)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Tenant {} missing", bill_row.tenant_id)))?;
    let room_row = room::find_by_id(pool, bill_row.room_id)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Room {} missing", bill_row.room_id)))?;

    let mut conn = pool.acquire().await?;
    let electric = utility::find_type_by_code(&mut conn, UtilityKind::Electric)
        .await?
        .ok_or_else(|| RepoError::Database("Utility reference data missing: electric".into()))?;
    let water = utility::find_type_by_code(&mut conn, UtilityKind::Water)
        .await?
        .ok_or_else(|| RepoError::Database("Utility reference data missing: water".into()))?;

    let tenant_count = contract::count_active_in_room(&mut conn, bill_row.room_id)
        .await?
        .max(1);

    let electric_breakdown =
        room_utility_breakdown(&mut conn, bill_row.room_id, &cycle, &electric).await?;
    let water_breakdown =
        room_utility_breakdown(&mut conn, bill_row.room_id, &cycle, &water).await?;

    let lines = vec![
        utility_line(&electric_breakdown, tenant_count),
        utility_line(&water_breakdown, tenant_count),
    ];
    let subtotal: Decimal = lines.iter().map(|l| money::to_decimal(l.tenant_amount)).sum();
    let total = subtotal + money::to_decimal(bill_row.maintenance_fee);

    let maintenance_fee = bill_row.maintenance_fee;
    Ok(Some(BillDetail {
        tenant_name: tenant_row.display_name,
        room_number: room_row.room_number,
        cycle_year: cycle.year,
        cycle_month: cycle.month,
        due_date: cycle.due_date,
        tenant_count,
        utilities: lines,
        maintenance_fee,
        subtotal_amount: money::to_f64(subtotal),
        total_amount: money::to_f64(total),
        bill: bill_row,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::engine;
    use crate::billing::fixtures::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn detail_recomputes_from_readings_and_rates() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;
        let alice = seed_tenant(&pool, "alice").await;
        let bob = seed_tenant(&pool, "bob").await;
        seed_contract(&pool, alice.id, room.id).await;
        seed_contract(&pool, bob.id, room.id).await;

        seed_rate(&pool, UtilityKind::Electric, 8.0, "2024-01-01").await;
        seed_rate(&pool, UtilityKind::Water, 18.0, "2024-01-01").await;
        seed_reading(&pool, room.id, 2567, 3, UtilityKind::Electric, 400.0).await;
        seed_reading(&pool, room.id, 2567, 4, UtilityKind::Electric, 500.0).await;
        seed_reading(&pool, room.id, 2567, 3, UtilityKind::Water, 50.0).await;
        seed_reading(&pool, room.id, 2567, 4, UtilityKind::Water, 60.0).await;

        let summary = engine::run_billing_for_cycle(&pool, 2567, 4, None).await.unwrap();
        let bills = bill::find_filtered(&pool, Some(summary.cycle_id), None, 10, 0)
            .await
            .unwrap();

        let detail = bill_detail(&pool, bills[0].id).await.unwrap().unwrap();
        assert_eq!(detail.tenant_count, 2);
        assert_eq!(detail.cycle_year, 2567);
        assert_eq!(detail.cycle_month, 4);

        let electric = detail
            .utilities
            .iter()
            .find(|l| l.utility == UtilityKind::Electric)
            .unwrap();
        assert_eq!(electric.meter_start, Some(400.0));
        assert_eq!(electric.meter_end, Some(500.0));
        assert_eq!(electric.usage, 100.0);
        assert_eq!(electric.room_amount, 800.0);
        assert_eq!(electric.tenant_amount, 400.0);

        let water = detail
            .utilities
            .iter()
            .find(|l| l.utility == UtilityKind::Water)
            .unwrap();
        assert_eq!(water.usage, 10.0);
        assert_eq!(water.room_amount, 180.0);
        assert_eq!(water.tenant_amount, 90.0);

        // 400 + 90 per tenant, fee on top in full
        assert_eq!(detail.subtotal_amount, 490.0);
        assert_eq!(detail.maintenance_fee, 1000.0);
        assert_eq!(detail.total_amount, 1490.0);

        assert!(bill_detail(&pool, 9999).await.unwrap().is_none());
    }
}
