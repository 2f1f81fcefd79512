//! Meter Reading Reconciler
//!
//! Turns an uploaded meter value into a reconciled reading row for
//! (room, cycle, utility). The start reading is carried forward from the
//! most recent earlier period; a first-ever reading bootstraps with
//! start = end (zero usage). Readings whose period is already billed are
//! frozen and reject any change.

use sqlx::SqliteConnection;

use crate::db::repository::{RepoError, RepoResult, meter_photo, meter_reading, utility};
use crate::utils::time::today_iso;
use shared::models::{BillingCycle, ReadingOutcome, UtilityKind, UtilityType};

use super::money;

fn validate_meter_value(kind: UtilityKind, value: f64) -> RepoResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(RepoError::Validation(format!(
            "Meter value must be a non-negative number, got {value}"
        )));
    }
    // A 4-digit rolling counter can never display its modulus
    if kind == UtilityKind::Electric && value >= money::ELECTRIC_METER_MODULUS as f64 {
        return Err(RepoError::Validation(format!(
            "Electric meter value must be below {}, got {value}",
            money::ELECTRIC_METER_MODULUS
        )));
    }
    Ok(())
}

/// Record or update the reading for (room, cycle, utility).
///
/// Existing row: only `meter_end` moves; the reconciled `meter_start` is
/// kept. Missing row: `meter_start` comes from the newest strictly-earlier
/// period's `meter_end` for the same room+utility, or from the value itself
/// when no history exists.
///
/// Errors: state-conflict when the period is already billed (frozen),
/// validation when the value is malformed or a water meter runs backwards.
pub async fn record_reading(
    conn: &mut SqliteConnection,
    room_id: i64,
    cycle: &BillingCycle,
    utility: &UtilityType,
    meter_value: f64,
) -> RepoResult<ReadingOutcome> {
    validate_meter_value(utility.code, meter_value)?;

    if meter_photo::has_billed_photo(&mut *conn, room_id, cycle.year, cycle.month).await? {
        return Err(RepoError::Conflict(format!(
            "Readings for room {room_id} in {}/{} are linked to an issued bill and cannot be changed",
            cycle.year, cycle.month
        )));
    }

    let existing =
        meter_reading::find_by_key(&mut *conn, room_id, cycle.id, utility.id).await?;

    let (reading, usage) = match existing {
        Some(row) => {
            let usage = money::meter_usage(utility.code, row.meter_start, meter_value)?;
            let updated = meter_reading::update_end(&mut *conn, row.id, meter_value).await?;
            (updated, usage)
        }
        None => {
            let meter_start = meter_reading::prior_meter_end(
                &mut *conn,
                room_id,
                utility.id,
                cycle.year,
                cycle.month,
            )
            .await?
            // First-ever reading: start = end, zero usage
            .unwrap_or(meter_value);
            let usage = money::meter_usage(utility.code, meter_start, meter_value)?;
            let inserted = meter_reading::insert(
                &mut *conn,
                room_id,
                cycle.id,
                utility.id,
                meter_start,
                meter_value,
            )
            .await?;
            (inserted, usage)
        }
    };

    let amount = reading_amount(&mut *conn, cycle, utility, usage.usage).await?;

    Ok(ReadingOutcome {
        reading,
        usage: money::to_f64(usage.usage),
        amount: money::to_f64(amount),
        is_rollover: usage.is_rollover,
    })
}

/// usage × the rate effective at the cycle's end date. A missing rate row
/// contributes zero (rates are operator data, unlike the utility types).
async fn reading_amount(
    conn: &mut SqliteConnection,
    cycle: &BillingCycle,
    utility: &UtilityType,
    usage: rust_decimal::Decimal,
) -> RepoResult<rust_decimal::Decimal> {
    let as_of = if cycle.end_date.is_empty() {
        today_iso()
    } else {
        cycle.end_date.clone()
    };
    match utility::effective_rate(&mut *conn, utility.id, &as_of).await? {
        Some(rate) => Ok(money::usage_amount(usage, rate.rate_per_unit)),
        None => {
            tracing::warn!(
                utility = %utility.code,
                as_of = %as_of,
                "No utility rate effective for date, amount defaults to zero"
            );
            Ok(rust_decimal::Decimal::ZERO)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::fixtures::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn first_reading_bootstraps_with_zero_usage() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;
        seed_rate(&pool, UtilityKind::Electric, 8.0, "2024-01-01").await;

        let outcome = seed_reading(&pool, room.id, 2567, 4, UtilityKind::Electric, 1500.0).await;
        assert_eq!(outcome.reading.meter_start, 1500.0);
        assert_eq!(outcome.reading.meter_end, 1500.0);
        assert_eq!(outcome.usage, 0.0);
        assert_eq!(outcome.amount, 0.0);
        assert!(!outcome.is_rollover);
    }

    #[tokio::test]
    async fn start_carries_forward_from_prior_period() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;
        seed_rate(&pool, UtilityKind::Electric, 8.0, "2024-01-01").await;

        seed_reading(&pool, room.id, 2567, 3, UtilityKind::Electric, 1200.0).await;
        let outcome = seed_reading(&pool, room.id, 2567, 4, UtilityKind::Electric, 1500.0).await;

        assert_eq!(outcome.reading.meter_start, 1200.0);
        assert_eq!(outcome.reading.meter_end, 1500.0);
        assert_eq!(outcome.usage, 300.0);
        assert_eq!(outcome.amount, 2400.0);
    }

    #[tokio::test]
    async fn carry_forward_skips_to_most_recent_period() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;

        // Gap month: April carries from February, and December-to-January
        // ordering crosses the year boundary correctly
        seed_reading(&pool, room.id, 2566, 12, UtilityKind::Water, 80.0).await;
        seed_reading(&pool, room.id, 2567, 2, UtilityKind::Water, 95.0).await;
        let outcome = seed_reading(&pool, room.id, 2567, 4, UtilityKind::Water, 110.0).await;

        assert_eq!(outcome.reading.meter_start, 95.0);
        assert_eq!(outcome.usage, 15.0);
    }

    #[tokio::test]
    async fn rollover_usage_flagged_and_computed() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;
        seed_rate(&pool, UtilityKind::Electric, 8.0, "2024-01-01").await;

        seed_reading(&pool, room.id, 2567, 3, UtilityKind::Electric, 9823.0).await;
        let outcome = seed_reading(&pool, room.id, 2567, 4, UtilityKind::Electric, 173.0).await;

        assert!(outcome.is_rollover);
        assert_eq!(outcome.usage, 350.0);
        assert_eq!(outcome.amount, 2800.0);
    }

    #[tokio::test]
    async fn water_meter_running_backwards_is_rejected() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;

        seed_reading(&pool, room.id, 2567, 3, UtilityKind::Water, 500.0).await;

        let cycle = seed_cycle(&pool, 2567, 4).await;
        let water = utility_type(&pool, UtilityKind::Water).await;
        let mut conn = pool.acquire().await.unwrap();
        let err = record_reading(&mut conn, room.id, &cycle, &water, 400.0)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        // Nothing was stored for the new period
        let reading =
            meter_reading::find_by_key(&mut conn, room.id, cycle.id, water.id).await.unwrap();
        assert!(reading.is_none());
    }

    #[tokio::test]
    async fn repeat_upload_updates_end_only() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;

        seed_reading(&pool, room.id, 2567, 3, UtilityKind::Water, 100.0).await;
        seed_reading(&pool, room.id, 2567, 4, UtilityKind::Water, 120.0).await;
        let outcome = seed_reading(&pool, room.id, 2567, 4, UtilityKind::Water, 130.0).await;

        // Start stays at the carried-forward value across re-uploads
        assert_eq!(outcome.reading.meter_start, 100.0);
        assert_eq!(outcome.reading.meter_end, 130.0);
        assert_eq!(outcome.usage, 30.0);
    }

    #[tokio::test]
    async fn electric_value_out_of_counter_range_is_rejected() {
        let pool = test_pool().await;
        let room = seed_room(&pool, "101", 2).await;
        let cycle = seed_cycle(&pool, 2567, 4).await;
        let electric = utility_type(&pool, UtilityKind::Electric).await;

        let mut conn = pool.acquire().await.unwrap();
        let err = record_reading(&mut conn, room.id, &cycle, &electric, 10000.0)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }
}
