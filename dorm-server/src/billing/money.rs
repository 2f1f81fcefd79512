//! Money and meter arithmetic using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization.

use rust_decimal::prelude::*;

use crate::db::repository::{RepoError, RepoResult};
use shared::models::UtilityKind;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Electric meters are 4-digit rolling counters: they wrap past 9999 back
/// to 0 within a billing period. Water meters do not roll over.
pub const ELECTRIC_METER_MODULUS: i64 = 10_000;

/// Convert f64 to Decimal for calculation
///
/// Input values should be pre-validated at the boundary. If NaN/Infinity
/// somehow reaches here, logs an error and returns ZERO to avoid silent
/// corruption in monetary calculations.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Round to monetary precision without leaving Decimal
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Usage derived from a (start, end) meter pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterUsage {
    pub usage: Decimal,
    pub is_rollover: bool,
}

/// Compute usage for one utility from start/end readings.
///
/// Electric: `end - start`, or `(modulus - start) + end` when the counter
/// wrapped. Water: `end` must not be below `start` (validation error), no
/// rollover branch.
pub fn meter_usage(kind: UtilityKind, meter_start: f64, meter_end: f64) -> RepoResult<MeterUsage> {
    let start = to_decimal(meter_start);
    let end = to_decimal(meter_end);

    match kind {
        UtilityKind::Electric => {
            if end >= start {
                Ok(MeterUsage {
                    usage: end - start,
                    is_rollover: false,
                })
            } else {
                let modulus = Decimal::from(ELECTRIC_METER_MODULUS);
                Ok(MeterUsage {
                    usage: ((modulus - start) + end).max(Decimal::ZERO),
                    is_rollover: true,
                })
            }
        }
        UtilityKind::Water => {
            if end < start {
                Err(RepoError::Validation(format!(
                    "End reading {meter_end} is below start reading {meter_start}"
                )))
            } else {
                Ok(MeterUsage {
                    usage: end - start,
                    is_rollover: false,
                })
            }
        }
    }
}

/// usage × rate, at monetary precision
pub fn usage_amount(usage: Decimal, rate_per_unit: f64) -> Decimal {
    round_money(usage * to_decimal(rate_per_unit))
}

/// Equal split of a whole-room amount among co-occupants.
///
/// The divisor is clamped to at least 1 so an unoccupied room never divides
/// by zero. The maintenance fee is NOT split - it is charged in full per
/// tenant and never passes through here.
pub fn split_equal(room_amount: Decimal, tenant_count: i64) -> Decimal {
    let count = Decimal::from(tenant_count.max(1));
    round_money(room_amount / count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn electric_usage_without_rollover() {
        let u = meter_usage(UtilityKind::Electric, 100.0, 500.0).unwrap();
        assert_eq!(u.usage, Decimal::from(400));
        assert!(!u.is_rollover);
    }

    #[test]
    fn electric_usage_with_rollover() {
        // 9823 → 173 wraps the 4-digit counter: (10000 - 9823) + 173 = 350
        let u = meter_usage(UtilityKind::Electric, 9823.0, 173.0).unwrap();
        assert_eq!(u.usage, Decimal::from(350));
        assert!(u.is_rollover);
    }

    #[test]
    fn water_decrease_is_validation_error() {
        let err = meter_usage(UtilityKind::Water, 500.0, 400.0).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn water_equal_readings_mean_zero_usage() {
        let u = meter_usage(UtilityKind::Water, 400.0, 400.0).unwrap();
        assert_eq!(u.usage, Decimal::ZERO);
        assert!(!u.is_rollover);
    }

    #[test]
    fn usage_amount_multiplies_and_rounds() {
        let amount = usage_amount(Decimal::from(100), 8.0);
        assert_eq!(to_f64(amount), 800.0);

        // 7 units at 3.555 → 24.885 → 24.89 (half-up)
        let amount = usage_amount(Decimal::from(7), 3.555);
        assert_eq!(to_f64(amount), 24.89);
    }

    #[test]
    fn split_equal_divides_among_tenants() {
        let share = split_equal(Decimal::from(800), 2);
        assert_eq!(to_f64(share), 400.0);

        // Uneven split rounds to cents
        let share = split_equal(Decimal::from(100), 3);
        assert_eq!(to_f64(share), 33.33);
    }

    #[test]
    fn split_equal_clamps_zero_tenants() {
        let share = split_equal(Decimal::from(800), 0);
        assert_eq!(to_f64(share), 800.0);
    }

    #[test]
    fn decimal_round_trip_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum), 0.3);
    }
}
