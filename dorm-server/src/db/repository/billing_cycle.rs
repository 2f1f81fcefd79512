//! Billing Cycle Repository
//!
//! One row per (year, month) accounting period, created lazily on first
//! reference. Creation is race-safe: the unique index owns the invariant and
//! the loser of a concurrent insert re-reads the winner's row.

use super::{RepoError, RepoResult};
use chrono::NaiveDate;
use shared::models::{BillingCycle, BillingCycleResolve};
use sqlx::{SqliteConnection, SqlitePool};

const CYCLE_SELECT: &str = "SELECT id, year, month, start_date, end_date, due_date, status, created_at, updated_at FROM billing_cycle";

/// Payment due this many days after the period ends
const DUE_DAYS_AFTER_END: i64 = 15;

fn validate_date(date: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| RepoError::Validation(format!("Invalid date format: {}", date)))
}

fn validate_period(year: i32, month: i32) -> RepoResult<()> {
    if !(1..=12).contains(&month) {
        return Err(RepoError::Validation(format!(
            "Month must be between 1 and 12, got {month}"
        )));
    }
    // Buddhist calendar sanity window (2400 BE = 1857 CE)
    if !(2400..=2700).contains(&year) {
        return Err(RepoError::Validation(format!(
            "Year must be a Buddhist calendar year, got {year}"
        )));
    }
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<BillingCycle>> {
    let sql = format!("{} WHERE id = ?", CYCLE_SELECT);
    let row = sqlx::query_as::<_, BillingCycle>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_all(pool: &SqlitePool, limit: i32, offset: i32) -> RepoResult<Vec<BillingCycle>> {
    let sql = format!(
        "{} ORDER BY year DESC, month DESC LIMIT ? OFFSET ?",
        CYCLE_SELECT
    );
    let rows = sqlx::query_as::<_, BillingCycle>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_period(
    conn: &mut SqliteConnection,
    year: i32,
    month: i32,
) -> RepoResult<Option<BillingCycle>> {
    let sql = format!("{} WHERE year = ? AND month = ?", CYCLE_SELECT);
    let row = sqlx::query_as::<_, BillingCycle>(&sql)
        .bind(year)
        .bind(month)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Resolve the cycle for (year, month), creating it when absent.
///
/// Idempotent: an existing row is returned as-is and explicit date overrides
/// are ignored for it. Defaults when creating: start = first day of the
/// Gregorian month, end = last day, due = end + 15 days.
pub async fn resolve_or_create(
    conn: &mut SqliteConnection,
    data: BillingCycleResolve,
) -> RepoResult<BillingCycle> {
    validate_period(data.year, data.month)?;

    if let Some(existing) = find_by_period(&mut *conn, data.year, data.month).await? {
        return Ok(existing);
    }

    let gregorian_year = shared::util::to_gregorian_year(data.year);
    let (first, last) = crate::utils::time::month_bounds(gregorian_year, data.month as u32)
        .ok_or_else(|| {
            RepoError::Validation(format!(
                "Cannot compute period boundaries for {}/{}",
                data.year, data.month
            ))
        })?;

    let start_date = match &data.start_date {
        Some(s) => validate_date(s)?.to_string(),
        None => first.to_string(),
    };
    let end_date = match &data.end_date {
        Some(s) => validate_date(s)?.to_string(),
        None => last.to_string(),
    };
    let due_date = match &data.due_date {
        Some(s) => validate_date(s)?.to_string(),
        None => (last + chrono::Duration::days(DUE_DAYS_AFTER_END)).to_string(),
    };

    let now = shared::util::now_millis();
    // Unique index on (year, month): a concurrent creator wins silently and
    // the re-read below observes its row.
    sqlx::query(
        "INSERT INTO billing_cycle (year, month, start_date, end_date, due_date, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 'open', ?6, ?6) ON CONFLICT(year, month) DO NOTHING",
    )
    .bind(data.year)
    .bind(data.month)
    .bind(&start_date)
    .bind(&end_date)
    .bind(&due_date)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    find_by_period(&mut *conn, data.year, data.month)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to resolve billing cycle".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn resolve(year: i32, month: i32) -> BillingCycleResolve {
        BillingCycleResolve {
            year,
            month,
            start_date: None,
            end_date: None,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn resolve_twice_returns_same_cycle() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let first = resolve_or_create(&mut conn, resolve(2567, 4)).await.unwrap();
        let second = resolve_or_create(&mut conn, resolve(2567, 4)).await.unwrap();
        assert_eq!(first.id, second.id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM billing_cycle")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn default_boundaries_from_buddhist_year() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        // 2567 BE = 2024 CE, leap February
        let cycle = resolve_or_create(&mut conn, resolve(2567, 2)).await.unwrap();
        assert_eq!(cycle.start_date, "2024-02-01");
        assert_eq!(cycle.end_date, "2024-02-29");
        assert_eq!(cycle.due_date, "2024-03-15");
    }

    #[tokio::test]
    async fn explicit_overrides_win_on_create() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let cycle = resolve_or_create(
            &mut conn,
            BillingCycleResolve {
                year: 2567,
                month: 5,
                start_date: Some("2024-05-05".into()),
                end_date: Some("2024-06-04".into()),
                due_date: Some("2024-06-20".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(cycle.start_date, "2024-05-05");
        assert_eq!(cycle.end_date, "2024-06-04");
        assert_eq!(cycle.due_date, "2024-06-20");
    }

    #[tokio::test]
    async fn rejects_invalid_period() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        assert!(matches!(
            resolve_or_create(&mut conn, resolve(2567, 13)).await,
            Err(RepoError::Validation(_))
        ));
        assert!(matches!(
            resolve_or_create(&mut conn, resolve(2024, 1)).await,
            Err(RepoError::Validation(_))
        ));
    }
}
