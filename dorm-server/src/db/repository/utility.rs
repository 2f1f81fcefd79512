//! Utility Type & Rate Repository
//!
//! Utility types are migration-seeded reference data. Rates are an
//! append-only history; the effective rate for a date is the newest row at
//! or before it.

use super::{RepoError, RepoResult};
use shared::models::{UtilityKind, UtilityRate, UtilityRateCreate, UtilityType};
use sqlx::{SqliteConnection, SqlitePool};

const RATE_SELECT: &str =
    "SELECT id, utility_type_id, rate_per_unit, effective_date, created_at FROM utility_rate";

pub async fn find_type_by_code(
    conn: &mut SqliteConnection,
    code: UtilityKind,
) -> RepoResult<Option<UtilityType>> {
    let row = sqlx::query_as::<_, UtilityType>(
        "SELECT id, code, display_name FROM utility_type WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn find_type_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<UtilityType>> {
    let row = sqlx::query_as::<_, UtilityType>(
        "SELECT id, code, display_name FROM utility_type WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn find_all_types(pool: &SqlitePool) -> RepoResult<Vec<UtilityType>> {
    let rows =
        sqlx::query_as::<_, UtilityType>("SELECT id, code, display_name FROM utility_type ORDER BY id")
            .fetch_all(pool)
            .await?;
    Ok(rows)
}

/// Effective rate for a utility type as of `as_of` (ISO date)
pub async fn effective_rate(
    conn: &mut SqliteConnection,
    utility_type_id: i64,
    as_of: &str,
) -> RepoResult<Option<UtilityRate>> {
    let sql = format!(
        "{} WHERE utility_type_id = ?1 AND effective_date <= ?2 ORDER BY effective_date DESC, id DESC LIMIT 1",
        RATE_SELECT
    );
    let row = sqlx::query_as::<_, UtilityRate>(&sql)
        .bind(utility_type_id)
        .bind(as_of)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_rates(
    pool: &SqlitePool,
    utility: Option<UtilityKind>,
) -> RepoResult<Vec<UtilityRate>> {
    let rows = match utility {
        Some(kind) => {
            let sql = format!(
                "{} WHERE utility_type_id = (SELECT id FROM utility_type WHERE code = ?) ORDER BY effective_date DESC, id DESC",
                RATE_SELECT
            );
            sqlx::query_as::<_, UtilityRate>(&sql)
                .bind(kind)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{} ORDER BY effective_date DESC, id DESC", RATE_SELECT);
            sqlx::query_as::<_, UtilityRate>(&sql).fetch_all(pool).await?
        }
    };
    Ok(rows)
}

/// Append a new rate row. Rate history is never updated in place.
pub async fn append_rate(pool: &SqlitePool, data: UtilityRateCreate) -> RepoResult<UtilityRate> {
    if data.rate_per_unit < 0.0 || !data.rate_per_unit.is_finite() {
        return Err(RepoError::Validation(format!(
            "Rate per unit must be a non-negative number, got {}",
            data.rate_per_unit
        )));
    }
    chrono::NaiveDate::parse_from_str(&data.effective_date, "%Y-%m-%d")
        .map_err(|_| RepoError::Validation(format!("Invalid date format: {}", data.effective_date)))?;

    let mut conn = pool.acquire().await?;
    let utility_type = find_type_by_code(&mut conn, data.utility)
        .await?
        .ok_or_else(|| {
            RepoError::Database(format!("Utility reference data missing: {}", data.utility))
        })?;

    let now = shared::util::now_millis();
    let rate = sqlx::query_as::<_, UtilityRate>(
        "INSERT INTO utility_rate (utility_type_id, rate_per_unit, effective_date, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING id, utility_type_id, rate_per_unit, effective_date, created_at",
    )
        .bind(utility_type.id)
        .bind(data.rate_per_unit)
        .bind(&data.effective_date)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed_rate(pool: &SqlitePool, utility: UtilityKind, rate: f64, date: &str) {
        append_rate(
            pool,
            UtilityRateCreate {
                utility,
                rate_per_unit: rate,
                effective_date: date.into(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn effective_rate_picks_newest_at_or_before_date() {
        let pool = test_pool().await;
        seed_rate(&pool, UtilityKind::Electric, 7.0, "2024-01-01").await;
        seed_rate(&pool, UtilityKind::Electric, 8.0, "2024-03-01").await;
        seed_rate(&pool, UtilityKind::Electric, 9.0, "2024-06-01").await;

        let mut conn = pool.acquire().await.unwrap();
        let electric = find_type_by_code(&mut conn, UtilityKind::Electric)
            .await
            .unwrap()
            .unwrap();

        let rate = effective_rate(&mut conn, electric.id, "2024-04-30")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rate.rate_per_unit, 8.0);

        // Exactly on the boundary takes the new rate
        let rate = effective_rate(&mut conn, electric.id, "2024-06-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rate.rate_per_unit, 9.0);

        // Before any rate exists
        let rate = effective_rate(&mut conn, electric.id, "2023-12-31")
            .await
            .unwrap();
        assert!(rate.is_none());
    }

    #[tokio::test]
    async fn append_rate_rejects_negative() {
        let pool = test_pool().await;
        let result = append_rate(
            &pool,
            UtilityRateCreate {
                utility: UtilityKind::Water,
                rate_per_unit: -1.0,
                effective_date: "2024-01-01".into(),
            },
        )
        .await;
        assert!(matches!(result, Err(RepoError::Validation(_))));
    }
}
