//! Database Module
//!
//! SQLite connection pool, migrations, and transient-error retry.

pub mod repository;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::utils::AppError;
use repository::RepoResult;

/// Retries for transient errors (pool exhaustion), on top of the first try
const RETRY_ATTEMPTS: u32 = 2;
/// Base delay; grows linearly per attempt
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Database service - owns a SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Create a new database service with WAL mode and a bounded pool
    pub async fn new(db_path: &str, max_connections: u32) -> Result<Self, AppError> {
        // Build connection options: WAL, foreign keys, normal sync
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON")
            .optimize_on_close(true, None);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        // busy_timeout: wait 5s on write contention instead of failing fast
        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to set busy_timeout: {e}")))?;

        tracing::info!(
            max_connections,
            "Database connection established (SQLite WAL, busy_timeout=5000ms)"
        );

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }
}

/// Run an operation, retrying transient failures with bounded linear backoff.
///
/// Only [`RepoError::Transient`] (pool exhaustion) is retried; everything
/// else surfaces on the first failure.
pub async fn with_retry<T, F, Fut>(mut op: F) -> RepoResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = RepoResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < RETRY_ATTEMPTS => {
                attempt += 1;
                let delay = RETRY_BASE_DELAY_MS * attempt as u64;
                tracing::warn!(attempt, delay_ms = delay, error = %e, "Transient database error, retrying");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            other => return other,
        }
    }
}

/// In-memory pool with the real schema applied, for repository tests.
/// Pinned to one connection - every `sqlite::memory:` connection is its own
/// database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::RepoError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn with_retry_recovers_from_transient() {
        let calls = AtomicU32::new(0);
        let result = with_retry(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(RepoError::Transient("connection pool exhausted".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn with_retry_gives_up_after_bounded_attempts() {
        let calls = AtomicU32::new(0);
        let result: RepoResult<()> = with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RepoError::Transient("connection pool exhausted".into())) }
        })
        .await;
        assert!(result.is_err());
        // first try + RETRY_ATTEMPTS retries
        assert_eq!(calls.load(Ordering::SeqCst), 1 + RETRY_ATTEMPTS);
    }

    #[tokio::test]
    async fn with_retry_does_not_retry_validation() {
        let calls = AtomicU32::new(0);
        let result: RepoResult<()> = with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RepoError::Validation("bad input".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
