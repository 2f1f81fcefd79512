use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{Directory, HttpDirectory, JwtService};
use crate::core::Config;
use crate::db::DbService;
use crate::storage::FileStorage;

/// Server state - shared handles for all request handlers.
///
/// Cloning is shallow (`Arc`/pool handles), so axum can clone freely per
/// request.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// JWT session token service
    pub jwt_service: Arc<JwtService>,
    /// External directory service (identity provider)
    pub directory: Arc<dyn Directory>,
    /// Photo/attachment file storage
    pub storage: FileStorage,
}

impl ServerState {
    pub fn new(
        config: Config,
        pool: SqlitePool,
        jwt_service: Arc<JwtService>,
        directory: Arc<dyn Directory>,
        storage: FileStorage,
    ) -> Self {
        Self {
            config,
            pool,
            jwt_service,
            directory,
            storage,
        }
    }

    /// Initialize server state: work directory layout, database, services.
    ///
    /// # Panics
    ///
    /// Panics when the work directory or database cannot be initialized -
    /// the server is useless without them.
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("dorm.db");
        let db_service = DbService::new(&db_path.to_string_lossy(), config.db_max_connections)
            .await
            .expect("Failed to initialize database");

        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let directory: Arc<dyn Directory> =
            Arc::new(HttpDirectory::new(config.directory_url.clone()));
        let storage = FileStorage::new(config.uploads_dir());

        Self::new(
            config.clone(),
            db_service.pool,
            jwt_service,
            directory,
            storage,
        )
    }
}
