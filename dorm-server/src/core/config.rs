use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::auth::directory::DirectoryGroups;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/dorm | Work directory (database, uploads, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | DIRECTORY_URL | http://localhost:3001 | Directory service base URL |
/// | DIRECTORY_SUPERUSER_GROUP | dorm-superusers | Group granting superUser |
/// | DIRECTORY_ADMIN_GROUP | dorm-admins | Group granting admin |
/// | DIRECTORY_TENANT_GROUP | dorm-tenants | Group granting tenant |
/// | DB_MAX_CONNECTIONS | 5 | Connection pool bound |
/// | ENVIRONMENT | development | development \| staging \| production |
///
/// JWT settings come from `JWT_SECRET`, `JWT_EXPIRATION_MINUTES`,
/// `JWT_ISSUER`, `JWT_AUDIENCE` (see [`JwtConfig`]).
#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory holding database, uploads and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Directory service base URL (external identity provider)
    pub directory_url: String,
    /// Directory group → role mapping
    pub directory_groups: DirectoryGroups,
    /// Connection pool bound
    pub db_max_connections: u32,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        let groups = DirectoryGroups {
            super_user_group: std::env::var("DIRECTORY_SUPERUSER_GROUP")
                .unwrap_or_else(|_| "dorm-superusers".into()),
            admin_group: std::env::var("DIRECTORY_ADMIN_GROUP")
                .unwrap_or_else(|_| "dorm-admins".into()),
            tenant_group: std::env::var("DIRECTORY_TENANT_GROUP")
                .unwrap_or_else(|_| "dorm-tenants".into()),
        };

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/dorm".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            directory_url: std::env::var("DIRECTORY_URL")
                .unwrap_or_else(|_| "http://localhost:3001".into()),
            directory_groups: groups,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads")
    }

    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the work directory layout if missing
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
