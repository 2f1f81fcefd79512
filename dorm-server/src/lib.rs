//! Dorm Server - dormitory management backend
//!
//! # Architecture
//!
//! - **Billing core** (`billing`): cycle resolution, meter-reading
//!   reconciliation with rollover-aware usage, and the idempotent monthly
//!   billing batch
//! - **Database** (`db`): SQLite pool, migrations, repositories
//! - **Auth** (`auth`): external directory login, JWT sessions, role gating
//! - **File storage** (`storage`): meter photos and attachments
//! - **HTTP API** (`api`): RESTful routes for the admin and tenant portals
//!
//! # Module structure
//!
//! ```text
//! dorm-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # directory client, JWT, middleware
//! ├── billing/       # reconciler, engine, money arithmetic
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # pool, migrations, repositories
//! ├── storage/       # photo/attachment files
//! └── utils/         # errors, time, logging
//! ```

pub mod api;
pub mod auth;
pub mod billing;
pub mod core;
pub mod db;
pub mod storage;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Prepare the process environment: dotenv, then logging.
///
/// Log files go to `$WORK_DIR/logs` when that directory exists; stdout
/// otherwise.
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("WORK_DIR")
        .map(|d| format!("{d}/logs"))
        .ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
    Ok(())
}
