//! Shared types for the dormitory management platform
//!
//! Domain models and utility types used by the server and the portal
//! clients. Database derives (`sqlx::FromRow`) are behind the `db` feature
//! so client builds stay free of sqlx.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
