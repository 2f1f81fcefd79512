//! Announcement Models

use serde::{Deserialize, Serialize};

/// Announcement entity. `published_at` null means draft (admin-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub attachment_path: Option<String>,
    pub author_name: String,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create announcement payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementCreate {
    pub title: String,
    pub body: String,
    /// Publish immediately when true (default)
    pub publish: Option<bool>,
}

/// Update announcement payload (partial)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub publish: Option<bool>,
}
