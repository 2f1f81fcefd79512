//! Billing API module - batch runs, bills, status transitions

mod handler;

use axum::{Router, middleware, routing::{get, post}};

use crate::auth::{ADMIN_ROLES, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    // Tenants read their own bills; batch and transitions are admin-only
    let read_routes = Router::new()
        .route("/api/bills", get(handler::list))
        .route("/api/bills/{id}", get(handler::detail));

    let manage_routes = Router::new()
        .route("/api/billing/run", post(handler::run))
        .route("/api/bills/{id}/status", post(handler::update_status))
        .layer(middleware::from_fn(require_role(ADMIN_ROLES)));

    read_routes.merge(manage_routes)
}
