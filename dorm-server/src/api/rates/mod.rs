//! Utility Rate API module

mod handler;

use axum::{Router, middleware, routing::{get, post}};

use crate::auth::{ADMIN_ROLES, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/rates", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/types", get(handler::list_types));

    let manage_routes = Router::new()
        .route("/", post(handler::append))
        .layer(middleware::from_fn(require_role(ADMIN_ROLES)));

    read_routes.merge(manage_routes)
}
