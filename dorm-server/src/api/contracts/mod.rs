//! Contract API module

mod handler;

use axum::{Router, middleware, routing::{get, post}};

use crate::auth::{ADMIN_ROLES, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/contracts", routes())
}

fn routes() -> Router<ServerState> {
    // Tenants can see their own contract history
    let read_routes = Router::new().route("/mine", get(handler::mine));

    let manage_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/end", post(handler::end))
        .layer(middleware::from_fn(require_role(ADMIN_ROLES)));

    read_routes.merge(manage_routes)
}
