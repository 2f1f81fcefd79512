//! Announcement API module

mod handler;

use axum::{Router, middleware, routing::{get, post, put}};

use crate::auth::{ADMIN_ROLES, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/announcements", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/attachment", get(handler::attachment));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/attachment", post(handler::upload_attachment))
        .layer(middleware::from_fn(require_role(ADMIN_ROLES)));

    read_routes.merge(manage_routes)
}
