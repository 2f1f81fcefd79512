//! Meter Reading API module

mod handler;

use axum::{Router, middleware, routing::{get, patch, post}};

use crate::auth::{ADMIN_ROLES, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/readings", routes())
}

fn routes() -> Router<ServerState> {
    // Tenants may view their own room's readings and photos
    let read_routes = Router::new()
        .route("/photos/{id}/file", get(handler::photo_file))
        .route(
            "/rooms/{room_id}/cycles/{cycle_id}",
            get(handler::list_room_readings),
        );

    let manage_routes = Router::new()
        .route("/", post(handler::upload_reading))
        .route("/photos", get(handler::list_photos))
        .route(
            "/photos/{id}",
            patch(handler::update_photo).delete(handler::delete_photo),
        )
        .layer(middleware::from_fn(require_role(ADMIN_ROLES)));

    read_routes.merge(manage_routes)
}
