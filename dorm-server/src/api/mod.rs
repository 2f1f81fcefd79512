//! API Routes
//!
//! One module per resource, each exporting a `router()`. Role gating is a
//! single `require_role` layer on the manage routes - no per-handler checks.
//!
//! # Modules
//!
//! - [`health`] - health check (public)
//! - [`auth`] - directory login, session info
//! - [`cycles`] - billing cycle resolution and listing
//! - [`rates`] - utility rate history
//! - [`readings`] - meter photo upload and reconciled readings
//! - [`billing`] - billing batch, bills, status transitions
//! - [`rooms`] - room management
//! - [`tenants`] - tenant management
//! - [`contracts`] - occupancy contracts
//! - [`announcements`] - announcements with optional attachments

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod announcements;
pub mod auth;
pub mod billing;
pub mod contracts;
pub mod cycles;
pub mod health;
pub mod rates;
pub mod readings;
pub mod rooms;
pub mod tenants;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(cycles::router())
        .merge(rates::router())
        .merge(readings::router())
        .merge(billing::router())
        .merge(rooms::router())
        .merge(tenants::router())
        .merge(contracts::router())
        .merge(announcements::router())
}

/// Build the fully configured application with middleware
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Request ID - generate and propagate a unique id per request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // ========== Application Middleware ==========
        // JWT authentication - injects CurrentUser before routes run
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
}
