//! Authentication Middleware
//!
//! `require_auth` validates the bearer token and injects [`CurrentUser`]
//! into request extensions; `require_role` is the single policy primitive
//! layered onto role-gated routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;
use shared::models::Role;

/// Roles that pass admin gates
pub const ADMIN_ROLES: &[Role] = &[Role::SuperUser, Role::Admin];

/// Paths reachable without a session
fn is_public_api_route(path: &str) -> bool {
    path == "/api/auth/login" || path == "/api/health"
}

/// Authentication middleware - requires a valid bearer token.
///
/// Skips CORS preflight, non-API paths, and the public routes above.
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }
    if !path.starts_with("/api/") || is_public_api_route(path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => {
            JwtService::extract_from_header(header).ok_or(AppError::InvalidToken)?
        }
        None => {
            tracing::warn!(uri = %req.uri(), "Request without authorization header");
            return Err(AppError::Unauthorized);
        }
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::try_from(claims).map_err(|e| {
                tracing::warn!(error = %e, "Malformed JWT claims");
                AppError::InvalidToken
            })?;
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(error = %e, uri = %req.uri(), "Token validation failed");
            match e {
                JwtError::ExpiredToken => Err(AppError::TokenExpired),
                _ => Err(AppError::InvalidToken),
            }
        }
    }
}

/// Role-gate middleware - requires the session role to be in `roles`.
///
/// ```ignore
/// .layer(middleware::from_fn(require_role(ADMIN_ROLES)));
/// ```
pub fn require_role(
    roles: &'static [Role],
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::Unauthorized)?;

            if !roles.contains(&user.role) {
                tracing::warn!(
                    username = %user.username,
                    role = user.role.as_str(),
                    "Role check failed"
                );
                return Err(AppError::forbidden(format!(
                    "Requires role in {:?}",
                    roles.iter().map(|r| r.as_str()).collect::<Vec<_>>()
                )));
            }

            Ok(next.run(req).await)
        })
    }
}
