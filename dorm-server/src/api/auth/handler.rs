//! Auth API Handlers

use axum::{
    Json,
    extract::{Extension, State},
};
use serde::Serialize;

use crate::auth::{CurrentUser, DirectoryError, role_from_groups};
use crate::core::ServerState;
use crate::db::repository::tenant;
use crate::utils::{AppError, AppResult};
use shared::models::{LoginRequest, LoginResponse, Role};

/// POST /api/auth/login - authenticate against the directory service
///
/// Directory groups decide the role; tenant sessions additionally require a
/// matching active tenant row so a directory account alone grants nothing.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::invalid_credentials());
    }

    let login = state
        .directory
        .authenticate(&payload.username, &payload.password)
        .await
        .map_err(|e| match e {
            DirectoryError::InvalidCredentials => AppError::invalid_credentials(),
            DirectoryError::Unavailable(msg) => AppError::internal(msg),
        })?;

    let role = role_from_groups(&login.groups, &state.config.directory_groups)
        .ok_or_else(|| AppError::forbidden("Account has no dormitory access"))?;

    let tenant_id = match role {
        Role::Tenant => {
            let row = tenant::find_by_username(&state.pool, &login.username)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::forbidden("No tenant record for this account"))?;
            if !row.is_active {
                return Err(AppError::forbidden("Tenant account is inactive"));
            }
            Some(row.id)
        }
        _ => None,
    };

    let token = state
        .jwt_service
        .generate_token(&login.username, &login.display_name, role, tenant_id)
        .map_err(|e| AppError::internal(e.to_string()))?;

    tracing::info!(username = %login.username, role = role.as_str(), "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        username: login.username,
        display_name: login.display_name,
        role,
    }))
}

/// Session profile
#[derive(Serialize)]
pub struct SessionInfo {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub tenant_id: Option<i64>,
}

/// GET /api/auth/me - current session
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<SessionInfo> {
    Json(SessionInfo {
        username: user.username,
        display_name: user.display_name,
        role: user.role,
        tenant_id: user.tenant_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::directory::{DirectoryGroups, DirectoryLogin, StaticDirectory};
    use crate::auth::{JwtConfig, JwtService};
    use crate::core::Config;
    use crate::storage::FileStorage;
    use shared::models::TenantCreate;

    fn directory_user(username: &str, password: &str, groups: &[&str]) -> (String, String, DirectoryLogin) {
        (
            username.to_string(),
            password.to_string(),
            DirectoryLogin {
                username: username.to_string(),
                display_name: username.to_uppercase(),
                email: None,
                groups: groups.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    async fn test_state(users: Vec<(String, String, DirectoryLogin)>) -> ServerState {
        let jwt = JwtConfig {
            secret: "test-secret-with-enough-length-0123".into(),
            expiration_minutes: 60,
            issuer: "dorm-server".into(),
            audience: "dorm-portals".into(),
        };
        let config = Config {
            work_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            http_port: 0,
            directory_url: String::new(),
            directory_groups: DirectoryGroups::default(),
            db_max_connections: 5,
            jwt: jwt.clone(),
            environment: "test".into(),
        };
        ServerState::new(
            config,
            crate::db::test_pool().await,
            Arc::new(JwtService::new(jwt)),
            Arc::new(StaticDirectory { users }),
            FileStorage::new(std::env::temp_dir()),
        )
    }

    fn login_request(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.into(),
            password: password.into(),
        })
    }

    #[tokio::test]
    async fn admin_group_yields_admin_session() {
        let state =
            test_state(vec![directory_user("boss", "pw", &["dorm-admins", "staff"])]).await;

        let Json(response) = login(State(state.clone()), login_request("boss", "pw"))
            .await
            .unwrap();
        assert_eq!(response.role, Role::Admin);

        let claims = state.jwt_service.validate_token(&response.token).unwrap();
        assert_eq!(claims.sub, "boss");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.tenant_id, None);
    }

    #[tokio::test]
    async fn tenant_login_requires_a_tenant_row() {
        let state = test_state(vec![directory_user("alice", "pw", &["dorm-tenants"])]).await;

        // Directory account alone is not enough
        let err = login(State(state.clone()), login_request("alice", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let row = tenant::create(
            &state.pool,
            TenantCreate {
                username: "alice".into(),
                display_name: "Alice".into(),
                phone: None,
                email: None,
            },
        )
        .await
        .unwrap();

        let Json(response) = login(State(state.clone()), login_request("alice", "pw"))
            .await
            .unwrap();
        assert_eq!(response.role, Role::Tenant);
        let claims = state.jwt_service.validate_token(&response.token).unwrap();
        assert_eq!(claims.tenant_id, Some(row.id));
    }

    #[tokio::test]
    async fn unrelated_groups_are_forbidden() {
        let state = test_state(vec![directory_user("eve", "pw", &["printing"])]).await;
        let err = login(State(state), login_request("eve", "pw")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let state = test_state(vec![directory_user("boss", "pw", &["dorm-admins"])]).await;
        let err = login(State(state), login_request("boss", "nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
