//! Authentication endpoints

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, RegisterRequest, RequestContext, UserProfile},
    services::auth::IssuedToken,
};

/// Outcome of a successful register or login
#[derive(Serialize, ToSchema)]
pub struct AuthResult {
    pub result: bool,
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for AuthResult {
    fn from(issued: IssuedToken) -> Self {
        Self {
            result: true,
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_at: issued.expires_at,
        }
    }
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/Authentication/Register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResult),
        (status = 400, description = "Invalid registration", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<AuthResult>> {
    let issued = state.services.auth.register(request).await?;
    Ok(Json(issued.into()))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/Authentication/Login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResult),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResult>> {
    let issued = state.services.auth.login(request).await?;
    Ok(Json(issued.into()))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/api/Authentication/Me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserProfile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
) -> AppResult<Json<UserProfile>> {
    let profile = state.services.auth.me(&ctx).await?;
    Ok(Json(profile))
}
