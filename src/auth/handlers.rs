use axum::{extract::State, http::Method, routing::post, Router};
use tracing::{info, instrument};

use crate::{
    auth::{
        claims::Role,
        dto::{LoginRequest, TokenResponse},
        extractors::AuthUser,
        guard::RouteRule,
        strategy::Credentials,
    },
    error::{internal, ApiResponse, AppError, AppResult},
    extract::AppJson,
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/api/auth/login", post(login))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/api/auth/logout", post(logout))
}

pub fn policies() -> Vec<RouteRule> {
    vec![RouteRule::new(
        Method::POST,
        "/api/auth/logout",
        &[Role::Admin, Role::EndUser],
    )]
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Unauthorized("Unauthorized".into()));
    }

    let principal = state
        .auth
        .authenticate(Credentials::Local {
            email,
            password: payload.password,
        })
        .await?;

    let token = state
        .auth
        .keys()
        .sign(&principal)
        .map_err(internal("An error occurred while user login."))?;

    info!(user_id = principal.id, role = ?principal.role, "user logged in");
    Ok(ApiResponse::ok("User login successfully", TokenResponse { token }))
}

/// Tokens are not tracked server-side, so there is nothing to revoke.
#[instrument(skip_all)]
pub async fn logout(AuthUser(user): AuthUser) -> ApiResponse<()> {
    info!(user_id = user.id, "user logged out");
    ApiResponse::done("User logout successfully")
}
