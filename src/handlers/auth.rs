// src/handlers/auth.rs

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    common::error::{AppError, ErrorBody},
    config::AppState,
    middleware::auth::CurrentUser,
    models::user::{AuthResponse, LoginPayload, User},
};

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "System",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "OK"
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed bearer token", body = AuthResponse),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Wrong e-mail or password", body = ErrorBody)
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginPayload>, AppError>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let token = app_state
        .auth_service
        .login_user(&app_state.db_pool, &payload.email, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token }))
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "The authenticated user", body = User),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<User>, AppError> {
    // The token may outlive its user.
    let user = app_state
        .auth_service
        .get_user(&app_state.db_pool, current_user.id)
        .await?
        .ok_or(AppError::InvalidToken)?;

    Ok(Json(user))
}
