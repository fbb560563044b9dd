// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::{
    common::error::{AppError, ErrorBody},
    config::AppState,
    middleware::rbac::{CapReadUsers, RequireCapability},
    models::user::User,
};

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Every user, by name", body = Vec<User>),
        (status = 403, description = "Missing capability", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadUsers>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = app_state.auth_service.list_users(&app_state.db_pool).await?;
    Ok(Json(users))
}

// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "Unknown user", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadUsers>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .auth_service
        .get_user(&app_state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(Json(user))
}
