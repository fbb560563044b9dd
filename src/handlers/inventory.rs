// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{AppError, ErrorBody},
    config::AppState,
    middleware::rbac::{CapReadInventory, CapWriteInventory, RequireCapability},
    models::inventory::{
        CreateProjectPayload, CreateTowerPayload, CreateUnitPayload, Project, Tower, Unit,
        UnitQuery, UnitStatusPayload, UpdateProjectPayload, UpdateUnitPayload,
    },
};

// =============================================================================
//  PROJECTS
// =============================================================================

// POST /api/projects
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Inventory",
    request_body = CreateProjectPayload,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 403, description = "Missing capability", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteInventory>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateProjectPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let project = app_state
        .inventory_service
        .create_project(&app_state.db_pool, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Inventory",
    responses((status = 200, description = "Projects, newest first", body = Vec<Project>)),
    security(("api_jwt" = []))
)]
pub async fn list_projects(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadInventory>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = app_state.inventory_service.list_projects(&app_state.db_pool).await?;
    Ok(Json(projects))
}

// GET /api/projects/{id}
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 404, description = "Unknown project", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadInventory>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Project>, AppError> {
    let project = app_state
        .inventory_service
        .get_project(&app_state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound("Project"))?;

    Ok(Json(project))
}

// PATCH /api/projects/{id}
#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = UpdateProjectPayload,
    responses(
        (status = 200, description = "Project after the patch", body = Project),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown project", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteInventory>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateProjectPayload>, AppError>,
) -> Result<Json<Project>, AppError> {
    payload.validate()?;

    let project = app_state
        .inventory_service
        .update_project(&app_state.db_pool, id, payload)
        .await?;

    Ok(Json(project))
}

// GET /api/projects/{id}/units
#[utoipa::path(
    get,
    path = "/api/projects/{id}/units",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Units of the project", body = Vec<Unit>),
        (status = 404, description = "Unknown project", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_project_units(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadInventory>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Vec<Unit>>, AppError> {
    let units = app_state
        .inventory_service
        .list_units_by_project(&app_state.db_pool, id)
        .await?;

    Ok(Json(units))
}

// =============================================================================
//  TOWERS
// =============================================================================

// POST /api/projects/{id}/towers
#[utoipa::path(
    post,
    path = "/api/projects/{id}/towers",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = CreateTowerPayload,
    responses(
        (status = 201, description = "Tower created", body = Tower),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown project", body = ErrorBody),
        (status = 409, description = "Tower name already used in this project", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tower(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteInventory>,
    WithRejection(Path(project_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateTowerPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tower = app_state
        .inventory_service
        .create_tower(&app_state.db_pool, project_id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(tower)))
}

// GET /api/projects/{id}/towers
#[utoipa::path(
    get,
    path = "/api/projects/{id}/towers",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Towers of the project", body = Vec<Tower>),
        (status = 404, description = "Unknown project", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_towers(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadInventory>,
    WithRejection(Path(project_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Vec<Tower>>, AppError> {
    let towers = app_state
        .inventory_service
        .list_towers(&app_state.db_pool, project_id)
        .await?;

    Ok(Json(towers))
}

// =============================================================================
//  UNITS
// =============================================================================

// POST /api/units
#[utoipa::path(
    post,
    path = "/api/units",
    tag = "Inventory",
    request_body = CreateUnitPayload,
    responses(
        (status = 201, description = "Unit created", body = Unit),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown tower", body = ErrorBody),
        (status = 409, description = "Unit number already used in this tower", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_unit(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteInventory>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateUnitPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate_all()?;

    let unit = app_state
        .inventory_service
        .create_unit(&app_state.db_pool, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(unit)))
}

// GET /api/units
#[utoipa::path(
    get,
    path = "/api/units",
    tag = "Inventory",
    params(UnitQuery),
    responses((status = 200, description = "Units matching the filter", body = Vec<Unit>)),
    security(("api_jwt" = []))
)]
pub async fn list_units(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadInventory>,
    WithRejection(Query(filter), _): WithRejection<Query<UnitQuery>, AppError>,
) -> Result<Json<Vec<Unit>>, AppError> {
    let units = app_state
        .inventory_service
        .list_units(&app_state.db_pool, &filter)
        .await?;

    Ok(Json(units))
}

// GET /api/units/{id}
#[utoipa::path(
    get,
    path = "/api/units/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Unit id")),
    responses(
        (status = 200, description = "Unit", body = Unit),
        (status = 404, description = "Unknown unit", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_unit(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadInventory>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Unit>, AppError> {
    let unit = app_state
        .inventory_service
        .get_unit(&app_state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound("Unit"))?;

    Ok(Json(unit))
}

// PATCH /api/units/{id}
#[utoipa::path(
    patch,
    path = "/api/units/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Unit id")),
    request_body = UpdateUnitPayload,
    responses(
        (status = 200, description = "Unit after the patch", body = Unit),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown unit", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_unit(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteInventory>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateUnitPayload>, AppError>,
) -> Result<Json<Unit>, AppError> {
    payload.validate_all()?;

    let unit = app_state
        .inventory_service
        .update_unit(&app_state.db_pool, id, payload)
        .await?;

    Ok(Json(unit))
}

// PATCH /api/units/{id}/status
#[utoipa::path(
    patch,
    path = "/api/units/{id}/status",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Unit id")),
    request_body = UnitStatusPayload,
    responses(
        (status = 200, description = "Unit in its new status", body = Unit),
        (status = 404, description = "Unknown unit", body = ErrorBody),
        (status = 409, description = "Transition not allowed from the current status", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn change_unit_status(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteInventory>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UnitStatusPayload>, AppError>,
) -> Result<Json<Unit>, AppError> {
    let unit = app_state
        .inventory_service
        .change_unit_status(&app_state.db_pool, id, payload.status)
        .await?;

    Ok(Json(unit))
}
