// src/handlers/crm.rs

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
    middleware::{
        auth::CurrentUser,
        rbac::{
            CapManagePartners, CapReadCustomers, CapReadLeads, CapWriteCustomers, CapWriteLeads,
            RequireCapability,
        },
    },
    models::crm::{
        ChannelPartner, Communication, CreateChannelPartnerPayload, CreateCommunicationPayload,
        CreateCustomerPayload, CreateLeadPayload, Customer, CustomerQuery, Lead, LeadQuery,
        PipelineStage, UpdateChannelPartnerPayload, UpdateCustomerPayload, UpdateLeadPayload,
    },
};

// =============================================================================
//  LEADS
// =============================================================================

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "CRM",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead created", body = Lead),
        (status = 400, description = "Every failing field is listed", body = ErrorBody),
        (status = 403, description = "Missing capability", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteLeads>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateLeadPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate_all()?;

    let lead = app_state.crm_service.create_lead(&app_state.db_pool, &payload).await?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "CRM",
    params(LeadQuery),
    responses(
        (status = 200, description = "Leads, newest first. Only one filter applies: search, then status, then assignee", body = Vec<Lead>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadLeads>,
    WithRejection(Query(query), _): WithRejection<Query<LeadQuery>, AppError>,
) -> Result<Json<Vec<Lead>>, AppError> {
    let leads = app_state
        .crm_service
        .list_leads(&app_state.db_pool, query.into_filter())
        .await?;

    Ok(Json(leads))
}

// GET /api/leads/pipeline
#[utoipa::path(
    get,
    path = "/api/leads/pipeline",
    tag = "CRM",
    responses(
        (status = 200, description = "Leads grouped into the seven funnel columns", body = Vec<PipelineStage>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_pipeline(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadLeads>,
) -> Result<Json<Vec<PipelineStage>>, AppError> {
    let stages = app_state.crm_service.lead_pipeline(&app_state.db_pool).await?;
    Ok(Json(stages))
}

// GET /api/leads/{id}
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "Lead id")),
    responses(
        (status = 200, description = "Lead", body = Lead),
        (status = 404, description = "Unknown lead", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadLeads>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Lead>, AppError> {
    let lead = app_state
        .crm_service
        .get_lead(&app_state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound("Lead"))?;

    Ok(Json(lead))
}

// PATCH /api/leads/{id}
#[utoipa::path(
    patch,
    path = "/api/leads/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "Lead id")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead after the patch; absent fields are untouched", body = Lead),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown lead", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteLeads>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateLeadPayload>, AppError>,
) -> Result<Json<Lead>, AppError> {
    payload.validate_all()?;

    let lead = app_state.crm_service.update_lead(&app_state.db_pool, id, payload).await?;

    Ok(Json(lead))
}

// GET /api/leads/{id}/communications
#[utoipa::path(
    get,
    path = "/api/leads/{id}/communications",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "Lead id")),
    responses(
        (status = 200, description = "Communications with the lead, newest first", body = Vec<Communication>),
        (status = 404, description = "Unknown lead", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_lead_communications(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadLeads>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Vec<Communication>>, AppError> {
    let items = app_state
        .crm_service
        .list_communications_by_lead(&app_state.db_pool, id)
        .await?;

    Ok(Json(items))
}

// =============================================================================
//  COMMUNICATIONS
// =============================================================================

// POST /api/communications
#[utoipa::path(
    post,
    path = "/api/communications",
    tag = "CRM",
    request_body = CreateCommunicationPayload,
    responses(
        (status = 201, description = "Communication logged by the current user", body = Communication),
        (status = 400, description = "Invalid payload or unknown lead", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_communication(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteLeads>,
    current_user: CurrentUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateCommunicationPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .crm_service
        .log_communication(&app_state.db_pool, current_user.id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// GET /api/communications
#[utoipa::path(
    get,
    path = "/api/communications",
    tag = "CRM",
    responses((status = 200, description = "All communications, newest first", body = Vec<Communication>)),
    security(("api_jwt" = []))
)]
pub async fn list_communications(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadLeads>,
) -> Result<Json<Vec<Communication>>, AppError> {
    let items = app_state.crm_service.list_communications(&app_state.db_pool).await?;
    Ok(Json(items))
}

// =============================================================================
//  CUSTOMERS
// =============================================================================

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "CRM",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid payload", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteCustomers>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateCustomerPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate_all()?;

    let customer = app_state.crm_service.create_customer(&app_state.db_pool, &payload).await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "CRM",
    params(CustomerQuery),
    responses((status = 200, description = "Customers, newest first", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadCustomers>,
    WithRejection(Query(query), _): WithRejection<Query<CustomerQuery>, AppError>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = app_state
        .crm_service
        .list_customers(&app_state.db_pool, query.search.as_deref())
        .await?;

    Ok(Json(customers))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = Customer),
        (status = 404, description = "Unknown customer", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadCustomers>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Customer>, AppError> {
    let customer = app_state
        .crm_service
        .get_customer(&app_state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;

    Ok(Json(customer))
}

// PATCH /api/customers/{id}
#[utoipa::path(
    patch,
    path = "/api/customers/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = UpdateCustomerPayload,
    responses(
        (status = 200, description = "Customer after the patch", body = Customer),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown customer", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteCustomers>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateCustomerPayload>, AppError>,
) -> Result<Json<Customer>, AppError> {
    payload.validate_all()?;

    let customer = app_state
        .crm_service
        .update_customer(&app_state.db_pool, id, payload)
        .await?;

    Ok(Json(customer))
}

// =============================================================================
//  CHANNEL PARTNERS
// =============================================================================

// POST /api/channel-partners
#[utoipa::path(
    post,
    path = "/api/channel-partners",
    tag = "CRM",
    request_body = CreateChannelPartnerPayload,
    responses(
        (status = 201, description = "Channel partner created", body = ChannelPartner),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "E-mail already registered", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_channel_partner(
    State(app_state): State<AppState>,
    _: RequireCapability<CapManagePartners>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateChannelPartnerPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate_all()?;

    let partner = app_state
        .crm_service
        .create_channel_partner(&app_state.db_pool, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(partner)))
}

// GET /api/channel-partners
#[utoipa::path(
    get,
    path = "/api/channel-partners",
    tag = "CRM",
    responses((status = 200, description = "Channel partners with lead and sale counts", body = Vec<ChannelPartner>)),
    security(("api_jwt" = []))
)]
pub async fn list_channel_partners(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadLeads>,
) -> Result<Json<Vec<ChannelPartner>>, AppError> {
    let partners = app_state.crm_service.list_channel_partners(&app_state.db_pool).await?;
    Ok(Json(partners))
}

// GET /api/channel-partners/{id}
#[utoipa::path(
    get,
    path = "/api/channel-partners/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "Channel partner id")),
    responses(
        (status = 200, description = "Channel partner", body = ChannelPartner),
        (status = 404, description = "Unknown channel partner", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_channel_partner(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadLeads>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<ChannelPartner>, AppError> {
    let partner = app_state
        .crm_service
        .get_channel_partner(&app_state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound("Channel partner"))?;

    Ok(Json(partner))
}

// PATCH /api/channel-partners/{id}
#[utoipa::path(
    patch,
    path = "/api/channel-partners/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "Channel partner id")),
    request_body = UpdateChannelPartnerPayload,
    responses(
        (status = 200, description = "Channel partner after the patch", body = ChannelPartner),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown channel partner", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_channel_partner(
    State(app_state): State<AppState>,
    _: RequireCapability<CapManagePartners>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateChannelPartnerPayload>, AppError>,
) -> Result<Json<ChannelPartner>, AppError> {
    payload.validate_all()?;

    let partner = app_state
        .crm_service
        .update_channel_partner(&app_state.db_pool, id, payload)
        .await?;

    Ok(Json(partner))
}
