// src/handlers/finance.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::{
    common::error::{AppError, ErrorBody},
    config::AppState,
    middleware::{
        auth::CurrentUser,
        rbac::{CapReadBookings, CapReadPayments, CapWriteBookings, CapWritePayments, RequireCapability},
    },
    models::finance::{
        Booking, CreateBookingPayload, CreatePaymentPayload, Payment, UpdateBookingPayload,
        UpdatePaymentPayload,
    },
};

// =============================================================================
//  BOOKINGS
// =============================================================================

// POST /api/bookings
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Finance",
    request_body = CreateBookingPayload,
    responses(
        (status = 201, description = "Booking created; assignedTo defaults to the caller, bookingDate to today", body = Booking),
        (status = 400, description = "Invalid payload or unknown customer", body = ErrorBody),
        (status = 404, description = "Unknown unit", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteBookings>,
    current_user: CurrentUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateBookingPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate_all()?;

    let booking = app_state
        .finance_service
        .create_booking(&app_state.db_pool, current_user.id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings
#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Finance",
    responses((status = 200, description = "Bookings, newest first", body = Vec<Booking>)),
    security(("api_jwt" = []))
)]
pub async fn list_bookings(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadBookings>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = app_state.finance_service.list_bookings(&app_state.db_pool).await?;
    Ok(Json(bookings))
}

// GET /api/bookings/{id}
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "Finance",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = Booking),
        (status = 404, description = "Unknown booking", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadBookings>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Booking>, AppError> {
    let booking = app_state
        .finance_service
        .get_booking(&app_state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound("Booking"))?;

    Ok(Json(booking))
}

// PATCH /api/bookings/{id}
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}",
    tag = "Finance",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = UpdateBookingPayload,
    responses(
        (status = 200, description = "Booking after the patch", body = Booking),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown booking", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_booking(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWriteBookings>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateBookingPayload>, AppError>,
) -> Result<Json<Booking>, AppError> {
    payload.validate_all()?;

    let booking = app_state
        .finance_service
        .update_booking(&app_state.db_pool, id, payload)
        .await?;

    Ok(Json(booking))
}

// GET /api/bookings/{id}/payments
#[utoipa::path(
    get,
    path = "/api/bookings/{id}/payments",
    tag = "Finance",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Payments against the booking", body = Vec<Payment>),
        (status = 404, description = "Unknown booking", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_booking_payments(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadPayments>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let payments = app_state
        .finance_service
        .list_payments_by_booking(&app_state.db_pool, id)
        .await?;

    Ok(Json(payments))
}

// =============================================================================
//  PAYMENTS
// =============================================================================

// POST /api/payments
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "Finance",
    request_body = CreatePaymentPayload,
    responses(
        (status = 201, description = "Payment recorded; booking totals refreshed", body = Payment),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown booking", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWritePayments>,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePaymentPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate_all()?;

    let payment = app_state
        .finance_service
        .create_payment(&app_state.db_pool, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/payments
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "Finance",
    responses((status = 200, description = "Payments, newest first", body = Vec<Payment>)),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadPayments>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let payments = app_state.finance_service.list_payments(&app_state.db_pool).await?;
    Ok(Json(payments))
}

// GET /api/payments/{id}
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "Finance",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment", body = Payment),
        (status = 404, description = "Unknown payment", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_payment(
    State(app_state): State<AppState>,
    _: RequireCapability<CapReadPayments>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Payment>, AppError> {
    let payment = app_state
        .finance_service
        .get_payment(&app_state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound("Payment"))?;

    Ok(Json(payment))
}

// PATCH /api/payments/{id}
#[utoipa::path(
    patch,
    path = "/api/payments/{id}",
    tag = "Finance",
    params(("id" = Uuid, Path, description = "Payment id")),
    request_body = UpdatePaymentPayload,
    responses(
        (status = 200, description = "Payment after the patch; booking totals refreshed", body = Payment),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Unknown payment", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_payment(
    State(app_state): State<AppState>,
    _: RequireCapability<CapWritePayments>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdatePaymentPayload>, AppError>,
) -> Result<Json<Payment>, AppError> {
    payload.validate_all()?;

    let payment = app_state
        .finance_service
        .update_payment(&app_state.db_pool, id, payload)
        .await?;

    Ok(Json(payment))
}
