// src/models/finance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::common::validation::{check_amount, check_required, validate_positive, validate_with, MONEY};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Cheque,
    BankTransfer,
    Card,
    Upi,
}

// --- Bookings ---

// `paid_amount` is the sum of the booking's completed payments and
// `balance_amount` is `total_amount - paid_amount`. Both are rewritten by
// the store whenever a payment changes, never by clients.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    #[schema(example = "BK-7F3A91C2")]
    pub booking_number: String,
    pub customer_id: Uuid,
    pub unit_id: Uuid,
    pub project_id: Uuid,
    pub assigned_to: Option<Uuid>,
    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub booking_date: NaiveDate,
    #[schema(example = "8450000.00")]
    pub total_amount: Decimal,
    #[schema(example = "500000.00")]
    pub paid_amount: Decimal,
    #[schema(example = "7950000.00")]
    pub balance_amount: Decimal,
    pub status: BookingStatus,
    pub payment_plan: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn balance(total_amount: Decimal, paid_amount: Decimal) -> Decimal {
        total_amount - paid_amount
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    #[validate(required(message = "This field is required."))]
    pub customer_id: Option<Uuid>,
    #[validate(required(message = "This field is required."))]
    pub unit_id: Option<Uuid>,
    /// Defaults to the user creating the booking.
    pub assigned_to: Option<Uuid>,
    /// Defaults to today.
    #[schema(value_type = Option<String>, format = Date)]
    pub booking_date: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub status: Option<BookingStatus>,
    pub payment_plan: Option<String>,
    pub notes: Option<String>,
}

impl CreateBookingPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_required(errors, "total_amount", self.total_amount.as_ref());
            check_amount(errors, "total_amount", self.total_amount.as_ref(), MONEY, validate_positive);
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingPayload {
    pub assigned_to: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Date)]
    pub booking_date: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub status: Option<BookingStatus>,
    pub payment_plan: Option<String>,
    pub notes: Option<String>,
}

impl UpdateBookingPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "total_amount", self.total_amount.as_ref(), MONEY, validate_positive);
        })
    }

    pub fn apply_to(self, booking: &mut Booking) {
        if let Some(v) = self.assigned_to { booking.assigned_to = Some(v); }
        if let Some(v) = self.booking_date { booking.booking_date = v; }
        if let Some(v) = self.total_amount {
            booking.total_amount = v;
            booking.balance_amount = Booking::balance(v, booking.paid_amount);
        }
        if let Some(v) = self.status { booking.status = v; }
        if let Some(v) = self.payment_plan { booking.payment_plan = Some(v); }
        if let Some(v) = self.notes { booking.notes = Some(v); }
    }
}

// --- Payments ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "500000.00")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub paid_date: Option<NaiveDate>,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentPayload {
    #[validate(required(message = "This field is required."))]
    pub booking_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    #[validate(required(message = "This field is required."))]
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    /// Defaults to today when the payment is created as completed.
    #[schema(value_type = Option<String>, format = Date)]
    pub paid_date: Option<NaiveDate>,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

impl CreatePaymentPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_required(errors, "amount", self.amount.as_ref());
            check_amount(errors, "amount", self.amount.as_ref(), MONEY, validate_positive);
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentPayload {
    pub amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub paid_date: Option<NaiveDate>,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

impl UpdatePaymentPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "amount", self.amount.as_ref(), MONEY, validate_positive);
        })
    }

    pub fn apply_to(self, payment: &mut Payment) {
        if let Some(v) = self.amount { payment.amount = v; }
        if let Some(v) = self.payment_method { payment.payment_method = v; }
        if let Some(v) = self.status { payment.status = v; }
        if let Some(v) = self.due_date { payment.due_date = Some(v); }
        if let Some(v) = self.paid_date { payment.paid_date = Some(v); }
        if let Some(v) = self.transaction_reference { payment.transaction_reference = Some(v); }
        if let Some(v) = self.notes { payment.notes = Some(v); }
    }
}

/// A completed payment without a date is stamped with `today`.
pub fn effective_paid_date(
    status: PaymentStatus,
    paid_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    match (status, paid_date) {
        (PaymentStatus::Completed, None) => Some(today),
        (_, date) => date,
    }
}
