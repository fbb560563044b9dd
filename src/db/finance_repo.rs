// src/db/finance_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_write_error, error::AppError},
    models::finance::{Booking, BookingStatus, CreateBookingPayload, CreatePaymentPayload, Payment, PaymentStatus},
};

#[derive(Clone, Default)]
pub struct FinanceRepository;

impl FinanceRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  BOOKINGS
    // =========================================================================

    /// The project is taken from the unit. `None` when the unit does not exist.
    pub async fn create_booking<'e, E>(
        &self,
        executor: E,
        booking_number: &str,
        assigned_to: Uuid,
        booking_date: NaiveDate,
        payload: &CreateBookingPayload,
    ) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // No payment exists yet: nothing paid, the whole amount is due.
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                booking_number, customer_id, unit_id, project_id, assigned_to,
                booking_date, total_amount, paid_amount, balance_amount, status,
                payment_plan, notes
            )
            SELECT $1, $2, u.id, u.project_id, $4, $5, $6, 0, $6, $7, $8, $9
            FROM units u
            WHERE u.id = $3
            RETURNING *
            "#,
        )
        .bind(booking_number)
        .bind(payload.customer_id)
        .bind(payload.unit_id)
        .bind(assigned_to)
        .bind(booking_date)
        .bind(payload.total_amount)
        .bind(payload.status.unwrap_or(BookingStatus::Pending))
        .bind(payload.payment_plan.as_deref())
        .bind(payload.notes.as_deref())
        .fetch_optional(executor)
        .await
        .map_err(|e| map_write_error(e, "Booking number collision, please retry."))
    }

    pub async fn get_booking<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(booking)
    }

    pub async fn list_bookings<'e, E>(&self, executor: E) -> Result<Vec<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bookings = sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at DESC")
            .fetch_all(executor)
            .await?;
        Ok(bookings)
    }

    /// Writes the client-editable columns. `balance_amount` is recomputed
    /// from the stored `paid_amount`.
    pub async fn update_booking<'e, E>(&self, executor: E, booking: &Booking) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET assigned_to = $2, booking_date = $3, total_amount = $4,
                balance_amount = $4 - paid_amount, status = $5, payment_plan = $6,
                notes = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.assigned_to)
        .bind(booking.booking_date)
        .bind(booking.total_amount)
        .bind(booking.status)
        .bind(booking.payment_plan.as_deref())
        .bind(booking.notes.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "Booking conflicts with an existing record."))
    }

    /// Recomputes `paid_amount` from completed payments and the balance
    /// from it, in a single statement.
    pub async fn refresh_booking_totals<'e, E>(&self, executor: E, booking_id: Uuid) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings b
            SET paid_amount = s.paid,
                balance_amount = b.total_amount - s.paid,
                updated_at = NOW()
            FROM (
                SELECT COALESCE(SUM(amount), 0) AS paid
                FROM payments
                WHERE booking_id = $1 AND status = 'completed'
            ) s
            WHERE b.id = $1
            RETURNING b.*
            "#,
        )
        .bind(booking_id)
        .fetch_one(executor)
        .await?;

        Ok(booking)
    }

    // =========================================================================
    //  PAYMENTS
    // =========================================================================

    /// The customer is taken from the booking. `None` when the booking does
    /// not exist.
    pub async fn create_payment<'e, E>(
        &self,
        executor: E,
        status: PaymentStatus,
        paid_date: Option<NaiveDate>,
        payload: &CreatePaymentPayload,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                booking_id, customer_id, amount, payment_method, status,
                due_date, paid_date, transaction_reference, notes
            )
            SELECT b.id, b.customer_id, $2, $3, $4, $5, $6, $7, $8
            FROM bookings b
            WHERE b.id = $1
            RETURNING *
            "#,
        )
        .bind(payload.booking_id)
        .bind(payload.amount)
        .bind(payload.payment_method)
        .bind(status)
        .bind(payload.due_date)
        .bind(paid_date)
        .bind(payload.transaction_reference.as_deref())
        .bind(payload.notes.as_deref())
        .fetch_optional(executor)
        .await
        .map_err(|e| map_write_error(e, "This payment was already recorded."))
    }

    pub async fn get_payment<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(payment)
    }

    pub async fn list_payments<'e, E>(&self, executor: E) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>("SELECT * FROM payments ORDER BY created_at DESC")
            .fetch_all(executor)
            .await?;
        Ok(payments)
    }

    pub async fn list_payments_by_booking<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
    ) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE booking_id = $1 ORDER BY created_at DESC",
        )
        .bind(booking_id)
        .fetch_all(executor)
        .await?;
        Ok(payments)
    }

    pub async fn update_payment<'e, E>(&self, executor: E, payment: &Payment) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET amount = $2, payment_method = $3, status = $4, due_date = $5,
                paid_date = $6, transaction_reference = $7, notes = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(payment.id)
        .bind(payment.amount)
        .bind(payment.payment_method)
        .bind(payment.status)
        .bind(payment.due_date)
        .bind(payment.paid_date)
        .bind(payment.transaction_reference.as_deref())
        .bind(payment.notes.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(updated)
    }
}
