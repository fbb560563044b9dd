// src/services/finance_service.rs

use chrono::Utc;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::lock_row, error::AppError},
    db::FinanceRepository,
    models::finance::{
        effective_paid_date, Booking, CreateBookingPayload, CreatePaymentPayload, Payment,
        PaymentStatus, UpdateBookingPayload, UpdatePaymentPayload,
    },
};

/// `BK-` followed by eight upper-case hex digits.
pub fn generate_booking_number() -> String {
    let id = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("BK-{}", &id[..8])
}

#[derive(Clone)]
pub struct FinanceService {
    repo: FinanceRepository,
}

impl FinanceService {
    pub fn new(repo: FinanceRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  BOOKINGS
    // =========================================================================

    /// `assigned_to` falls back to `current_user` and the booking date to
    /// today. The unit's status is left untouched.
    pub async fn create_booking<'e, E>(
        &self,
        executor: E,
        current_user: Uuid,
        payload: &CreateBookingPayload,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking_number = generate_booking_number();
        let assigned_to = payload.assigned_to.unwrap_or(current_user);
        let booking_date = payload.booking_date.unwrap_or_else(|| Utc::now().date_naive());

        let booking = self
            .repo
            .create_booking(executor, &booking_number, assigned_to, booking_date, payload)
            .await?
            .ok_or(AppError::NotFound("Unit"))?;

        tracing::info!(booking_id = %booking.id, booking_number = %booking.booking_number, "booking created");
        Ok(booking)
    }

    pub async fn get_booking<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_booking(executor, id).await
    }

    pub async fn list_bookings<'e, E>(&self, executor: E) -> Result<Vec<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_bookings(executor).await
    }

    pub async fn update_booking<'a, A>(
        &self,
        conn: A,
        id: Uuid,
        patch: UpdateBookingPayload,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        if !lock_row(&mut *tx, "bookings", id).await? {
            return Err(AppError::NotFound("Booking"));
        }

        let mut booking = self
            .repo
            .get_booking(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Booking"))?;

        patch.apply_to(&mut booking);
        let updated = self.repo.update_booking(&mut *tx, &booking).await?;

        tx.commit().await?;
        Ok(updated)
    }

    // =========================================================================
    //  PAYMENTS
    // =========================================================================

    /// Records a payment and refreshes the booking's paid and balance
    /// amounts in the same transaction.
    pub async fn create_payment<'a, A>(&self, conn: A, payload: &CreatePaymentPayload) -> Result<Payment, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let status = payload.status.unwrap_or(PaymentStatus::Pending);
        let paid_date = effective_paid_date(status, payload.paid_date, Utc::now().date_naive());

        let mut tx = conn.begin().await?;

        // Payment writes on one booking are serialized on the booking row,
        // so each refresh sums every payment committed before it.
        let locked = match payload.booking_id {
            Some(booking_id) => lock_row(&mut *tx, "bookings", booking_id).await?,
            None => false,
        };
        if !locked {
            return Err(AppError::NotFound("Booking"));
        }

        let payment = self
            .repo
            .create_payment(&mut *tx, status, paid_date, payload)
            .await?
            .ok_or(AppError::NotFound("Booking"))?;

        self.repo.refresh_booking_totals(&mut *tx, payment.booking_id).await?;

        tx.commit().await?;

        tracing::info!(payment_id = %payment.id, booking_id = %payment.booking_id, "payment recorded");
        Ok(payment)
    }

    pub async fn get_payment<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_payment(executor, id).await
    }

    pub async fn list_payments<'e, E>(&self, executor: E) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_payments(executor).await
    }

    pub async fn list_payments_by_booking<'a, A>(
        &self,
        conn: A,
        booking_id: Uuid,
    ) -> Result<Vec<Payment>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        if self.repo.get_booking(&mut *conn, booking_id).await?.is_none() {
            return Err(AppError::NotFound("Booking"));
        }

        self.repo.list_payments_by_booking(&mut *conn, booking_id).await
    }

    pub async fn update_payment<'a, A>(
        &self,
        conn: A,
        id: Uuid,
        patch: UpdatePaymentPayload,
    ) -> Result<Payment, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        // Booking first, then payment: the same order `create_payment` and
        // `update_booking` take their locks in.
        let booking_id = self
            .repo
            .get_payment(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Payment"))?
            .booking_id;
        lock_row(&mut *tx, "bookings", booking_id).await?;
        if !lock_row(&mut *tx, "payments", id).await? {
            return Err(AppError::NotFound("Payment"));
        }

        let mut payment = self
            .repo
            .get_payment(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Payment"))?;

        patch.apply_to(&mut payment);
        payment.paid_date = effective_paid_date(payment.status, payment.paid_date, Utc::now().date_naive());

        let updated = self.repo.update_payment(&mut *tx, &payment).await?;
        self.repo.refresh_booking_totals(&mut *tx, updated.booking_id).await?;

        tx.commit().await?;
        Ok(updated)
    }
}
