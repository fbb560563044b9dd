// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

/// Raw aggregates read in one snapshot, before any shaping.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub total_leads: i64,
    pub sold_leads: i64,
    pub monthly_revenue: Decimal,
    pub active_projects: i64,
    pub status_rows: Vec<(Option<String>, i64)>,
    pub source_rows: Vec<(String, i64)>,
    /// One row per user, in insertion order.
    pub performer_rows: Vec<PerformerRow>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PerformerRow {
    pub user_id: Uuid,
    pub name: String,
    pub sales: Decimal,
    pub bookings: i64,
}

#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    /// Runs every dashboard query inside one read-only REPEATABLE READ
    /// transaction. Payment figures only count `[month_start, month_end)`.
    pub async fn load_snapshot<'a, A>(
        &self,
        conn: A,
        month_start: NaiveDate,
        month_end: NaiveDate,
    ) -> Result<MetricsSnapshot, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        // A. Lead totals
        let total_leads = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads")
            .fetch_one(&mut *tx)
            .await?;

        let sold_leads = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads WHERE status = 'sold'")
            .fetch_one(&mut *tx)
            .await?;

        // B. Revenue for the month
        let monthly_revenue = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM payments
            WHERE status = 'completed'
              AND paid_date >= $1
              AND paid_date < $2
            "#,
        )
        .bind(month_start)
        .bind(month_end)
        .fetch_one(&mut *tx)
        .await?;

        // C. Active projects
        let active_projects =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE is_active = TRUE")
                .fetch_one(&mut *tx)
                .await?;

        // D. Groupings
        let status_rows = sqlx::query_as::<_, (Option<String>, i64)>(
            "SELECT status::text, COUNT(*) FROM leads GROUP BY status ORDER BY COUNT(*) DESC, status::text ASC",
        )
        .fetch_all(&mut *tx)
        .await?;

        let source_rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT source::text, COUNT(*) FROM leads GROUP BY source ORDER BY COUNT(*) DESC, source::text ASC",
        )
        .fetch_all(&mut *tx)
        .await?;

        // E. Sales per user. LEFT JOINs keep users without bookings or
        // payments, with sales = 0.
        let performer_rows = sqlx::query_as::<_, PerformerRow>(
            r#"
            SELECT
                u.id AS user_id,
                u.full_name AS name,
                COALESCE(SUM(p.amount), 0) AS sales,
                COUNT(DISTINCT b.id) AS bookings
            FROM users u
            LEFT JOIN bookings b ON b.assigned_to = u.id
            LEFT JOIN payments p
                   ON p.booking_id = b.id
                  AND p.status = 'completed'
                  AND p.paid_date >= $1
                  AND p.paid_date < $2
            GROUP BY u.id
            ORDER BY u.created_at ASC, u.id ASC
            "#,
        )
        .bind(month_start)
        .bind(month_end)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(MetricsSnapshot {
            total_leads,
            sold_leads,
            monthly_revenue,
            active_projects,
            status_rows,
            source_rows,
            performer_rows,
        })
    }
}
