// src/services/dashboard_service.rs

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use sqlx::{Acquire, Postgres};

use crate::{
    common::error::AppError,
    db::{
        dashboard_repo::{MetricsSnapshot, PerformerRow},
        DashboardRepository,
    },
    models::dashboard::{DashboardMetrics, SourceCount, StatusCount, TopPerformer},
};

pub const TOP_PERFORMERS_LIMIT: usize = 5;

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_metrics<'a, A>(&self, conn: A) -> Result<DashboardMetrics, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let (month_start, month_end) = month_bounds(Utc::now().date_naive());
        let snapshot = self.repo.load_snapshot(conn, month_start, month_end).await?;
        Ok(build_metrics(snapshot))
    }
}

pub fn build_metrics(snapshot: MetricsSnapshot) -> DashboardMetrics {
    DashboardMetrics {
        total_leads: snapshot.total_leads,
        monthly_revenue: snapshot.monthly_revenue,
        conversion_rate: conversion_rate(snapshot.sold_leads, snapshot.total_leads),
        active_projects: snapshot.active_projects,
        leads_by_status: status_counts(snapshot.status_rows),
        leads_by_source: snapshot
            .source_rows
            .into_iter()
            .map(|(source, count)| SourceCount { source, count })
            .collect(),
        top_performers: rank_top_performers(snapshot.performer_rows, TOP_PERFORMERS_LIMIT),
    }
}

/// Percentage of sold leads rounded to one decimal place. Zero leads give 0.
pub fn conversion_rate(sold: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((sold as f64 / total as f64) * 1000.0).round() / 10.0
}

/// Half-open `[first of month, first of next month)` around `today`.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(i64::from(today.day0()));
    (start, start + Months::new(1))
}

// Leads without a status are reported as "unknown".
pub fn status_counts(rows: Vec<(Option<String>, i64)>) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = Vec::with_capacity(rows.len());

    for (status, count) in rows {
        let status = status.unwrap_or_else(|| "unknown".to_string());
        match counts.iter_mut().find(|c| c.status == status) {
            Some(existing) => existing.count += count,
            None => counts.push(StatusCount { status, count }),
        }
    }

    counts
}

/// Orders by sales, highest first. Rows arrive in user insertion order and
/// the sort is stable, so ties keep that order.
pub fn rank_top_performers(mut rows: Vec<PerformerRow>, limit: usize) -> Vec<TopPerformer> {
    rows.sort_by(|a, b| b.sales.cmp(&a.sales));
    rows.truncate(limit);

    rows.into_iter()
        .map(|row| TopPerformer {
            user_id: row.user_id,
            name: row.name,
            sales: row.sales,
            bookings: row.bookings,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{test_support::TestDb, FinanceRepository},
        models::finance::CreatePaymentPayload,
        services::finance_service::FinanceService,
    };
    use rust_decimal::Decimal;
    use serde_json::json;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(name: &str, sales: i64, bookings: i64) -> PerformerRow {
        PerformerRow {
            user_id: Uuid::new_v4(),
            name: name.into(),
            sales: Decimal::new(sales, 0),
            bookings,
        }
    }

    #[test]
    fn conversion_rate_rounds_to_one_decimal() {
        assert_eq!(conversion_rate(0, 0), 0.0);
        assert_eq!(conversion_rate(1, 3), 33.3);
        assert_eq!(conversion_rate(15, 100), 15.0);
        assert_eq!(conversion_rate(2, 3), 66.7);
        assert_eq!(conversion_rate(4, 4), 100.0);
    }

    #[test]
    fn month_bounds_cover_the_calendar_month() {
        assert_eq!(month_bounds(date(2025, 3, 17)), (date(2025, 3, 1), date(2025, 4, 1)));
        assert_eq!(month_bounds(date(2025, 3, 1)), (date(2025, 3, 1), date(2025, 4, 1)));
        assert_eq!(month_bounds(date(2024, 2, 29)), (date(2024, 2, 1), date(2024, 3, 1)));
    }

    #[test]
    fn month_bounds_roll_over_december() {
        assert_eq!(month_bounds(date(2025, 12, 31)), (date(2025, 12, 1), date(2026, 1, 1)));
    }

    #[test]
    fn missing_status_is_reported_as_unknown() {
        let counts = status_counts(vec![
            (Some("new".into()), 4),
            (None, 2),
            (Some("sold".into()), 1),
        ]);

        assert_eq!(
            counts,
            vec![
                StatusCount { status: "new".into(), count: 4 },
                StatusCount { status: "unknown".into(), count: 2 },
                StatusCount { status: "sold".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn top_performers_sorted_by_sales_with_stable_ties() {
        let rows = vec![
            row("asha", 100, 1),
            row("bala", 300, 2),
            row("chitra", 100, 1),
            row("dev", 0, 0),
        ];
        let ranked = rank_top_performers(rows, TOP_PERFORMERS_LIMIT);
        let names: Vec<&str> = ranked.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["bala", "asha", "chitra", "dev"]);
        assert!(ranked.windows(2).all(|w| w[0].sales >= w[1].sales));
    }

    #[test]
    fn top_performers_keep_zero_sales_users_and_cap_at_five() {
        let rows = (0..7).map(|i| row(&format!("user{i}"), 0, 0)).collect();
        let ranked = rank_top_performers(rows, TOP_PERFORMERS_LIMIT);

        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].name, "user0");
        assert_eq!(ranked[4].name, "user4");
        assert!(ranked.iter().all(|p| p.sales.is_zero()));
    }

    #[test]
    fn single_new_website_lead() {
        let metrics = build_metrics(MetricsSnapshot {
            total_leads: 1,
            sold_leads: 0,
            monthly_revenue: Decimal::ZERO,
            active_projects: 1,
            status_rows: vec![(Some("new".into()), 1)],
            source_rows: vec![("website".into(), 1)],
            performer_rows: vec![],
        });

        assert_eq!(metrics.total_leads, 1);
        assert_eq!(metrics.conversion_rate, 0.0);
        assert_eq!(metrics.active_projects, 1);
        assert_eq!(metrics.leads_by_status, vec![StatusCount { status: "new".into(), count: 1 }]);
        assert_eq!(metrics.leads_by_source, vec![SourceCount { source: "website".into(), count: 1 }]);

        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["monthlyRevenue"], "0");
        assert!(json["topPerformers"].as_array().unwrap().is_empty());
    }

    fn dashboard() -> DashboardService {
        DashboardService::new(DashboardRepository::new())
    }

    #[tokio::test]
    async fn one_project_and_one_new_website_lead() {
        let Some(db) = TestDb::new().await else { return };
        let project = db.project("Project A").await;
        db.lead("L1", "9845011111").await;

        let metrics = dashboard().get_metrics(&db.pool).await.unwrap();
        assert_eq!(metrics.total_leads, 1);
        assert_eq!(metrics.conversion_rate, 0.0);
        assert_eq!(metrics.active_projects, 1);
        assert_eq!(metrics.monthly_revenue, Decimal::ZERO);
        assert_eq!(metrics.leads_by_status, vec![StatusCount { status: "new".into(), count: 1 }]);
        assert_eq!(metrics.leads_by_source, vec![SourceCount { source: "website".into(), count: 1 }]);

        sqlx::query("UPDATE projects SET is_active = FALSE WHERE id = $1")
            .bind(project.id)
            .execute(&db.pool)
            .await
            .unwrap();
        assert_eq!(dashboard().get_metrics(&db.pool).await.unwrap().active_projects, 0);

        db.cleanup().await;
    }

    #[tokio::test]
    async fn revenue_counts_completed_payments_of_this_month_only() {
        let Some(db) = TestDb::new().await else { return };
        let finance = FinanceService::new(FinanceRepository::new());

        let asha = db.user("Asha Rao").await;
        let bala = db.user("Bala Krishnan").await;
        let project = db.project("Orchid Heights").await;
        let unit = db.unit(&project, "E-12").await;
        let customer = db.customer("Meera Nair").await;
        let booking = db.booking(&unit, &customer, asha.id, Decimal::new(5_000_000, 0)).await;

        let (month_start, _) = month_bounds(Utc::now().date_naive());
        let last_month = month_start - Duration::days(1);
        for body in [
            json!({ "bookingId": booking.id, "amount": "300000", "paymentMethod": "upi", "status": "completed" }),
            json!({ "bookingId": booking.id, "amount": "100000", "paymentMethod": "cash" }),
            json!({
                "bookingId": booking.id,
                "amount": "200000",
                "paymentMethod": "bank_transfer",
                "status": "completed",
                "paidDate": last_month
            }),
        ] {
            let payload: CreatePaymentPayload = serde_json::from_value(body).unwrap();
            finance.create_payment(&db.pool, &payload).await.unwrap();
        }

        let metrics = dashboard().get_metrics(&db.pool).await.unwrap();
        assert_eq!(metrics.monthly_revenue, Decimal::new(300_000, 0));

        let performers: Vec<(Uuid, Decimal, i64)> = metrics
            .top_performers
            .iter()
            .map(|p| (p.user_id, p.sales, p.bookings))
            .collect();
        assert_eq!(
            performers,
            vec![(asha.id, Decimal::new(300_000, 0), 1), (bala.id, Decimal::ZERO, 0)]
        );

        db.cleanup().await;
    }

    #[tokio::test]
    async fn stored_lead_without_status_is_unknown() {
        let Some(db) = TestDb::new().await else { return };
        let legacy = db.lead("Legacy Import", "9845022222").await;
        db.lead("Fresh Enquiry", "9845033333").await;

        sqlx::query("UPDATE leads SET status = NULL WHERE id = $1")
            .bind(legacy.id)
            .execute(&db.pool)
            .await
            .unwrap();

        let metrics = dashboard().get_metrics(&db.pool).await.unwrap();
        let mut statuses = metrics.leads_by_status.clone();
        statuses.sort_by(|a, b| a.status.cmp(&b.status));
        assert_eq!(
            statuses,
            vec![
                StatusCount { status: "new".into(), count: 1 },
                StatusCount { status: "unknown".into(), count: 1 },
            ]
        );

        db.cleanup().await;
    }
}
