// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_leads: i64,
    /// Completed payments in the current calendar month.
    #[schema(value_type = String, example = "1250000.00")]
    pub monthly_revenue: Decimal,
    /// Percentage of leads with status `sold`, one decimal place.
    #[schema(example = 33.3)]
    pub conversion_rate: f64,
    pub active_projects: i64,
    pub leads_by_status: Vec<StatusCount>,
    pub leads_by_source: Vec<SourceCount>,
    pub top_performers: Vec<TopPerformer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCount {
    #[schema(example = "new")]
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SourceCount {
    #[schema(example = "website")]
    pub source: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub user_id: Uuid,
    #[schema(example = "Priya Sharma")]
    pub name: String,
    #[schema(value_type = String, example = "850000.00")]
    pub sales: Decimal,
    pub bookings: i64,
}
