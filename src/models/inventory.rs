// src/models/inventory.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::common::validation::{check_amount, validate_positive, validate_with, AREA, MONEY};

// --- 1. Projects ---

// `available_units` and `sold_units` are counted from the units table on
// every read, `total_units` is the planned size typed in by the user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    #[schema(example = "Skyline Residency")]
    pub name: String,
    #[schema(example = "Acme Developers")]
    pub developer: Option<String>,
    #[schema(example = "Whitefield, Bengaluru")]
    pub location: String,
    pub description: Option<String>,
    #[schema(example = "residential")]
    pub project_type: Option<String>,
    #[schema(example = 120)]
    pub total_units: i32,
    pub available_units: i64,
    pub sold_units: i64,
    #[schema(value_type = Option<String>, format = Date, example = "2025-01-15")]
    pub launch_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date, example = "2028-06-30")]
    pub completion_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectPayload {
    #[validate(required(message = "This field is required."), length(min = 2, message = "The name must have at least 2 characters."))]
    #[schema(example = "Skyline Residency")]
    pub name: Option<String>,
    pub developer: Option<String>,
    #[validate(required(message = "This field is required."), length(min = 2, message = "The location must have at least 2 characters."))]
    #[schema(example = "Whitefield, Bengaluru")]
    pub location: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<String>,
    #[validate(range(min = 0, message = "The value cannot be negative."))]
    #[serde(default)]
    pub total_units: i32,
    #[schema(value_type = Option<String>, format = Date)]
    pub launch_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub completion_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectPayload {
    #[validate(length(min = 2, message = "The name must have at least 2 characters."))]
    pub name: Option<String>,
    pub developer: Option<String>,
    #[validate(length(min = 2, message = "The location must have at least 2 characters."))]
    pub location: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<String>,
    #[validate(range(min = 0, message = "The value cannot be negative."))]
    pub total_units: Option<i32>,
    #[schema(value_type = Option<String>, format = Date)]
    pub launch_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub completion_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl UpdateProjectPayload {
    pub fn apply_to(self, project: &mut Project) {
        if let Some(v) = self.name { project.name = v; }
        if let Some(v) = self.developer { project.developer = Some(v); }
        if let Some(v) = self.location { project.location = v; }
        if let Some(v) = self.description { project.description = Some(v); }
        if let Some(v) = self.project_type { project.project_type = Some(v); }
        if let Some(v) = self.total_units { project.total_units = v; }
        if let Some(v) = self.launch_date { project.launch_date = Some(v); }
        if let Some(v) = self.completion_date { project.completion_date = Some(v); }
        if let Some(v) = self.is_active { project.is_active = v; }
    }
}

// --- 2. Towers ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tower {
    pub id: Uuid,
    pub project_id: Uuid,
    #[schema(example = "Tower A")]
    pub name: String,
    #[schema(example = 14)]
    pub total_floors: i32,
    #[schema(example = 4)]
    pub units_per_floor: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTowerPayload {
    #[validate(required(message = "This field is required."), length(min = 1, message = "This field is required."))]
    #[schema(example = "Tower A")]
    pub name: Option<String>,
    #[validate(range(min = 0, message = "The value cannot be negative."))]
    #[serde(default)]
    pub total_floors: i32,
    #[validate(range(min = 0, message = "The value cannot be negative."))]
    #[serde(default)]
    pub units_per_floor: i32,
}

// --- 3. Units ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "unit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Available,
    Reserved,
    Sold,
    Blocked,
}

impl UnitStatus {
    pub const ALL: [UnitStatus; 4] = [
        UnitStatus::Available,
        UnitStatus::Reserved,
        UnitStatus::Sold,
        UnitStatus::Blocked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UnitStatus::Available => "available",
            UnitStatus::Reserved => "reserved",
            UnitStatus::Sold => "sold",
            UnitStatus::Blocked => "blocked",
        }
    }

    /// Transition table for unit inventory. Staying in the same status is
    /// always allowed, `sold` is terminal.
    pub fn can_transition_to(self, next: UnitStatus) -> bool {
        use UnitStatus::*;

        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Available, Reserved)
                | (Available, Blocked)
                | (Reserved, Available)
                | (Reserved, Sold)
                | (Reserved, Blocked)
                | (Blocked, Available)
        )
    }

    /// Statuses a unit may currently be in for a move to `target` to succeed.
    pub fn allowed_predecessors(target: UnitStatus) -> Vec<UnitStatus> {
        UnitStatus::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(target))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: Uuid,
    pub project_id: Uuid,
    pub tower_id: Uuid,
    #[schema(example = "A-1203")]
    pub unit_number: String,
    #[schema(example = 12)]
    pub floor: i32,
    #[schema(example = "2BHK")]
    pub unit_type: String,
    #[schema(example = "1185.50")]
    pub area: Decimal,
    #[schema(example = "8450000.00")]
    pub price: Decimal,
    #[schema(example = "east")]
    pub facing: Option<String>,
    pub status: UnitStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUnitPayload {
    #[validate(required(message = "This field is required."))]
    pub tower_id: Option<Uuid>,
    #[validate(required(message = "This field is required."), length(min = 1, message = "This field is required."))]
    #[schema(example = "A-1203")]
    pub unit_number: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub floor: Option<i32>,
    #[validate(required(message = "This field is required."), length(min = 1, message = "This field is required."))]
    #[schema(example = "2BHK")]
    pub unit_type: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub area: Option<Decimal>,
    #[validate(required(message = "This field is required."))]
    pub price: Option<Decimal>,
    pub facing: Option<String>,
    pub status: Option<UnitStatus>,
}

impl CreateUnitPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "area", self.area.as_ref(), AREA, validate_positive);
            check_amount(errors, "price", self.price.as_ref(), MONEY, validate_positive);
        })
    }
}

/// Descriptive fields only; status moves go through `UnitStatusPayload`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUnitPayload {
    #[validate(length(min = 1, message = "This field is required."))]
    pub unit_number: Option<String>,
    pub floor: Option<i32>,
    #[validate(length(min = 1, message = "This field is required."))]
    pub unit_type: Option<String>,
    pub area: Option<Decimal>,
    pub price: Option<Decimal>,
    pub facing: Option<String>,
}

impl UpdateUnitPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "area", self.area.as_ref(), AREA, validate_positive);
            check_amount(errors, "price", self.price.as_ref(), MONEY, validate_positive);
        })
    }

    pub fn apply_to(self, unit: &mut Unit) {
        if let Some(v) = self.unit_number { unit.unit_number = v; }
        if let Some(v) = self.floor { unit.floor = v; }
        if let Some(v) = self.unit_type { unit.unit_type = v; }
        if let Some(v) = self.area { unit.area = v; }
        if let Some(v) = self.price { unit.price = v; }
        if let Some(v) = self.facing { unit.facing = Some(v); }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnitStatusPayload {
    pub status: UnitStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UnitQuery {
    pub status: Option<UnitStatus>,
    pub project_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use UnitStatus::*;

    fn sample_project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Skyline".into(),
            developer: Some("Acme".into()),
            location: "Pune".into(),
            description: None,
            project_type: Some("residential".into()),
            total_units: 10,
            available_units: 7,
            sold_units: 3,
            launch_date: None,
            completion_date: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn booking_flow_is_allowed() {
        assert!(Available.can_transition_to(Reserved));
        assert!(Reserved.can_transition_to(Sold));
        assert!(Reserved.can_transition_to(Available));
        assert!(Blocked.can_transition_to(Available));
    }

    #[test]
    fn sold_units_are_terminal() {
        assert!(!Sold.can_transition_to(Available));
        assert!(!Sold.can_transition_to(Reserved));
        assert!(!Sold.can_transition_to(Blocked));
        assert!(Sold.can_transition_to(Sold));
    }

    #[test]
    fn cannot_sell_without_reserving() {
        assert!(!Available.can_transition_to(Sold));
        assert!(!Blocked.can_transition_to(Sold));
        assert!(!Blocked.can_transition_to(Reserved));
    }

    #[test]
    fn predecessors_follow_the_table() {
        assert_eq!(UnitStatus::allowed_predecessors(Sold), vec![Reserved, Sold]);
        assert_eq!(
            UnitStatus::allowed_predecessors(Available),
            vec![Available, Reserved, Blocked]
        );
        assert_eq!(
            UnitStatus::allowed_predecessors(Blocked),
            vec![Available, Reserved, Blocked]
        );
    }

    #[test]
    fn project_patch_keeps_untouched_fields() {
        let mut project = sample_project();
        let before = project.clone();

        UpdateProjectPayload { is_active: Some(false), ..Default::default() }.apply_to(&mut project);

        assert!(!project.is_active);
        assert_eq!(project.name, before.name);
        assert_eq!(project.developer, before.developer);
        assert_eq!(project.total_units, before.total_units);
    }

    #[test]
    fn unit_payload_reports_all_missing_fields() {
        let payload: CreateUnitPayload =
            serde_json::from_value(serde_json::json!({ "unitNumber": "A-1", "price": "-5" })).unwrap();
        let errors = payload.validate_all().unwrap_err();
        let fields = errors.field_errors();
        for f in ["tower_id", "floor", "unit_type", "area", "price"] {
            assert!(fields.contains_key(f), "missing {f}");
        }
        assert!(!fields.contains_key("unit_number"));
    }

    #[test]
    fn unit_area_is_bounded_by_its_column() {
        let payload: UpdateUnitPayload =
            serde_json::from_value(serde_json::json!({ "area": "10000000000", "price": "8450000.00" })).unwrap();
        let errors = payload.validate_all().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("area"));
        assert!(!fields.contains_key("price"));
    }
}
