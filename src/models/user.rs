// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Master,
    DeveloperHq,
    SalesAdmin,
    SalesExecutive,
}

/// What a role is allowed to do. Checked once per request by
/// `RequireCapability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewDashboard,
    ReadUsers,
    ReadInventory,
    WriteInventory,
    ReadLeads,
    WriteLeads,
    ReadCustomers,
    WriteCustomers,
    ReadBookings,
    WriteBookings,
    ReadPayments,
    WritePayments,
    ManagePartners,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ViewDashboard => "dashboard:view",
            Capability::ReadUsers => "users:read",
            Capability::ReadInventory => "inventory:read",
            Capability::WriteInventory => "inventory:write",
            Capability::ReadLeads => "leads:read",
            Capability::WriteLeads => "leads:write",
            Capability::ReadCustomers => "customers:read",
            Capability::WriteCustomers => "customers:write",
            Capability::ReadBookings => "bookings:read",
            Capability::WriteBookings => "bookings:write",
            Capability::ReadPayments => "payments:read",
            Capability::WritePayments => "payments:write",
            Capability::ManagePartners => "partners:manage",
        }
    }
}

impl UserRole {
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;

        match self {
            UserRole::Master => &[
                ViewDashboard, ReadUsers, ReadInventory, WriteInventory, ReadLeads, WriteLeads,
                ReadCustomers, WriteCustomers, ReadBookings, WriteBookings, ReadPayments,
                WritePayments, ManagePartners,
            ],
            // Head office sees everything but only manages stock and partners.
            UserRole::DeveloperHq => &[
                ViewDashboard, ReadUsers, ReadInventory, WriteInventory, ReadLeads,
                ReadCustomers, ReadBookings, ReadPayments, ManagePartners,
            ],
            UserRole::SalesAdmin => &[
                ViewDashboard, ReadUsers, ReadInventory, ReadLeads, WriteLeads, ReadCustomers,
                WriteCustomers, ReadBookings, WriteBookings, ReadPayments, WritePayments,
                ManagePartners,
            ],
            UserRole::SalesExecutive => &[
                ViewDashboard, ReadInventory, ReadLeads, WriteLeads, ReadCustomers,
                WriteCustomers, ReadBookings, WriteBookings, ReadPayments,
            ],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "priya.sharma")]
    pub username: String,
    #[schema(example = "priya@acmerealty.in")]
    pub email: String,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = "Priya Sharma")]
    pub full_name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "The e-mail address is invalid."))]
    #[schema(example = "priya@acmerealty.in")]
    pub email: String,
    #[validate(length(min = 6, message = "The password must have at least 6 characters."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// JWT payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_has_every_capability() {
        for cap in [
            Capability::ViewDashboard,
            Capability::WriteInventory,
            Capability::WritePayments,
            Capability::ManagePartners,
            Capability::ReadUsers,
        ] {
            assert!(UserRole::Master.can(cap), "{:?}", cap);
        }
    }

    #[test]
    fn executives_cannot_touch_inventory_or_payments() {
        let role = UserRole::SalesExecutive;
        assert!(role.can(Capability::WriteLeads));
        assert!(role.can(Capability::WriteBookings));
        assert!(!role.can(Capability::WriteInventory));
        assert!(!role.can(Capability::WritePayments));
        assert!(!role.can(Capability::ManagePartners));
        assert!(!role.can(Capability::ReadUsers));
    }

    #[test]
    fn developer_hq_is_read_only_on_sales() {
        let role = UserRole::DeveloperHq;
        assert!(role.can(Capability::WriteInventory));
        assert!(role.can(Capability::ReadLeads));
        assert!(!role.can(Capability::WriteLeads));
        assert!(!role.can(Capability::WriteBookings));
    }

    #[test]
    fn every_role_sees_the_dashboard() {
        for role in [
            UserRole::Master,
            UserRole::DeveloperHq,
            UserRole::SalesAdmin,
            UserRole::SalesExecutive,
        ] {
            assert!(role.can(Capability::ViewDashboard));
        }
    }

    #[test]
    fn role_uses_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&UserRole::DeveloperHq).unwrap(), "\"developer_hq\"");
        let role: UserRole = serde_json::from_str("\"sales_executive\"").unwrap();
        assert_eq!(role, UserRole::SalesExecutive);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "a".into(),
            email: "a@b.com".into(),
            password_hash: "secret-hash".into(),
            full_name: "A".into(),
            role: UserRole::SalesAdmin,
            phone: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["fullName"], "A");
    }
}
