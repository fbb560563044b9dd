// src/db/test_support.rs

//! Database fixtures for tests that need real SQL.
//!
//! Each [`TestDb`] is a fresh schema on the server named by `DATABASE_URL`,
//! with every migration applied. Without that variable the tests that use
//! it return early.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use uuid::Uuid;

use crate::{
    db::{CrmRepository, FinanceRepository, InventoryRepository, UserRepository},
    models::{
        crm::{Customer, Lead},
        finance::Booking,
        inventory::{Project, Unit},
        user::{User, UserRole},
    },
};

pub struct TestDb {
    pub pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL is not set, skipping");
            return None;
        };

        let schema = format!("test_{}", Uuid::new_v4().simple());
        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&admin)
            .await
            .expect("create test schema");

        let options = PgConnectOptions::from_str(&url)
            .expect("parse DATABASE_URL")
            .options([("search_path", schema.as_str())]);
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .expect("connect to test schema");
        sqlx::migrate!().run(&pool).await.expect("run migrations");

        Some(Self { pool, admin, schema })
    }

    pub async fn cleanup(self) {
        self.pool.close().await;
        let _ = sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await;
    }

    pub async fn user(&self, full_name: &str) -> User {
        let handle = Uuid::new_v4().simple().to_string();
        UserRepository::new()
            .create_user(
                &self.pool,
                &handle,
                &format!("{}@example.com", handle),
                "not-a-real-hash",
                full_name,
                UserRole::SalesExecutive,
            )
            .await
            .expect("insert user")
    }

    pub async fn project(&self, name: &str) -> Project {
        let payload = serde_json::from_value(json!({ "name": name, "location": "Whitefield" }))
            .expect("project payload");
        InventoryRepository::new()
            .create_project(&self.pool, &payload)
            .await
            .expect("insert project")
    }

    /// A unit in a fresh tower of `project`, priced at 1 crore.
    pub async fn unit(&self, project: &Project, unit_number: &str) -> Unit {
        let repo = InventoryRepository::new();
        let tower_payload =
            serde_json::from_value(json!({ "name": format!("Tower {}", unit_number) })).expect("tower payload");
        let tower = repo
            .create_tower(&self.pool, project.id, &tower_payload)
            .await
            .expect("insert tower");

        let unit_payload = serde_json::from_value(json!({
            "towerId": tower.id,
            "unitNumber": unit_number,
            "floor": 1,
            "unitType": "2BHK",
            "area": "1180.50",
            "price": "10000000.00"
        }))
        .expect("unit payload");
        repo.create_unit(&self.pool, &unit_payload)
            .await
            .expect("insert unit")
            .expect("tower exists")
    }

    pub async fn lead(&self, name: &str, phone: &str) -> Lead {
        let payload = serde_json::from_value(json!({
            "name": name,
            "phone": phone,
            "source": "website"
        }))
        .expect("lead payload");
        CrmRepository::new()
            .create_lead(&self.pool, &payload)
            .await
            .expect("insert lead")
    }

    pub async fn customer(&self, full_name: &str) -> Customer {
        let payload = serde_json::from_value(json!({ "fullName": full_name, "phone": "9845012345" }))
            .expect("customer payload");
        CrmRepository::new()
            .create_customer(&self.pool, &payload)
            .await
            .expect("insert customer")
    }

    pub async fn booking(&self, unit: &Unit, customer: &Customer, assignee: Uuid, total: Decimal) -> Booking {
        let payload = serde_json::from_value(json!({
            "customerId": customer.id,
            "unitId": unit.id,
            "totalAmount": total
        }))
        .expect("booking payload");
        FinanceRepository::new()
            .create_booking(
                &self.pool,
                &format!("BK-{}", &Uuid::new_v4().simple().to_string()[..8]),
                assignee,
                chrono::Utc::now().date_naive(),
                &payload,
            )
            .await
            .expect("insert booking")
            .expect("unit exists")
    }
}
