// src/config.rs

use std::{env, time::Duration};

use anyhow::{Context, bail};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{CrmRepository, DashboardRepository, FinanceRepository, InventoryRepository, UserRepository},
    services::{
        auth::AuthService, crm_service::CrmService, dashboard_service::DashboardService,
        finance_service::FinanceService, inventory_service::InventoryService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_JWT_TTL_HOURS: i64 = 168;

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub jwt_ttl_hours: i64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {v}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let jwt_ttl_hours = match var("JWT_TTL_HOURS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("JWT_TTL_HOURS is not a number: {v}"))?,
            None => DEFAULT_JWT_TTL_HOURS,
        };
        if jwt_ttl_hours <= 0 {
            bail!("JWT_TTL_HOURS must be positive");
        }

        let bootstrap_admin = match (var("BOOTSTRAP_ADMIN_EMAIL"), var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                full_name: var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            database_max_connections,
            jwt_ttl_hours,
            bootstrap_admin,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub crm_service: CrmService,
    pub inventory_service: InventoryService,
    pub finance_service: FinanceService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("database connection established");

        Ok(Self::from_pool(db_pool, config))
    }

    /// Wires repositories and services around an existing pool.
    pub fn from_pool(db_pool: PgPool, config: &Config) -> Self {
        let auth_service = AuthService::new(
            UserRepository::new(),
            config.jwt_secret.clone(),
            chrono::Duration::hours(config.jwt_ttl_hours),
        );

        Self {
            db_pool,
            auth_service,
            crm_service: CrmService::new(CrmRepository::new()),
            inventory_service: InventoryService::new(InventoryRepository::new()),
            finance_service: FinanceService::new(FinanceRepository::new()),
            dashboard_service: DashboardService::new(DashboardRepository::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/crm"), ("JWT_SECRET", "s3cret")]).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.jwt_ttl_hours, 168);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn required_vars_are_enforced() {
        assert!(config_from(&[("JWT_SECRET", "s3cret")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "postgres://localhost/crm"), ("JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ]);
        assert!(result.is_err());

        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_HOURS", "0"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn bootstrap_admin_needs_email_and_password() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("JWT_SECRET", "s3cret"),
            ("BOOTSTRAP_ADMIN_EMAIL", "admin@acmerealty.in"),
        ])
        .unwrap();
        assert!(config.bootstrap_admin.is_none());

        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("JWT_SECRET", "s3cret"),
            ("BOOTSTRAP_ADMIN_EMAIL", "admin@acmerealty.in"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "changeme123"),
        ])
        .unwrap();
        let admin = config.bootstrap_admin.unwrap();
        assert_eq!(admin.email, "admin@acmerealty.in");
        assert_eq!(admin.full_name, "Administrator");
    }
}
