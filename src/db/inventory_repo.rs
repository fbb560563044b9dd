// src/db/inventory_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_write_error, error::AppError},
    models::inventory::{
        CreateProjectPayload, CreateTowerPayload, CreateUnitPayload, Project, Tower, Unit,
        UnitQuery, UnitStatus,
    },
};

#[derive(Clone, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  PROJECTS
    // =========================================================================

    pub async fn create_project<'e, E>(
        &self,
        executor: E,
        payload: &CreateProjectPayload,
    ) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // A brand new project has no units yet, so both counters start at 0.
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (
                name, developer, location, description, project_type,
                total_units, launch_date, completion_date, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *, 0::BIGINT AS available_units, 0::BIGINT AS sold_units
            "#,
        )
        .bind(payload.name.as_deref())
        .bind(payload.developer.as_deref())
        .bind(payload.location.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.project_type.as_deref())
        .bind(payload.total_units)
        .bind(payload.launch_date)
        .bind(payload.completion_date)
        .bind(payload.is_active.unwrap_or(true))
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    pub async fn get_project<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM project_overview WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(project)
    }

    pub async fn list_projects<'e, E>(&self, executor: E) -> Result<Vec<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM project_overview ORDER BY created_at DESC",
        )
        .fetch_all(executor)
        .await?;
        Ok(projects)
    }

    /// Writes every stored column of `project`; the counters are recomputed.
    pub async fn update_project<'e, E>(&self, executor: E, project: &Project) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects p
            SET name = $2, developer = $3, location = $4, description = $5,
                project_type = $6, total_units = $7, launch_date = $8,
                completion_date = $9, is_active = $10, updated_at = NOW()
            WHERE p.id = $1
            RETURNING p.*,
                (SELECT COUNT(*) FROM units u WHERE u.project_id = p.id AND u.status = 'available') AS available_units,
                (SELECT COUNT(*) FROM units u WHERE u.project_id = p.id AND u.status = 'sold') AS sold_units
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(project.developer.as_deref())
        .bind(&project.location)
        .bind(project.description.as_deref())
        .bind(project.project_type.as_deref())
        .bind(project.total_units)
        .bind(project.launch_date)
        .bind(project.completion_date)
        .bind(project.is_active)
        .fetch_one(executor)
        .await?;

        Ok(updated)
    }

    // =========================================================================
    //  TOWERS
    // =========================================================================

    pub async fn create_tower<'e, E>(
        &self,
        executor: E,
        project_id: Uuid,
        payload: &CreateTowerPayload,
    ) -> Result<Tower, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = payload.name.as_deref().unwrap_or_default();

        sqlx::query_as::<_, Tower>(
            r#"
            INSERT INTO towers (project_id, name, total_floors, units_per_floor)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(name)
        .bind(payload.total_floors)
        .bind(payload.units_per_floor)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, &format!("Tower '{}' already exists in this project.", name)))
    }

    pub async fn list_towers_by_project<'e, E>(
        &self,
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Tower>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let towers = sqlx::query_as::<_, Tower>(
            "SELECT * FROM towers WHERE project_id = $1 ORDER BY name ASC",
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;
        Ok(towers)
    }

    // =========================================================================
    //  UNITS
    // =========================================================================

    /// Inserts a unit under `tower_id`, copying the tower's project.
    /// Returns `None` when the tower does not exist.
    pub async fn create_unit<'e, E>(
        &self,
        executor: E,
        payload: &CreateUnitPayload,
    ) -> Result<Option<Unit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let unit_number = payload.unit_number.as_deref().unwrap_or_default();

        sqlx::query_as::<_, Unit>(
            r#"
            INSERT INTO units (
                project_id, tower_id, unit_number, floor, unit_type,
                area, price, facing, status
            )
            SELECT t.project_id, t.id, $2, $3, $4, $5, $6, $7, $8
            FROM towers t
            WHERE t.id = $1
            RETURNING *
            "#,
        )
        .bind(payload.tower_id)
        .bind(unit_number)
        .bind(payload.floor)
        .bind(payload.unit_type.as_deref())
        .bind(payload.area)
        .bind(payload.price)
        .bind(payload.facing.as_deref())
        .bind(payload.status.unwrap_or(UnitStatus::Available))
        .fetch_optional(executor)
        .await
        .map_err(|e| map_write_error(e, &format!("Unit '{}' already exists in this tower.", unit_number)))
    }

    pub async fn get_unit<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Unit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let unit = sqlx::query_as::<_, Unit>("SELECT * FROM units WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(unit)
    }

    pub async fn list_units<'e, E>(&self, executor: E, filter: &UnitQuery) -> Result<Vec<Unit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let units = sqlx::query_as::<_, Unit>(
            r#"
            SELECT * FROM units
            WHERE ($1::unit_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR project_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.project_id)
        .fetch_all(executor)
        .await?;
        Ok(units)
    }

    pub async fn list_units_by_project<'e, E>(
        &self,
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Unit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let units = sqlx::query_as::<_, Unit>(
            r#"
            SELECT u.* FROM units u
            JOIN towers t ON t.id = u.tower_id
            WHERE u.project_id = $1
            ORDER BY t.name ASC, u.floor ASC, u.unit_number ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;
        Ok(units)
    }

    /// Descriptive fields only, status is left alone.
    pub async fn update_unit<'e, E>(&self, executor: E, unit: &Unit) -> Result<Unit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Unit>(
            r#"
            UPDATE units
            SET unit_number = $2, floor = $3, unit_type = $4, area = $5,
                price = $6, facing = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(unit.id)
        .bind(&unit.unit_number)
        .bind(unit.floor)
        .bind(&unit.unit_type)
        .bind(unit.area)
        .bind(unit.price)
        .bind(unit.facing.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, &format!("Unit '{}' already exists in this tower.", unit.unit_number)))
    }

    /// Moves the unit to `target` only if its current status is one of
    /// `allowed_from`. Check and write happen in one statement; `None`
    /// means the unit is missing or in a status the table does not allow.
    pub async fn transition_unit_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        target: UnitStatus,
        allowed_from: &[UnitStatus],
    ) -> Result<Option<Unit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let allowed: Vec<String> = allowed_from.iter().map(|s| s.as_str().to_string()).collect();

        let unit = sqlx::query_as::<_, Unit>(
            r#"
            UPDATE units
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status::text = ANY($3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(target)
        .bind(allowed)
        .fetch_optional(executor)
        .await?;

        Ok(unit)
    }
}
