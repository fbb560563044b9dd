// src/services/inventory_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::lock_row, error::AppError},
    db::InventoryRepository,
    models::inventory::{
        CreateProjectPayload, CreateTowerPayload, CreateUnitPayload, Project, Tower, Unit,
        UnitQuery, UnitStatus, UpdateProjectPayload, UpdateUnitPayload,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepository,
}

impl InventoryService {
    pub fn new(repo: InventoryRepository) -> Self {
        Self { repo }
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
        let project = self.repo.create_project(executor, payload).await?;
        tracing::info!(project_id = %project.id, "project created");
        Ok(project)
    }

    pub async fn get_project<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_project(executor, id).await
    }

    pub async fn list_projects<'e, E>(&self, executor: E) -> Result<Vec<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_projects(executor).await
    }

    pub async fn update_project<'a, A>(
        &self,
        conn: A,
        id: Uuid,
        patch: UpdateProjectPayload,
    ) -> Result<Project, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        if !lock_row(&mut *tx, "projects", id).await? {
            return Err(AppError::NotFound("Project"));
        }

        let mut project = self
            .repo
            .get_project(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Project"))?;

        patch.apply_to(&mut project);
        let updated = self.repo.update_project(&mut *tx, &project).await?;

        tx.commit().await?;
        Ok(updated)
    }

    // =========================================================================
    //  TOWERS
    // =========================================================================

    pub async fn create_tower<'a, A>(
        &self,
        conn: A,
        project_id: Uuid,
        payload: &CreateTowerPayload,
    ) -> Result<Tower, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_project(&mut *conn, project_id).await?;
        self.repo.create_tower(&mut *conn, project_id, payload).await
    }

    pub async fn list_towers<'a, A>(&self, conn: A, project_id: Uuid) -> Result<Vec<Tower>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_project(&mut *conn, project_id).await?;
        self.repo.list_towers_by_project(&mut *conn, project_id).await
    }

    // =========================================================================
    //  UNITS
    // =========================================================================

    pub async fn create_unit<'e, E>(&self, executor: E, payload: &CreateUnitPayload) -> Result<Unit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let unit = self
            .repo
            .create_unit(executor, payload)
            .await?
            .ok_or(AppError::NotFound("Tower"))?;

        tracing::info!(unit_id = %unit.id, project_id = %unit.project_id, "unit created");
        Ok(unit)
    }

    pub async fn get_unit<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Unit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_unit(executor, id).await
    }

    pub async fn list_units<'e, E>(&self, executor: E, filter: &UnitQuery) -> Result<Vec<Unit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_units(executor, filter).await
    }

    pub async fn list_units_by_project<'a, A>(&self, conn: A, project_id: Uuid) -> Result<Vec<Unit>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_project(&mut *conn, project_id).await?;
        self.repo.list_units_by_project(&mut *conn, project_id).await
    }

    /// Patches the descriptive fields of a unit. Status moves go through
    /// [`InventoryService::change_unit_status`].
    pub async fn update_unit<'a, A>(&self, conn: A, id: Uuid, patch: UpdateUnitPayload) -> Result<Unit, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        if !lock_row(&mut *tx, "units", id).await? {
            return Err(AppError::NotFound("Unit"));
        }

        let mut unit = self
            .repo
            .get_unit(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Unit"))?;

        patch.apply_to(&mut unit);
        let updated = self.repo.update_unit(&mut *tx, &unit).await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Moves a unit through the inventory state machine. The guard and the
    /// write are a single statement, so two racing moves cannot both pass.
    pub async fn change_unit_status<'a, A>(
        &self,
        conn: A,
        id: Uuid,
        target: UnitStatus,
    ) -> Result<Unit, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let allowed = UnitStatus::allowed_predecessors(target);

        if let Some(unit) = self
            .repo
            .transition_unit_status(&mut *conn, id, target, &allowed)
            .await?
        {
            tracing::info!(unit_id = %unit.id, status = target.as_str(), "unit status changed");
            return Ok(unit);
        }

        let current = self
            .repo
            .get_unit(&mut *conn, id)
            .await?
            .ok_or(AppError::NotFound("Unit"))?;

        Err(AppError::Conflict(format!(
            "Unit {} cannot move from '{}' to '{}'.",
            current.unit_number,
            current.status.as_str(),
            target.as_str()
        )))
    }

    async fn ensure_project<'e, E>(&self, executor: E, project_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        match self.repo.get_project(executor, project_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Project")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::TestDb;
    use rust_decimal::Decimal;

    fn service() -> InventoryService {
        InventoryService::new(InventoryRepository::new())
    }

    #[tokio::test]
    async fn illegal_status_move_is_a_conflict() {
        let Some(db) = TestDb::new().await else { return };
        let inventory = service();
        let project = db.project("Skyline Residency").await;
        let unit = db.unit(&project, "A-101").await;

        let err = inventory
            .change_unit_status(&db.pool, unit.id, UnitStatus::Sold)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let reserved = inventory
            .change_unit_status(&db.pool, unit.id, UnitStatus::Reserved)
            .await
            .unwrap();
        assert_eq!(reserved.status, UnitStatus::Reserved);

        let sold = inventory
            .change_unit_status(&db.pool, unit.id, UnitStatus::Sold)
            .await
            .unwrap();
        assert_eq!(sold.status, UnitStatus::Sold);

        let err = inventory
            .change_unit_status(&db.pool, unit.id, UnitStatus::Available)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = inventory
            .change_unit_status(&db.pool, Uuid::new_v4(), UnitStatus::Reserved)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Unit")));

        db.cleanup().await;
    }

    #[tokio::test]
    async fn project_counters_follow_unit_status() {
        let Some(db) = TestDb::new().await else { return };
        let inventory = service();
        let project = db.project("Lakeview Towers").await;
        assert_eq!((project.available_units, project.sold_units), (0, 0));

        let first = db.unit(&project, "B-1").await;
        db.unit(&project, "B-2").await;
        inventory.change_unit_status(&db.pool, first.id, UnitStatus::Reserved).await.unwrap();
        inventory.change_unit_status(&db.pool, first.id, UnitStatus::Sold).await.unwrap();

        let project = inventory.get_project(&db.pool, project.id).await.unwrap().unwrap();
        assert_eq!((project.available_units, project.sold_units), (1, 1));

        db.cleanup().await;
    }

    #[tokio::test]
    async fn concurrent_unit_patches_both_survive() {
        let Some(db) = TestDb::new().await else { return };
        let inventory = service();
        let project = db.project("Palm Grove").await;
        let unit = db.unit(&project, "C-7").await;

        let price_patch = UpdateUnitPayload { price: Some(Decimal::new(9_500_000, 0)), ..Default::default() };
        let facing_patch = UpdateUnitPayload { facing: Some("East".into()), ..Default::default() };

        let (a, b) = tokio::join!(
            inventory.update_unit(&db.pool, unit.id, price_patch),
            inventory.update_unit(&db.pool, unit.id, facing_patch),
        );
        a.unwrap();
        b.unwrap();

        let stored = inventory.get_unit(&db.pool, unit.id).await.unwrap().unwrap();
        assert_eq!(stored.price, Decimal::new(9_500_000, 0));
        assert_eq!(stored.facing.as_deref(), Some("East"));
        assert_eq!(stored.status, UnitStatus::Available);

        db.cleanup().await;
    }
}
