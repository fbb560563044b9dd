// src/services/crm_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, lock_row},
        error::AppError,
    },
    db::CrmRepository,
    models::crm::{
        ChannelPartner, Communication, CreateChannelPartnerPayload, CreateCommunicationPayload,
        CreateCustomerPayload, CreateLeadPayload, Customer, Lead, LeadFilter, PipelineStage,
        UpdateChannelPartnerPayload, UpdateCustomerPayload, UpdateLeadPayload,
    },
    services::pipeline,
};

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
}

impl CrmService {
    pub fn new(repo: CrmRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    pub async fn create_lead<'e, E>(&self, executor: E, payload: &CreateLeadPayload) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = self.repo.create_lead(executor, payload).await?;
        tracing::info!(lead_id = %lead.id, "lead created");
        Ok(lead)
    }

    pub async fn get_lead<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_lead(executor, id).await
    }

    pub async fn list_leads<'e, E>(&self, executor: E, filter: LeadFilter) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        match filter {
            LeadFilter::All => self.repo.list_leads(executor).await,
            LeadFilter::Search(query) => self.search_leads(executor, &query).await,
            LeadFilter::Status(status) => self.repo.list_leads_by_status(executor, status).await,
            LeadFilter::Assignee(user_id) => self.repo.list_leads_by_assignee(executor, user_id).await,
        }
    }

    /// Case-insensitive substring match over name, phone and e-mail.
    /// A blank query returns every lead.
    pub async fn search_leads<'e, E>(&self, executor: E, query: &str) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        match like_pattern(query) {
            Some(pattern) => self.repo.search_leads(executor, &pattern).await,
            None => self.repo.list_leads(executor).await,
        }
    }

    /// Applies `patch` to the locked row, so a concurrent patch is merged
    /// into the other one's result instead of overwriting it.
    pub async fn update_lead<'a, A>(&self, conn: A, id: Uuid, patch: UpdateLeadPayload) -> Result<Lead, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        if !lock_row(&mut *tx, "leads", id).await? {
            return Err(AppError::NotFound("Lead"));
        }

        let mut lead = self
            .repo
            .get_lead(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Lead"))?;

        patch.apply_to(&mut lead);
        let updated = self.repo.update_lead(&mut *tx, &lead).await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn lead_pipeline<'e, E>(&self, executor: E) -> Result<Vec<PipelineStage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = self.repo.list_leads(executor).await?;
        Ok(pipeline::group_by_status(&leads))
    }

    // =========================================================================
    //  COMMUNICATIONS
    // =========================================================================

    pub async fn log_communication<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        payload: &CreateCommunicationPayload,
    ) -> Result<Communication, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_communication(executor, user_id, payload).await
    }

    pub async fn list_communications<'e, E>(&self, executor: E) -> Result<Vec<Communication>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_communications(executor).await
    }

    pub async fn list_communications_by_lead<'a, A>(
        &self,
        conn: A,
        lead_id: Uuid,
    ) -> Result<Vec<Communication>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        if self.repo.get_lead(&mut *conn, lead_id).await?.is_none() {
            return Err(AppError::NotFound("Lead"));
        }

        self.repo.list_communications_by_lead(&mut *conn, lead_id).await
    }

    // =========================================================================
    //  CUSTOMERS
    // =========================================================================

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        payload: &CreateCustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = self.repo.create_customer(executor, payload).await?;
        tracing::info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    pub async fn get_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_customer(executor, id).await
    }

    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        search: Option<&str>,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        match search.and_then(like_pattern) {
            Some(pattern) => self.repo.search_customers(executor, &pattern).await,
            None => self.repo.list_customers(executor).await,
        }
    }

    pub async fn update_customer<'a, A>(
        &self,
        conn: A,
        id: Uuid,
        patch: UpdateCustomerPayload,
    ) -> Result<Customer, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        if !lock_row(&mut *tx, "customers", id).await? {
            return Err(AppError::NotFound("Customer"));
        }

        let mut customer = self
            .repo
            .get_customer(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Customer"))?;

        patch.apply_to(&mut customer);
        let updated = self.repo.update_customer(&mut *tx, &customer).await?;

        tx.commit().await?;
        Ok(updated)
    }

    // =========================================================================
    //  CHANNEL PARTNERS
    // =========================================================================

    pub async fn create_channel_partner<'e, E>(
        &self,
        executor: E,
        payload: &CreateChannelPartnerPayload,
    ) -> Result<ChannelPartner, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_channel_partner(executor, payload).await
    }

    pub async fn get_channel_partner<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ChannelPartner>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_channel_partner(executor, id).await
    }

    pub async fn list_channel_partners<'e, E>(&self, executor: E) -> Result<Vec<ChannelPartner>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_channel_partners(executor).await
    }

    pub async fn update_channel_partner<'a, A>(
        &self,
        conn: A,
        id: Uuid,
        patch: UpdateChannelPartnerPayload,
    ) -> Result<ChannelPartner, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        if !lock_row(&mut *tx, "channel_partners", id).await? {
            return Err(AppError::NotFound("Channel partner"));
        }

        let mut partner = self
            .repo
            .get_channel_partner(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Channel partner"))?;

        patch.apply_to(&mut partner);
        let updated = self.repo.update_channel_partner(&mut *tx, &partner).await?;

        tx.commit().await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::test_support::TestDb, models::crm::LeadStatus};

    fn service() -> CrmService {
        CrmService::new(CrmRepository::new())
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let Some(db) = TestDb::new().await else { return };
        let crm = service();

        let exact = db.lead("100% Sure Buyer", "9845000001").await;
        db.lead("1000 Acres Investor", "9845000002").await;
        db.lead("Under_score Holdings", "9845000003").await;
        db.lead("Underwood Family", "9845000004").await;

        let hits = crm.search_leads(&db.pool, "100%").await.unwrap();
        assert_eq!(hits.iter().map(|l| l.id).collect::<Vec<_>>(), vec![exact.id]);

        let hits = crm.search_leads(&db.pool, "under_").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Under_score Holdings");

        assert_eq!(crm.search_leads(&db.pool, "  ").await.unwrap().len(), 4);

        db.cleanup().await;
    }

    #[tokio::test]
    async fn concurrent_patches_to_different_fields_both_survive() {
        let Some(db) = TestDb::new().await else { return };
        let crm = service();

        for i in 0..5 {
            let lead = db.lead(&format!("Lead {i}"), &format!("98450100{i:02}")).await;

            let status_patch = UpdateLeadPayload { status: Some(LeadStatus::Contacted), ..Default::default() };
            let notes_patch = UpdateLeadPayload { notes: Some("Call back after 6pm".into()), ..Default::default() };

            let (a, b) = tokio::join!(
                crm.update_lead(&db.pool, lead.id, status_patch),
                crm.update_lead(&db.pool, lead.id, notes_patch),
            );
            a.unwrap();
            b.unwrap();

            let stored = crm.get_lead(&db.pool, lead.id).await.unwrap().unwrap();
            assert_eq!(stored.status, Some(LeadStatus::Contacted));
            assert_eq!(stored.notes.as_deref(), Some("Call back after 6pm"));
        }

        db.cleanup().await;
    }

    #[tokio::test]
    async fn patching_a_missing_lead_is_not_found() {
        let Some(db) = TestDb::new().await else { return };

        let err = service()
            .update_lead(&db.pool, Uuid::new_v4(), UpdateLeadPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Lead")));

        db.cleanup().await;
    }
}
