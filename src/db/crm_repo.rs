// src/db/crm_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_write_error, error::AppError},
    models::crm::{
        ChannelPartner, Communication, CreateChannelPartnerPayload, CreateCommunicationPayload,
        CreateCustomerPayload, CreateLeadPayload, Customer, Lead, LeadStatus,
    },
};

#[derive(Clone, Default)]
pub struct CrmRepository;

impl CrmRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    pub async fn create_lead<'e, E>(&self, executor: E, payload: &CreateLeadPayload) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                name, email, phone, alternate_phone, source, status, budget,
                preferred_location, requirements, notes, assigned_to, project_id,
                unit_id, channel_partner_id, next_follow_up
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(payload.name.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.alternate_phone.as_deref())
        .bind(payload.source)
        .bind(payload.status.unwrap_or(LeadStatus::New))
        .bind(payload.budget)
        .bind(payload.preferred_location.as_deref())
        .bind(payload.requirements.as_deref())
        .bind(payload.notes.as_deref())
        .bind(payload.assigned_to)
        .bind(payload.project_id)
        .bind(payload.unit_id)
        .bind(payload.channel_partner_id)
        .bind(payload.next_follow_up)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "This lead already exists."))
    }

    pub async fn get_lead<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(lead)
    }

    pub async fn list_leads<'e, E>(&self, executor: E) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY created_at DESC")
            .fetch_all(executor)
            .await?;
        Ok(leads)
    }

    pub async fn list_leads_by_status<'e, E>(
        &self,
        executor: E,
        status: LeadStatus,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = sqlx::query_as::<_, Lead>(
            "SELECT * FROM leads WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(executor)
        .await?;
        Ok(leads)
    }

    pub async fn list_leads_by_assignee<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = sqlx::query_as::<_, Lead>(
            "SELECT * FROM leads WHERE assigned_to = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(leads)
    }

    /// `pattern` is an already escaped ILIKE pattern (see `like_pattern`).
    pub async fn search_leads<'e, E>(&self, executor: E, pattern: &str) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(pattern)
        .fetch_all(executor)
        .await?;
        Ok(leads)
    }

    pub async fn update_lead<'e, E>(&self, executor: E, lead: &Lead) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET name = $2, email = $3, phone = $4, alternate_phone = $5, source = $6,
                status = $7, budget = $8, preferred_location = $9, requirements = $10,
                notes = $11, assigned_to = $12, project_id = $13, unit_id = $14,
                channel_partner_id = $15, next_follow_up = $16, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lead.id)
        .bind(&lead.name)
        .bind(lead.email.as_deref())
        .bind(&lead.phone)
        .bind(lead.alternate_phone.as_deref())
        .bind(lead.source)
        .bind(lead.status)
        .bind(lead.budget)
        .bind(lead.preferred_location.as_deref())
        .bind(lead.requirements.as_deref())
        .bind(lead.notes.as_deref())
        .bind(lead.assigned_to)
        .bind(lead.project_id)
        .bind(lead.unit_id)
        .bind(lead.channel_partner_id)
        .bind(lead.next_follow_up)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "This lead already exists."))
    }

    // =========================================================================
    //  COMMUNICATIONS
    // =========================================================================

    pub async fn create_communication<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        payload: &CreateCommunicationPayload,
    ) -> Result<Communication, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Communication>(
            r#"
            INSERT INTO communications (
                lead_id, user_id, communication_type, subject, content,
                outcome, scheduled_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(payload.lead_id)
        .bind(user_id)
        .bind(payload.communication_type)
        .bind(payload.subject.as_deref())
        .bind(payload.content.as_deref())
        .bind(payload.outcome.as_deref())
        .bind(payload.scheduled_at)
        .bind(payload.completed_at)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "This communication was already logged."))
    }

    pub async fn list_communications<'e, E>(&self, executor: E) -> Result<Vec<Communication>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, Communication>(
            "SELECT * FROM communications ORDER BY created_at DESC",
        )
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_communications_by_lead<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
    ) -> Result<Vec<Communication>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, Communication>(
            "SELECT * FROM communications WHERE lead_id = $1 ORDER BY created_at DESC",
        )
        .bind(lead_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
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
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                lead_id, full_name, email, phone, alternate_phone, address, city,
                state, pincode, pan_number, aadhar_number, occupation,
                annual_income, assigned_to
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(payload.lead_id)
        .bind(payload.full_name.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.alternate_phone.as_deref())
        .bind(payload.address.as_deref())
        .bind(payload.city.as_deref())
        .bind(payload.state.as_deref())
        .bind(payload.pincode.as_deref())
        .bind(payload.pan_number.as_deref())
        .bind(payload.aadhar_number.as_deref())
        .bind(payload.occupation.as_deref())
        .bind(payload.annual_income)
        .bind(payload.assigned_to)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "This customer already exists."))
    }

    pub async fn get_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn list_customers<'e, E>(&self, executor: E) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC")
            .fetch_all(executor)
            .await?;
        Ok(customers)
    }

    pub async fn search_customers<'e, E>(&self, executor: E, pattern: &str) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE full_name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(pattern)
        .fetch_all(executor)
        .await?;
        Ok(customers)
    }

    pub async fn update_customer<'e, E>(&self, executor: E, customer: &Customer) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET full_name = $2, email = $3, phone = $4, alternate_phone = $5,
                address = $6, city = $7, state = $8, pincode = $9, pan_number = $10,
                aadhar_number = $11, occupation = $12, annual_income = $13,
                assigned_to = $14, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(&customer.full_name)
        .bind(customer.email.as_deref())
        .bind(&customer.phone)
        .bind(customer.alternate_phone.as_deref())
        .bind(customer.address.as_deref())
        .bind(customer.city.as_deref())
        .bind(customer.state.as_deref())
        .bind(customer.pincode.as_deref())
        .bind(customer.pan_number.as_deref())
        .bind(customer.aadhar_number.as_deref())
        .bind(customer.occupation.as_deref())
        .bind(customer.annual_income)
        .bind(customer.assigned_to)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "This customer already exists."))
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
        sqlx::query_as::<_, ChannelPartner>(
            r#"
            INSERT INTO channel_partners (name, company_name, email, phone, commission_rate, is_active)
            VALUES ($1, $2, $3, $4, COALESCE($5, 0), $6)
            RETURNING *, 0::BIGINT AS total_leads, 0::BIGINT AS total_sales
            "#,
        )
        .bind(payload.name.as_deref())
        .bind(payload.company_name.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.commission_rate)
        .bind(payload.is_active.unwrap_or(true))
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "A channel partner with this e-mail already exists."))
    }

    pub async fn get_channel_partner<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ChannelPartner>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let partner = sqlx::query_as::<_, ChannelPartner>(
            "SELECT * FROM channel_partner_overview WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(partner)
    }

    pub async fn list_channel_partners<'e, E>(&self, executor: E) -> Result<Vec<ChannelPartner>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let partners = sqlx::query_as::<_, ChannelPartner>(
            "SELECT * FROM channel_partner_overview ORDER BY created_at DESC",
        )
        .fetch_all(executor)
        .await?;
        Ok(partners)
    }

    pub async fn update_channel_partner<'e, E>(
        &self,
        executor: E,
        partner: &ChannelPartner,
    ) -> Result<ChannelPartner, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ChannelPartner>(
            r#"
            UPDATE channel_partners cp
            SET name = $2, company_name = $3, email = $4, phone = $5,
                commission_rate = $6, total_commission = $7, is_active = $8,
                updated_at = NOW()
            WHERE cp.id = $1
            RETURNING cp.*,
                (SELECT COUNT(*) FROM leads l WHERE l.channel_partner_id = cp.id) AS total_leads,
                (SELECT COUNT(*) FROM leads l WHERE l.channel_partner_id = cp.id AND l.status = 'sold') AS total_sales
            "#,
        )
        .bind(partner.id)
        .bind(&partner.name)
        .bind(partner.company_name.as_deref())
        .bind(partner.email.as_deref())
        .bind(&partner.phone)
        .bind(partner.commission_rate)
        .bind(partner.total_commission)
        .bind(partner.is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, "A channel partner with this e-mail already exists."))
    }
}
