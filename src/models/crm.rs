// src/models/crm.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::common::validation::{check_amount, validate_not_negative, validate_with, MONEY, RATE};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    SiteVisit,
    Negotiation,
    Booking,
    #[serde(alias = "sale")]
    Sold,
    Lost,
}

impl LeadStatus {
    /// Funnel order, used for the pipeline board.
    pub const PIPELINE: [LeadStatus; 7] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::SiteVisit,
        LeadStatus::Negotiation,
        LeadStatus::Booking,
        LeadStatus::Sold,
        LeadStatus::Lost,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Website,
    Referral,
    SocialMedia,
    WalkIn,
    Phone,
    Email,
    Advertisement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "communication_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommunicationType {
    Call,
    Email,
    Sms,
    Meeting,
    SiteVisit,
}

// =========================================================================
//  LEADS
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = "Rahul Mehta")]
    pub name: String,
    #[schema(example = "rahul.mehta@example.com")]
    pub email: Option<String>,
    #[schema(example = "9845012345")]
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub source: LeadSource,
    // Legacy rows may have no status.
    pub status: Option<LeadStatus>,
    #[schema(example = "7500000.00")]
    pub budget: Option<Decimal>,
    pub preferred_location: Option<String>,
    pub requirements: Option<String>,
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub channel_partner_id: Option<Uuid>,
    pub next_follow_up: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Every field is optional at the serde level so a single request reports
// all missing fields at once instead of failing on the first one.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(required(message = "This field is required."), length(min = 2, message = "The name must have at least 2 characters."))]
    #[schema(example = "Rahul Mehta")]
    pub name: Option<String>,

    #[validate(email(message = "The e-mail address is invalid."))]
    #[schema(example = "rahul.mehta@example.com")]
    pub email: Option<String>,

    #[validate(required(message = "This field is required."), length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    #[schema(example = "9845012345")]
    pub phone: Option<String>,

    #[validate(length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    pub alternate_phone: Option<String>,

    #[validate(required(message = "This field is required."))]
    pub source: Option<LeadSource>,

    pub status: Option<LeadStatus>,
    pub budget: Option<Decimal>,
    pub preferred_location: Option<String>,
    pub requirements: Option<String>,
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub channel_partner_id: Option<Uuid>,
    pub next_follow_up: Option<DateTime<Utc>>,
}

impl CreateLeadPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "budget", self.budget.as_ref(), MONEY, validate_not_negative);
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    #[validate(length(min = 2, message = "The name must have at least 2 characters."))]
    pub name: Option<String>,
    #[validate(email(message = "The e-mail address is invalid."))]
    pub email: Option<String>,
    #[validate(length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    pub phone: Option<String>,
    #[validate(length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    pub alternate_phone: Option<String>,
    pub source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    pub budget: Option<Decimal>,
    pub preferred_location: Option<String>,
    pub requirements: Option<String>,
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub channel_partner_id: Option<Uuid>,
    pub next_follow_up: Option<DateTime<Utc>>,
}

impl UpdateLeadPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "budget", self.budget.as_ref(), MONEY, validate_not_negative);
        })
    }

    /// Absent fields leave the stored value untouched.
    pub fn apply_to(self, lead: &mut Lead) {
        if let Some(v) = self.name { lead.name = v; }
        if let Some(v) = self.email { lead.email = Some(v); }
        if let Some(v) = self.phone { lead.phone = v; }
        if let Some(v) = self.alternate_phone { lead.alternate_phone = Some(v); }
        if let Some(v) = self.source { lead.source = v; }
        if let Some(v) = self.status { lead.status = Some(v); }
        if let Some(v) = self.budget { lead.budget = Some(v); }
        if let Some(v) = self.preferred_location { lead.preferred_location = Some(v); }
        if let Some(v) = self.requirements { lead.requirements = Some(v); }
        if let Some(v) = self.notes { lead.notes = Some(v); }
        if let Some(v) = self.assigned_to { lead.assigned_to = Some(v); }
        if let Some(v) = self.project_id { lead.project_id = Some(v); }
        if let Some(v) = self.unit_id { lead.unit_id = Some(v); }
        if let Some(v) = self.channel_partner_id { lead.channel_partner_id = Some(v); }
        if let Some(v) = self.next_follow_up { lead.next_follow_up = Some(v); }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeadQuery {
    /// Free text over name, phone and e-mail.
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    /// User id the lead is assigned to.
    pub assignee: Option<Uuid>,
}

/// The single filter honoured by `GET /api/leads`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadFilter {
    All,
    Search(String),
    Status(LeadStatus),
    Assignee(Uuid),
}

impl LeadQuery {
    // search > status > assignee; a blank search counts as absent.
    pub fn into_filter(self) -> LeadFilter {
        match self {
            LeadQuery { search: Some(q), .. } if !q.trim().is_empty() => LeadFilter::Search(q),
            LeadQuery { status: Some(s), .. } => LeadFilter::Status(s),
            LeadQuery { assignee: Some(a), .. } => LeadFilter::Assignee(a),
            _ => LeadFilter::All,
        }
    }
}

/// One column of the pipeline board.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    pub status: LeadStatus,
    pub count: usize,
    pub leads: Vec<Lead>,
}

// =========================================================================
//  COMMUNICATIONS
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub user_id: Uuid,
    pub communication_type: CommunicationType,
    #[schema(example = "Follow-up on 2BHK pricing")]
    pub subject: Option<String>,
    pub content: String,
    pub outcome: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommunicationPayload {
    #[validate(required(message = "This field is required."))]
    pub lead_id: Option<Uuid>,
    #[validate(required(message = "This field is required."))]
    pub communication_type: Option<CommunicationType>,
    pub subject: Option<String>,
    #[validate(required(message = "This field is required."), length(min = 1, message = "This field is required."))]
    pub content: Option<String>,
    pub outcome: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

// =========================================================================
//  CUSTOMERS
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub lead_id: Option<Uuid>,
    #[schema(example = "Rahul Mehta")]
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    #[schema(example = "ABCDE1234F")]
    pub pan_number: Option<String>,
    pub aadhar_number: Option<String>,
    pub occupation: Option<String>,
    pub annual_income: Option<Decimal>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    pub lead_id: Option<Uuid>,
    #[validate(required(message = "This field is required."), length(min = 2, message = "The name must have at least 2 characters."))]
    pub full_name: Option<String>,
    #[validate(email(message = "The e-mail address is invalid."))]
    pub email: Option<String>,
    #[validate(required(message = "This field is required."), length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    pub phone: Option<String>,
    #[validate(length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    pub alternate_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[validate(length(equal = 6, message = "The pincode must have 6 digits."))]
    pub pincode: Option<String>,
    #[validate(length(equal = 10, message = "The PAN must have 10 characters."))]
    pub pan_number: Option<String>,
    #[validate(length(equal = 12, message = "The Aadhaar number must have 12 digits."))]
    pub aadhar_number: Option<String>,
    pub occupation: Option<String>,
    pub annual_income: Option<Decimal>,
    pub assigned_to: Option<Uuid>,
}

impl CreateCustomerPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "annual_income", self.annual_income.as_ref(), MONEY, validate_not_negative);
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 2, message = "The name must have at least 2 characters."))]
    pub full_name: Option<String>,
    #[validate(email(message = "The e-mail address is invalid."))]
    pub email: Option<String>,
    #[validate(length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    pub phone: Option<String>,
    #[validate(length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    pub alternate_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[validate(length(equal = 6, message = "The pincode must have 6 digits."))]
    pub pincode: Option<String>,
    #[validate(length(equal = 10, message = "The PAN must have 10 characters."))]
    pub pan_number: Option<String>,
    #[validate(length(equal = 12, message = "The Aadhaar number must have 12 digits."))]
    pub aadhar_number: Option<String>,
    pub occupation: Option<String>,
    pub annual_income: Option<Decimal>,
    pub assigned_to: Option<Uuid>,
}

impl UpdateCustomerPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "annual_income", self.annual_income.as_ref(), MONEY, validate_not_negative);
        })
    }

    pub fn apply_to(self, customer: &mut Customer) {
        if let Some(v) = self.full_name { customer.full_name = v; }
        if let Some(v) = self.email { customer.email = Some(v); }
        if let Some(v) = self.phone { customer.phone = v; }
        if let Some(v) = self.alternate_phone { customer.alternate_phone = Some(v); }
        if let Some(v) = self.address { customer.address = Some(v); }
        if let Some(v) = self.city { customer.city = Some(v); }
        if let Some(v) = self.state { customer.state = Some(v); }
        if let Some(v) = self.pincode { customer.pincode = Some(v); }
        if let Some(v) = self.pan_number { customer.pan_number = Some(v); }
        if let Some(v) = self.aadhar_number { customer.aadhar_number = Some(v); }
        if let Some(v) = self.occupation { customer.occupation = Some(v); }
        if let Some(v) = self.annual_income { customer.annual_income = Some(v); }
        if let Some(v) = self.assigned_to { customer.assigned_to = Some(v); }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerQuery {
    /// Free text over name, phone and e-mail.
    pub search: Option<String>,
}

// =========================================================================
//  CHANNEL PARTNERS
// =========================================================================

// `total_leads` and `total_sales` are counted from the leads table on read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPartner {
    pub id: Uuid,
    #[schema(example = "Sunil Rao")]
    pub name: String,
    #[schema(example = "Rao Realty Brokers")]
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: String,
    #[schema(example = "2.50")]
    pub commission_rate: Decimal,
    pub total_leads: i64,
    pub total_sales: i64,
    pub total_commission: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelPartnerPayload {
    #[validate(required(message = "This field is required."), length(min = 2, message = "The name must have at least 2 characters."))]
    pub name: Option<String>,
    pub company_name: Option<String>,
    #[validate(email(message = "The e-mail address is invalid."))]
    pub email: Option<String>,
    #[validate(required(message = "This field is required."), length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    pub phone: Option<String>,
    pub commission_rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl CreateChannelPartnerPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "commission_rate", self.commission_rate.as_ref(), RATE, validate_not_negative);
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelPartnerPayload {
    #[validate(length(min = 2, message = "The name must have at least 2 characters."))]
    pub name: Option<String>,
    pub company_name: Option<String>,
    #[validate(email(message = "The e-mail address is invalid."))]
    pub email: Option<String>,
    #[validate(length(min = 10, max = 15, message = "The phone number must have 10 to 15 digits."))]
    pub phone: Option<String>,
    pub commission_rate: Option<Decimal>,
    pub total_commission: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl UpdateChannelPartnerPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        validate_with(self, |errors| {
            check_amount(errors, "commission_rate", self.commission_rate.as_ref(), RATE, validate_not_negative);
            check_amount(errors, "total_commission", self.total_commission.as_ref(), MONEY, validate_not_negative);
        })
    }

    pub fn apply_to(self, partner: &mut ChannelPartner) {
        if let Some(v) = self.name { partner.name = v; }
        if let Some(v) = self.company_name { partner.company_name = Some(v); }
        if let Some(v) = self.email { partner.email = Some(v); }
        if let Some(v) = self.phone { partner.phone = v; }
        if let Some(v) = self.commission_rate { partner.commission_rate = v; }
        if let Some(v) = self.total_commission { partner.total_commission = v; }
        if let Some(v) = self.is_active { partner.is_active = v; }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_lead() -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: "Rahul Mehta".into(),
            email: Some("rahul@example.com".into()),
            phone: "9845012345".into(),
            alternate_phone: None,
            source: LeadSource::Website,
            status: Some(LeadStatus::New),
            budget: Some(Decimal::new(7_500_000, 0)),
            preferred_location: Some("Whitefield".into()),
            requirements: Some("2BHK, east facing".into()),
            notes: None,
            assigned_to: Some(Uuid::new_v4()),
            project_id: Some(Uuid::new_v4()),
            unit_id: None,
            channel_partner_id: None,
            next_follow_up: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn status_only_patch_is_non_destructive() {
        let mut lead = sample_lead();
        let before = serde_json::to_value(&lead).unwrap();

        let patch: UpdateLeadPayload = serde_json::from_value(json!({ "status": "contacted" })).unwrap();
        patch.apply_to(&mut lead);

        let mut after = serde_json::to_value(&lead).unwrap();
        assert_eq!(after["status"], "contacted");

        after["status"] = before["status"].clone();
        assert_eq!(after, before);
    }

    #[test]
    fn missing_phone_and_bad_email_are_both_reported() {
        let payload: CreateLeadPayload = serde_json::from_value(json!({
            "name": "Rahul Mehta",
            "email": "not-an-email",
            "source": "website"
        }))
        .unwrap();

        let errors = payload.validate_all().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn valid_lead_payload_passes() {
        let payload: CreateLeadPayload = serde_json::from_value(json!({
            "name": "Rahul Mehta",
            "phone": "9845012345",
            "source": "walk_in",
            "budget": "6500000"
        }))
        .unwrap();
        assert!(payload.validate_all().is_ok());
    }

    #[test]
    fn negative_budget_is_rejected() {
        let payload: CreateLeadPayload = serde_json::from_value(json!({
            "name": "Rahul Mehta",
            "phone": "9845012345",
            "source": "website",
            "budget": "-1"
        }))
        .unwrap();
        let errors = payload.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("budget"));
    }

    #[test]
    fn sale_is_accepted_as_sold() {
        let status: LeadStatus = serde_json::from_value(json!("sale")).unwrap();
        assert_eq!(status, LeadStatus::Sold);
        assert_eq!(serde_json::to_value(LeadStatus::Sold).unwrap(), json!("sold"));
        assert_eq!(serde_json::to_value(LeadStatus::SiteVisit).unwrap(), json!("site_visit"));
    }

    #[test]
    fn search_wins_over_status_and_assignee() {
        let q = LeadQuery {
            search: Some("rahul".into()),
            status: Some(LeadStatus::New),
            assignee: Some(Uuid::new_v4()),
        };
        assert_eq!(q.into_filter(), LeadFilter::Search("rahul".into()));
    }

    #[test]
    fn status_wins_over_assignee() {
        let q = LeadQuery { search: None, status: Some(LeadStatus::Lost), assignee: Some(Uuid::new_v4()) };
        assert_eq!(q.into_filter(), LeadFilter::Status(LeadStatus::Lost));
    }

    #[test]
    fn blank_search_falls_through() {
        let user = Uuid::new_v4();
        let q = LeadQuery { search: Some("  ".into()), status: None, assignee: Some(user) };
        assert_eq!(q.into_filter(), LeadFilter::Assignee(user));
        assert_eq!(LeadQuery::default().into_filter(), LeadFilter::All);
    }

    #[test]
    fn customer_kyc_lengths_are_checked() {
        let payload: CreateCustomerPayload = serde_json::from_value(json!({
            "fullName": "Rahul Mehta",
            "phone": "9845012345",
            "panNumber": "ABC",
            "pincode": "5600"
        }))
        .unwrap();
        let errors = payload.validate_all().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("pan_number"));
        assert!(fields.contains_key("pincode"));
    }

    #[test]
    fn partner_patch_updates_commission_only() {
        let mut partner = ChannelPartner {
            id: Uuid::new_v4(),
            name: "Sunil".into(),
            company_name: None,
            email: None,
            phone: "9845000000".into(),
            commission_rate: Decimal::new(25, 1),
            total_leads: 4,
            total_sales: 1,
            total_commission: Decimal::ZERO,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        UpdateChannelPartnerPayload { total_commission: Some(Decimal::new(150_000, 0)), ..Default::default() }
            .apply_to(&mut partner);
        assert_eq!(partner.total_commission, Decimal::new(150_000, 0));
        assert_eq!(partner.commission_rate, Decimal::new(25, 1));
        assert_eq!(partner.name, "Sunil");
    }
}
