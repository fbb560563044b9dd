// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- System / Auth ---
        handlers::auth::health,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::get_user,

        // --- Dashboard ---
        handlers::dashboard::get_metrics,

        // --- Inventory ---
        handlers::inventory::create_project,
        handlers::inventory::list_projects,
        handlers::inventory::get_project,
        handlers::inventory::update_project,
        handlers::inventory::list_project_units,
        handlers::inventory::create_tower,
        handlers::inventory::list_towers,
        handlers::inventory::create_unit,
        handlers::inventory::list_units,
        handlers::inventory::get_unit,
        handlers::inventory::update_unit,
        handlers::inventory::change_unit_status,

        // --- CRM ---
        handlers::crm::create_lead,
        handlers::crm::list_leads,
        handlers::crm::get_pipeline,
        handlers::crm::get_lead,
        handlers::crm::update_lead,
        handlers::crm::list_lead_communications,
        handlers::crm::create_communication,
        handlers::crm::list_communications,
        handlers::crm::create_customer,
        handlers::crm::list_customers,
        handlers::crm::get_customer,
        handlers::crm::update_customer,
        handlers::crm::create_channel_partner,
        handlers::crm::list_channel_partners,
        handlers::crm::get_channel_partner,
        handlers::crm::update_channel_partner,

        // --- Finance ---
        handlers::finance::create_booking,
        handlers::finance::list_bookings,
        handlers::finance::get_booking,
        handlers::finance::update_booking,
        handlers::finance::list_booking_payments,
        handlers::finance::create_payment,
        handlers::finance::list_payments,
        handlers::finance::get_payment,
        handlers::finance::update_payment,
    ),
    components(
        schemas(
            // --- Errors ---
            common::error::ErrorBody,
            common::error::FieldError,

            // --- Users ---
            models::user::UserRole,
            models::user::User,
            models::user::LoginPayload,
            models::user::AuthResponse,

            // --- Dashboard ---
            models::dashboard::DashboardMetrics,
            models::dashboard::StatusCount,
            models::dashboard::SourceCount,
            models::dashboard::TopPerformer,

            // --- Inventory ---
            models::inventory::Project,
            models::inventory::CreateProjectPayload,
            models::inventory::UpdateProjectPayload,
            models::inventory::Tower,
            models::inventory::CreateTowerPayload,
            models::inventory::UnitStatus,
            models::inventory::Unit,
            models::inventory::CreateUnitPayload,
            models::inventory::UpdateUnitPayload,
            models::inventory::UnitStatusPayload,

            // --- CRM ---
            models::crm::LeadStatus,
            models::crm::LeadSource,
            models::crm::CommunicationType,
            models::crm::Lead,
            models::crm::CreateLeadPayload,
            models::crm::UpdateLeadPayload,
            models::crm::PipelineStage,
            models::crm::Communication,
            models::crm::CreateCommunicationPayload,
            models::crm::Customer,
            models::crm::CreateCustomerPayload,
            models::crm::UpdateCustomerPayload,
            models::crm::ChannelPartner,
            models::crm::CreateChannelPartnerPayload,
            models::crm::UpdateChannelPartnerPayload,

            // --- Finance ---
            models::finance::BookingStatus,
            models::finance::PaymentStatus,
            models::finance::PaymentMethod,
            models::finance::Booking,
            models::finance::CreateBookingPayload,
            models::finance::UpdateBookingPayload,
            models::finance::Payment,
            models::finance::CreatePaymentPayload,
            models::finance::UpdatePaymentPayload,
        )
    ),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Auth", description = "Login and tokens"),
        (name = "Users", description = "Staff accounts"),
        (name = "Dashboard", description = "Sales metrics"),
        (name = "Inventory", description = "Projects, towers and units"),
        (name = "CRM", description = "Leads, communications, customers and channel partners"),
        (name = "Finance", description = "Bookings and payments")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
