pub mod crm;
pub mod dashboard;
pub mod finance;
pub mod inventory;
pub mod user;
