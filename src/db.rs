pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
#[cfg(test)]
pub mod test_support;
