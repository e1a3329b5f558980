pub mod check_service;
pub mod systemctl;

pub use check_service::CheckServiceModule;
pub use systemctl::{ServiceOperations, ServiceStatus, SystemctlClient};
