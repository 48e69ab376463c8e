pub mod audit_log;
pub mod global_config;
pub mod leave_request;
pub mod notification;
pub mod principal;
pub mod reimbursement;
pub mod request;
pub mod role;
pub mod user;
