pub mod admin;
pub mod auth;
pub mod leave_request;
pub mod notification;
pub mod reimbursement;
