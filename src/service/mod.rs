pub mod audit;
pub mod config;
pub mod notifications;
pub mod policy;
pub mod requests;
