//! Persistence seams.
//!
//! Services only see these traits. Two backends implement them: MySQL
//! ([`mysql::MySqlStore`]) and an in-process one ([`memory`]) used when no
//! database is configured and throughout the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use derive_more::Display;

use crate::model::audit_log::{AuditFilter, AuditLogEntry, NewAuditEntry};
use crate::model::global_config::GlobalConfig;
use crate::model::request::{Decision, RequestStatus, WorkflowRequest};
use crate::model::role::Role;
use crate::model::user::User;

pub mod memory;
pub mod mysql;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum StoreError {
    #[display(fmt = "record not found")]
    NotFound,
    /// Optimistic version check failed.
    #[display(fmt = "record was modified concurrently")]
    Conflict,
    #[display(fmt = "storage unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage of one request kind. Listings are newest first.
#[async_trait]
pub trait RequestStore<R: WorkflowRequest>: Send + Sync {
    async fn insert(&self, employee_id: u64, owner_role: Role, draft: R::Draft, status: RequestStatus)
    -> StoreResult<R>;

    async fn fetch(&self, id: u64) -> StoreResult<Option<R>>;

    async fn list_for_employee(&self, employee_id: u64) -> StoreResult<Vec<R>>;

    async fn list_all(&self) -> StoreResult<Vec<R>>;

    /// Compare-and-swap on `(id, expected_version)`.
    async fn apply_decision(&self, id: u64, expected_version: u32, decision: &Decision) -> StoreResult<R>;

    /// Decided, not yet acknowledged requests owned by `employee_id`.
    async fn unseen_decisions(&self, employee_id: u64) -> StoreResult<Vec<R>>;

    /// Marks `(id, version)` pairs owned by `employee_id` as seen. Pairs whose
    /// version moved on are left alone. Returns how many rows changed.
    async fn mark_notified(&self, employee_id: u64, seen: &[(u64, u32)]) -> StoreResult<u64>;
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> StoreResult<Option<GlobalConfig>>;

    /// Creates the default record unless one exists; returns the live record either way.
    async fn insert_default(&self) -> StoreResult<GlobalConfig>;

    async fn save(&self, config: &GlobalConfig) -> StoreResult<GlobalConfig>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditLogEntry>;

    /// Newest first, at most `limit` rows.
    async fn query(&self, filter: &AuditFilter, limit: usize) -> StoreResult<Vec<AuditLogEntry>>;
}

/// Read-only view of the employee directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Unknown ids are simply absent from the result.
    async fn lookup(&self, ids: &[u64]) -> StoreResult<HashMap<u64, User>>;
}
