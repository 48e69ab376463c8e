use std::sync::Arc;

use tracing::error;

use crate::error::AppError;
use crate::model::audit_log::{AuditFilter, AuditLogEntry, NewAuditEntry};
use crate::model::principal::Principal;
use crate::store::AuditStore;

/// Append-only record of privileged mutations.
pub struct AuditLog {
    store: Arc<dyn AuditStore>,
    cap: usize,
}

impl AuditLog {
    pub fn new(store: Arc<dyn AuditStore>, cap: usize) -> Self {
        Self { store, cap: cap.max(1) }
    }

    pub async fn record(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AppError> {
        Ok(self.store.append(entry).await?)
    }

    /// Failures are logged and swallowed so the primary mutation stands.
    pub async fn record_best_effort(&self, entry: NewAuditEntry) {
        let action = entry.action;
        let target_id = entry.target_id.clone();
        if let Err(e) = self.record(entry).await {
            error!(error = %e, %action, %target_id, "Failed to write audit entry");
        }
    }

    /// Newest first; `limit` is clamped to the configured cap.
    pub async fn query(
        &self,
        principal: &Principal,
        filter: &AuditFilter,
        limit: Option<usize>,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        principal.require_admin()?;
        let limit = limit.unwrap_or(self.cap).clamp(1, self.cap);
        Ok(self.store.query(filter, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::audit_log::AuditAction;
    use crate::model::role::Role;
    use crate::store::memory::MemoryAuditStore;
    use crate::store::{StoreError, StoreResult};
    use async_trait::async_trait;

    fn entry(target: u64) -> NewAuditEntry {
        NewAuditEntry {
            actor_id: 1,
            action: AuditAction::LeaveApproved,
            target_id: target.to_string(),
            details: "Admin approved".into(),
        }
    }

    #[actix_web::test]
    async fn query_is_admin_only() {
        let log = AuditLog::new(Arc::new(MemoryAuditStore::default()), 50);
        let manager = Principal::new(2, Role::Manager);

        let result = log.query(&manager, &AuditFilter::default(), None).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[actix_web::test]
    async fn query_is_capped_and_newest_first() {
        let log = AuditLog::new(Arc::new(MemoryAuditStore::default()), 3);
        for target in 1..=5 {
            log.record(entry(target)).await.unwrap();
        }

        let admin = Principal::new(1, Role::Admin);
        let entries = log.query(&admin, &AuditFilter::default(), Some(100)).await.unwrap();
        let targets: Vec<_> = entries.iter().map(|e| e.target_id.as_str()).collect();
        assert_eq!(targets, ["5", "4", "3"]);
    }

    struct Unavailable;

    #[async_trait]
    impl AuditStore for Unavailable {
        async fn append(&self, _entry: NewAuditEntry) -> StoreResult<AuditLogEntry> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn query(&self, _filter: &AuditFilter, _limit: usize) -> StoreResult<Vec<AuditLogEntry>> {
            Ok(Vec::new())
        }
    }

    #[actix_web::test]
    async fn best_effort_swallows_what_record_reports() {
        let log = AuditLog::new(Arc::new(Unavailable), 10);
        assert!(matches!(log.record(entry(1)).await, Err(AppError::Internal(_))));
        log.record_best_effort(entry(1)).await;

        let log = AuditLog::new(Arc::new(MemoryAuditStore::default()), 10);
        log.record_best_effort(entry(7)).await;
        let admin = Principal::new(1, Role::Admin);
        let entries = log.query(&admin, &AuditFilter::default(), None).await.unwrap();
        assert_eq!(entries[0].target_id, "7");
    }
}
