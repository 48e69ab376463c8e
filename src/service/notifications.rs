use std::sync::Arc;

use crate::error::AppError;
use crate::model::leave_request::LeaveRequest;
use crate::model::notification::NotificationUpdate;
use crate::model::principal::Principal;
use crate::model::reimbursement::ReimbursementClaim;
use crate::model::request::Category;
use crate::service::requests::RequestEngine;

/// Per-user feed of decisions across both request kinds.
pub struct NotificationCenter {
    leave: Arc<RequestEngine<LeaveRequest>>,
    claims: Arc<RequestEngine<ReimbursementClaim>>,
}

impl NotificationCenter {
    pub fn new(leave: Arc<RequestEngine<LeaveRequest>>, claims: Arc<RequestEngine<ReimbursementClaim>>) -> Self {
        Self { leave, claims }
    }

    /// Leave updates first, then claims, each newest first.
    pub async fn pending(&self, principal: &Principal) -> Result<Vec<NotificationUpdate>, AppError> {
        let mut updates = self.leave.unseen(principal).await?;
        updates.extend(self.claims.unseen(principal).await?);
        Ok(updates)
    }

    pub async fn mark_seen(
        &self,
        principal: &Principal,
        id: u64,
        version: Option<u32>,
        category: Category,
    ) -> Result<u64, AppError> {
        self.acknowledge(principal, &[(id, version)], category).await
    }

    pub async fn mark_seen_many(&self, principal: &Principal, ids: &[u64], category: Category) -> Result<u64, AppError> {
        let seen: Vec<(u64, Option<u32>)> = ids.iter().map(|id| (*id, None)).collect();
        self.acknowledge(principal, &seen, category).await
    }

    async fn acknowledge(
        &self,
        principal: &Principal,
        seen: &[(u64, Option<u32>)],
        category: Category,
    ) -> Result<u64, AppError> {
        match category {
            Category::Leave => self.leave.acknowledge(principal, seen).await,
            Category::Expense => self.claims.acknowledge(principal, seen).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::model::leave_request::LeaveDraft;
    use crate::model::reimbursement::ClaimDraft;
    use crate::model::request::RequestStatus;
    use crate::model::role::Role;
    use crate::service::audit::AuditLog;
    use crate::service::config::ConfigService;
    use crate::service::requests::StatusChange;
    use crate::store::memory::{MemoryAuditStore, MemoryConfigStore, MemoryDirectory, MemoryRequestStore};

    const MANAGER: Principal = Principal { id: 2, role: Role::Manager };
    const EMPLOYEE: Principal = Principal { id: 3, role: Role::Employee };

    fn center() -> NotificationCenter {
        let directory = Arc::new(MemoryDirectory::default());
        let audit = Arc::new(AuditLog::new(Arc::new(MemoryAuditStore::default()), 50));
        let config = Arc::new(ConfigService::new(
            Arc::new(MemoryConfigStore::default()),
            audit.clone(),
            Duration::from_secs(30),
        ));
        let leave = RequestEngine::new(
            Arc::new(MemoryRequestStore::<LeaveRequest>::default()),
            directory.clone(),
            config.clone(),
            audit.clone(),
        );
        let claims = RequestEngine::new(
            Arc::new(MemoryRequestStore::<ReimbursementClaim>::default()),
            directory,
            config,
            audit,
        );
        NotificationCenter::new(Arc::new(leave), Arc::new(claims))
    }

    fn decide(status: RequestStatus) -> StatusChange {
        StatusChange { status, reason: None }
    }

    #[actix_web::test]
    async fn decisions_surface_until_acknowledged() {
        let center = center();
        let leave = center
            .leave
            .submit(&EMPLOYEE, LeaveDraft {
                leave_type: "sick".into(),
                from_date: "2025-03-01".parse().unwrap(),
                to_date: "2025-03-01".parse().unwrap(),
                reason: "flu".into(),
            })
            .await
            .unwrap();
        let claim = center
            .claims
            .submit(&EMPLOYEE, ClaimDraft {
                title: "Taxi".into(),
                amount: 42.5,
                proof: None,
            })
            .await
            .unwrap();

        // Pending requests are not notifications.
        assert!(center.pending(&EMPLOYEE).await.unwrap().is_empty());

        center.leave.update_status(&MANAGER, leave.id, decide(RequestStatus::Rejected)).await.unwrap();
        center.claims.update_status(&MANAGER, claim.id, decide(RequestStatus::Approved)).await.unwrap();

        let updates = center.pending(&EMPLOYEE).await.unwrap();
        let categories: Vec<_> = updates.iter().map(|u| u.category).collect();
        assert_eq!(categories, [Category::Leave, Category::Expense]);
        assert_eq!(updates[0].status, RequestStatus::Rejected);
        assert_eq!(updates[1].label, "Taxi | 42.5");

        assert_eq!(
            center.mark_seen(&EMPLOYEE, leave.id, Some(updates[0].version), Category::Leave).await.unwrap(),
            1
        );
        let updates = center.pending(&EMPLOYEE).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].category, Category::Expense);

        assert_eq!(
            center.mark_seen_many(&EMPLOYEE, &[claim.id], Category::Expense).await.unwrap(),
            1
        );
        assert!(center.pending(&EMPLOYEE).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn category_selects_the_request_kind() {
        let center = center();
        let claim = center
            .claims
            .submit(&EMPLOYEE, ClaimDraft {
                title: "Hotel".into(),
                amount: 120.0,
                proof: None,
            })
            .await
            .unwrap();

        // The claim id does not exist as a leave request.
        let wrong_kind = center.mark_seen(&EMPLOYEE, claim.id + 100, None, Category::Leave).await;
        assert!(matches!(wrong_kind, Err(AppError::NotFound(_))));

        let other = Principal::new(9, Role::Employee);
        let foreign = center.mark_seen(&other, claim.id, None, Category::Expense).await;
        assert!(matches!(foreign, Err(AppError::Forbidden(_))));
    }

    #[actix_web::test]
    async fn new_decision_notifies_again() {
        let center = center();
        let admin = Principal::new(1, Role::Admin);
        let leave = center
            .leave
            .submit(&EMPLOYEE, LeaveDraft {
                leave_type: "annual".into(),
                from_date: "2025-05-01".parse().unwrap(),
                to_date: "2025-05-02".parse().unwrap(),
                reason: "trip".into(),
            })
            .await
            .unwrap();

        center.leave.update_status(&MANAGER, leave.id, decide(RequestStatus::Rejected)).await.unwrap();
        center.mark_seen(&EMPLOYEE, leave.id, None, Category::Leave).await.unwrap();
        assert!(center.pending(&EMPLOYEE).await.unwrap().is_empty());

        center.leave.update_status(&admin, leave.id, decide(RequestStatus::Approved)).await.unwrap();
        let updates = center.pending(&EMPLOYEE).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].status, RequestStatus::Approved);
        assert_eq!(updates[0].version, 2);
    }

    #[actix_web::test]
    async fn shown_version_guards_the_acknowledgement() {
        let center = center();
        let admin = Principal::new(1, Role::Admin);
        let claim = center
            .claims
            .submit(&EMPLOYEE, ClaimDraft {
                title: "Hotel".into(),
                amount: 120.0,
                proof: None,
            })
            .await
            .unwrap();

        center.claims.update_status(&MANAGER, claim.id, decide(RequestStatus::Rejected)).await.unwrap();
        let shown = center.pending(&EMPLOYEE).await.unwrap();
        center.claims.update_status(&admin, claim.id, decide(RequestStatus::Approved)).await.unwrap();

        let marked = center
            .mark_seen(&EMPLOYEE, claim.id, Some(shown[0].version), Category::Expense)
            .await
            .unwrap();
        assert_eq!(marked, 0);

        let updates = center.pending(&EMPLOYEE).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].status, RequestStatus::Approved);
    }
}
