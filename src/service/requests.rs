use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::error::{AppError, ValidationErrors};
use crate::model::audit_log::{AuditAction, NewAuditEntry};
use crate::model::notification::NotificationUpdate;
use crate::model::principal::Principal;
use crate::model::request::{Decision, RequestStatus, WorkflowRequest};
use crate::model::user::{Applicant, Listed, User};
use crate::service::audit::AuditLog;
use crate::service::config::ConfigService;
use crate::service::policy::{self, Transition, TransitionContext};
use crate::store::{RequestStore, UserDirectory};

pub const ADMIN_REASON_MAX_CHARS: usize = 1024;

/// Body of a status update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatusChange {
    pub status: RequestStatus,
    /// Optional justification shown to the employee
    #[schema(example = "insufficient coverage", max_length = 1024)]
    pub reason: Option<String>,
}

impl StatusChange {
    /// Trimmed reason, empty when none was given.
    fn admin_reason(&self) -> Result<String, ValidationErrors> {
        let reason = self.reason.as_deref().map(str::trim).unwrap_or_default().to_string();
        let mut errors = ValidationErrors::default();
        errors.max_chars("reason", &reason, ADMIN_REASON_MAX_CHARS);
        errors.finish(reason)
    }
}

/// Lifecycle of one request kind: submission, listing, decisions and
/// acknowledgement of decisions.
pub struct RequestEngine<R: WorkflowRequest> {
    store: Arc<dyn RequestStore<R>>,
    directory: Arc<dyn UserDirectory>,
    config: Arc<ConfigService>,
    audit: Arc<AuditLog>,
}

impl<R: WorkflowRequest> RequestEngine<R> {
    pub fn new(
        store: Arc<dyn RequestStore<R>>,
        directory: Arc<dyn UserDirectory>,
        config: Arc<ConfigService>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            store,
            directory,
            config,
            audit,
        }
    }

    #[instrument(skip(self, draft), fields(category = %R::CATEGORY, actor_id = principal.id))]
    pub async fn submit(&self, principal: &Principal, draft: R::Draft) -> Result<R, AppError> {
        let config = self.config.get_config().await?;
        let status = R::initial_status(principal.role, &config);

        let request = self.store.insert(principal.id, principal.role, draft, status).await?;
        info!(request_id = request.id(), %status, "Request submitted");

        let mut details = request.label();
        if status == RequestStatus::Approved {
            details.push_str(" (auto-approved)");
        }
        self.audit
            .record_best_effort(NewAuditEntry {
                actor_id: principal.id,
                action: AuditAction::submitted(R::CATEGORY),
                target_id: request.id().to_string(),
                details,
            })
            .await;

        Ok(request)
    }

    /// History of one employee. Owners see all of theirs; approvers see the
    /// entries the visibility rule lets them see.
    pub async fn list_own(&self, principal: &Principal, employee_id: u64) -> Result<Vec<Listed<R>>, AppError> {
        let is_owner = principal.id == employee_id;
        if !is_owner {
            principal.require_approver()?;
        }

        let mut requests = self.store.list_for_employee(employee_id).await?;
        if !is_owner {
            requests.retain(|r| visible_to(principal, r));
        }
        self.attach_applicants(requests).await
    }

    /// Approval queue, filtered by what the caller's role may see.
    pub async fn list_all(&self, principal: &Principal) -> Result<Vec<Listed<R>>, AppError> {
        principal.require_approver()?;

        let mut requests = self.store.list_all().await?;
        requests.retain(|r| visible_to(principal, r));
        self.attach_applicants(requests).await
    }

    pub async fn get(&self, principal: &Principal, id: u64) -> Result<Listed<R>, AppError> {
        let request = self.load(id).await?;
        if request.employee_id() != principal.id && !visible_to(principal, &request) {
            return Err(AppError::forbidden("Not allowed to view this request"));
        }

        let owner = self.lookup_one(request.employee_id()).await?;
        Ok(Listed {
            request,
            applicant: owner.as_ref().map(Applicant::from).unwrap_or_else(Applicant::placeholder),
        })
    }

    /// Applies the hierarchy rule against the state read here, then writes
    /// with a version guard so a concurrent change surfaces as `Conflict`.
    #[instrument(skip(self, change), fields(category = %R::CATEGORY, actor_id = principal.id))]
    pub async fn update_status(&self, principal: &Principal, id: u64, change: StatusChange) -> Result<R, AppError> {
        principal.require_approver()?;
        let admin_reason = change.admin_reason()?;

        let request = self.load(id).await?;
        let config = self.config.get_config().await?;

        let ctx = TransitionContext {
            current: request.status(),
            requested: change.status,
            owner_id: request.employee_id(),
            owner_role: request.lifecycle().owner_role,
            strict_role_validation: config.strict_role_validation,
        };

        if policy::evaluate_transition(principal, &ctx)? == Transition::Unchanged {
            return Ok(request);
        }

        let decision = Decision {
            status: change.status,
            admin_reason,
            updated_by: principal.id,
            decided_at: Utc::now(),
        };
        let updated = self
            .store
            .apply_decision(id, request.lifecycle().version, &decision)
            .await?;

        info!(request_id = id, from = %ctx.current, to = %change.status, "Request status changed");

        if let Some(action) = AuditAction::decided(R::CATEGORY, change.status) {
            let owner_name = self
                .lookup_one(updated.employee_id())
                .await?
                .map(|u| u.name)
                .unwrap_or_else(|| Applicant::placeholder().name);
            self.audit
                .record_best_effort(NewAuditEntry {
                    actor_id: principal.id,
                    action,
                    target_id: id.to_string(),
                    details: format!(
                        "{} {} {} for {}",
                        principal.role,
                        change.status.as_ref().to_lowercase(),
                        updated.label(),
                        owner_name
                    ),
                })
                .await;
        }

        Ok(updated)
    }

    /// Decided requests the principal has not acknowledged yet.
    pub async fn unseen(&self, principal: &Principal) -> Result<Vec<NotificationUpdate>, AppError> {
        let requests = self.store.unseen_decisions(principal.id).await?;
        Ok(requests.iter().map(NotificationUpdate::from_request).collect())
    }

    /// Every id must exist and belong to the principal; nothing is marked otherwise.
    ///
    /// Each entry carries the version the caller was shown, or `None` to use the
    /// version read here. A decision applied after that version stays pending.
    pub async fn acknowledge(&self, principal: &Principal, seen: &[(u64, Option<u32>)]) -> Result<u64, AppError> {
        let mut unique = BTreeMap::new();
        for (id, version) in seen {
            unique.entry(*id).or_insert(*version);
        }

        let mut guarded = Vec::with_capacity(unique.len());
        for (id, shown) in unique {
            let request = self.load(id).await?;
            if request.employee_id() != principal.id {
                return Err(AppError::forbidden("Notification belongs to another employee"));
            }
            guarded.push((id, shown.unwrap_or(request.lifecycle().version)));
        }
        Ok(self.store.mark_notified(principal.id, &guarded).await?)
    }

    async fn load(&self, id: u64) -> Result<R, AppError> {
        self.store
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} request {id}", R::CATEGORY)))
    }

    async fn lookup_one(&self, user_id: u64) -> Result<Option<User>, AppError> {
        Ok(self.directory.lookup(&[user_id]).await?.remove(&user_id))
    }

    async fn lookup(&self, requests: &[R]) -> Result<HashMap<u64, User>, AppError> {
        let ids: Vec<u64> = requests
            .iter()
            .map(|r| r.employee_id())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        Ok(self.directory.lookup(&ids).await?)
    }

    async fn attach_applicants(&self, requests: Vec<R>) -> Result<Vec<Listed<R>>, AppError> {
        let users = self.lookup(&requests).await?;
        Ok(requests.into_iter().map(|r| listed(r, &users)).collect())
    }
}

fn visible_to<R: WorkflowRequest>(principal: &Principal, request: &R) -> bool {
    policy::can_view(principal, request.lifecycle().owner_role)
}

fn listed<R: WorkflowRequest>(request: R, users: &HashMap<u64, User>) -> Listed<R> {
    let applicant = users
        .get(&request.employee_id())
        .map(Applicant::from)
        .unwrap_or_else(Applicant::placeholder);
    Listed { request, applicant }
}
